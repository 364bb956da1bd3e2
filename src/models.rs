use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "DPWORLD")]
    pub company_code: String,
    #[schema(example = "jdoe")]
    pub username: String,
    #[schema(example = "secret")]
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct QuickPinLoginReq {
    #[schema(example = "DPWORLD")]
    pub company_code: String,
    #[schema(example = "jdoe")]
    pub username: String,
    #[schema(example = "1234")]
    pub pin: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SetupPinReq {
    #[schema(example = "1234")]
    pub pin: String,
    #[schema(example = "1234")]
    pub confirm_pin: String,
}

/// Credentials row used by both password and quick PIN login.
#[derive(FromRow)]
pub struct UserSql {
    pub id: u64, // 👈 matches BIGINT UNSIGNED,
    pub username: String,
    pub password: String,
    pub quick_pin: Option<String>,
    pub role_id: u8,
    pub company_code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    pub role: u8, // role id
    pub company_code: String,
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}
