use derive_more::Display;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 7,
        "username": "jdoe",
        "company_code": "DPWORLD",
        "first_name": "John",
        "last_name": "Doe",
        "email": "john.doe@company.com",
        "department": "Operations"
    })
)]
pub struct UserProfile {
    pub id: u64,
    pub username: String,
    pub company_code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[schema(nullable = true)]
    pub department: Option<String>,
}

/// The authenticated caller, passed explicitly to every attendance operation.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display(fmt = "{}#{}", username, user_id)]
pub struct UserContext {
    pub user_id: u64,
    pub username: String,
    pub company_code: String,
    pub role: Role,
}

impl UserContext {
    /// Context for acting on `user_id`'s records on behalf of this caller.
    pub fn on_behalf_of(&self, user_id: u64) -> UserContext {
        UserContext {
            user_id,
            ..self.clone()
        }
    }
}
