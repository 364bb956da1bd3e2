use crate::{
    auth::auth::AuthUser,
    model::user::UserProfile,
    utils::db_utils::{build_update_sql, execute_update},
};
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::{error, info};
use utoipa::ToSchema;

/// Columns a user may change on their own profile.
const EDITABLE_COLUMNS: &[&str] = &["first_name", "last_name", "email", "department"];

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "John")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Doe")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "john.doe@company.com")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Operations")]
    pub department: Option<String>,
}

async fn fetch_profile(pool: &MySqlPool, user_id: u64) -> Result<Option<UserProfile>, sqlx::Error> {
    sqlx::query_as::<_, UserProfile>(
        r#"
        SELECT id, username, company_code, first_name, last_name, email, department
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Current user's profile
#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "Profile found", body = UserProfile),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Profile not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Profile"
)]
pub async fn get_profile(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let profile = fetch_profile(pool.get_ref(), auth.user_id)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = auth.user_id, "Failed to load profile");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Profile not found"))?;

    Ok(HttpResponse::Ok().json(profile))
}

/// Update the current user's profile
#[utoipa::path(
    patch,
    path = "/api/profile",
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = UserProfile),
        (status = 400, description = "No editable fields provided"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Profile not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Profile"
)]
pub async fn update_profile(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<UpdateProfile>,
) -> actix_web::Result<impl Responder> {
    let payload = serde_json::to_value(payload.into_inner())
        .map_err(|_| actix_web::error::ErrorBadRequest("Invalid payload"))?;

    let update = build_update_sql("users", &payload, EDITABLE_COLUMNS, "id", auth.user_id)?;

    execute_update(pool.get_ref(), update).await.map_err(|e| {
        error!(error = %e, user_id = auth.user_id, "Failed to update profile");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    info!(user_id = auth.user_id, "Profile updated");

    let profile = fetch_profile(pool.get_ref(), auth.user_id)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = auth.user_id, "Failed to reload profile");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Profile not found"))?;

    Ok(HttpResponse::Ok().json(profile))
}
