use crate::{
    auth::{
        auth::AuthUser,
        jwt::{TokenSubject, generate_access_token, generate_refresh_token, verify_token},
        password::{hash_secret, verify_secret},
        pin::validate_pin_setup,
    },
    config::Config,
    models::{LoginReqDto, QuickPinLoginReq, SetupPinReq, TokenType, UserSql},
};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};
use utoipa::ToSchema;

// auth end points

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    access_token: String,
    refresh_token: String,
}

async fn find_user(
    pool: &MySqlPool,
    company_code: &str,
    username: &str,
) -> Result<Option<UserSql>, sqlx::Error> {
    sqlx::query_as::<_, UserSql>(
        r#"
        SELECT id, username, password, quick_pin, role_id, company_code
        FROM users
        WHERE username = ?
        AND company_code = ?
        AND is_active = TRUE
        "#,
    )
    .bind(username)
    .bind(company_code)
    .fetch_optional(pool)
    .await
}

/// Issues an access/refresh pair and records the refresh token.
async fn issue_tokens(
    user: &UserSql,
    pool: &MySqlPool,
    config: &Config,
) -> Result<LoginResponse, HttpResponse> {
    let subject = TokenSubject {
        user_id: user.id,
        username: user.username.clone(),
        role: user.role_id,
        company_code: user.company_code.clone(),
    };

    debug!("Generating access token");
    let access_token = generate_access_token(&subject, &config.jwt_secret, config.access_token_ttl)
        .map_err(|e| {
            error!(error = %e, "Failed to sign access token");
            HttpResponse::InternalServerError().finish()
        })?;

    debug!("Generating refresh token");
    let (refresh_token, refresh_claims) =
        generate_refresh_token(&subject, &config.jwt_secret, config.refresh_token_ttl).map_err(
            |e| {
                error!(error = %e, "Failed to sign refresh token");
                HttpResponse::InternalServerError().finish()
            },
        )?;

    debug!(
        user_id = user.id,
        jti = %refresh_claims.jti,
        "Storing refresh token"
    );

    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(user.id)
    .bind(&refresh_claims.jti)
    .bind(refresh_claims.exp as i64)
    .execute(pool)
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to store refresh token");
        HttpResponse::InternalServerError().finish()
    })?;

    // last_login_at is informational only
    if let Err(e) = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
        .bind(user.id)
        .execute(pool)
        .await
    {
        error!(error = %e, "Failed to update last_login_at");
    }

    Ok(LoginResponse {
        access_token,
        refresh_token,
    })
}

/// Password login
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Missing company code, username or password"),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, user),
    fields(username = %user.username, company = %user.company_code)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    if user.company_code.trim().is_empty()
        || user.username.trim().is_empty()
        || user.password.is_empty()
    {
        info!("Validation failed: empty company code, username or password");
        return HttpResponse::BadRequest().body("Company code, username and password required");
    }

    debug!("Fetching user from database");

    let db_user = match find_user(pool.get_ref(), user.company_code.trim(), user.username.trim()).await
    {
        Ok(Some(user)) => {
            debug!(user_id = user.id, "User found");
            user
        }
        Ok(None) => {
            info!("Invalid credentials: user not found");
            return HttpResponse::Unauthorized().body("Invalid credentials");
        }
        Err(e) => {
            error!(error = %e, "Database error while fetching user");
            return HttpResponse::InternalServerError().finish();
        }
    };

    debug!("Verifying password");

    if let Err(e) = verify_secret(&user.password, &db_user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return HttpResponse::Unauthorized().body("Invalid credentials");
    }

    match issue_tokens(&db_user, pool.get_ref(), &config).await {
        Ok(tokens) => {
            info!("Login successful");
            HttpResponse::Ok().json(tokens)
        }
        Err(resp) => resp,
    }
}

/// Quick PIN login
#[utoipa::path(
    post,
    path = "/auth/quick-pin",
    request_body = QuickPinLoginReq,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid PIN"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_quick_pin",
    skip(pool, config, req),
    fields(username = %req.username, company = %req.company_code)
)]
pub async fn quick_pin_login(
    req: web::Json<QuickPinLoginReq>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Quick PIN login request received");

    let db_user = match find_user(pool.get_ref(), req.company_code.trim(), req.username.trim()).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            info!("Invalid PIN: user not found");
            return HttpResponse::Unauthorized().body("Invalid PIN");
        }
        Err(e) => {
            error!(error = %e, "Database error while fetching user");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let Some(pin_hash) = db_user.quick_pin.as_deref() else {
        info!("Invalid PIN: no quick PIN set up");
        return HttpResponse::Unauthorized().body("Invalid PIN");
    };

    if let Err(e) = verify_secret(&req.pin, pin_hash) {
        info!(error = %e, "Invalid PIN: mismatch");
        return HttpResponse::Unauthorized().body("Invalid PIN");
    }

    match issue_tokens(&db_user, pool.get_ref(), &config).await {
        Ok(tokens) => {
            info!("Quick PIN login successful");
            HttpResponse::Ok().json(tokens)
        }
        Err(resp) => resp,
    }
}

/// Set up a quick PIN for the current user
#[utoipa::path(
    post,
    path = "/api/auth/pin",
    request_body = SetupPinReq,
    responses(
        (status = 200, description = "Quick PIN set", body = Object, example = json!({
            "message": "Quick PIN has been set successfully!"
        })),
        (status = 400, description = "PIN invalid or confirmation mismatch", body = Object, example = json!({
            "error": "PINs do not match. Please try again."
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn setup_pin(
    auth: AuthUser,
    req: web::Json<SetupPinReq>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    if let Err(e) = validate_pin_setup(&req.pin, &req.confirm_pin, config.quick_pin_length) {
        return Ok(HttpResponse::BadRequest().json(json!({ "error": e.to_string() })));
    }

    let hashed = hash_secret(&req.pin).map_err(|e| {
        error!(error = %e, user_id = auth.user_id, "Failed to hash quick PIN");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    sqlx::query("UPDATE users SET quick_pin = ? WHERE id = ?")
        .bind(hashed)
        .bind(auth.user_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, user_id = auth.user_id, "Failed to store quick PIN");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    info!(user_id = auth.user_id, "Quick PIN set up");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Quick PIN has been set successfully!"
    })))
}

/// Remove the current user's quick PIN
#[utoipa::path(
    delete,
    path = "/api/auth/pin",
    responses(
        (status = 204, description = "Quick PIN removed"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn remove_pin(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    sqlx::query("UPDATE users SET quick_pin = NULL WHERE id = ?")
        .bind(auth.user_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, user_id = auth.user_id, "Failed to remove quick PIN");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::NoContent().finish())
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

// #[post("/refresh")]
pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let Some(token) = bearer_token(&req) else {
        return HttpResponse::Unauthorized().body("No token");
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return HttpResponse::Unauthorized().finish(),
    };

    if claims.token_type != TokenType::Refresh {
        return HttpResponse::Unauthorized().finish();
    }

    // 🔍 find refresh token in DB
    let record = sqlx::query_as::<_, (u64, bool)>(
        r#"
        SELECT id, revoked
        FROM refresh_tokens
        WHERE jti = ?
        "#,
    )
    .bind(&claims.jti)
    .fetch_optional(pool.get_ref())
    .await;

    let record_id = match record {
        Ok(Some((id, false))) => id,
        Ok(_) => return HttpResponse::Unauthorized().finish(),
        Err(e) => {
            error!(error = %e, "Failed to look up refresh token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    // 🔥 revoke old refresh token
    if let Err(e) = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = ?")
        .bind(record_id)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to revoke refresh token");
        return HttpResponse::InternalServerError().finish();
    }

    // 🔄 issue a new pair for the same user
    let user = UserSql {
        id: claims.user_id,
        username: claims.sub,
        password: String::new(),
        quick_pin: None,
        role_id: claims.role,
        company_code: claims.company_code,
    };

    match issue_tokens(&user, pool.get_ref(), &config).await {
        Ok(tokens) => HttpResponse::Ok().json(tokens),
        Err(resp) => resp,
    }
}

// #[post("/logout")]
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let Some(token) = bearer_token(&req) else {
        return HttpResponse::NoContent().finish();
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return HttpResponse::NoContent().finish(),
    };

    // only refresh tokens can logout
    if claims.token_type != TokenType::Refresh {
        return HttpResponse::NoContent().finish();
    }

    // revoke refresh token (idempotent)
    if let Err(e) = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ?")
        .bind(&claims.jti)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to revoke refresh token on logout");
    }

    // success even if token didn't exist
    HttpResponse::NoContent().finish()
}
