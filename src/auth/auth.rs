use crate::{
    auth::jwt::verify_token,
    config::Config,
    model::{role::Role, user::UserContext},
    models::TokenType,
};
use actix_web::{
    FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized,
    http::header::{AUTHORIZATION, HeaderMap},
    web::Data,
};
use futures::future::{Ready, ready};
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,
    pub company_code: String,
}

/// Reasons a request carries no usable access token.
#[derive(Debug, Error, PartialEq)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingHeader,

    #[error("Invalid Authorization header encoding")]
    BadEncoding,

    #[error("Authorization header must start with Bearer")]
    NotBearer,

    #[error("Invalid or expired token: {0}")]
    InvalidToken(String),

    #[error("Refresh tokens cannot access the API")]
    RefreshToken,

    #[error("Invalid role")]
    InvalidRole,
}

impl AuthUser {
    /// Resolves the caller from a `Bearer` access token in `headers`.
    pub fn from_headers(headers: &HeaderMap, secret: &str) -> Result<Self, AuthError> {
        let header = headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingHeader)?
            .to_str()
            .map_err(|_| AuthError::BadEncoding)?;

        let token = header.strip_prefix("Bearer ").ok_or(AuthError::NotBearer)?;
        let claims = verify_token(token, secret).map_err(AuthError::InvalidToken)?;

        if claims.token_type != TokenType::Access {
            return Err(AuthError::RefreshToken);
        }

        let role = Role::from_id(claims.role).ok_or(AuthError::InvalidRole)?;

        Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.sub,
            role,
            company_code: claims.company_code,
        })
    }
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Already resolved by the auth middleware
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let Some(config) = req.app_data::<Data<Config>>() else {
            return ready(Err(actix_web::error::ErrorInternalServerError(
                "Config missing",
            )));
        };

        ready(
            AuthUser::from_headers(req.headers(), &config.jwt_secret)
                .map_err(|e| ErrorUnauthorized(e.to_string())),
        )
    }
}

impl AuthUser {
    pub fn context(&self) -> UserContext {
        UserContext {
            user_id: self.user_id,
            username: self.username.clone(),
            company_code: self.company_code.clone(),
            role: self.role,
        }
    }

    /// Context for reading `target`'s records; other users need an elevated role.
    ///
    /// The context keeps the caller's company. Whether `target` belongs to it
    /// is checked against the store by `AttendanceService::ensure_same_company`.
    pub fn context_for(&self, target: Option<u64>) -> actix_web::Result<UserContext> {
        match target {
            None => Ok(self.context()),
            Some(id) if id == self.user_id => Ok(self.context()),
            Some(id) if self.role.can_view_others() => Ok(self.context().on_behalf_of(id)),
            Some(_) => Err(actix_web::error::ErrorForbidden("Supervisor/Admin only")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            user_id: 7,
            username: "jdoe".to_string(),
            role,
            company_code: "DPWORLD".to_string(),
        }
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value.parse().unwrap());
        headers
    }

    fn token(token_type: &str, role: u8) -> String {
        use crate::auth::jwt::{TokenSubject, generate_access_token, generate_refresh_token};

        let subject = TokenSubject {
            user_id: 7,
            username: "jdoe".to_string(),
            role,
            company_code: "DPWORLD".to_string(),
        };
        match token_type {
            "access" => generate_access_token(&subject, "s3cret", 60).unwrap(),
            _ => generate_refresh_token(&subject, "s3cret", 60).unwrap().0,
        }
    }

    #[test]
    fn access_token_resolves_the_caller() {
        let auth =
            AuthUser::from_headers(&headers(&format!("Bearer {}", token("access", 2))), "s3cret")
                .unwrap();
        assert_eq!(auth.user_id, 7);
        assert_eq!(auth.role, Role::Supervisor);
        assert_eq!(auth.company_code, "DPWORLD");
    }

    #[test]
    fn unusable_headers_are_rejected() {
        assert_eq!(
            AuthUser::from_headers(&HeaderMap::new(), "s3cret").unwrap_err(),
            AuthError::MissingHeader
        );
        assert_eq!(
            AuthUser::from_headers(&headers("Basic abc"), "s3cret").unwrap_err(),
            AuthError::NotBearer
        );
        assert!(matches!(
            AuthUser::from_headers(&headers("Bearer junk"), "s3cret"),
            Err(AuthError::InvalidToken(_))
        ));
        assert!(matches!(
            AuthUser::from_headers(&headers(&format!("Bearer {}", token("access", 1))), "other"),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn refresh_tokens_and_unknown_roles_are_rejected() {
        let refresh = headers(&format!("Bearer {}", token("refresh", 1)));
        assert_eq!(
            AuthUser::from_headers(&refresh, "s3cret").unwrap_err(),
            AuthError::RefreshToken
        );

        let bad_role = headers(&format!("Bearer {}", token("access", 9)));
        assert_eq!(
            AuthUser::from_headers(&bad_role, "s3cret").unwrap_err(),
            AuthError::InvalidRole
        );
    }

    #[test]
    fn own_records_need_no_role() {
        let auth = user(Role::Employee);
        assert_eq!(auth.context_for(None).unwrap().user_id, 7);
        assert_eq!(auth.context_for(Some(7)).unwrap().user_id, 7);
    }

    #[test]
    fn employees_cannot_read_others() {
        assert!(user(Role::Employee).context_for(Some(8)).is_err());
    }

    #[test]
    fn supervisors_act_on_behalf_of_others() {
        let ctx = user(Role::Supervisor).context_for(Some(8)).unwrap();
        assert_eq!(ctx.user_id, 8);
        assert_eq!(ctx.username, "jdoe");
    }
}
