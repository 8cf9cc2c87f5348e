use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::Request;
use rocket_okapi::request::OpenApiFromRequest;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::utils::error::{AppError, AppResult};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // admin username
    pub exp: usize,
}

/// Request guard for mutating endpoints: a valid bearer token signed with
/// the configured secret.
#[derive(Debug, OpenApiFromRequest)]
pub struct AuthenticatedUser {
    pub username: String,
}

pub fn generate_token(config: &AppConfig, username: &str) -> AppResult<String> {
    let expiration = chrono::Utc::now()
        .checked_add_signed(chrono::Duration::hours(config.token_ttl_hours))
        .ok_or_else(|| AppError::AuthError("token lifetime out of range".to_string()))?
        .timestamp() as usize;

    let claims = Claims {
        sub: username.to_string(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::AuthError(e.to_string()))
}

pub fn verify_token(config: &AppConfig, token: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::AuthError(e.to_string()))
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let token = match request.headers().get_one("Authorization") {
            Some(token) if token.starts_with("Bearer ") => &token[7..],
            _ => return Outcome::Error((Status::Unauthorized, ())),
        };

        let Some(config) = request.rocket().state::<AppConfig>() else {
            tracing::error!("AppConfig is not managed by this rocket instance");
            return Outcome::Error((Status::InternalServerError, ()));
        };

        match verify_token(config, token) {
            Ok(claims) => Outcome::Success(AuthenticatedUser {
                username: claims.sub,
            }),
            Err(err) => {
                tracing::debug!(error = %err, "rejected bearer token");
                Outcome::Error((Status::Unauthorized, ()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageBackend;
    use std::time::Duration;

    fn config(secret: &str) -> AppConfig {
        AppConfig {
            storage: StorageBackend::Memory,
            database_url: None,
            max_connections: 1,
            acquire_timeout: Duration::from_secs(1),
            jwt_secret: secret.to_string(),
            token_ttl_hours: 1,
            admin_username: "admin".to_string(),
            admin_password_hash: String::new(),
        }
    }

    #[test]
    fn token_carries_the_username() {
        let config = config("secret");
        let token = generate_token(&config, "admin").unwrap();
        assert_eq!(verify_token(&config, &token).unwrap().sub, "admin");
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let token = generate_token(&config("one"), "admin").unwrap();
        assert!(matches!(
            verify_token(&config("two"), &token),
            Err(AppError::AuthError(_))
        ));
    }
}
