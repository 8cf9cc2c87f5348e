use std::sync::Arc;

use bcrypt::verify;

use crate::config::AppConfig;
use crate::models::auth::{LoginRequest, LoginResponse};
use crate::utils::error::{AppError, AppResult};
use crate::utils::jwt;

/// Issues bearer tokens to the operations administrator configured through
/// `ADMIN_USERNAME` / `ADMIN_PASSWORD_HASH`.
#[derive(Clone)]
pub struct AuthService {
    config: Arc<AppConfig>,
}

impl AuthService {
    pub fn new(config: Arc<AppConfig>) -> Self {
        AuthService { config }
    }

    #[tracing::instrument(skip_all, fields(username = %request.username))]
    pub async fn login(&self, request: LoginRequest) -> AppResult<LoginResponse> {
        if request.username != self.config.admin_username {
            tracing::info!("login refused");
            return Err(AppError::AuthError("Invalid credentials".into()));
        }

        // Verify password
        let password_matches = verify(request.password.as_bytes(), &self.config.admin_password_hash)
            .map_err(|e| AppError::AuthError(e.to_string()))?;

        if !password_matches {
            tracing::info!("login refused");
            return Err(AppError::AuthError("Invalid credentials".into()));
        }

        let token = jwt::generate_token(&self.config, &request.username)?;

        Ok(LoginResponse {
            token,
            token_type: "Bearer".to_string(),
        })
    }
}
