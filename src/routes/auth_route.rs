use crate::models::auth::{LoginRequest, LoginResponse};
use crate::services::auth_service::AuthService;
use crate::utils::error::AppError;
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

/// Log in as the operations administrator
#[openapi(tag = "Auth")]
#[post("/auth/login", format = "json", data = "<request>")]
pub async fn login(
    request: Json<LoginRequest>,
    auth_service: &State<AuthService>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = auth_service.login(request.into_inner()).await?;
    Ok(Json(response))
}
