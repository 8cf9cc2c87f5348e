use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, JsonSchema)]
#[schemars(example = "LoginResponse::example")]
pub struct LoginResponse {
    #[schemars(title = "Bearer token")]
    pub token: String,

    #[schemars(title = "Token type")]
    pub token_type: String,
}

impl LoginResponse {
    pub fn example() -> Self {
        Self {
            token: "eyJhbGciOiJIUzI1NiJ9...".to_string(),
            token_type: "Bearer".to_string(),
        }
    }
}
