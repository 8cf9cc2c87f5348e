use crate::models::flight::FlightState;
use crate::utils::error::{AppError, Conflict, Invalid};
use indexmap::IndexMap;
use okapi::openapi3::SchemaObject;
use rocket::http::Status;
use rocket_okapi::gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::RefOr;
use rocket_okapi::okapi::openapi3::{MediaType, Response, Responses};
use rocket_okapi::response::OpenApiResponderInner;
use serde_json::json;

impl<'r> OpenApiResponderInner for AppError {
    fn responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        let mut responses = Responses::default();

        // Define error responses
        let error_responses = [
            (
                Status::BadRequest,
                "Validation failed",
                AppError::ValidationError(Invalid::NonPositiveCapacity { value: 0 }),
            ),
            (
                Status::Unauthorized,
                "Missing or invalid bearer token",
                AppError::AuthError("Invalid credentials".to_string()),
            ),
            (
                Status::NotFound,
                "Entity not found",
                AppError::not_found("Flight", 42),
            ),
            (
                Status::Conflict,
                "Business rule violated",
                AppError::Conflict(Conflict::FlightClosed {
                    flight_id: 42,
                    state: FlightState::Cancelled,
                }),
            ),
            (
                Status::InternalServerError,
                "Storage failure or broken invariant",
                AppError::StorageFailure(String::new()),
            ),
        ];

        for (status, description, error) in error_responses {
            let detail = match &error {
                AppError::Conflict(conflict) => json!(conflict),
                AppError::ValidationError(invalid) => json!(invalid),
                _ => serde_json::Value::Null,
            };
            responses.responses.insert(
                status.code.to_string(),
                RefOr::Object(Response {
                    description: description.to_string(),
                    content: {
                        let mut content = IndexMap::new();
                        content.insert(
                            "application/json".to_string(),
                            MediaType {
                                schema: Some(SchemaObject::default()),
                                example: Some(json!({
                                    "error": error.to_string(),
                                    "kind": error.kind(),
                                    "detail": detail,
                                })),
                                ..Default::default()
                            },
                        );
                        content
                    },
                    ..Default::default()
                }),
            );
        }

        Ok(responses)
    }
}
