use crate::models::aircraft::{Aircraft, CreateAircraftRequest, UpdateAircraftRequest};
use crate::models::maintenance::Maintenance;
use crate::services::aircraft_service::AircraftService;
use crate::services::maintenance_service::MaintenanceService;
use crate::utils::error::AppError;
use crate::utils::jwt::AuthenticatedUser;
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

/// Register an aircraft
#[openapi(tag = "Aircraft")]
#[post("/aircraft", format = "json", data = "<request>")]
pub async fn create_aircraft(
    request: Json<CreateAircraftRequest>,
    _auth: AuthenticatedUser,
    aircraft_service: &State<AircraftService>,
) -> Result<Json<Aircraft>, AppError> {
    let aircraft = aircraft_service.create_aircraft(request.into_inner()).await?;
    Ok(Json(aircraft))
}

/// List all aircraft
#[openapi(tag = "Aircraft")]
#[get("/aircraft")]
pub async fn list_aircraft(
    aircraft_service: &State<AircraftService>,
) -> Result<Json<Vec<Aircraft>>, AppError> {
    Ok(Json(aircraft_service.list_aircraft().await?))
}

/// Get an aircraft
#[openapi(tag = "Aircraft")]
#[get("/aircraft/<aircraft_id>")]
pub async fn get_aircraft(
    aircraft_id: i32,
    aircraft_service: &State<AircraftService>,
) -> Result<Json<Aircraft>, AppError> {
    Ok(Json(aircraft_service.get_aircraft(aircraft_id).await?))
}

/// Update model, capacity or state of an aircraft
#[openapi(tag = "Aircraft")]
#[patch("/aircraft/<aircraft_id>", format = "json", data = "<request>")]
pub async fn update_aircraft(
    aircraft_id: i32,
    request: Json<UpdateAircraftRequest>,
    _auth: AuthenticatedUser,
    aircraft_service: &State<AircraftService>,
) -> Result<Json<Aircraft>, AppError> {
    let aircraft = aircraft_service
        .update_aircraft(aircraft_id, request.into_inner())
        .await?;
    Ok(Json(aircraft))
}

/// Delete an aircraft that is not flying or in turnaround
#[openapi(tag = "Aircraft")]
#[delete("/aircraft/<aircraft_id>")]
pub async fn delete_aircraft(
    aircraft_id: i32,
    _auth: AuthenticatedUser,
    aircraft_service: &State<AircraftService>,
) -> Result<Json<Aircraft>, AppError> {
    Ok(Json(aircraft_service.delete_aircraft(aircraft_id).await?))
}

/// List maintenance windows of an aircraft
#[openapi(tag = "Aircraft")]
#[get("/aircraft/<aircraft_id>/maintenance")]
pub async fn list_aircraft_maintenance(
    aircraft_id: i32,
    maintenance_service: &State<MaintenanceService>,
) -> Result<Json<Vec<Maintenance>>, AppError> {
    let windows = maintenance_service
        .list_aircraft_maintenance(aircraft_id)
        .await?;
    Ok(Json(windows))
}
