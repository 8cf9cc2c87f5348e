use crate::models::maintenance::{
    Maintenance, ScheduleMaintenanceRequest, UpdateMaintenanceRequest,
};
use crate::services::maintenance_service::MaintenanceService;
use crate::utils::error::AppError;
use crate::utils::jwt::AuthenticatedUser;
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

/// Plan a maintenance window
#[openapi(tag = "Maintenance")]
#[post("/maintenance", format = "json", data = "<request>")]
pub async fn schedule_maintenance(
    request: Json<ScheduleMaintenanceRequest>,
    _auth: AuthenticatedUser,
    maintenance_service: &State<MaintenanceService>,
) -> Result<Json<Maintenance>, AppError> {
    let maintenance = maintenance_service
        .schedule_maintenance(request.into_inner())
        .await?;
    Ok(Json(maintenance))
}

/// List all maintenance windows
#[openapi(tag = "Maintenance")]
#[get("/maintenance")]
pub async fn list_maintenance(
    maintenance_service: &State<MaintenanceService>,
) -> Result<Json<Vec<Maintenance>>, AppError> {
    Ok(Json(maintenance_service.list_maintenance().await?))
}

/// Get a maintenance window
#[openapi(tag = "Maintenance")]
#[get("/maintenance/<maintenance_id>")]
pub async fn get_maintenance(
    maintenance_id: i32,
    maintenance_service: &State<MaintenanceService>,
) -> Result<Json<Maintenance>, AppError> {
    Ok(Json(maintenance_service.get_maintenance(maintenance_id).await?))
}

/// Reschedule or re-type a maintenance window
#[openapi(tag = "Maintenance")]
#[patch("/maintenance/<maintenance_id>", format = "json", data = "<request>")]
pub async fn update_maintenance(
    maintenance_id: i32,
    request: Json<UpdateMaintenanceRequest>,
    _auth: AuthenticatedUser,
    maintenance_service: &State<MaintenanceService>,
) -> Result<Json<Maintenance>, AppError> {
    let maintenance = maintenance_service
        .update_maintenance(maintenance_id, request.into_inner())
        .await?;
    Ok(Json(maintenance))
}

/// Finish a maintenance window
#[openapi(tag = "Maintenance")]
#[post("/maintenance/<maintenance_id>/complete")]
pub async fn complete_maintenance(
    maintenance_id: i32,
    _auth: AuthenticatedUser,
    maintenance_service: &State<MaintenanceService>,
) -> Result<Json<Maintenance>, AppError> {
    let maintenance = maintenance_service
        .complete_maintenance(maintenance_id)
        .await?;
    Ok(Json(maintenance))
}

/// Delete a maintenance window
#[openapi(tag = "Maintenance")]
#[delete("/maintenance/<maintenance_id>")]
pub async fn delete_maintenance(
    maintenance_id: i32,
    _auth: AuthenticatedUser,
    maintenance_service: &State<MaintenanceService>,
) -> Result<Json<Maintenance>, AppError> {
    let maintenance = maintenance_service
        .delete_maintenance(maintenance_id)
        .await?;
    Ok(Json(maintenance))
}
