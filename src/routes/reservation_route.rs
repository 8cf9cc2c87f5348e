use crate::models::reservation::{
    CreateReservationRequest, Reservation, ReservationStateRequest, SeatChangeRequest,
};
use crate::services::reservation_service::ReservationService;
use crate::utils::error::AppError;
use crate::utils::jwt::AuthenticatedUser;
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use validator::Validate;

/// Book a seat on a flight
#[openapi(tag = "Reservations")]
#[post("/reservations", format = "json", data = "<request>")]
pub async fn create_reservation(
    request: Json<CreateReservationRequest>,
    _auth: AuthenticatedUser,
    reservation_service: &State<ReservationService>,
) -> Result<Json<Reservation>, AppError> {
    let reservation = reservation_service
        .create_reservation(request.into_inner())
        .await?;
    Ok(Json(reservation))
}

/// List all reservations
#[openapi(tag = "Reservations")]
#[get("/reservations")]
pub async fn list_reservations(
    _auth: AuthenticatedUser,
    reservation_service: &State<ReservationService>,
) -> Result<Json<Vec<Reservation>>, AppError> {
    Ok(Json(reservation_service.list_reservations().await?))
}

/// Get a reservation
#[openapi(tag = "Reservations")]
#[get("/reservations/<reservation_id>")]
pub async fn get_reservation(
    reservation_id: i32,
    _auth: AuthenticatedUser,
    reservation_service: &State<ReservationService>,
) -> Result<Json<Reservation>, AppError> {
    Ok(Json(reservation_service.get_reservation(reservation_id).await?))
}

/// Confirm, wait-list or cancel a reservation
#[openapi(tag = "Reservations")]
#[put("/reservations/<reservation_id>/state", format = "json", data = "<request>")]
pub async fn change_reservation_state(
    reservation_id: i32,
    request: Json<ReservationStateRequest>,
    _auth: AuthenticatedUser,
    reservation_service: &State<ReservationService>,
) -> Result<Json<Reservation>, AppError> {
    let reservation = reservation_service
        .change_state(reservation_id, request.into_inner().state)
        .await?;
    Ok(Json(reservation))
}

/// Move a reservation to another seat
#[openapi(tag = "Reservations")]
#[put("/reservations/<reservation_id>/seat", format = "json", data = "<request>")]
pub async fn change_seat(
    reservation_id: i32,
    request: Json<SeatChangeRequest>,
    _auth: AuthenticatedUser,
    reservation_service: &State<ReservationService>,
) -> Result<Json<Reservation>, AppError> {
    request.validate()?;
    let reservation = reservation_service
        .change_seat(reservation_id, &request.seat_code)
        .await?;
    Ok(Json(reservation))
}

/// Delete a reservation and release its seat
#[openapi(tag = "Reservations")]
#[delete("/reservations/<reservation_id>")]
pub async fn delete_reservation(
    reservation_id: i32,
    _auth: AuthenticatedUser,
    reservation_service: &State<ReservationService>,
) -> Result<Json<Reservation>, AppError> {
    Ok(Json(
        reservation_service.delete_reservation(reservation_id).await?,
    ))
}
