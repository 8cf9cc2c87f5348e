use crate::models::flight::{CreateFlightRequest, Flight, FlightStateRequest, UpdateFlightRequest};
use crate::models::reservation::Reservation;
use crate::services::flight_service::FlightService;
use crate::services::reservation_service::ReservationService;
use crate::utils::error::AppError;
use crate::utils::jwt::AuthenticatedUser;
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

/// Schedule a flight
#[openapi(tag = "Flights")]
#[post("/flights", format = "json", data = "<request>")]
pub async fn create_flight(
    request: Json<CreateFlightRequest>,
    _auth: AuthenticatedUser,
    flight_service: &State<FlightService>,
) -> Result<Json<Flight>, AppError> {
    let flight = flight_service.create_flight(request.into_inner()).await?;
    Ok(Json(flight))
}

/// List all flights
#[openapi(tag = "Flights")]
#[get("/flights")]
pub async fn list_flights(
    flight_service: &State<FlightService>,
) -> Result<Json<Vec<Flight>>, AppError> {
    Ok(Json(flight_service.list_flights().await?))
}

/// Get a flight
#[openapi(tag = "Flights")]
#[get("/flights/<flight_id>")]
pub async fn get_flight(
    flight_id: i32,
    flight_service: &State<FlightService>,
) -> Result<Json<Flight>, AppError> {
    Ok(Json(flight_service.get_flight(flight_id).await?))
}

/// Update a scheduled flight
#[openapi(tag = "Flights")]
#[patch("/flights/<flight_id>", format = "json", data = "<request>")]
pub async fn update_flight(
    flight_id: i32,
    request: Json<UpdateFlightRequest>,
    _auth: AuthenticatedUser,
    flight_service: &State<FlightService>,
) -> Result<Json<Flight>, AppError> {
    let flight = flight_service
        .update_flight(flight_id, request.into_inner())
        .await?;
    Ok(Json(flight))
}

/// Move a flight to its next state
#[openapi(tag = "Flights")]
#[put("/flights/<flight_id>/state", format = "json", data = "<request>")]
pub async fn change_flight_state(
    flight_id: i32,
    request: Json<FlightStateRequest>,
    _auth: AuthenticatedUser,
    flight_service: &State<FlightService>,
) -> Result<Json<Flight>, AppError> {
    let flight = flight_service
        .change_state(flight_id, request.into_inner().state)
        .await?;
    Ok(Json(flight))
}

/// Delete a flight without reservations
#[openapi(tag = "Flights")]
#[delete("/flights/<flight_id>")]
pub async fn delete_flight(
    flight_id: i32,
    _auth: AuthenticatedUser,
    flight_service: &State<FlightService>,
) -> Result<Json<Flight>, AppError> {
    Ok(Json(flight_service.delete_flight(flight_id).await?))
}

/// List reservations on a flight
#[openapi(tag = "Flights")]
#[get("/flights/<flight_id>/reservations")]
pub async fn list_flight_reservations(
    flight_id: i32,
    reservation_service: &State<ReservationService>,
) -> Result<Json<Vec<Reservation>>, AppError> {
    let reservations = reservation_service
        .list_flight_reservations(flight_id)
        .await?;
    Ok(Json(reservations))
}
