use crate::models::passenger::{CreatePassengerRequest, Passenger, UpdatePassengerRequest};
use crate::models::reservation::Reservation;
use crate::services::passenger_service::PassengerService;
use crate::services::reservation_service::ReservationService;
use crate::utils::error::AppError;
use crate::utils::jwt::AuthenticatedUser;
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

/// Register a passenger
#[openapi(tag = "Passengers")]
#[post("/passengers", format = "json", data = "<request>")]
pub async fn create_passenger(
    request: Json<CreatePassengerRequest>,
    _auth: AuthenticatedUser,
    passenger_service: &State<PassengerService>,
) -> Result<Json<Passenger>, AppError> {
    let passenger = passenger_service
        .create_passenger(request.into_inner())
        .await?;
    Ok(Json(passenger))
}

/// List all passengers
#[openapi(tag = "Passengers")]
#[get("/passengers")]
pub async fn list_passengers(
    _auth: AuthenticatedUser,
    passenger_service: &State<PassengerService>,
) -> Result<Json<Vec<Passenger>>, AppError> {
    Ok(Json(passenger_service.list_passengers().await?))
}

/// Get a passenger
#[openapi(tag = "Passengers")]
#[get("/passengers/<passenger_id>")]
pub async fn get_passenger(
    passenger_id: i32,
    _auth: AuthenticatedUser,
    passenger_service: &State<PassengerService>,
) -> Result<Json<Passenger>, AppError> {
    Ok(Json(passenger_service.get_passenger(passenger_id).await?))
}

/// Look up a passenger by passport number
#[openapi(tag = "Passengers")]
#[get("/passengers/passport/<passport_number>")]
pub async fn get_passenger_by_passport(
    passport_number: String,
    _auth: AuthenticatedUser,
    passenger_service: &State<PassengerService>,
) -> Result<Json<Passenger>, AppError> {
    let passenger = passenger_service.get_by_passport(&passport_number).await?;
    Ok(Json(passenger))
}

/// List reservations held under a passport number
#[openapi(tag = "Passengers")]
#[get("/passengers/passport/<passport_number>/reservations")]
pub async fn list_passport_reservations(
    passport_number: String,
    _auth: AuthenticatedUser,
    reservation_service: &State<ReservationService>,
) -> Result<Json<Vec<Reservation>>, AppError> {
    let reservations = reservation_service
        .find_by_passport(&passport_number)
        .await?;
    Ok(Json(reservations))
}

/// Update passenger details
#[openapi(tag = "Passengers")]
#[patch("/passengers/<passenger_id>", format = "json", data = "<request>")]
pub async fn update_passenger(
    passenger_id: i32,
    request: Json<UpdatePassengerRequest>,
    _auth: AuthenticatedUser,
    passenger_service: &State<PassengerService>,
) -> Result<Json<Passenger>, AppError> {
    let passenger = passenger_service
        .update_passenger(passenger_id, request.into_inner())
        .await?;
    Ok(Json(passenger))
}

/// Delete a passenger without reservations
#[openapi(tag = "Passengers")]
#[delete("/passengers/<passenger_id>")]
pub async fn delete_passenger(
    passenger_id: i32,
    _auth: AuthenticatedUser,
    passenger_service: &State<PassengerService>,
) -> Result<Json<Passenger>, AppError> {
    Ok(Json(passenger_service.delete_passenger(passenger_id).await?))
}
