#[macro_use]
extern crate rocket;
extern crate rocket_okapi;

pub mod config;
pub mod db;
pub mod models;
pub mod routes;
pub mod services;
pub mod storage;
pub mod swagger;
pub mod utils;

use std::sync::Arc;

use rocket::fairing::AdHoc;
use rocket::{Build, Rocket};
use rocket_okapi::openapi_get_routes;
use rocket_okapi::swagger_ui::make_swagger_ui;

use crate::config::AppConfig;
use crate::services::aircraft_service::AircraftService;
use crate::services::auth_service::AuthService;
use crate::services::flight_service::FlightService;
use crate::services::maintenance_service::MaintenanceService;
use crate::services::passenger_service::PassengerService;
use crate::services::reservation_service::ReservationService;
use crate::storage::Store;
use crate::swagger::swagger_ui;

/// Assembles the HTTP application over an already opened store.
pub fn build_rocket(config: AppConfig, store: Arc<dyn Store>) -> Rocket<Build> {
    let auth_service = AuthService::new(Arc::new(config.clone()));

    rocket::build()
        .manage(config)
        .manage(auth_service)
        .manage(AircraftService::new(store.clone()))
        .manage(FlightService::new(store.clone()))
        .manage(PassengerService::new(store.clone()))
        .manage(ReservationService::new(store.clone()))
        .manage(MaintenanceService::new(store))
        .mount(
            "/api",
            openapi_get_routes![
                routes::auth_route::login,
                routes::aircraft_route::create_aircraft,
                routes::aircraft_route::list_aircraft,
                routes::aircraft_route::get_aircraft,
                routes::aircraft_route::update_aircraft,
                routes::aircraft_route::delete_aircraft,
                routes::aircraft_route::list_aircraft_maintenance,
                routes::flight_route::create_flight,
                routes::flight_route::list_flights,
                routes::flight_route::get_flight,
                routes::flight_route::update_flight,
                routes::flight_route::change_flight_state,
                routes::flight_route::delete_flight,
                routes::flight_route::list_flight_reservations,
                routes::passenger_route::create_passenger,
                routes::passenger_route::list_passengers,
                routes::passenger_route::get_passenger,
                routes::passenger_route::get_passenger_by_passport,
                routes::passenger_route::list_passport_reservations,
                routes::passenger_route::update_passenger,
                routes::passenger_route::delete_passenger,
                routes::reservation_route::create_reservation,
                routes::reservation_route::list_reservations,
                routes::reservation_route::get_reservation,
                routes::reservation_route::change_reservation_state,
                routes::reservation_route::change_seat,
                routes::reservation_route::delete_reservation,
                routes::maintenance_route::schedule_maintenance,
                routes::maintenance_route::list_maintenance,
                routes::maintenance_route::get_maintenance,
                routes::maintenance_route::update_maintenance,
                routes::maintenance_route::complete_maintenance,
                routes::maintenance_route::delete_maintenance,
            ],
        )
        .mount("/swagger", make_swagger_ui(&swagger_ui()))
        .attach(AdHoc::on_response("CORS", |_, res| {
            Box::pin(async move {
                res.set_header(rocket::http::Header::new(
                    "Access-Control-Allow-Origin",
                    "*",
                ));
            })
        }))
}
