pub mod aircraft_service;
pub mod auth_service;
pub mod flight_service;
pub mod maintenance_service;
pub mod passenger_service;
pub mod reservation_service;
pub mod transaction;
