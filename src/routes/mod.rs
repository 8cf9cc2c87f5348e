pub mod aircraft_route;
pub mod auth_route;
pub mod flight_route;
pub mod maintenance_route;
pub mod passenger_route;
pub mod reservation_route;
