pub mod aircraft;
pub mod auth;
pub mod flight;
pub mod maintenance;
pub mod passenger;
pub mod reservation;

// State columns are MySQL ENUMs holding the strum display names; rows decode
// them through `#[sqlx(try_from = "String")]`.
macro_rules! state_from_column {
    ($($state:ty),+ $(,)?) => {
        $(
            impl TryFrom<String> for $state {
                type Error = strum::ParseError;

                fn try_from(value: String) -> Result<Self, Self::Error> {
                    value.parse()
                }
            }
        )+
    };
}

state_from_column!(
    aircraft::AircraftState,
    flight::FlightState,
    maintenance::MaintenanceState,
    reservation::ReservationState,
);
