use chrono::NaiveDateTime;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use validator::Validate;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, JsonSchema)]
pub struct Flight {
    pub flight_id: i32,
    pub destination: String,
    pub departure_time: NaiveDateTime,
    pub arrival_time: NaiveDateTime,
    pub aircraft_id: i32,
    pub current_capacity: i32,
    #[sqlx(try_from = "String")]
    pub state: FlightState,
}

// Flight State Enum
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Display, EnumString,
)]
pub enum FlightState {
    Scheduled,
    InProgress,
    Arrived,
    Cancelled,
}

impl FlightState {
    pub fn can_transition_to(self, next: FlightState) -> bool {
        use FlightState::*;

        self == next
            || matches!(
                (self, next),
                (Scheduled, InProgress) | (InProgress, Arrived) | (Scheduled, Cancelled)
            )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, FlightState::Arrived | FlightState::Cancelled)
    }
}

// Row values for a flight insert; the store assigns the id
#[derive(Debug, Clone)]
pub struct NewFlight {
    pub destination: String,
    pub departure_time: NaiveDateTime,
    pub arrival_time: NaiveDateTime,
    pub aircraft_id: i32,
}

#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
pub struct CreateFlightRequest {
    #[validate(length(min = 1, max = 100))]
    pub destination: String,
    pub departure_time: NaiveDateTime,
    pub arrival_time: NaiveDateTime,
    pub aircraft_id: i32,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema, Validate)]
pub struct UpdateFlightRequest {
    #[validate(length(min = 1, max = 100))]
    pub destination: Option<String>,
    pub departure_time: Option<NaiveDateTime>,
    pub arrival_time: Option<NaiveDateTime>,
    pub aircraft_id: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FlightStateRequest {
    pub state: FlightState,
}
