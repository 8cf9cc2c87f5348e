use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use validator::Validate;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, JsonSchema)]
pub struct Aircraft {
    pub aircraft_id: i32,
    pub model: String,
    pub max_capacity: i32,
    #[sqlx(try_from = "String")]
    pub state: AircraftState,
}

// Aircraft State Enum
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Display, EnumString,
)]
pub enum AircraftState {
    #[strum(serialize = "Ready")]
    Ready,
    #[strum(serialize = "Flying")]
    Flying,
    #[strum(serialize = "Turnaround")]
    Turnaround,
    #[strum(serialize = "Maintenance")]
    Maintenance,
    #[serde(rename = "Out of Service")]
    #[strum(serialize = "Out of Service")]
    OutOfService,
}

impl AircraftState {
    /// Whether an admin or a flight/maintenance event may move an aircraft
    /// from `self` to `next`. Staying in the same state is always allowed
    /// and treated as a no-op by callers.
    pub fn can_transition_to(self, next: AircraftState) -> bool {
        use AircraftState::*;

        if self == next {
            return true;
        }
        match (self, next) {
            (OutOfService, _) => false,
            (_, OutOfService) => true,
            (Ready, Flying) | (Flying, Turnaround) | (Turnaround, Ready) => true,
            (Ready, Maintenance) | (Turnaround, Maintenance) | (Maintenance, Ready) => true,
            _ => false,
        }
    }

    // Flying and Turnaround aircraft cannot be grounded by deletion
    pub fn is_active(self) -> bool {
        matches!(self, AircraftState::Flying | AircraftState::Turnaround)
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
pub struct CreateAircraftRequest {
    pub aircraft_id: i32,
    #[validate(length(min = 1, max = 64))]
    pub model: String,
    pub max_capacity: i32,
    pub state: Option<AircraftState>,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema, Validate)]
pub struct UpdateAircraftRequest {
    #[validate(length(min = 1, max = 64))]
    pub model: Option<String>,
    pub max_capacity: Option<i32>,
    pub state: Option<AircraftState>,
}
