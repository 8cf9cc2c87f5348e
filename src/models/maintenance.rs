use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use validator::Validate;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, JsonSchema)]
pub struct Maintenance {
    pub maintenance_id: i32,
    pub aircraft_id: i32,
    pub operation_date: NaiveDate,
    pub maintenance_type: String,
    #[sqlx(try_from = "String")]
    pub state: MaintenanceState,
}

impl Maintenance {
    pub fn is_open(&self) -> bool {
        self.state != MaintenanceState::Finished
    }
}

// Maintenance State Enum
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Display, EnumString,
)]
pub enum MaintenanceState {
    Planned,
    Finished,
    Waiting,
}

impl MaintenanceState {
    /// Planned and Waiting swap freely; Finished is final.
    pub fn can_transition_to(self, next: MaintenanceState) -> bool {
        self == next || self != MaintenanceState::Finished
    }
}

#[derive(Debug, Clone)]
pub struct NewMaintenance {
    pub aircraft_id: i32,
    pub operation_date: NaiveDate,
    pub maintenance_type: String,
    pub state: MaintenanceState,
}

#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
pub struct ScheduleMaintenanceRequest {
    pub aircraft_id: i32,
    pub operation_date: NaiveDate,
    #[validate(length(min = 1, max = 50))]
    pub maintenance_type: String,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema, Validate)]
pub struct UpdateMaintenanceRequest {
    pub operation_date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 50))]
    pub maintenance_type: Option<String>,
    pub state: Option<MaintenanceState>,
}
