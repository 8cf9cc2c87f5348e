use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Passengers younger than this need a guardian on every reservation.
pub const ADULT_AGE: i32 = 18;
pub const MAX_AGE: i32 = 130;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, JsonSchema)]
pub struct Passenger {
    pub passenger_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub passport_number: String,
    pub contact: String,
    pub nationality: String,
    pub age: i32,
}

impl Passenger {
    pub fn is_minor(&self) -> bool {
        self.age < ADULT_AGE
    }
}

#[derive(Debug, Clone)]
pub struct NewPassenger {
    pub first_name: String,
    pub last_name: String,
    pub passport_number: String,
    pub contact: String,
    pub nationality: String,
    pub age: i32,
}

#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
pub struct CreatePassengerRequest {
    #[validate(length(min = 1, max = 50))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50))]
    pub last_name: String,
    #[validate(length(min = 5, max = 20))]
    pub passport_number: String,
    #[validate(email)]
    pub contact: String,
    #[validate(length(min = 1, max = 50))]
    pub nationality: String,
    pub age: i32,
}

// Passport numbers are immutable once registered
#[derive(Debug, Clone, Default, Deserialize, JsonSchema, Validate)]
pub struct UpdatePassengerRequest {
    #[validate(length(min = 1, max = 50))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub last_name: Option<String>,
    #[validate(email)]
    pub contact: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub nationality: Option<String>,
    pub age: Option<i32>,
}
