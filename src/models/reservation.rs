use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, sqlx::FromRow, JsonSchema)]
pub struct Reservation {
    pub reservation_id: i32,
    pub passenger_id: i32,
    pub flight_id: i32,
    pub seat_code: String,
    #[sqlx(try_from = "String")]
    pub state: ReservationState,
    pub guardian_id: Option<i32>,
}

impl Reservation {
    /// Canceled reservations keep their row and seat but no longer count
    /// towards the flight's capacity.
    pub fn holds_capacity(&self) -> bool {
        self.state != ReservationState::Canceled
    }
}

// Reservation State Enum
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Display, EnumString,
)]
pub enum ReservationState {
    Pending,
    Confirmed,
    Waiting,
    Canceled,
}

impl ReservationState {
    /// State every new reservation starts in.
    pub const INITIAL: ReservationState = ReservationState::Pending;

    pub fn can_transition_to(self, next: ReservationState) -> bool {
        use ReservationState::*;

        self == next
            || matches!(
                (self, next),
                (Pending, Confirmed)
                    | (Pending, Waiting)
                    | (Pending, Canceled)
                    | (Waiting, Confirmed)
                    | (Waiting, Canceled)
                    | (Confirmed, Canceled)
            )
    }
}

#[derive(Debug, Clone)]
pub struct NewReservation {
    pub passenger_id: i32,
    pub flight_id: i32,
    pub seat_code: String,
    pub state: ReservationState,
    pub guardian_id: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
pub struct CreateReservationRequest {
    pub passenger_id: i32,
    pub flight_id: i32,
    #[validate(custom(function = "validate_seat_code"))]
    pub seat_code: String,
    pub guardian_id: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ReservationStateRequest {
    pub state: ReservationState,
}

#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
pub struct SeatChangeRequest {
    #[validate(custom(function = "validate_seat_code"))]
    pub seat_code: String,
}

/// Seat codes are compared case-insensitively ("12a" and "12A" are the same
/// seat), so they are stored upper-cased without surrounding whitespace.
pub fn normalize_seat_code(seat_code: &str) -> String {
    seat_code.trim().to_uppercase()
}

/// Width of the `seat_code` column.
pub const MAX_SEAT_CODE_LEN: usize = 8;

/// Checks an already normalized seat code.
pub fn is_valid_seat_code(seat_code: &str) -> bool {
    !seat_code.is_empty()
        && seat_code.len() <= MAX_SEAT_CODE_LEN
        && seat_code.chars().all(|c| c.is_ascii_alphanumeric())
}

// Request rule: judged after normalization, so padding does not count
fn validate_seat_code(seat_code: &str) -> Result<(), ValidationError> {
    if is_valid_seat_code(&normalize_seat_code(seat_code)) {
        Ok(())
    } else {
        Err(ValidationError::new("seat_code"))
    }
}
