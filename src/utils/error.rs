use chrono::{NaiveDate, NaiveDateTime};
use rocket::http::ContentType;
use rocket::http::Status;
use rocket::response::Responder;
use rocket::Request;
use rocket::Response;
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::json;
use std::io::Cursor;
use thiserror::Error;
use validator::ValidationErrors;

use crate::models::aircraft::AircraftState;
use crate::models::flight::FlightState;
use crate::storage::StorageError;

/// Business rules broken by a request, reported with the values involved.
#[derive(Error, Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Conflict {
    #[error("duplicate booking: passenger {passenger_id} already has a reservation on flight {flight_id}")]
    DuplicateBooking { passenger_id: i32, flight_id: i32 },

    #[error("aircraft full: {current_capacity} of {max_capacity} seats taken")]
    AircraftFull {
        current_capacity: i32,
        max_capacity: i32,
    },

    #[error("seat taken: {seat_code} on flight {flight_id}")]
    SeatTaken { flight_id: i32, seat_code: String },

    #[error("guardian {guardian_id} has no confirmed reservation on flight {flight_id}")]
    GuardianNotBooked { guardian_id: i32, flight_id: i32 },

    #[error("passenger {guardian_id} is the guardian of {dependents} minor(s) on flight {flight_id}")]
    GuardianInUse {
        guardian_id: i32,
        flight_id: i32,
        dependents: usize,
    },

    #[error("reservation {reservation_id} is canceled")]
    ReservationCanceled { reservation_id: i32 },

    #[error("flight {flight_id} is {state} and not open for booking")]
    FlightClosed { flight_id: i32, state: FlightState },

    #[error("flight {flight_id} is {state} and can no longer be changed")]
    FlightLocked { flight_id: i32, state: FlightState },

    #[error("flight {flight_id} still has {reservations} reservation(s)")]
    FlightHasReservations { flight_id: i32, reservations: usize },

    #[error("aircraft {aircraft_id} is {state}")]
    AircraftActive {
        aircraft_id: i32,
        state: AircraftState,
    },

    #[error("aircraft {aircraft_id} is out of service")]
    AircraftOutOfService { aircraft_id: i32 },

    #[error("aircraft {aircraft_id} must be Ready to depart, it is {state}")]
    AircraftNotReady {
        aircraft_id: i32,
        state: AircraftState,
    },

    #[error("max capacity {requested} is below the {booked} seat(s) booked on flight {flight_id}")]
    CapacityBelowBookings {
        flight_id: i32,
        booked: i32,
        requested: i32,
    },

    #[error("aircraft {aircraft_id} already has open maintenance {maintenance_id} on {date}")]
    MaintenanceOverlap {
        aircraft_id: i32,
        maintenance_id: i32,
        date: NaiveDate,
    },

    #[error("maintenance {maintenance_id} is already finished")]
    MaintenanceFinished { maintenance_id: i32 },

    #[error("aircraft {aircraft_id} already exists")]
    DuplicateAircraft { aircraft_id: i32 },

    #[error("passport {passport_number} is already registered")]
    DuplicatePassport { passport_number: String },

    #[error("passenger {passenger_id} cannot change between minor and adult with {reservations} active reservation(s)")]
    AgeChangeWithBookings {
        passenger_id: i32,
        reservations: usize,
    },

    #[error("unique constraint {constraint} violated")]
    UniqueKey { constraint: String },

    #[error("foreign key {constraint} violated")]
    ForeignKey { constraint: String },
}

/// Malformed input, rejected before anything is written.
#[derive(Error, Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Invalid {
    #[error("max capacity must be positive, got {value}")]
    NonPositiveCapacity { value: i32 },

    #[error("age {value} is out of range")]
    AgeOutOfRange { value: i32 },

    #[error("passenger {passenger_id} is a minor and needs a guardian")]
    GuardianRequired { passenger_id: i32 },

    #[error("guardian {guardian_id} is a minor (age {age})")]
    GuardianIsMinor { guardian_id: i32, age: i32 },

    #[error("invalid {entity} state transition from {from} to {to}")]
    InvalidTransition {
        entity: String,
        from: String,
        to: String,
    },

    #[error("arrival {arrival} is not after departure {departure}")]
    ArrivalBeforeDeparture {
        departure: NaiveDateTime,
        arrival: NaiveDateTime,
    },

    #[error("check constraint {constraint} violated")]
    CheckConstraint { constraint: String },

    #[error("{message}")]
    Malformed { message: String },
}

impl Invalid {
    pub fn transition(entity: &str, from: impl ToString, to: impl ToString) -> Self {
        Invalid::InvalidTransition {
            entity: entity.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

#[derive(Error, Debug, Serialize, JsonSchema)]
pub enum AppError {
    #[error("Storage failure")]
    StorageFailure(String),

    #[error("Invariant broken")]
    InvariantBroken(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Validation error: {0}")]
    ValidationError(Invalid),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(Conflict),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        AppError::NotFound(format!("{entity} {id} not found"))
    }

    /// Stable name of the error kind, used in response bodies and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::StorageFailure(_) => "storage_failure",
            AppError::InvariantBroken(_) => "invariant_broken",
            AppError::AuthError(_) => "auth",
            AppError::ValidationError(_) => "validation",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::BadRequest(_) => "bad_request",
        }
    }

    fn status(&self) -> Status {
        match self {
            AppError::ValidationError(_) => Status::BadRequest,
            AppError::NotFound(_) => Status::NotFound,
            AppError::StorageFailure(_) => Status::InternalServerError,
            AppError::InvariantBroken(_) => Status::InternalServerError,
            AppError::AuthError(_) => Status::Unauthorized,
            AppError::Conflict(_) => Status::Conflict,
            AppError::BadRequest(_) => Status::BadRequest,
        }
    }
}

impl From<Conflict> for AppError {
    fn from(conflict: Conflict) -> Self {
        AppError::Conflict(conflict)
    }
}

impl From<Invalid> for AppError {
    fn from(invalid: Invalid) -> Self {
        AppError::ValidationError(invalid)
    }
}

// Constraint violations become business errors; anything else is opaque
impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UniqueViolation(constraint) => {
                AppError::Conflict(Conflict::UniqueKey { constraint })
            }
            StorageError::ForeignKeyViolation(constraint) => {
                AppError::Conflict(Conflict::ForeignKey { constraint })
            }
            StorageError::CheckViolation(constraint) => {
                AppError::ValidationError(Invalid::CheckConstraint { constraint })
            }
            StorageError::Database(err) => AppError::StorageFailure(err.to_string()),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::from(StorageError::from(err))
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::ValidationError(Invalid::Malformed {
            message: errors.to_string(),
        })
    }
}

// Define a type alias for the result type
pub type AppResult<T> = Result<T, AppError>;

// Format all errors from the route level into a JSON response
#[rocket::async_trait]
impl<'r> Responder<'r, 'static> for AppError {
    fn respond_to(self, _: &'r Request<'_>) -> rocket::response::Result<'static> {
        let status = self.status();

        let detail = match &self {
            AppError::Conflict(conflict) => json!(conflict),
            AppError::ValidationError(invalid) => json!(invalid),
            _ => serde_json::Value::Null,
        };

        let json = json!({
            "error": self.to_string(),
            "kind": self.kind(),
            "detail": detail,
        });

        Response::build()
            .status(status)
            .header(ContentType::JSON)
            .sized_body(None, Cursor::new(json.to_string()))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_constraints_are_classified() {
        let err = AppError::from(StorageError::UniqueViolation("seat".into()));
        assert!(matches!(err, AppError::Conflict(Conflict::UniqueKey { .. })));

        let err = AppError::from(StorageError::ForeignKeyViolation("flight".into()));
        assert!(matches!(err, AppError::Conflict(Conflict::ForeignKey { .. })));

        let err = AppError::from(StorageError::CheckViolation("age".into()));
        assert!(matches!(
            err,
            AppError::ValidationError(Invalid::CheckConstraint { .. })
        ));

        let err = AppError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, AppError::StorageFailure(_)));
    }

    #[test]
    fn storage_failure_hides_driver_detail() {
        let err = AppError::StorageFailure("connection refused on 10.0.0.3".into());
        assert_eq!(err.to_string(), "Storage failure");
        assert_eq!(err.status(), Status::InternalServerError);
    }

    #[test]
    fn conflicts_name_the_rule_and_values() {
        let err = AppError::from(Conflict::AircraftFull {
            current_capacity: 1,
            max_capacity: 1,
        });
        assert_eq!(err.to_string(), "Conflict: aircraft full: 1 of 1 seats taken");

        let detail = serde_json::to_value(Conflict::SeatTaken {
            flight_id: 3,
            seat_code: "1A".into(),
        })
        .unwrap();
        assert_eq!(detail["rule"], "seat_taken");
        assert_eq!(detail["seat_code"], "1A");
    }

    #[test]
    fn transitions_report_both_states() {
        let invalid = Invalid::transition("aircraft", AircraftState::OutOfService, AircraftState::Ready);
        assert_eq!(
            invalid.to_string(),
            "invalid aircraft state transition from Out of Service to Ready"
        );
    }
}
