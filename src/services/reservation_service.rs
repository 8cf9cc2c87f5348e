use std::sync::Arc;

use validator::Validate;

use crate::models::flight::{Flight, FlightState};
use crate::models::passenger::Passenger;
use crate::models::reservation::{
    is_valid_seat_code, normalize_seat_code, CreateReservationRequest, NewReservation, Reservation,
    ReservationState, MAX_SEAT_CODE_LEN,
};
use crate::services::transaction::{Transaction, TransactionCoordinator};
use crate::storage::{Lock, Store};
use crate::utils::error::{AppError, AppResult, Conflict, Invalid};

#[derive(Clone)]
pub struct ReservationService {
    coordinator: TransactionCoordinator,
}

impl ReservationService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        ReservationService {
            coordinator: TransactionCoordinator::new(store),
        }
    }

    /// Books a seat on a flight.
    ///
    /// The flight row stays locked from the first check until commit, so
    /// concurrent bookings on one flight are checked and counted one at a
    /// time. New reservations start in [`ReservationState::INITIAL`].
    #[tracing::instrument(skip(self))]
    pub async fn create_reservation(
        &self,
        request: CreateReservationRequest,
    ) -> AppResult<Reservation> {
        request.validate()?;
        let mut tx = self.coordinator.begin("create_reservation").await?;
        let result = create_reservation(&mut tx, request).await;
        tx.finish(result).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_reservation(&self, reservation_id: i32) -> AppResult<Reservation> {
        let mut tx = self.coordinator.begin("delete_reservation").await?;
        let result = delete_reservation(&mut tx, reservation_id).await;
        tx.finish(result).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn change_state(
        &self,
        reservation_id: i32,
        state: ReservationState,
    ) -> AppResult<Reservation> {
        let mut tx = self.coordinator.begin("change_reservation_state").await?;
        let result = change_state(&mut tx, reservation_id, state).await;
        tx.finish(result).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn change_seat(&self, reservation_id: i32, seat_code: &str) -> AppResult<Reservation> {
        let seat_code = parse_seat_code(seat_code)?;
        let mut tx = self.coordinator.begin("change_seat").await?;
        let result = change_seat(&mut tx, reservation_id, seat_code).await;
        tx.finish(result).await
    }

    pub async fn get_reservation(&self, reservation_id: i32) -> AppResult<Reservation> {
        let mut tx = self.coordinator.begin("get_reservation").await?;
        let result = tx
            .get_reservation(reservation_id, Lock::None)
            .await
            .map_err(AppError::from)
            .and_then(|found| found.ok_or_else(|| AppError::not_found("Reservation", reservation_id)));
        tx.finish(result).await
    }

    pub async fn list_reservations(&self) -> AppResult<Vec<Reservation>> {
        let mut tx = self.coordinator.begin("list_reservations").await?;
        let result = tx.list_reservations().await.map_err(AppError::from);
        tx.finish(result).await
    }

    pub async fn list_flight_reservations(&self, flight_id: i32) -> AppResult<Vec<Reservation>> {
        let mut tx = self.coordinator.begin("list_flight_reservations").await?;
        let result = list_flight_reservations(&mut tx, flight_id).await;
        tx.finish(result).await
    }

    pub async fn find_by_passport(&self, passport_number: &str) -> AppResult<Vec<Reservation>> {
        let mut tx = self.coordinator.begin("find_reservations_by_passport").await?;
        let result = find_by_passport(&mut tx, passport_number).await;
        tx.finish(result).await
    }
}

fn parse_seat_code(seat_code: &str) -> AppResult<String> {
    let seat_code = normalize_seat_code(seat_code);
    if !is_valid_seat_code(&seat_code) {
        return Err(Invalid::Malformed {
            message: format!(
                "seat code {seat_code:?} must be 1 to {MAX_SEAT_CODE_LEN} letters or digits"
            ),
        }
        .into());
    }
    Ok(seat_code)
}

async fn create_reservation(
    tx: &mut Transaction,
    request: CreateReservationRequest,
) -> AppResult<Reservation> {
    let seat_code = parse_seat_code(&request.seat_code)?;

    let mut flight = tx
        .get_flight(request.flight_id, Lock::Update)
        .await?
        .ok_or_else(|| AppError::not_found("Flight", request.flight_id))?;

    let passenger = tx
        .get_passenger(request.passenger_id, Lock::Share)
        .await?
        .ok_or_else(|| AppError::not_found("Passenger", request.passenger_id))?;

    if tx
        .find_reservation(passenger.passenger_id, flight.flight_id)
        .await?
        .is_some()
    {
        return Err(Conflict::DuplicateBooking {
            passenger_id: passenger.passenger_id,
            flight_id: flight.flight_id,
        }
        .into());
    }

    let aircraft = tx
        .get_aircraft(flight.aircraft_id, Lock::Share)
        .await?
        .ok_or_else(|| {
            AppError::InvariantBroken(format!(
                "flight {} references missing aircraft {}",
                flight.flight_id, flight.aircraft_id
            ))
        })?;
    if flight.current_capacity >= aircraft.max_capacity {
        return Err(Conflict::AircraftFull {
            current_capacity: flight.current_capacity,
            max_capacity: aircraft.max_capacity,
        }
        .into());
    }

    if tx
        .find_seat_holder(flight.flight_id, &seat_code)
        .await?
        .is_some()
    {
        return Err(Conflict::SeatTaken {
            flight_id: flight.flight_id,
            seat_code,
        }
        .into());
    }

    // Only minors carry a guardian link
    let guardian_id = if passenger.is_minor() {
        Some(check_guardian(tx, &passenger, &flight, request.guardian_id).await?)
    } else {
        None
    };

    if flight.state != FlightState::Scheduled {
        return Err(Conflict::FlightClosed {
            flight_id: flight.flight_id,
            state: flight.state,
        }
        .into());
    }

    let new_reservation = NewReservation {
        passenger_id: passenger.passenger_id,
        flight_id: flight.flight_id,
        seat_code,
        state: ReservationState::INITIAL,
        guardian_id,
    };
    let reservation_id = tx.insert_reservation(&new_reservation).await?;

    flight.current_capacity += 1;
    tx.update_flight(&flight).await?;

    tracing::info!(
        reservation_id,
        flight_id = flight.flight_id,
        current_capacity = flight.current_capacity,
        "reservation created"
    );

    Ok(Reservation {
        reservation_id,
        passenger_id: new_reservation.passenger_id,
        flight_id: new_reservation.flight_id,
        seat_code: new_reservation.seat_code,
        state: new_reservation.state,
        guardian_id: new_reservation.guardian_id,
    })
}

async fn check_guardian(
    tx: &mut Transaction,
    minor: &Passenger,
    flight: &Flight,
    guardian_id: Option<i32>,
) -> AppResult<i32> {
    let guardian_id = guardian_id.ok_or(Invalid::GuardianRequired {
        passenger_id: minor.passenger_id,
    })?;

    let guardian = tx
        .get_passenger(guardian_id, Lock::Share)
        .await?
        .ok_or_else(|| AppError::not_found("Guardian", guardian_id))?;
    if guardian.is_minor() {
        return Err(Invalid::GuardianIsMinor {
            guardian_id,
            age: guardian.age,
        }
        .into());
    }

    let confirmed = tx
        .find_reservation(guardian_id, flight.flight_id)
        .await?
        .is_some_and(|reservation| reservation.state == ReservationState::Confirmed);
    if !confirmed {
        return Err(Conflict::GuardianNotBooked {
            guardian_id,
            flight_id: flight.flight_id,
        }
        .into());
    }

    Ok(guardian_id)
}

/// Locks the owning flight before the reservation so that every mutation of
/// a flight's bookings takes the flight lock first.
///
/// Plain reads made after this see every booking committed before the flight
/// lock was granted; sessions run at READ COMMITTED.
async fn lock_reservation(
    tx: &mut Transaction,
    reservation_id: i32,
) -> AppResult<(Reservation, Flight)> {
    let flight_id = tx
        .get_reservation(reservation_id, Lock::None)
        .await?
        .ok_or_else(|| AppError::not_found("Reservation", reservation_id))?
        .flight_id;

    let flight = tx
        .get_flight(flight_id, Lock::Update)
        .await?
        .ok_or_else(|| {
            AppError::InvariantBroken(format!(
                "reservation {reservation_id} references missing flight {flight_id}"
            ))
        })?;

    // Re-read under the flight lock; a concurrent delete may have won
    let reservation = tx
        .get_reservation(reservation_id, Lock::Update)
        .await?
        .ok_or_else(|| AppError::not_found("Reservation", reservation_id))?;

    Ok((reservation, flight))
}

/// Takes one seat off the flight's occupied count.
pub(crate) fn release_seat(flight: &mut Flight) -> AppResult<()> {
    if flight.current_capacity <= 0 {
        return Err(AppError::InvariantBroken(format!(
            "capacity of flight {} would drop below zero",
            flight.flight_id
        )));
    }
    flight.current_capacity -= 1;
    Ok(())
}

// A guardian cannot leave while a minor on the flight still depends on them
async fn ensure_not_guardian(tx: &mut Transaction, reservation: &Reservation) -> AppResult<()> {
    let dependents = tx
        .list_flight_reservations(reservation.flight_id)
        .await?
        .into_iter()
        .filter(|other| {
            other.reservation_id != reservation.reservation_id
                && other.guardian_id == Some(reservation.passenger_id)
                && other.holds_capacity()
        })
        .count();

    if dependents > 0 {
        return Err(Conflict::GuardianInUse {
            guardian_id: reservation.passenger_id,
            flight_id: reservation.flight_id,
            dependents,
        }
        .into());
    }
    Ok(())
}

async fn delete_reservation(tx: &mut Transaction, reservation_id: i32) -> AppResult<Reservation> {
    let (reservation, mut flight) = lock_reservation(tx, reservation_id).await?;

    if reservation.holds_capacity() {
        ensure_not_guardian(tx, &reservation).await?;
    }

    tx.delete_reservation(reservation_id).await?;

    if reservation.holds_capacity() {
        release_seat(&mut flight)?;
        tx.update_flight(&flight).await?;
    }

    tracing::info!(
        reservation_id,
        flight_id = flight.flight_id,
        current_capacity = flight.current_capacity,
        "reservation deleted"
    );
    Ok(reservation)
}

async fn change_state(
    tx: &mut Transaction,
    reservation_id: i32,
    state: ReservationState,
) -> AppResult<Reservation> {
    let (mut reservation, mut flight) = lock_reservation(tx, reservation_id).await?;

    if reservation.state == state {
        return Ok(reservation);
    }
    if !reservation.state.can_transition_to(state) {
        return Err(Invalid::transition("reservation", reservation.state, state).into());
    }

    if state == ReservationState::Canceled {
        ensure_not_guardian(tx, &reservation).await?;
        release_seat(&mut flight)?;
        tx.update_flight(&flight).await?;
    }

    reservation.state = state;
    tx.update_reservation(&reservation).await?;

    tracing::info!(reservation_id, state = %state, "reservation state changed");
    Ok(reservation)
}

async fn change_seat(
    tx: &mut Transaction,
    reservation_id: i32,
    seat_code: String,
) -> AppResult<Reservation> {
    let (mut reservation, flight) = lock_reservation(tx, reservation_id).await?;

    if !reservation.holds_capacity() {
        return Err(Conflict::ReservationCanceled { reservation_id }.into());
    }
    if flight.state != FlightState::Scheduled {
        return Err(Conflict::FlightClosed {
            flight_id: flight.flight_id,
            state: flight.state,
        }
        .into());
    }
    if reservation.seat_code == seat_code {
        return Ok(reservation);
    }
    if tx
        .find_seat_holder(flight.flight_id, &seat_code)
        .await?
        .is_some()
    {
        return Err(Conflict::SeatTaken {
            flight_id: flight.flight_id,
            seat_code,
        }
        .into());
    }

    reservation.seat_code = seat_code;
    tx.update_reservation(&reservation).await?;
    Ok(reservation)
}

async fn list_flight_reservations(
    tx: &mut Transaction,
    flight_id: i32,
) -> AppResult<Vec<Reservation>> {
    if tx.get_flight(flight_id, Lock::None).await?.is_none() {
        return Err(AppError::not_found("Flight", flight_id));
    }
    Ok(tx.list_flight_reservations(flight_id).await?)
}

async fn find_by_passport(
    tx: &mut Transaction,
    passport_number: &str,
) -> AppResult<Vec<Reservation>> {
    let passenger = tx
        .find_passenger_by_passport(passport_number.trim())
        .await?
        .ok_or_else(|| AppError::not_found("Passenger with passport", passport_number))?;
    Ok(tx.list_passenger_reservations(passenger.passenger_id).await?)
}
