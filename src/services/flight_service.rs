use std::sync::Arc;

use chrono::NaiveDateTime;
use validator::Validate;

use crate::models::aircraft::{Aircraft, AircraftState};
use crate::models::flight::{
    CreateFlightRequest, Flight, FlightState, NewFlight, UpdateFlightRequest,
};
use crate::models::reservation::ReservationState;
use crate::services::transaction::{Transaction, TransactionCoordinator};
use crate::storage::{Lock, Store};
use crate::utils::error::{AppError, AppResult, Conflict, Invalid};

#[derive(Clone)]
pub struct FlightService {
    coordinator: TransactionCoordinator,
}

impl FlightService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        FlightService {
            coordinator: TransactionCoordinator::new(store),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_flight(&self, request: CreateFlightRequest) -> AppResult<Flight> {
        request.validate()?;
        let mut tx = self.coordinator.begin("create_flight").await?;
        let result = create_flight(&mut tx, request).await;
        tx.finish(result).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_flight(
        &self,
        flight_id: i32,
        request: UpdateFlightRequest,
    ) -> AppResult<Flight> {
        request.validate()?;
        let mut tx = self.coordinator.begin("update_flight").await?;
        let result = update_flight(&mut tx, flight_id, request).await;
        tx.finish(result).await
    }

    /// Moves a flight through its lifecycle and carries the aircraft along:
    /// departure puts a Ready aircraft in the air, arrival sends it to
    /// turnaround, and cancelling a flight cancels every booking on it.
    #[tracing::instrument(skip(self))]
    pub async fn change_state(&self, flight_id: i32, state: FlightState) -> AppResult<Flight> {
        let mut tx = self.coordinator.begin("change_flight_state").await?;
        let result = change_state(&mut tx, flight_id, state).await;
        tx.finish(result).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_flight(&self, flight_id: i32) -> AppResult<Flight> {
        let mut tx = self.coordinator.begin("delete_flight").await?;
        let result = delete_flight(&mut tx, flight_id).await;
        tx.finish(result).await
    }

    pub async fn get_flight(&self, flight_id: i32) -> AppResult<Flight> {
        let mut tx = self.coordinator.begin("get_flight").await?;
        let result = lock_flight(&mut tx, flight_id, Lock::None).await;
        tx.finish(result).await
    }

    pub async fn list_flights(&self) -> AppResult<Vec<Flight>> {
        let mut tx = self.coordinator.begin("list_flights").await?;
        let result = tx.list_flights().await.map_err(AppError::from);
        tx.finish(result).await
    }
}

fn check_schedule(departure: NaiveDateTime, arrival: NaiveDateTime) -> AppResult<()> {
    if arrival <= departure {
        return Err(Invalid::ArrivalBeforeDeparture { departure, arrival }.into());
    }
    Ok(())
}

async fn lock_flight(tx: &mut Transaction, flight_id: i32, lock: Lock) -> AppResult<Flight> {
    tx.get_flight(flight_id, lock)
        .await?
        .ok_or_else(|| AppError::not_found("Flight", flight_id))
}

// Aircraft a flight can be assigned to
async fn assignable_aircraft(tx: &mut Transaction, aircraft_id: i32) -> AppResult<Aircraft> {
    let aircraft = tx
        .get_aircraft(aircraft_id, Lock::Share)
        .await?
        .ok_or_else(|| AppError::not_found("Aircraft", aircraft_id))?;
    if aircraft.state == AircraftState::OutOfService {
        return Err(Conflict::AircraftOutOfService { aircraft_id }.into());
    }
    Ok(aircraft)
}

async fn create_flight(tx: &mut Transaction, request: CreateFlightRequest) -> AppResult<Flight> {
    check_schedule(request.departure_time, request.arrival_time)?;
    assignable_aircraft(tx, request.aircraft_id).await?;

    let flight_id = tx
        .insert_flight(&NewFlight {
            destination: request.destination,
            departure_time: request.departure_time,
            arrival_time: request.arrival_time,
            aircraft_id: request.aircraft_id,
        })
        .await?;

    tracing::info!(flight_id, aircraft_id = request.aircraft_id, "flight created");
    lock_flight(tx, flight_id, Lock::None).await
}

async fn update_flight(
    tx: &mut Transaction,
    flight_id: i32,
    request: UpdateFlightRequest,
) -> AppResult<Flight> {
    let mut flight = lock_flight(tx, flight_id, Lock::Update).await?;
    if flight.state != FlightState::Scheduled {
        return Err(Conflict::FlightLocked {
            flight_id,
            state: flight.state,
        }
        .into());
    }

    if let Some(destination) = request.destination {
        flight.destination = destination;
    }
    if let Some(departure_time) = request.departure_time {
        flight.departure_time = departure_time;
    }
    if let Some(arrival_time) = request.arrival_time {
        flight.arrival_time = arrival_time;
    }
    check_schedule(flight.departure_time, flight.arrival_time)?;

    if let Some(aircraft_id) = request.aircraft_id.filter(|id| *id != flight.aircraft_id) {
        let aircraft = assignable_aircraft(tx, aircraft_id).await?;
        if aircraft.max_capacity < flight.current_capacity {
            return Err(Conflict::CapacityBelowBookings {
                flight_id,
                booked: flight.current_capacity,
                requested: aircraft.max_capacity,
            }
            .into());
        }
        flight.aircraft_id = aircraft_id;
    }

    tx.update_flight(&flight).await?;
    Ok(flight)
}

async fn change_state(
    tx: &mut Transaction,
    flight_id: i32,
    state: FlightState,
) -> AppResult<Flight> {
    let mut flight = lock_flight(tx, flight_id, Lock::Update).await?;

    if flight.state == state {
        return Ok(flight);
    }
    if !flight.state.can_transition_to(state) {
        return Err(Invalid::transition("flight", flight.state, state).into());
    }

    match state {
        FlightState::InProgress => {
            let mut aircraft = flight_aircraft(tx, &flight).await?;
            if aircraft.state != AircraftState::Ready {
                return Err(Conflict::AircraftNotReady {
                    aircraft_id: aircraft.aircraft_id,
                    state: aircraft.state,
                }
                .into());
            }
            aircraft.state = AircraftState::Flying;
            tx.update_aircraft(&aircraft).await?;
        }
        FlightState::Arrived => {
            let mut aircraft = flight_aircraft(tx, &flight).await?;
            if aircraft.state == AircraftState::Flying {
                aircraft.state = AircraftState::Turnaround;
                tx.update_aircraft(&aircraft).await?;
            }
        }
        FlightState::Cancelled => {
            let mut canceled = 0;
            for mut reservation in tx.list_flight_reservations(flight_id).await? {
                if reservation.holds_capacity() {
                    reservation.state = ReservationState::Canceled;
                    tx.update_reservation(&reservation).await?;
                    canceled += 1;
                }
            }
            if canceled != flight.current_capacity {
                return Err(AppError::InvariantBroken(format!(
                    "flight {flight_id} counts {} seat(s) but holds {canceled} reservation(s)",
                    flight.current_capacity
                )));
            }
            flight.current_capacity = 0;
            tracing::info!(flight_id, canceled, "bookings canceled with flight");
        }
        FlightState::Scheduled => {}
    }

    flight.state = state;
    tx.update_flight(&flight).await?;

    tracing::info!(flight_id, state = %state, "flight state changed");
    Ok(flight)
}

async fn flight_aircraft(tx: &mut Transaction, flight: &Flight) -> AppResult<Aircraft> {
    tx.get_aircraft(flight.aircraft_id, Lock::Update)
        .await?
        .ok_or_else(|| {
            AppError::InvariantBroken(format!(
                "flight {} references missing aircraft {}",
                flight.flight_id, flight.aircraft_id
            ))
        })
}

async fn delete_flight(tx: &mut Transaction, flight_id: i32) -> AppResult<Flight> {
    let flight = lock_flight(tx, flight_id, Lock::Update).await?;

    let reservations = tx.list_flight_reservations(flight_id).await?.len();
    if reservations > 0 {
        return Err(Conflict::FlightHasReservations {
            flight_id,
            reservations,
        }
        .into());
    }

    tx.delete_flight(flight_id).await?;
    tracing::info!(flight_id, "flight deleted");
    Ok(flight)
}
