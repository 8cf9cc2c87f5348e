use std::sync::Arc;

use validator::Validate;

use crate::models::aircraft::{
    Aircraft, AircraftState, CreateAircraftRequest, UpdateAircraftRequest,
};
use crate::services::transaction::{Transaction, TransactionCoordinator};
use crate::storage::{Lock, Store};
use crate::utils::error::{AppError, AppResult, Conflict, Invalid};

#[derive(Clone)]
pub struct AircraftService {
    coordinator: TransactionCoordinator,
}

impl AircraftService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        AircraftService {
            coordinator: TransactionCoordinator::new(store),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_aircraft(&self, request: CreateAircraftRequest) -> AppResult<Aircraft> {
        request.validate()?;
        let mut tx = self.coordinator.begin("create_aircraft").await?;
        let result = create_aircraft(&mut tx, request).await;
        tx.finish(result).await
    }

    /// Updates model, capacity or state. A capacity cut is refused while any
    /// open flight on the aircraft has more seats booked than the new limit.
    #[tracing::instrument(skip(self))]
    pub async fn update_aircraft(
        &self,
        aircraft_id: i32,
        request: UpdateAircraftRequest,
    ) -> AppResult<Aircraft> {
        request.validate()?;
        let mut tx = self.coordinator.begin("update_aircraft").await?;
        let result = update_aircraft(&mut tx, aircraft_id, request).await;
        tx.finish(result).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_aircraft(&self, aircraft_id: i32) -> AppResult<Aircraft> {
        let mut tx = self.coordinator.begin("delete_aircraft").await?;
        let result = delete_aircraft(&mut tx, aircraft_id).await;
        tx.finish(result).await
    }

    pub async fn get_aircraft(&self, aircraft_id: i32) -> AppResult<Aircraft> {
        let mut tx = self.coordinator.begin("get_aircraft").await?;
        let result = find_aircraft(&mut tx, aircraft_id, Lock::None).await;
        tx.finish(result).await
    }

    pub async fn list_aircraft(&self) -> AppResult<Vec<Aircraft>> {
        let mut tx = self.coordinator.begin("list_aircraft").await?;
        let result = tx.list_aircraft().await.map_err(AppError::from);
        tx.finish(result).await
    }
}

fn check_capacity(max_capacity: i32) -> AppResult<()> {
    if max_capacity <= 0 {
        return Err(Invalid::NonPositiveCapacity {
            value: max_capacity,
        }
        .into());
    }
    Ok(())
}

pub(crate) async fn find_aircraft(
    tx: &mut Transaction,
    aircraft_id: i32,
    lock: Lock,
) -> AppResult<Aircraft> {
    tx.get_aircraft(aircraft_id, lock)
        .await?
        .ok_or_else(|| AppError::not_found("Aircraft", aircraft_id))
}

async fn create_aircraft(
    tx: &mut Transaction,
    request: CreateAircraftRequest,
) -> AppResult<Aircraft> {
    check_capacity(request.max_capacity)?;

    if tx
        .get_aircraft(request.aircraft_id, Lock::None)
        .await?
        .is_some()
    {
        return Err(Conflict::DuplicateAircraft {
            aircraft_id: request.aircraft_id,
        }
        .into());
    }

    let aircraft = Aircraft {
        aircraft_id: request.aircraft_id,
        model: request.model,
        max_capacity: request.max_capacity,
        state: request.state.unwrap_or(AircraftState::Ready),
    };
    tx.insert_aircraft(&aircraft).await?;

    tracing::info!(aircraft_id = aircraft.aircraft_id, state = %aircraft.state, "aircraft registered");
    Ok(aircraft)
}

async fn update_aircraft(
    tx: &mut Transaction,
    aircraft_id: i32,
    request: UpdateAircraftRequest,
) -> AppResult<Aircraft> {
    let mut aircraft = find_aircraft(tx, aircraft_id, Lock::Update).await?;

    if let Some(max_capacity) = request.max_capacity {
        check_capacity(max_capacity)?;
        if max_capacity < aircraft.max_capacity {
            let overbooked = tx
                .list_aircraft_flights(aircraft_id)
                .await?
                .into_iter()
                .find(|flight| !flight.state.is_terminal() && flight.current_capacity > max_capacity);
            if let Some(flight) = overbooked {
                return Err(Conflict::CapacityBelowBookings {
                    flight_id: flight.flight_id,
                    booked: flight.current_capacity,
                    requested: max_capacity,
                }
                .into());
            }
        }
        aircraft.max_capacity = max_capacity;
    }

    if let Some(state) = request.state {
        if !aircraft.state.can_transition_to(state) {
            return Err(Invalid::transition("aircraft", aircraft.state, state).into());
        }
        aircraft.state = state;
    }

    if let Some(model) = request.model {
        aircraft.model = model;
    }

    tx.update_aircraft(&aircraft).await?;
    Ok(aircraft)
}

async fn delete_aircraft(tx: &mut Transaction, aircraft_id: i32) -> AppResult<Aircraft> {
    let aircraft = find_aircraft(tx, aircraft_id, Lock::Update).await?;

    if aircraft.state.is_active() {
        return Err(Conflict::AircraftActive {
            aircraft_id,
            state: aircraft.state,
        }
        .into());
    }

    // Flights still pointing here surface as a foreign key conflict
    tx.delete_aircraft(aircraft_id).await?;
    tracing::info!(aircraft_id, "aircraft deleted");
    Ok(aircraft)
}
