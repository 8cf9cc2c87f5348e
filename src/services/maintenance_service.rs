use std::sync::Arc;

use chrono::NaiveDate;
use validator::Validate;

use crate::models::aircraft::{Aircraft, AircraftState};
use crate::models::maintenance::{
    Maintenance, MaintenanceState, NewMaintenance, ScheduleMaintenanceRequest,
    UpdateMaintenanceRequest,
};
use crate::services::aircraft_service::find_aircraft;
use crate::services::transaction::{Transaction, TransactionCoordinator};
use crate::storage::{Lock, Store};
use crate::utils::error::{AppError, AppResult, Conflict, Invalid};

#[derive(Clone)]
pub struct MaintenanceService {
    coordinator: TransactionCoordinator,
}

impl MaintenanceService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        MaintenanceService {
            coordinator: TransactionCoordinator::new(store),
        }
    }

    /// Plans a maintenance window. The aircraft is held exclusively while the
    /// overlap check runs and is grounded if it was Ready or in turnaround.
    #[tracing::instrument(skip(self))]
    pub async fn schedule_maintenance(
        &self,
        request: ScheduleMaintenanceRequest,
    ) -> AppResult<Maintenance> {
        request.validate()?;
        let mut tx = self.coordinator.begin("schedule_maintenance").await?;
        let result = schedule_maintenance(&mut tx, request).await;
        tx.finish(result).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn complete_maintenance(&self, maintenance_id: i32) -> AppResult<Maintenance> {
        let mut tx = self.coordinator.begin("complete_maintenance").await?;
        let result = update_maintenance(
            &mut tx,
            maintenance_id,
            UpdateMaintenanceRequest {
                state: Some(MaintenanceState::Finished),
                ..Default::default()
            },
        )
        .await;
        tx.finish(result).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_maintenance(
        &self,
        maintenance_id: i32,
        request: UpdateMaintenanceRequest,
    ) -> AppResult<Maintenance> {
        request.validate()?;
        if request.state == Some(MaintenanceState::Finished) {
            return Err(Invalid::Malformed {
                message: "maintenance is finished through the complete operation".to_string(),
            }
            .into());
        }
        let mut tx = self.coordinator.begin("update_maintenance").await?;
        let result = update_maintenance(&mut tx, maintenance_id, request).await;
        tx.finish(result).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_maintenance(&self, maintenance_id: i32) -> AppResult<Maintenance> {
        let mut tx = self.coordinator.begin("delete_maintenance").await?;
        let result = delete_maintenance(&mut tx, maintenance_id).await;
        tx.finish(result).await
    }

    pub async fn get_maintenance(&self, maintenance_id: i32) -> AppResult<Maintenance> {
        let mut tx = self.coordinator.begin("get_maintenance").await?;
        let result = tx
            .get_maintenance(maintenance_id, Lock::None)
            .await
            .map_err(AppError::from)
            .and_then(|found| found.ok_or_else(|| AppError::not_found("Maintenance", maintenance_id)));
        tx.finish(result).await
    }

    pub async fn list_maintenance(&self) -> AppResult<Vec<Maintenance>> {
        let mut tx = self.coordinator.begin("list_maintenance").await?;
        let result = tx.list_maintenance().await.map_err(AppError::from);
        tx.finish(result).await
    }

    pub async fn list_aircraft_maintenance(&self, aircraft_id: i32) -> AppResult<Vec<Maintenance>> {
        let mut tx = self.coordinator.begin("list_aircraft_maintenance").await?;
        let result = list_aircraft_maintenance(&mut tx, aircraft_id).await;
        tx.finish(result).await
    }
}

async fn list_aircraft_maintenance(
    tx: &mut Transaction,
    aircraft_id: i32,
) -> AppResult<Vec<Maintenance>> {
    find_aircraft(tx, aircraft_id, Lock::None).await?;
    Ok(tx.list_aircraft_maintenance(aircraft_id).await?)
}

// Another open window for the aircraft on the same day
async fn find_overlap(
    tx: &mut Transaction,
    aircraft_id: i32,
    date: NaiveDate,
    exclude: Option<i32>,
) -> AppResult<Option<Maintenance>> {
    Ok(tx
        .list_aircraft_maintenance(aircraft_id)
        .await?
        .into_iter()
        .find(|window| {
            window.is_open()
                && window.operation_date == date
                && Some(window.maintenance_id) != exclude
        }))
}

async fn schedule_maintenance(
    tx: &mut Transaction,
    request: ScheduleMaintenanceRequest,
) -> AppResult<Maintenance> {
    let mut aircraft = find_aircraft(tx, request.aircraft_id, Lock::Update).await?;

    match aircraft.state {
        AircraftState::OutOfService => {
            return Err(Conflict::AircraftOutOfService {
                aircraft_id: aircraft.aircraft_id,
            }
            .into())
        }
        AircraftState::Flying => {
            return Err(Conflict::AircraftActive {
                aircraft_id: aircraft.aircraft_id,
                state: aircraft.state,
            }
            .into())
        }
        _ => {}
    }

    if let Some(existing) =
        find_overlap(tx, aircraft.aircraft_id, request.operation_date, None).await?
    {
        return Err(Conflict::MaintenanceOverlap {
            aircraft_id: aircraft.aircraft_id,
            maintenance_id: existing.maintenance_id,
            date: request.operation_date,
        }
        .into());
    }

    let new_maintenance = NewMaintenance {
        aircraft_id: aircraft.aircraft_id,
        operation_date: request.operation_date,
        maintenance_type: request.maintenance_type,
        state: MaintenanceState::Planned,
    };
    let maintenance_id = tx.insert_maintenance(&new_maintenance).await?;

    if matches!(
        aircraft.state,
        AircraftState::Ready | AircraftState::Turnaround
    ) {
        aircraft.state = AircraftState::Maintenance;
        tx.update_aircraft(&aircraft).await?;
    }

    tracing::info!(
        maintenance_id,
        aircraft_id = aircraft.aircraft_id,
        date = %new_maintenance.operation_date,
        "maintenance scheduled"
    );

    Ok(Maintenance {
        maintenance_id,
        aircraft_id: new_maintenance.aircraft_id,
        operation_date: new_maintenance.operation_date,
        maintenance_type: new_maintenance.maintenance_type,
        state: new_maintenance.state,
    })
}

/// Locks the aircraft ahead of its maintenance row, the same order
/// scheduling uses.
/// Window lists read afterwards include anything scheduled while waiting.
async fn lock_maintenance(
    tx: &mut Transaction,
    maintenance_id: i32,
) -> AppResult<(Maintenance, Aircraft)> {
    let aircraft_id = tx
        .get_maintenance(maintenance_id, Lock::None)
        .await?
        .ok_or_else(|| AppError::not_found("Maintenance", maintenance_id))?
        .aircraft_id;

    let aircraft = find_aircraft(tx, aircraft_id, Lock::Update).await?;

    let maintenance = tx
        .get_maintenance(maintenance_id, Lock::Update)
        .await?
        .ok_or_else(|| AppError::not_found("Maintenance", maintenance_id))?;

    Ok((maintenance, aircraft))
}

// Returns a grounded aircraft to service once no open window is left
async fn release_aircraft(tx: &mut Transaction, mut aircraft: Aircraft) -> AppResult<()> {
    if aircraft.state != AircraftState::Maintenance {
        return Ok(());
    }
    let still_open = tx
        .list_aircraft_maintenance(aircraft.aircraft_id)
        .await?
        .iter()
        .any(Maintenance::is_open);
    if !still_open {
        aircraft.state = AircraftState::Ready;
        tx.update_aircraft(&aircraft).await?;
        tracing::info!(aircraft_id = aircraft.aircraft_id, "aircraft back in service");
    }
    Ok(())
}

async fn update_maintenance(
    tx: &mut Transaction,
    maintenance_id: i32,
    request: UpdateMaintenanceRequest,
) -> AppResult<Maintenance> {
    let (mut maintenance, aircraft) = lock_maintenance(tx, maintenance_id).await?;

    if !maintenance.is_open() {
        return Err(Conflict::MaintenanceFinished { maintenance_id }.into());
    }

    if let Some(operation_date) = request.operation_date {
        if let Some(existing) =
            find_overlap(tx, maintenance.aircraft_id, operation_date, Some(maintenance_id)).await?
        {
            return Err(Conflict::MaintenanceOverlap {
                aircraft_id: maintenance.aircraft_id,
                maintenance_id: existing.maintenance_id,
                date: operation_date,
            }
            .into());
        }
        maintenance.operation_date = operation_date;
    }
    if let Some(maintenance_type) = request.maintenance_type {
        maintenance.maintenance_type = maintenance_type;
    }
    if let Some(state) = request.state {
        if !maintenance.state.can_transition_to(state) {
            return Err(Invalid::transition("maintenance", maintenance.state, state).into());
        }
        maintenance.state = state;
    }

    tx.update_maintenance(&maintenance).await?;

    if !maintenance.is_open() {
        tracing::info!(maintenance_id, "maintenance finished");
        release_aircraft(tx, aircraft).await?;
    }
    Ok(maintenance)
}

async fn delete_maintenance(tx: &mut Transaction, maintenance_id: i32) -> AppResult<Maintenance> {
    let (maintenance, aircraft) = lock_maintenance(tx, maintenance_id).await?;

    tx.delete_maintenance(maintenance_id).await?;
    if maintenance.is_open() {
        release_aircraft(tx, aircraft).await?;
    }
    Ok(maintenance)
}
