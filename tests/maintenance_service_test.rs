use airline_operations::models::aircraft::{AircraftState, UpdateAircraftRequest};
use airline_operations::models::flight::FlightState;
use airline_operations::models::maintenance::{
    MaintenanceState, ScheduleMaintenanceRequest, UpdateMaintenanceRequest,
};
use airline_operations::utils::error::{AppError, Conflict, Invalid};
use async_trait::async_trait;
use chrono::NaiveDate;
use test_context::{test_context, AsyncTestContext};

mod common {
    pub mod test_utils;
}
use common::test_utils::Services;

struct MaintenanceContext {
    services: Services,
}

#[async_trait]
impl AsyncTestContext for MaintenanceContext {
    async fn setup() -> Self {
        let services = Services::in_memory();
        services.add_aircraft(900, 76).await;
        MaintenanceContext { services }
    }
}

fn day(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
}

fn window(aircraft_id: i32, date: NaiveDate) -> ScheduleMaintenanceRequest {
    ScheduleMaintenanceRequest {
        aircraft_id,
        operation_date: date,
        maintenance_type: "A-check".to_string(),
    }
}

async fn aircraft_state(ctx: &MaintenanceContext) -> AircraftState {
    ctx.services.aircraft.get_aircraft(900).await.unwrap().state
}

#[test_context(MaintenanceContext)]
#[tokio::test]
async fn test_scheduling_grounds_the_aircraft(ctx: &mut MaintenanceContext) {
    let maintenance = ctx
        .services
        .maintenance
        .schedule_maintenance(window(900, day(1)))
        .await
        .unwrap();

    assert_eq!(maintenance.state, MaintenanceState::Planned);
    assert_eq!(aircraft_state(ctx).await, AircraftState::Maintenance);
}

#[test_context(MaintenanceContext)]
#[tokio::test]
async fn test_same_day_overlap_is_refused(ctx: &mut MaintenanceContext) {
    let first = ctx
        .services
        .maintenance
        .schedule_maintenance(window(900, day(2)))
        .await
        .unwrap();

    let result = ctx
        .services
        .maintenance
        .schedule_maintenance(window(900, day(2)))
        .await;
    match result {
        Err(AppError::Conflict(Conflict::MaintenanceOverlap { maintenance_id, .. })) => {
            assert_eq!(maintenance_id, first.maintenance_id)
        }
        other => panic!("expected overlap, got {other:?}"),
    }

    // Another day is fine, and so is the same day once the first is done
    ctx.services
        .maintenance
        .schedule_maintenance(window(900, day(3)))
        .await
        .unwrap();
    ctx.services
        .maintenance
        .complete_maintenance(first.maintenance_id)
        .await
        .unwrap();
    ctx.services
        .maintenance
        .schedule_maintenance(window(900, day(2)))
        .await
        .unwrap();
}

#[test_context(MaintenanceContext)]
#[tokio::test]
async fn test_flying_or_retired_aircraft_cannot_be_scheduled(ctx: &mut MaintenanceContext) {
    let flight = ctx.services.add_flight(900).await;
    ctx.services
        .flights
        .change_state(flight.flight_id, FlightState::InProgress)
        .await
        .unwrap();
    let result = ctx
        .services
        .maintenance
        .schedule_maintenance(window(900, day(4)))
        .await;
    assert!(matches!(
        result,
        Err(AppError::Conflict(Conflict::AircraftActive { .. }))
    ));

    ctx.services.add_aircraft(901, 50).await;
    ctx.services
        .aircraft
        .update_aircraft(
            901,
            UpdateAircraftRequest {
                state: Some(AircraftState::OutOfService),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let result = ctx
        .services
        .maintenance
        .schedule_maintenance(window(901, day(4)))
        .await;
    assert!(matches!(
        result,
        Err(AppError::Conflict(Conflict::AircraftOutOfService { aircraft_id: 901 }))
    ));

    let result = ctx
        .services
        .maintenance
        .schedule_maintenance(window(404, day(4)))
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[test_context(MaintenanceContext)]
#[tokio::test]
async fn test_aircraft_returns_after_last_window(ctx: &mut MaintenanceContext) {
    let first = ctx
        .services
        .maintenance
        .schedule_maintenance(window(900, day(5)))
        .await
        .unwrap();
    let second = ctx
        .services
        .maintenance
        .schedule_maintenance(window(900, day(6)))
        .await
        .unwrap();

    let finished = ctx
        .services
        .maintenance
        .complete_maintenance(first.maintenance_id)
        .await
        .unwrap();
    assert_eq!(finished.state, MaintenanceState::Finished);
    assert_eq!(aircraft_state(ctx).await, AircraftState::Maintenance);

    let result = ctx
        .services
        .maintenance
        .complete_maintenance(first.maintenance_id)
        .await;
    assert!(matches!(
        result,
        Err(AppError::Conflict(Conflict::MaintenanceFinished { .. }))
    ));

    ctx.services
        .maintenance
        .delete_maintenance(second.maintenance_id)
        .await
        .unwrap();
    assert_eq!(aircraft_state(ctx).await, AircraftState::Ready);
}

#[test_context(MaintenanceContext)]
#[tokio::test]
async fn test_update_reschedules_and_waits(ctx: &mut MaintenanceContext) {
    let first = ctx
        .services
        .maintenance
        .schedule_maintenance(window(900, day(7)))
        .await
        .unwrap();
    let second = ctx
        .services
        .maintenance
        .schedule_maintenance(window(900, day(8)))
        .await
        .unwrap();

    let result = ctx
        .services
        .maintenance
        .update_maintenance(
            second.maintenance_id,
            UpdateMaintenanceRequest {
                operation_date: Some(day(7)),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(
        result,
        Err(AppError::Conflict(Conflict::MaintenanceOverlap { .. }))
    ));

    let updated = ctx
        .services
        .maintenance
        .update_maintenance(
            second.maintenance_id,
            UpdateMaintenanceRequest {
                operation_date: Some(day(9)),
                state: Some(MaintenanceState::Waiting),
                maintenance_type: Some("C-check".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.operation_date, day(9));
    assert_eq!(updated.state, MaintenanceState::Waiting);
    assert_eq!(updated.maintenance_type, "C-check");

    let result = ctx
        .services
        .maintenance
        .update_maintenance(
            first.maintenance_id,
            UpdateMaintenanceRequest {
                state: Some(MaintenanceState::Finished),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(
        result,
        Err(AppError::ValidationError(Invalid::Malformed { .. }))
    ));

    let listed = ctx
        .services
        .maintenance
        .list_aircraft_maintenance(900)
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);
}

#[test_context(MaintenanceContext)]
#[tokio::test]
async fn test_deleting_aircraft_removes_its_windows(ctx: &mut MaintenanceContext) {
    let maintenance = ctx
        .services
        .maintenance
        .schedule_maintenance(window(900, day(10)))
        .await
        .unwrap();

    ctx.services.aircraft.delete_aircraft(900).await.unwrap();

    let result = ctx
        .services
        .maintenance
        .get_maintenance(maintenance.maintenance_id)
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert!(ctx
        .services
        .maintenance
        .list_maintenance()
        .await
        .unwrap()
        .is_empty());
}
