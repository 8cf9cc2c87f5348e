use airline_operations::models::aircraft::{AircraftState, UpdateAircraftRequest};
use airline_operations::models::flight::{CreateFlightRequest, FlightState, UpdateFlightRequest};
use airline_operations::models::reservation::ReservationState;
use airline_operations::utils::error::{AppError, Conflict, Invalid};
use async_trait::async_trait;
use test_context::{test_context, AsyncTestContext};

mod common {
    pub mod test_utils;
}
use common::test_utils::{at, Services};

struct FlightContext {
    services: Services,
}

#[async_trait]
impl AsyncTestContext for FlightContext {
    async fn setup() -> Self {
        let services = Services::in_memory();
        services.add_aircraft(737, 2).await;
        services.add_aircraft(777, 10).await;
        FlightContext { services }
    }
}

#[test_context(FlightContext)]
#[tokio::test]
async fn test_new_flight_is_scheduled_and_empty(ctx: &mut FlightContext) {
    let flight = ctx.services.add_flight(737).await;

    assert_eq!(flight.state, FlightState::Scheduled);
    assert_eq!(flight.current_capacity, 0);
    assert_eq!(flight.aircraft_id, 737);
    assert_eq!(ctx.services.flights.list_flights().await.unwrap().len(), 1);
}

#[test_context(FlightContext)]
#[tokio::test]
async fn test_create_checks_aircraft_and_times(ctx: &mut FlightContext) {
    let request = |aircraft_id, arrival_hour| CreateFlightRequest {
        destination: "Vancouver".to_string(),
        departure_time: at(2025, 7, 1, 10),
        arrival_time: at(2025, 7, 1, arrival_hour),
        aircraft_id,
    };

    let result = ctx.services.flights.create_flight(request(1, 14)).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let result = ctx.services.flights.create_flight(request(737, 10)).await;
    assert!(matches!(
        result,
        Err(AppError::ValidationError(Invalid::ArrivalBeforeDeparture { .. }))
    ));

    ctx.services
        .aircraft
        .update_aircraft(
            777,
            UpdateAircraftRequest {
                state: Some(AircraftState::OutOfService),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let result = ctx.services.flights.create_flight(request(777, 14)).await;
    assert!(matches!(
        result,
        Err(AppError::Conflict(Conflict::AircraftOutOfService { aircraft_id: 777 }))
    ));
}

#[test_context(FlightContext)]
#[tokio::test]
async fn test_reassignment_needs_room_for_bookings(ctx: &mut FlightContext) {
    let flight = ctx.services.add_flight(777).await;
    for i in 0..3 {
        let passenger = ctx.services.add_passenger(&format!("F{:06}", i), 30).await;
        ctx.services
            .book(passenger.passenger_id, flight.flight_id, &format!("{}F", i), None)
            .await
            .unwrap();
    }

    let result = ctx
        .services
        .flights
        .update_flight(
            flight.flight_id,
            UpdateFlightRequest {
                aircraft_id: Some(737),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(
        result,
        Err(AppError::Conflict(Conflict::CapacityBelowBookings {
            booked: 3,
            requested: 2,
            ..
        }))
    ));

    let updated = ctx
        .services
        .flights
        .update_flight(
            flight.flight_id,
            UpdateFlightRequest {
                destination: Some("Montreal".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.destination, "Montreal");
    assert_eq!(updated.aircraft_id, 777);
    assert_eq!(updated.current_capacity, 3);
}

#[test_context(FlightContext)]
#[tokio::test]
async fn test_departure_and_arrival_move_the_aircraft(ctx: &mut FlightContext) {
    let flight = ctx.services.add_flight(737).await;

    let departed = ctx
        .services
        .flights
        .change_state(flight.flight_id, FlightState::InProgress)
        .await
        .unwrap();
    assert_eq!(departed.state, FlightState::InProgress);
    assert_eq!(
        ctx.services.aircraft.get_aircraft(737).await.unwrap().state,
        AircraftState::Flying
    );

    // No edits once the flight left
    let result = ctx
        .services
        .flights
        .update_flight(flight.flight_id, UpdateFlightRequest::default())
        .await;
    assert!(matches!(
        result,
        Err(AppError::Conflict(Conflict::FlightLocked { .. }))
    ));

    ctx.services
        .flights
        .change_state(flight.flight_id, FlightState::Arrived)
        .await
        .unwrap();
    assert_eq!(
        ctx.services.aircraft.get_aircraft(737).await.unwrap().state,
        AircraftState::Turnaround
    );

    let result = ctx
        .services
        .flights
        .change_state(flight.flight_id, FlightState::Scheduled)
        .await;
    assert!(matches!(
        result,
        Err(AppError::ValidationError(Invalid::InvalidTransition { .. }))
    ));
}

#[test_context(FlightContext)]
#[tokio::test]
async fn test_departure_requires_ready_aircraft(ctx: &mut FlightContext) {
    let first = ctx.services.add_flight(737).await;
    let second = ctx.services.add_flight(737).await;
    ctx.services
        .flights
        .change_state(first.flight_id, FlightState::InProgress)
        .await
        .unwrap();

    let result = ctx
        .services
        .flights
        .change_state(second.flight_id, FlightState::InProgress)
        .await;
    assert!(matches!(
        result,
        Err(AppError::Conflict(Conflict::AircraftNotReady {
            state: AircraftState::Flying,
            ..
        }))
    ));
    assert_eq!(
        ctx.services.flights.get_flight(second.flight_id).await.unwrap().state,
        FlightState::Scheduled
    );
}

#[test_context(FlightContext)]
#[tokio::test]
async fn test_cancelling_flight_cancels_bookings(ctx: &mut FlightContext) {
    let flight = ctx.services.add_flight(777).await;
    let guardian = ctx.services.add_passenger("G000001", 44).await;
    let minor = ctx.services.add_passenger("G000002", 6).await;
    ctx.services
        .book_confirmed(guardian.passenger_id, flight.flight_id, "1A")
        .await;
    ctx.services
        .book(minor.passenger_id, flight.flight_id, "1B", Some(guardian.passenger_id))
        .await
        .unwrap();

    let cancelled = ctx
        .services
        .flights
        .change_state(flight.flight_id, FlightState::Cancelled)
        .await
        .unwrap();
    assert_eq!(cancelled.current_capacity, 0);

    let reservations = ctx
        .services
        .reservations
        .list_flight_reservations(flight.flight_id)
        .await
        .unwrap();
    assert_eq!(reservations.len(), 2);
    assert!(reservations
        .iter()
        .all(|reservation| reservation.state == ReservationState::Canceled));
    assert_eq!(ctx.services.held_seats(flight.flight_id).await, 0);
}

#[test_context(FlightContext)]
#[tokio::test]
async fn test_flight_with_reservations_cannot_be_deleted(ctx: &mut FlightContext) {
    let flight = ctx.services.add_flight(777).await;
    let passenger = ctx.services.add_passenger("H000001", 30).await;
    let reservation = ctx
        .services
        .book(passenger.passenger_id, flight.flight_id, "2A", None)
        .await
        .unwrap();

    let result = ctx.services.flights.delete_flight(flight.flight_id).await;
    assert!(matches!(
        result,
        Err(AppError::Conflict(Conflict::FlightHasReservations {
            reservations: 1,
            ..
        }))
    ));

    ctx.services
        .reservations
        .delete_reservation(reservation.reservation_id)
        .await
        .unwrap();
    ctx.services
        .flights
        .delete_flight(flight.flight_id)
        .await
        .unwrap();
    let result = ctx.services.flights.get_flight(flight.flight_id).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}
