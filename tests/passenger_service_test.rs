use airline_operations::models::passenger::{CreatePassengerRequest, UpdatePassengerRequest};
use airline_operations::utils::error::{AppError, Conflict, Invalid};
use async_trait::async_trait;
use test_context::{test_context, AsyncTestContext};

mod common {
    pub mod test_utils;
}
use common::test_utils::Services;

struct PassengerContext {
    services: Services,
}

#[async_trait]
impl AsyncTestContext for PassengerContext {
    async fn setup() -> Self {
        PassengerContext {
            services: Services::in_memory(),
        }
    }
}

fn request(passport_number: &str, age: i32) -> CreatePassengerRequest {
    CreatePassengerRequest {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        passport_number: passport_number.to_string(),
        contact: "ada@example.com".to_string(),
        nationality: "British".to_string(),
        age,
    }
}

#[test_context(PassengerContext)]
#[tokio::test]
async fn test_register_and_look_up(ctx: &mut PassengerContext) {
    let passenger = ctx
        .services
        .passengers
        .create_passenger(request(" GB123456 ", 36))
        .await
        .unwrap();
    assert_eq!(passenger.passport_number, "GB123456");

    let found = ctx
        .services
        .passengers
        .get_by_passport("GB123456")
        .await
        .unwrap();
    assert_eq!(found.passenger_id, passenger.passenger_id);
    assert_eq!(ctx.services.passengers.list_passengers().await.unwrap().len(), 1);
}

#[test_context(PassengerContext)]
#[tokio::test]
async fn test_duplicate_passport_is_a_conflict(ctx: &mut PassengerContext) {
    ctx.services
        .passengers
        .create_passenger(request("GB000001", 36))
        .await
        .unwrap();
    let result = ctx
        .services
        .passengers
        .create_passenger(request("GB000001", 20))
        .await;
    assert!(matches!(
        result,
        Err(AppError::Conflict(Conflict::DuplicatePassport { .. }))
    ));
}

#[test_context(PassengerContext)]
#[tokio::test]
async fn test_age_and_fields_are_validated(ctx: &mut PassengerContext) {
    for age in [-1, 131] {
        let result = ctx
            .services
            .passengers
            .create_passenger(request("GB000002", age))
            .await;
        assert!(matches!(
            result,
            Err(AppError::ValidationError(Invalid::AgeOutOfRange { .. }))
        ));
    }

    let mut bad_contact = request("GB000003", 30);
    bad_contact.contact = "not-an-email".to_string();
    let result = ctx.services.passengers.create_passenger(bad_contact).await;
    assert!(matches!(
        result,
        Err(AppError::ValidationError(Invalid::Malformed { .. }))
    ));
}

#[test_context(PassengerContext)]
#[tokio::test]
async fn test_update_details(ctx: &mut PassengerContext) {
    let passenger = ctx.services.add_passenger("GB000004", 30).await;

    let updated = ctx
        .services
        .passengers
        .update_passenger(
            passenger.passenger_id,
            UpdatePassengerRequest {
                last_name: Some("Byron".to_string()),
                age: Some(31),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.last_name, "Byron");
    assert_eq!(updated.age, 31);
    assert_eq!(updated.passport_number, "GB000004");
}

#[test_context(PassengerContext)]
#[tokio::test]
async fn test_booked_adult_cannot_become_minor(ctx: &mut PassengerContext) {
    ctx.services.add_aircraft(1, 10).await;
    let flight = ctx.services.add_flight(1).await;
    let passenger = ctx.services.add_passenger("GB000005", 18).await;
    ctx.services
        .book(passenger.passenger_id, flight.flight_id, "1A", None)
        .await
        .unwrap();

    let result = ctx
        .services
        .passengers
        .update_passenger(
            passenger.passenger_id,
            UpdatePassengerRequest {
                age: Some(17),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(
        result,
        Err(AppError::Conflict(Conflict::AgeChangeWithBookings { reservations: 1, .. }))
    ));
}

#[test_context(PassengerContext)]
#[tokio::test]
async fn test_booked_passenger_cannot_be_deleted(ctx: &mut PassengerContext) {
    ctx.services.add_aircraft(1, 10).await;
    let flight = ctx.services.add_flight(1).await;
    let booked = ctx.services.add_passenger("GB000006", 30).await;
    let idle = ctx.services.add_passenger("GB000007", 30).await;
    ctx.services
        .book(booked.passenger_id, flight.flight_id, "1A", None)
        .await
        .unwrap();

    let result = ctx
        .services
        .passengers
        .delete_passenger(booked.passenger_id)
        .await;
    assert!(matches!(
        result,
        Err(AppError::Conflict(Conflict::ForeignKey { .. }))
    ));

    ctx.services
        .passengers
        .delete_passenger(idle.passenger_id)
        .await
        .unwrap();
    let result = ctx.services.passengers.get_passenger(idle.passenger_id).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}
