use std::sync::Arc;

use validator::Validate;

use crate::models::passenger::{
    CreatePassengerRequest, NewPassenger, Passenger, UpdatePassengerRequest, MAX_AGE,
};
use crate::services::transaction::{Transaction, TransactionCoordinator};
use crate::storage::{Lock, Store};
use crate::utils::error::{AppError, AppResult, Conflict, Invalid};

#[derive(Clone)]
pub struct PassengerService {
    coordinator: TransactionCoordinator,
}

impl PassengerService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        PassengerService {
            coordinator: TransactionCoordinator::new(store),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_passenger(&self, request: CreatePassengerRequest) -> AppResult<Passenger> {
        request.validate()?;
        check_age(request.age)?;
        let mut tx = self.coordinator.begin("create_passenger").await?;
        let result = create_passenger(&mut tx, request).await;
        tx.finish(result).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_passenger(
        &self,
        passenger_id: i32,
        request: UpdatePassengerRequest,
    ) -> AppResult<Passenger> {
        request.validate()?;
        if let Some(age) = request.age {
            check_age(age)?;
        }
        let mut tx = self.coordinator.begin("update_passenger").await?;
        let result = update_passenger(&mut tx, passenger_id, request).await;
        tx.finish(result).await
    }

    /// Removes a passenger with no reservations. Passengers still booked, or
    /// named as someone's guardian, are kept by the foreign keys.
    #[tracing::instrument(skip(self))]
    pub async fn delete_passenger(&self, passenger_id: i32) -> AppResult<Passenger> {
        let mut tx = self.coordinator.begin("delete_passenger").await?;
        let result = delete_passenger(&mut tx, passenger_id).await;
        tx.finish(result).await
    }

    pub async fn get_passenger(&self, passenger_id: i32) -> AppResult<Passenger> {
        let mut tx = self.coordinator.begin("get_passenger").await?;
        let result = find_passenger(&mut tx, passenger_id, Lock::None).await;
        tx.finish(result).await
    }

    pub async fn get_by_passport(&self, passport_number: &str) -> AppResult<Passenger> {
        let mut tx = self.coordinator.begin("get_passenger_by_passport").await?;
        let result = tx
            .find_passenger_by_passport(passport_number.trim())
            .await
            .map_err(AppError::from)
            .and_then(|found| {
                found.ok_or_else(|| AppError::not_found("Passenger with passport", passport_number))
            });
        tx.finish(result).await
    }

    pub async fn list_passengers(&self) -> AppResult<Vec<Passenger>> {
        let mut tx = self.coordinator.begin("list_passengers").await?;
        let result = tx.list_passengers().await.map_err(AppError::from);
        tx.finish(result).await
    }
}

fn check_age(age: i32) -> AppResult<()> {
    if !(0..=MAX_AGE).contains(&age) {
        return Err(Invalid::AgeOutOfRange { value: age }.into());
    }
    Ok(())
}

async fn find_passenger(
    tx: &mut Transaction,
    passenger_id: i32,
    lock: Lock,
) -> AppResult<Passenger> {
    tx.get_passenger(passenger_id, lock)
        .await?
        .ok_or_else(|| AppError::not_found("Passenger", passenger_id))
}

async fn create_passenger(
    tx: &mut Transaction,
    request: CreatePassengerRequest,
) -> AppResult<Passenger> {
    let passport_number = request.passport_number.trim().to_string();
    if tx
        .find_passenger_by_passport(&passport_number)
        .await?
        .is_some()
    {
        return Err(Conflict::DuplicatePassport { passport_number }.into());
    }

    let new_passenger = NewPassenger {
        first_name: request.first_name,
        last_name: request.last_name,
        passport_number,
        contact: request.contact,
        nationality: request.nationality,
        age: request.age,
    };
    let passenger_id = tx.insert_passenger(&new_passenger).await?;

    tracing::info!(passenger_id, "passenger registered");
    Ok(Passenger {
        passenger_id,
        first_name: new_passenger.first_name,
        last_name: new_passenger.last_name,
        passport_number: new_passenger.passport_number,
        contact: new_passenger.contact,
        nationality: new_passenger.nationality,
        age: new_passenger.age,
    })
}

async fn update_passenger(
    tx: &mut Transaction,
    passenger_id: i32,
    request: UpdatePassengerRequest,
) -> AppResult<Passenger> {
    // Exclusive: bookings hold a shared lock on the passenger until commit
    let mut passenger = find_passenger(tx, passenger_id, Lock::Update).await?;

    if let Some(age) = request.age {
        let was_minor = passenger.is_minor();
        passenger.age = age;
        // Guardian links were checked against the old age
        if passenger.is_minor() != was_minor {
            let reservations = tx
                .list_passenger_reservations(passenger_id)
                .await?
                .into_iter()
                .filter(|reservation| reservation.holds_capacity())
                .count();
            if reservations > 0 {
                return Err(Conflict::AgeChangeWithBookings {
                    passenger_id,
                    reservations,
                }
                .into());
            }
        }
    }
    if let Some(first_name) = request.first_name {
        passenger.first_name = first_name;
    }
    if let Some(last_name) = request.last_name {
        passenger.last_name = last_name;
    }
    if let Some(contact) = request.contact {
        passenger.contact = contact;
    }
    if let Some(nationality) = request.nationality {
        passenger.nationality = nationality;
    }

    tx.update_passenger(&passenger).await?;
    Ok(passenger)
}

async fn delete_passenger(tx: &mut Transaction, passenger_id: i32) -> AppResult<Passenger> {
    let passenger = find_passenger(tx, passenger_id, Lock::Update).await?;
    tx.delete_passenger(passenger_id).await?;
    tracing::info!(passenger_id, "passenger deleted");
    Ok(passenger)
}
