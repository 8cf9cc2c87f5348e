use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{Lock, StorageError, StorageResult, Store, UnitOfWork};
use crate::models::aircraft::Aircraft;
use crate::models::flight::{Flight, FlightState, NewFlight};
use crate::models::maintenance::{Maintenance, NewMaintenance};
use crate::models::passenger::{NewPassenger, Passenger, MAX_AGE};
use crate::models::reservation::{NewReservation, Reservation};

#[derive(Debug, Clone, Default)]
struct Tables {
    aircraft: BTreeMap<i32, Aircraft>,
    flights: BTreeMap<i32, Flight>,
    passengers: BTreeMap<i32, Passenger>,
    reservations: BTreeMap<i32, Reservation>,
    maintenance: BTreeMap<i32, Maintenance>,
    last_flight_id: i32,
    last_passenger_id: i32,
    last_reservation_id: i32,
    last_maintenance_id: i32,
}

/// In-memory store with the same constraints as the MySQL schema.
///
/// Units of work are fully serialized: `begin` waits for the previous unit
/// of work to finish, then operates on a private copy of the tables that is
/// published only on commit.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> StorageResult<Box<dyn UnitOfWork>> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryUnitOfWork { guard, working }))
    }
}

pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

fn unique(constraint: &str) -> StorageError {
    StorageError::UniqueViolation(constraint.to_string())
}

fn foreign_key(constraint: &str) -> StorageError {
    StorageError::ForeignKeyViolation(constraint.to_string())
}

fn check(constraint: &str) -> StorageError {
    StorageError::CheckViolation(constraint.to_string())
}

impl Tables {
    fn check_aircraft(&self, aircraft: &Aircraft) -> StorageResult<()> {
        if aircraft.max_capacity <= 0 {
            return Err(check("aircraft_max_capacity_positive"));
        }
        Ok(())
    }

    fn check_flight(&self, flight: &Flight) -> StorageResult<()> {
        if !self.aircraft.contains_key(&flight.aircraft_id) {
            return Err(foreign_key("flight_aircraft_aircraft_id_fk"));
        }
        if flight.current_capacity < 0 {
            return Err(check("flight_current_capacity_non_negative"));
        }
        if flight.arrival_time <= flight.departure_time {
            return Err(check("flight_arrival_after_departure"));
        }
        Ok(())
    }

    fn check_passenger(&self, passenger: &Passenger) -> StorageResult<()> {
        if !(0..=MAX_AGE).contains(&passenger.age) {
            return Err(check("passenger_age_range"));
        }
        let duplicate = self.passengers.values().any(|other| {
            other.passenger_id != passenger.passenger_id
                && other.passport_number == passenger.passport_number
        });
        if duplicate {
            return Err(unique("passenger_passport_number_uindex"));
        }
        Ok(())
    }

    fn check_reservation(&self, reservation: &Reservation) -> StorageResult<()> {
        if !self.passengers.contains_key(&reservation.passenger_id) {
            return Err(foreign_key("reservation_passenger_id_fk"));
        }
        if !self.flights.contains_key(&reservation.flight_id) {
            return Err(foreign_key("reservation_flight_id_fk"));
        }
        if let Some(guardian_id) = reservation.guardian_id {
            if !self.passengers.contains_key(&guardian_id) {
                return Err(foreign_key("reservation_guardian_id_fk"));
            }
        }
        for other in self.reservations.values() {
            if other.reservation_id == reservation.reservation_id
                || other.flight_id != reservation.flight_id
            {
                continue;
            }
            if other.passenger_id == reservation.passenger_id {
                return Err(unique("reservation_passenger_flight_uindex"));
            }
            if other.seat_code == reservation.seat_code {
                return Err(unique("reservation_flight_seat_uindex"));
            }
        }
        Ok(())
    }

    fn check_maintenance(&self, maintenance: &Maintenance) -> StorageResult<()> {
        if !self.aircraft.contains_key(&maintenance.aircraft_id) {
            return Err(foreign_key("maintenance_aircraft_id_fk"));
        }
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn get_aircraft(
        &mut self,
        aircraft_id: i32,
        _lock: Lock,
    ) -> StorageResult<Option<Aircraft>> {
        Ok(self.working.aircraft.get(&aircraft_id).cloned())
    }

    async fn list_aircraft(&mut self) -> StorageResult<Vec<Aircraft>> {
        Ok(self.working.aircraft.values().cloned().collect())
    }

    async fn insert_aircraft(&mut self, aircraft: &Aircraft) -> StorageResult<()> {
        if self.working.aircraft.contains_key(&aircraft.aircraft_id) {
            return Err(unique("PRIMARY"));
        }
        self.working.check_aircraft(aircraft)?;
        self.working
            .aircraft
            .insert(aircraft.aircraft_id, aircraft.clone());
        Ok(())
    }

    async fn update_aircraft(&mut self, aircraft: &Aircraft) -> StorageResult<()> {
        self.working.check_aircraft(aircraft)?;
        if let Some(row) = self.working.aircraft.get_mut(&aircraft.aircraft_id) {
            *row = aircraft.clone();
        }
        Ok(())
    }

    async fn delete_aircraft(&mut self, aircraft_id: i32) -> StorageResult<()> {
        let referenced = self
            .working
            .flights
            .values()
            .any(|flight| flight.aircraft_id == aircraft_id);
        if referenced {
            return Err(foreign_key("flight_aircraft_aircraft_id_fk"));
        }
        self.working
            .maintenance
            .retain(|_, record| record.aircraft_id != aircraft_id);
        self.working.aircraft.remove(&aircraft_id);
        Ok(())
    }

    async fn get_flight(&mut self, flight_id: i32, _lock: Lock) -> StorageResult<Option<Flight>> {
        Ok(self.working.flights.get(&flight_id).cloned())
    }

    async fn list_flights(&mut self) -> StorageResult<Vec<Flight>> {
        let mut flights: Vec<Flight> = self.working.flights.values().cloned().collect();
        flights.sort_by_key(|flight| (flight.departure_time, flight.flight_id));
        Ok(flights)
    }

    async fn list_aircraft_flights(&mut self, aircraft_id: i32) -> StorageResult<Vec<Flight>> {
        let mut flights: Vec<Flight> = self
            .working
            .flights
            .values()
            .filter(|flight| flight.aircraft_id == aircraft_id)
            .cloned()
            .collect();
        flights.sort_by_key(|flight| (flight.departure_time, flight.flight_id));
        Ok(flights)
    }

    async fn insert_flight(&mut self, flight: &NewFlight) -> StorageResult<i32> {
        let flight_id = self.working.last_flight_id + 1;
        let row = Flight {
            flight_id,
            destination: flight.destination.clone(),
            departure_time: flight.departure_time,
            arrival_time: flight.arrival_time,
            aircraft_id: flight.aircraft_id,
            current_capacity: 0,
            state: FlightState::Scheduled,
        };
        self.working.check_flight(&row)?;
        self.working.last_flight_id = flight_id;
        self.working.flights.insert(flight_id, row);
        Ok(flight_id)
    }

    async fn update_flight(&mut self, flight: &Flight) -> StorageResult<()> {
        self.working.check_flight(flight)?;
        if let Some(row) = self.working.flights.get_mut(&flight.flight_id) {
            *row = flight.clone();
        }
        Ok(())
    }

    async fn delete_flight(&mut self, flight_id: i32) -> StorageResult<()> {
        let referenced = self
            .working
            .reservations
            .values()
            .any(|reservation| reservation.flight_id == flight_id);
        if referenced {
            return Err(foreign_key("reservation_flight_id_fk"));
        }
        self.working.flights.remove(&flight_id);
        Ok(())
    }

    async fn get_passenger(
        &mut self,
        passenger_id: i32,
        _lock: Lock,
    ) -> StorageResult<Option<Passenger>> {
        Ok(self.working.passengers.get(&passenger_id).cloned())
    }

    async fn find_passenger_by_passport(
        &mut self,
        passport_number: &str,
    ) -> StorageResult<Option<Passenger>> {
        Ok(self
            .working
            .passengers
            .values()
            .find(|passenger| passenger.passport_number == passport_number)
            .cloned())
    }

    async fn list_passengers(&mut self) -> StorageResult<Vec<Passenger>> {
        Ok(self.working.passengers.values().cloned().collect())
    }

    async fn insert_passenger(&mut self, passenger: &NewPassenger) -> StorageResult<i32> {
        let passenger_id = self.working.last_passenger_id + 1;
        let row = Passenger {
            passenger_id,
            first_name: passenger.first_name.clone(),
            last_name: passenger.last_name.clone(),
            passport_number: passenger.passport_number.clone(),
            contact: passenger.contact.clone(),
            nationality: passenger.nationality.clone(),
            age: passenger.age,
        };
        self.working.check_passenger(&row)?;
        self.working.last_passenger_id = passenger_id;
        self.working.passengers.insert(passenger_id, row);
        Ok(passenger_id)
    }

    async fn update_passenger(&mut self, passenger: &Passenger) -> StorageResult<()> {
        self.working.check_passenger(passenger)?;
        if let Some(row) = self.working.passengers.get_mut(&passenger.passenger_id) {
            *row = passenger.clone();
        }
        Ok(())
    }

    async fn delete_passenger(&mut self, passenger_id: i32) -> StorageResult<()> {
        for reservation in self.working.reservations.values() {
            if reservation.passenger_id == passenger_id {
                return Err(foreign_key("reservation_passenger_id_fk"));
            }
            if reservation.guardian_id == Some(passenger_id) {
                return Err(foreign_key("reservation_guardian_id_fk"));
            }
        }
        self.working.passengers.remove(&passenger_id);
        Ok(())
    }

    async fn get_reservation(
        &mut self,
        reservation_id: i32,
        _lock: Lock,
    ) -> StorageResult<Option<Reservation>> {
        Ok(self.working.reservations.get(&reservation_id).cloned())
    }

    async fn list_reservations(&mut self) -> StorageResult<Vec<Reservation>> {
        Ok(self.working.reservations.values().cloned().collect())
    }

    async fn list_flight_reservations(
        &mut self,
        flight_id: i32,
    ) -> StorageResult<Vec<Reservation>> {
        Ok(self
            .working
            .reservations
            .values()
            .filter(|reservation| reservation.flight_id == flight_id)
            .cloned()
            .collect())
    }

    async fn list_passenger_reservations(
        &mut self,
        passenger_id: i32,
    ) -> StorageResult<Vec<Reservation>> {
        Ok(self
            .working
            .reservations
            .values()
            .filter(|reservation| reservation.passenger_id == passenger_id)
            .cloned()
            .collect())
    }

    async fn find_reservation(
        &mut self,
        passenger_id: i32,
        flight_id: i32,
    ) -> StorageResult<Option<Reservation>> {
        Ok(self
            .working
            .reservations
            .values()
            .find(|reservation| {
                reservation.passenger_id == passenger_id && reservation.flight_id == flight_id
            })
            .cloned())
    }

    async fn find_seat_holder(
        &mut self,
        flight_id: i32,
        seat_code: &str,
    ) -> StorageResult<Option<Reservation>> {
        Ok(self
            .working
            .reservations
            .values()
            .find(|reservation| {
                reservation.flight_id == flight_id && reservation.seat_code == seat_code
            })
            .cloned())
    }

    async fn insert_reservation(&mut self, reservation: &NewReservation) -> StorageResult<i32> {
        let reservation_id = self.working.last_reservation_id + 1;
        let row = Reservation {
            reservation_id,
            passenger_id: reservation.passenger_id,
            flight_id: reservation.flight_id,
            seat_code: reservation.seat_code.clone(),
            state: reservation.state,
            guardian_id: reservation.guardian_id,
        };
        self.working.check_reservation(&row)?;
        self.working.last_reservation_id = reservation_id;
        self.working.reservations.insert(reservation_id, row);
        Ok(reservation_id)
    }

    async fn update_reservation(&mut self, reservation: &Reservation) -> StorageResult<()> {
        self.working.check_reservation(reservation)?;
        if let Some(row) = self
            .working
            .reservations
            .get_mut(&reservation.reservation_id)
        {
            *row = reservation.clone();
        }
        Ok(())
    }

    async fn delete_reservation(&mut self, reservation_id: i32) -> StorageResult<()> {
        self.working.reservations.remove(&reservation_id);
        Ok(())
    }

    async fn get_maintenance(
        &mut self,
        maintenance_id: i32,
        _lock: Lock,
    ) -> StorageResult<Option<Maintenance>> {
        Ok(self.working.maintenance.get(&maintenance_id).cloned())
    }

    async fn list_maintenance(&mut self) -> StorageResult<Vec<Maintenance>> {
        let mut records: Vec<Maintenance> = self.working.maintenance.values().cloned().collect();
        records.sort_by_key(|record| (record.operation_date, record.maintenance_id));
        Ok(records)
    }

    async fn list_aircraft_maintenance(
        &mut self,
        aircraft_id: i32,
    ) -> StorageResult<Vec<Maintenance>> {
        let mut records: Vec<Maintenance> = self
            .working
            .maintenance
            .values()
            .filter(|record| record.aircraft_id == aircraft_id)
            .cloned()
            .collect();
        records.sort_by_key(|record| (record.operation_date, record.maintenance_id));
        Ok(records)
    }

    async fn insert_maintenance(&mut self, maintenance: &NewMaintenance) -> StorageResult<i32> {
        let maintenance_id = self.working.last_maintenance_id + 1;
        let row = Maintenance {
            maintenance_id,
            aircraft_id: maintenance.aircraft_id,
            operation_date: maintenance.operation_date,
            maintenance_type: maintenance.maintenance_type.clone(),
            state: maintenance.state,
        };
        self.working.check_maintenance(&row)?;
        self.working.last_maintenance_id = maintenance_id;
        self.working.maintenance.insert(maintenance_id, row);
        Ok(maintenance_id)
    }

    async fn update_maintenance(&mut self, maintenance: &Maintenance) -> StorageResult<()> {
        self.working.check_maintenance(maintenance)?;
        if let Some(row) = self
            .working
            .maintenance
            .get_mut(&maintenance.maintenance_id)
        {
            *row = maintenance.clone();
        }
        Ok(())
    }

    async fn delete_maintenance(&mut self, maintenance_id: i32) -> StorageResult<()> {
        self.working.maintenance.remove(&maintenance_id);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StorageResult<()> {
        let MemoryUnitOfWork { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StorageResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::aircraft::AircraftState;
    use chrono::NaiveDate;

    fn aircraft(aircraft_id: i32, max_capacity: i32) -> Aircraft {
        Aircraft {
            aircraft_id,
            model: "A320".to_string(),
            max_capacity,
            state: AircraftState::Ready,
        }
    }

    fn new_flight(aircraft_id: i32) -> NewFlight {
        let departure = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        NewFlight {
            destination: "Algiers".to_string(),
            departure_time: departure,
            arrival_time: departure + chrono::Duration::hours(2),
            aircraft_id,
        }
    }

    #[tokio::test]
    async fn uncommitted_work_is_discarded() {
        let store = MemoryStore::new();

        let mut uow = store.begin().await.unwrap();
        uow.insert_aircraft(&aircraft(1, 10)).await.unwrap();
        drop(uow);

        let mut uow = store.begin().await.unwrap();
        assert!(uow.get_aircraft(1, Lock::None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn committed_work_is_visible() {
        let store = MemoryStore::new();

        let mut uow = store.begin().await.unwrap();
        uow.insert_aircraft(&aircraft(1, 10)).await.unwrap();
        uow.commit().await.unwrap();

        let mut uow = store.begin().await.unwrap();
        assert!(uow.get_aircraft(1, Lock::None).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn duplicate_aircraft_id_is_a_unique_violation() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        uow.insert_aircraft(&aircraft(1, 10)).await.unwrap();

        let err = uow.insert_aircraft(&aircraft(1, 20)).await.unwrap_err();
        assert!(matches!(err, StorageError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn flight_requires_existing_aircraft() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();

        let err = uow.insert_flight(&new_flight(42)).await.unwrap_err();
        assert!(matches!(err, StorageError::ForeignKeyViolation(_)));
    }

    #[tokio::test]
    async fn negative_capacity_is_a_check_violation() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        uow.insert_aircraft(&aircraft(1, 10)).await.unwrap();
        let flight_id = uow.insert_flight(&new_flight(1)).await.unwrap();

        let mut flight = uow.get_flight(flight_id, Lock::Update).await.unwrap().unwrap();
        flight.current_capacity = -1;
        let err = uow.update_flight(&flight).await.unwrap_err();
        assert!(matches!(err, StorageError::CheckViolation(_)));
    }

    #[tokio::test]
    async fn deleting_aircraft_cascades_maintenance() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        uow.insert_aircraft(&aircraft(1, 10)).await.unwrap();
        uow.insert_maintenance(&NewMaintenance {
            aircraft_id: 1,
            operation_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            maintenance_type: "A-check".to_string(),
            state: crate::models::maintenance::MaintenanceState::Planned,
        })
        .await
        .unwrap();

        uow.delete_aircraft(1).await.unwrap();
        assert!(uow.list_maintenance().await.unwrap().is_empty());
    }
}
