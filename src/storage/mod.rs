//! Storage boundary: typed rows in, typed rows out.
//!
//! A [`Store`] hands out [`UnitOfWork`]s. Every read and write of a domain
//! operation goes through one unit of work, which either commits as a whole
//! or rolls back as a whole. Dropping a unit of work without committing it
//! rolls it back.

pub mod error;
pub mod memory;
pub mod mysql;

use async_trait::async_trait;

use crate::models::aircraft::Aircraft;
use crate::models::flight::{Flight, NewFlight};
use crate::models::maintenance::{Maintenance, NewMaintenance};
use crate::models::passenger::{NewPassenger, Passenger};
use crate::models::reservation::{NewReservation, Reservation};

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use mysql::MySqlStore;

/// Row lock taken by a read inside a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lock {
    /// Plain consistent read.
    None,
    /// Shared lock: blocks writers of the row until commit.
    Share,
    /// Exclusive lock: blocks other locking readers and writers until commit.
    Update,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> StorageResult<Box<dyn UnitOfWork>>;
}

#[async_trait]
pub trait UnitOfWork: Send {
    // Aircraft
    async fn get_aircraft(&mut self, aircraft_id: i32, lock: Lock)
        -> StorageResult<Option<Aircraft>>;
    async fn list_aircraft(&mut self) -> StorageResult<Vec<Aircraft>>;
    async fn insert_aircraft(&mut self, aircraft: &Aircraft) -> StorageResult<()>;
    async fn update_aircraft(&mut self, aircraft: &Aircraft) -> StorageResult<()>;
    async fn delete_aircraft(&mut self, aircraft_id: i32) -> StorageResult<()>;

    // Flights
    async fn get_flight(&mut self, flight_id: i32, lock: Lock) -> StorageResult<Option<Flight>>;
    async fn list_flights(&mut self) -> StorageResult<Vec<Flight>>;
    async fn list_aircraft_flights(&mut self, aircraft_id: i32) -> StorageResult<Vec<Flight>>;
    async fn insert_flight(&mut self, flight: &NewFlight) -> StorageResult<i32>;
    async fn update_flight(&mut self, flight: &Flight) -> StorageResult<()>;
    async fn delete_flight(&mut self, flight_id: i32) -> StorageResult<()>;

    // Passengers
    async fn get_passenger(
        &mut self,
        passenger_id: i32,
        lock: Lock,
    ) -> StorageResult<Option<Passenger>>;
    async fn find_passenger_by_passport(
        &mut self,
        passport_number: &str,
    ) -> StorageResult<Option<Passenger>>;
    async fn list_passengers(&mut self) -> StorageResult<Vec<Passenger>>;
    async fn insert_passenger(&mut self, passenger: &NewPassenger) -> StorageResult<i32>;
    async fn update_passenger(&mut self, passenger: &Passenger) -> StorageResult<()>;
    async fn delete_passenger(&mut self, passenger_id: i32) -> StorageResult<()>;

    // Reservations
    async fn get_reservation(
        &mut self,
        reservation_id: i32,
        lock: Lock,
    ) -> StorageResult<Option<Reservation>>;
    async fn list_reservations(&mut self) -> StorageResult<Vec<Reservation>>;
    async fn list_flight_reservations(&mut self, flight_id: i32)
        -> StorageResult<Vec<Reservation>>;
    async fn list_passenger_reservations(
        &mut self,
        passenger_id: i32,
    ) -> StorageResult<Vec<Reservation>>;
    async fn find_reservation(
        &mut self,
        passenger_id: i32,
        flight_id: i32,
    ) -> StorageResult<Option<Reservation>>;
    async fn find_seat_holder(
        &mut self,
        flight_id: i32,
        seat_code: &str,
    ) -> StorageResult<Option<Reservation>>;
    async fn insert_reservation(&mut self, reservation: &NewReservation) -> StorageResult<i32>;
    async fn update_reservation(&mut self, reservation: &Reservation) -> StorageResult<()>;
    async fn delete_reservation(&mut self, reservation_id: i32) -> StorageResult<()>;

    // Maintenance
    async fn get_maintenance(
        &mut self,
        maintenance_id: i32,
        lock: Lock,
    ) -> StorageResult<Option<Maintenance>>;
    async fn list_maintenance(&mut self) -> StorageResult<Vec<Maintenance>>;
    async fn list_aircraft_maintenance(
        &mut self,
        aircraft_id: i32,
    ) -> StorageResult<Vec<Maintenance>>;
    async fn insert_maintenance(&mut self, maintenance: &NewMaintenance) -> StorageResult<i32>;
    async fn update_maintenance(&mut self, maintenance: &Maintenance) -> StorageResult<()>;
    async fn delete_maintenance(&mut self, maintenance_id: i32) -> StorageResult<()>;

    async fn commit(self: Box<Self>) -> StorageResult<()>;
    async fn rollback(self: Box<Self>) -> StorageResult<()>;
}
