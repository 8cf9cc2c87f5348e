use async_trait::async_trait;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::{Executor, MySql, MySqlPool, Transaction};

use super::{Lock, StorageResult, Store, UnitOfWork};
use crate::models::aircraft::Aircraft;
use crate::models::flight::{Flight, NewFlight};
use crate::models::maintenance::{Maintenance, NewMaintenance};
use crate::models::passenger::{NewPassenger, Passenger};
use crate::models::reservation::{NewReservation, Reservation};

const AIRCRAFT_COLUMNS: &str = "aircraft_id, model, max_capacity, state";
const FLIGHT_COLUMNS: &str =
    "flight_id, destination, departure_time, arrival_time, aircraft_id, current_capacity, state";
const PASSENGER_COLUMNS: &str =
    "passenger_id, first_name, last_name, passport_number, contact, nationality, age";
const RESERVATION_COLUMNS: &str =
    "reservation_id, passenger_id, flight_id, seat_code, state, guardian_id";
const MAINTENANCE_COLUMNS: &str =
    "maintenance_id, aircraft_id, operation_date, maintenance_type, state";

impl Lock {
    fn clause(self) -> &'static str {
        match self {
            Lock::None => "",
            Lock::Share => " LOCK IN SHARE MODE",
            Lock::Update => " FOR UPDATE",
        }
    }
}

/// Pool options for connections handed to [`MySqlStore`].
///
/// Every session runs at READ COMMITTED. Under InnoDB's default REPEATABLE
/// READ the first plain read fixes a snapshot, so plain reads made after
/// waiting on a row lock would miss rows committed during the wait.
pub fn pool_options() -> MySqlPoolOptions {
    MySqlPoolOptions::new().after_connect(|conn, _meta| {
        Box::pin(async move {
            conn.execute("SET SESSION TRANSACTION ISOLATION LEVEL READ COMMITTED")
                .await?;
            Ok(())
        })
    })
}

// MySQL-backed store; every unit of work is one InnoDB transaction.
// The pool must come from `pool_options`.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlStore { pool }
    }
}

#[async_trait]
impl Store for MySqlStore {
    async fn begin(&self) -> StorageResult<Box<dyn UnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(MySqlUnitOfWork { tx }))
    }
}

// sqlx rolls the transaction back if it is dropped before commit
pub struct MySqlUnitOfWork {
    tx: Transaction<'static, MySql>,
}

#[async_trait]
impl UnitOfWork for MySqlUnitOfWork {
    async fn get_aircraft(
        &mut self,
        aircraft_id: i32,
        lock: Lock,
    ) -> StorageResult<Option<Aircraft>> {
        let sql = format!(
            "SELECT {AIRCRAFT_COLUMNS} FROM aircraft WHERE aircraft_id = ?{}",
            lock.clause()
        );
        let aircraft = sqlx::query_as::<_, Aircraft>(&sql)
            .bind(aircraft_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(aircraft)
    }

    async fn list_aircraft(&mut self) -> StorageResult<Vec<Aircraft>> {
        let sql = format!("SELECT {AIRCRAFT_COLUMNS} FROM aircraft ORDER BY aircraft_id");
        let aircraft = sqlx::query_as::<_, Aircraft>(&sql)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(aircraft)
    }

    async fn insert_aircraft(&mut self, aircraft: &Aircraft) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO aircraft (aircraft_id, model, max_capacity, state)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(aircraft.aircraft_id)
        .bind(&aircraft.model)
        .bind(aircraft.max_capacity)
        .bind(aircraft.state.to_string())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn update_aircraft(&mut self, aircraft: &Aircraft) -> StorageResult<()> {
        sqlx::query(
            r#"
            UPDATE aircraft
            SET model = ?, max_capacity = ?, state = ?
            WHERE aircraft_id = ?
            "#,
        )
        .bind(&aircraft.model)
        .bind(aircraft.max_capacity)
        .bind(aircraft.state.to_string())
        .bind(aircraft.aircraft_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_aircraft(&mut self, aircraft_id: i32) -> StorageResult<()> {
        sqlx::query("DELETE FROM aircraft WHERE aircraft_id = ?")
            .bind(aircraft_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn get_flight(&mut self, flight_id: i32, lock: Lock) -> StorageResult<Option<Flight>> {
        let sql = format!(
            "SELECT {FLIGHT_COLUMNS} FROM flight WHERE flight_id = ?{}",
            lock.clause()
        );
        let flight = sqlx::query_as::<_, Flight>(&sql)
            .bind(flight_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(flight)
    }

    async fn list_flights(&mut self) -> StorageResult<Vec<Flight>> {
        let sql = format!("SELECT {FLIGHT_COLUMNS} FROM flight ORDER BY departure_time, flight_id");
        let flights = sqlx::query_as::<_, Flight>(&sql)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(flights)
    }

    async fn list_aircraft_flights(&mut self, aircraft_id: i32) -> StorageResult<Vec<Flight>> {
        let sql = format!(
            "SELECT {FLIGHT_COLUMNS} FROM flight WHERE aircraft_id = ? ORDER BY departure_time"
        );
        let flights = sqlx::query_as::<_, Flight>(&sql)
            .bind(aircraft_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(flights)
    }

    async fn insert_flight(&mut self, flight: &NewFlight) -> StorageResult<i32> {
        let result = sqlx::query(
            r#"
            INSERT INTO flight (destination, departure_time, arrival_time, aircraft_id)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&flight.destination)
        .bind(flight.departure_time)
        .bind(flight.arrival_time)
        .bind(flight.aircraft_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.last_insert_id() as i32)
    }

    async fn update_flight(&mut self, flight: &Flight) -> StorageResult<()> {
        sqlx::query(
            r#"
            UPDATE flight
            SET destination = ?,
                departure_time = ?,
                arrival_time = ?,
                aircraft_id = ?,
                current_capacity = ?,
                state = ?
            WHERE flight_id = ?
            "#,
        )
        .bind(&flight.destination)
        .bind(flight.departure_time)
        .bind(flight.arrival_time)
        .bind(flight.aircraft_id)
        .bind(flight.current_capacity)
        .bind(flight.state.to_string())
        .bind(flight.flight_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_flight(&mut self, flight_id: i32) -> StorageResult<()> {
        sqlx::query("DELETE FROM flight WHERE flight_id = ?")
            .bind(flight_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn get_passenger(
        &mut self,
        passenger_id: i32,
        lock: Lock,
    ) -> StorageResult<Option<Passenger>> {
        let sql = format!(
            "SELECT {PASSENGER_COLUMNS} FROM passenger WHERE passenger_id = ?{}",
            lock.clause()
        );
        let passenger = sqlx::query_as::<_, Passenger>(&sql)
            .bind(passenger_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(passenger)
    }

    async fn find_passenger_by_passport(
        &mut self,
        passport_number: &str,
    ) -> StorageResult<Option<Passenger>> {
        let sql = format!("SELECT {PASSENGER_COLUMNS} FROM passenger WHERE passport_number = ?");
        let passenger = sqlx::query_as::<_, Passenger>(&sql)
            .bind(passport_number)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(passenger)
    }

    async fn list_passengers(&mut self) -> StorageResult<Vec<Passenger>> {
        let sql = format!("SELECT {PASSENGER_COLUMNS} FROM passenger ORDER BY passenger_id");
        let passengers = sqlx::query_as::<_, Passenger>(&sql)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(passengers)
    }

    async fn insert_passenger(&mut self, passenger: &NewPassenger) -> StorageResult<i32> {
        let result = sqlx::query(
            r#"
            INSERT INTO passenger
            (first_name, last_name, passport_number, contact, nationality, age)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&passenger.first_name)
        .bind(&passenger.last_name)
        .bind(&passenger.passport_number)
        .bind(&passenger.contact)
        .bind(&passenger.nationality)
        .bind(passenger.age)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.last_insert_id() as i32)
    }

    async fn update_passenger(&mut self, passenger: &Passenger) -> StorageResult<()> {
        sqlx::query(
            r#"
            UPDATE passenger
            SET first_name = ?, last_name = ?, contact = ?, nationality = ?, age = ?
            WHERE passenger_id = ?
            "#,
        )
        .bind(&passenger.first_name)
        .bind(&passenger.last_name)
        .bind(&passenger.contact)
        .bind(&passenger.nationality)
        .bind(passenger.age)
        .bind(passenger.passenger_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_passenger(&mut self, passenger_id: i32) -> StorageResult<()> {
        sqlx::query("DELETE FROM passenger WHERE passenger_id = ?")
            .bind(passenger_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn get_reservation(
        &mut self,
        reservation_id: i32,
        lock: Lock,
    ) -> StorageResult<Option<Reservation>> {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservation WHERE reservation_id = ?{}",
            lock.clause()
        );
        let reservation = sqlx::query_as::<_, Reservation>(&sql)
            .bind(reservation_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(reservation)
    }

    async fn list_reservations(&mut self) -> StorageResult<Vec<Reservation>> {
        let sql = format!("SELECT {RESERVATION_COLUMNS} FROM reservation ORDER BY reservation_id");
        let reservations = sqlx::query_as::<_, Reservation>(&sql)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(reservations)
    }

    async fn list_flight_reservations(
        &mut self,
        flight_id: i32,
    ) -> StorageResult<Vec<Reservation>> {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservation WHERE flight_id = ? ORDER BY reservation_id"
        );
        let reservations = sqlx::query_as::<_, Reservation>(&sql)
            .bind(flight_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(reservations)
    }

    async fn list_passenger_reservations(
        &mut self,
        passenger_id: i32,
    ) -> StorageResult<Vec<Reservation>> {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservation WHERE passenger_id = ? ORDER BY reservation_id"
        );
        let reservations = sqlx::query_as::<_, Reservation>(&sql)
            .bind(passenger_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(reservations)
    }

    async fn find_reservation(
        &mut self,
        passenger_id: i32,
        flight_id: i32,
    ) -> StorageResult<Option<Reservation>> {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservation WHERE passenger_id = ? AND flight_id = ?"
        );
        let reservation = sqlx::query_as::<_, Reservation>(&sql)
            .bind(passenger_id)
            .bind(flight_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(reservation)
    }

    async fn find_seat_holder(
        &mut self,
        flight_id: i32,
        seat_code: &str,
    ) -> StorageResult<Option<Reservation>> {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservation WHERE flight_id = ? AND seat_code = ?"
        );
        let reservation = sqlx::query_as::<_, Reservation>(&sql)
            .bind(flight_id)
            .bind(seat_code)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(reservation)
    }

    async fn insert_reservation(&mut self, reservation: &NewReservation) -> StorageResult<i32> {
        let result = sqlx::query(
            r#"
            INSERT INTO reservation (passenger_id, flight_id, seat_code, state, guardian_id)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(reservation.passenger_id)
        .bind(reservation.flight_id)
        .bind(&reservation.seat_code)
        .bind(reservation.state.to_string())
        .bind(reservation.guardian_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.last_insert_id() as i32)
    }

    async fn update_reservation(&mut self, reservation: &Reservation) -> StorageResult<()> {
        sqlx::query(
            r#"
            UPDATE reservation
            SET seat_code = ?, state = ?, guardian_id = ?
            WHERE reservation_id = ?
            "#,
        )
        .bind(&reservation.seat_code)
        .bind(reservation.state.to_string())
        .bind(reservation.guardian_id)
        .bind(reservation.reservation_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_reservation(&mut self, reservation_id: i32) -> StorageResult<()> {
        sqlx::query("DELETE FROM reservation WHERE reservation_id = ?")
            .bind(reservation_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn get_maintenance(
        &mut self,
        maintenance_id: i32,
        lock: Lock,
    ) -> StorageResult<Option<Maintenance>> {
        let sql = format!(
            "SELECT {MAINTENANCE_COLUMNS} FROM maintenance WHERE maintenance_id = ?{}",
            lock.clause()
        );
        let maintenance = sqlx::query_as::<_, Maintenance>(&sql)
            .bind(maintenance_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(maintenance)
    }

    async fn list_maintenance(&mut self) -> StorageResult<Vec<Maintenance>> {
        let sql = format!(
            "SELECT {MAINTENANCE_COLUMNS} FROM maintenance ORDER BY operation_date, maintenance_id"
        );
        let records = sqlx::query_as::<_, Maintenance>(&sql)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(records)
    }

    async fn list_aircraft_maintenance(
        &mut self,
        aircraft_id: i32,
    ) -> StorageResult<Vec<Maintenance>> {
        let sql = format!(
            "SELECT {MAINTENANCE_COLUMNS} FROM maintenance WHERE aircraft_id = ? \
             ORDER BY operation_date, maintenance_id"
        );
        let records = sqlx::query_as::<_, Maintenance>(&sql)
            .bind(aircraft_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(records)
    }

    async fn insert_maintenance(&mut self, maintenance: &NewMaintenance) -> StorageResult<i32> {
        let result = sqlx::query(
            r#"
            INSERT INTO maintenance (aircraft_id, operation_date, maintenance_type, state)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(maintenance.aircraft_id)
        .bind(maintenance.operation_date)
        .bind(&maintenance.maintenance_type)
        .bind(maintenance.state.to_string())
        .execute(&mut *self.tx)
        .await?;
        Ok(result.last_insert_id() as i32)
    }

    async fn update_maintenance(&mut self, maintenance: &Maintenance) -> StorageResult<()> {
        sqlx::query(
            r#"
            UPDATE maintenance
            SET operation_date = ?, maintenance_type = ?, state = ?
            WHERE maintenance_id = ?
            "#,
        )
        .bind(maintenance.operation_date)
        .bind(&maintenance.maintenance_type)
        .bind(maintenance.state.to_string())
        .bind(maintenance.maintenance_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_maintenance(&mut self, maintenance_id: i32) -> StorageResult<()> {
        sqlx::query("DELETE FROM maintenance WHERE maintenance_id = ?")
            .bind(maintenance_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StorageResult<()> {
        let MySqlUnitOfWork { tx } = *self;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StorageResult<()> {
        let MySqlUnitOfWork { tx } = *self;
        tx.rollback().await?;
        Ok(())
    }
}
