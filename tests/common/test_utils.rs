#![allow(dead_code)]

use std::env;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use airline_operations::models::aircraft::{Aircraft, AircraftState, CreateAircraftRequest};
use airline_operations::models::flight::{CreateFlightRequest, Flight};
use airline_operations::models::passenger::{CreatePassengerRequest, Passenger};
use airline_operations::models::reservation::{
    CreateReservationRequest, Reservation, ReservationState,
};
use airline_operations::services::aircraft_service::AircraftService;
use airline_operations::services::flight_service::FlightService;
use airline_operations::services::maintenance_service::MaintenanceService;
use airline_operations::services::passenger_service::PassengerService;
use airline_operations::services::reservation_service::ReservationService;
use airline_operations::storage::mysql::pool_options;
use airline_operations::storage::{MemoryStore, Store};
use airline_operations::utils::error::AppResult;
use chrono::{NaiveDate, NaiveDateTime};
use dotenv::dotenv;
use once_cell::sync::OnceCell;
use sqlx::mysql::MySqlPool as Pool;
use sqlx::Error;
use tokio::sync::Mutex;

/// Every domain service, sharing one store.
#[derive(Clone)]
pub struct Services {
    pub aircraft: AircraftService,
    pub flights: FlightService,
    pub passengers: PassengerService,
    pub reservations: ReservationService,
    pub maintenance: MaintenanceService,
}

impl Services {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Services {
            aircraft: AircraftService::new(store.clone()),
            flights: FlightService::new(store.clone()),
            passengers: PassengerService::new(store.clone()),
            reservations: ReservationService::new(store.clone()),
            maintenance: MaintenanceService::new(store),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub async fn add_aircraft(&self, aircraft_id: i32, max_capacity: i32) -> Aircraft {
        self.aircraft
            .create_aircraft(CreateAircraftRequest {
                aircraft_id,
                model: format!("A320-{aircraft_id}"),
                max_capacity,
                state: Some(AircraftState::Ready),
            })
            .await
            .expect("Failed to create aircraft")
    }

    pub async fn add_flight(&self, aircraft_id: i32) -> Flight {
        self.flights
            .create_flight(CreateFlightRequest {
                destination: "Toronto".to_string(),
                departure_time: at(2025, 6, 1, 9),
                arrival_time: at(2025, 6, 1, 13),
                aircraft_id,
            })
            .await
            .expect("Failed to create flight")
    }

    pub async fn add_passenger(&self, passport_number: &str, age: i32) -> Passenger {
        self.passengers
            .create_passenger(CreatePassengerRequest {
                first_name: "Test".to_string(),
                last_name: format!("Passenger {passport_number}"),
                passport_number: passport_number.to_string(),
                contact: format!("{}@example.com", passport_number.to_lowercase()),
                nationality: "Canadian".to_string(),
                age,
            })
            .await
            .expect("Failed to create passenger")
    }

    pub async fn book(
        &self,
        passenger_id: i32,
        flight_id: i32,
        seat_code: &str,
        guardian_id: Option<i32>,
    ) -> AppResult<Reservation> {
        self.reservations
            .create_reservation(CreateReservationRequest {
                passenger_id,
                flight_id,
                seat_code: seat_code.to_string(),
                guardian_id,
            })
            .await
    }

    /// Books and confirms, as needed for a guardian.
    pub async fn book_confirmed(
        &self,
        passenger_id: i32,
        flight_id: i32,
        seat_code: &str,
    ) -> Reservation {
        let reservation = self
            .book(passenger_id, flight_id, seat_code, None)
            .await
            .expect("Failed to book");
        self.reservations
            .change_state(reservation.reservation_id, ReservationState::Confirmed)
            .await
            .expect("Failed to confirm")
    }

    /// Occupied seats according to the flight row.
    pub async fn capacity(&self, flight_id: i32) -> i32 {
        self.flights
            .get_flight(flight_id)
            .await
            .expect("Failed to read flight")
            .current_capacity
    }

    /// Occupied seats according to the reservation rows.
    pub async fn held_seats(&self, flight_id: i32) -> i32 {
        self.reservations
            .list_flight_reservations(flight_id)
            .await
            .expect("Failed to list reservations")
            .iter()
            .filter(|reservation| reservation.holds_capacity())
            .count() as i32
    }
}

pub fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, 0, 0))
        .expect("valid test timestamp")
}

static TEST_DB: OnceCell<Mutex<Option<TestDb>>> = OnceCell::new();
static DB_NAME: OnceCell<String> = OnceCell::new();

#[derive(Debug)]
pub struct TestDb {
    pub pool: Pool,
    pub db_name: String,
}

// Server part of ADMIN_DATABASE_URL, without a database name
fn admin_base_url() -> Option<String> {
    dotenv().ok();
    let db_url = env::var("ADMIN_DATABASE_URL").ok()?;
    Some(db_url.split('/').collect::<Vec<&str>>()[..3].join("/"))
}

async fn connect(url: &str) -> Result<Pool, Error> {
    pool_options()
        .max_connections(20)
        .connect(url)
        .await
}

impl TestDb {
    /// Shared pool on a scratch database, or `None` when no MySQL server is
    /// configured for this run.
    pub async fn get_instance() -> Result<Option<Pool>, Error> {
        let Some(base_url) = admin_base_url() else {
            println!("ADMIN_DATABASE_URL not set, skipping MySQL tests");
            return Ok(None);
        };

        let test_db = TEST_DB.get_or_init(|| Mutex::new(None));
        let mut guard = test_db.lock().await;

        // Only create one database for all tests in one run
        if let Some(db) = guard.as_ref() {
            return Ok(Some(db.pool.clone()));
        }

        let db = Self::setup_database(&base_url).await?;
        let pool = db.pool.clone();
        *guard = Some(db);
        Ok(Some(pool))
    }

    async fn setup_database(base_url: &str) -> Result<Self, Error> {
        let db_name = DB_NAME
            .get_or_init(|| {
                let timestamp = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap()
                    .as_millis();
                format!("airline_ops_test_{}_{}", timestamp, std::process::id())
            })
            .clone();

        println!("Creating test database: {}", db_name);
        let admin_pool = connect(base_url).await?;
        sqlx::query(&format!("CREATE DATABASE {}", db_name))
            .execute(&admin_pool)
            .await?;

        let pool = connect(&format!("{}/{}", base_url, db_name)).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool, db_name })
    }

    // Teardown function to drop database after test run (not after each test)
    pub async fn cleanup_database() -> Result<(), Error> {
        let Some(base_url) = admin_base_url() else {
            return Ok(());
        };
        let Some(db_name) = DB_NAME.get() else {
            return Ok(());
        };

        println!("Dropping database: {}", db_name);
        let admin_pool = connect(&base_url).await?;
        sqlx::query(&format!("DROP DATABASE IF EXISTS {}", db_name))
            .execute(&admin_pool)
            .await?;
        Ok(())
    }

    /// For `#[dtor]` hooks, which run outside any async runtime.
    pub fn cleanup_database_sync() -> Result<(), Error> {
        if DB_NAME.get().is_none() {
            return Ok(());
        }
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(Error::Io)?
            .block_on(Self::cleanup_database())
    }
}
