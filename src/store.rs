use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use sqlx::{Sqlite, SqlitePool, Transaction};
use thiserror::Error;
use tracing::info;

use crate::calendar::ServiceCalendar;
use crate::gtfs::Bundle;
use crate::gtfs::records::{
    CalendarException, CalendarRule, ExceptionKind, Route, Trip, parse_service_date,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Store table {table} holds malformed {column} value {value:?}")]
    Corrupt {
        table: &'static str,
        column: &'static str,
        value: String,
    },
}

/// Schema applied to every fresh store. Tables and columns mirror the
/// bundle's files one to one; dates are kept in their YYYYMMDD text form.
const SCHEMA: [&str; 9] = [
    "CREATE TABLE IF NOT EXISTS agency (
        agency_id TEXT PRIMARY KEY,
        agency_name TEXT,
        agency_url TEXT,
        agency_timezone TEXT,
        agency_lang TEXT,
        agency_phone TEXT,
        agency_fare_url TEXT,
        agency_noc TEXT)",
    "CREATE TABLE IF NOT EXISTS stops (
        stop_id TEXT PRIMARY KEY,
        stop_code TEXT,
        stop_name TEXT,
        stop_desc TEXT,
        stop_lat TEXT,
        stop_lon TEXT,
        zone_id TEXT,
        stop_url TEXT,
        location_type INTEGER,
        parent_station TEXT,
        stop_timezone TEXT,
        wheelchair_boarding INTEGER,
        platform_code TEXT)",
    "CREATE TABLE IF NOT EXISTS routes (
        route_id TEXT PRIMARY KEY,
        agency_id TEXT,
        route_short_name TEXT,
        route_long_name TEXT,
        route_desc TEXT,
        route_type INTEGER,
        route_url TEXT,
        route_color TEXT,
        route_text_color TEXT,
        FOREIGN KEY (agency_id) REFERENCES agency (agency_id))",
    "CREATE TABLE IF NOT EXISTS trips (
        route_id TEXT,
        service_id TEXT,
        trip_id TEXT PRIMARY KEY,
        trip_headsign TEXT,
        trip_short_name TEXT,
        direction_id INTEGER,
        block_id TEXT,
        shape_id TEXT,
        wheelchair_accessible INTEGER,
        bikes_allowed INTEGER,
        vehicle_journey_code TEXT,
        FOREIGN KEY (route_id) REFERENCES routes (route_id))",
    "CREATE TABLE IF NOT EXISTS stop_times (
        trip_id TEXT,
        arrival_time TEXT,
        departure_time TEXT,
        stop_id TEXT,
        stop_sequence INTEGER,
        stop_headsign TEXT,
        pickup_type INTEGER,
        drop_off_type INTEGER,
        shape_dist_traveled REAL,
        timepoint INTEGER,
        PRIMARY KEY (trip_id, stop_sequence),
        FOREIGN KEY (trip_id) REFERENCES trips (trip_id),
        FOREIGN KEY (stop_id) REFERENCES stops (stop_id))",
    "CREATE TABLE IF NOT EXISTS calendar (
        service_id TEXT PRIMARY KEY,
        monday INTEGER,
        tuesday INTEGER,
        wednesday INTEGER,
        thursday INTEGER,
        friday INTEGER,
        saturday INTEGER,
        sunday INTEGER,
        start_date TEXT,
        end_date TEXT)",
    "CREATE TABLE IF NOT EXISTS calendar_dates (
        service_id TEXT,
        date TEXT,
        exception_type INTEGER,
        PRIMARY KEY (service_id, date),
        FOREIGN KEY (service_id) REFERENCES calendar (service_id))",
    "CREATE TABLE IF NOT EXISTS shapes (
        shape_id TEXT,
        shape_pt_lat TEXT,
        shape_pt_lon TEXT,
        shape_pt_sequence INTEGER,
        shape_dist_traveled TEXT)",
    "CREATE TABLE IF NOT EXISTS feed_info (
        feed_publisher_name TEXT,
        feed_publisher_url TEXT,
        feed_lang TEXT,
        feed_start_date TEXT,
        feed_end_date TEXT,
        feed_version TEXT)",
];

/// One ingestion run's database file.
///
/// The file name is derived from the run's captured start timestamp, so
/// every run gets its own independent store.
pub struct Store {
    pool: SqlitePool,
    path: PathBuf,
    name: String,
}

impl Store {
    /// Create the store file for a run and apply the schema.
    pub async fn create(dir: &Path, started_at: NaiveDateTime) -> Result<Store, StoreError> {
        std::fs::create_dir_all(dir)?;
        let name = format!("gtfs_data_{}", started_at.format("%Y%m%d_%H%M%S"));
        let path = dir.join(format!("{name}.db"));
        let url = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&url).await?;
        for ddl in SCHEMA {
            sqlx::query(ddl).execute(&pool).await?;
        }
        info!(path = %path.display(), "Created schedule store");
        Ok(Store { pool, path, name })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store name without the `.db` extension, used for sibling artifacts.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a whole bundle in one transaction.
    ///
    /// Any failure (a duplicate primary key slipping past validation, disk
    /// exhaustion) rolls back every table; the store never holds a partial
    /// load.
    pub async fn load_bundle(&self, bundle: &Bundle) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        for agency in &bundle.agencies {
            sqlx::query(
                "INSERT INTO agency (agency_id, agency_name, agency_url, agency_timezone,
                 agency_lang, agency_phone, agency_fare_url, agency_noc)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&agency.agency_id)
            .bind(&agency.agency_name)
            .bind(&agency.agency_url)
            .bind(&agency.agency_timezone)
            .bind(&agency.agency_lang)
            .bind(&agency.agency_phone)
            .bind(&agency.agency_fare_url)
            .bind(&agency.agency_noc)
            .execute(&mut *tx)
            .await?;
        }
        info!(count = bundle.agencies.len(), "Loaded agency table");

        for stop in &bundle.stops {
            sqlx::query(
                "INSERT INTO stops (stop_id, stop_code, stop_name, stop_desc, stop_lat, stop_lon,
                 zone_id, stop_url, location_type, parent_station, stop_timezone,
                 wheelchair_boarding, platform_code)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&stop.stop_id)
            .bind(&stop.stop_code)
            .bind(&stop.stop_name)
            .bind(&stop.stop_desc)
            .bind(&stop.stop_lat)
            .bind(&stop.stop_lon)
            .bind(&stop.zone_id)
            .bind(&stop.stop_url)
            .bind(stop.location_type)
            .bind(&stop.parent_station)
            .bind(&stop.stop_timezone)
            .bind(stop.wheelchair_boarding)
            .bind(&stop.platform_code)
            .execute(&mut *tx)
            .await?;
        }
        info!(count = bundle.stops.len(), "Loaded stops table");

        for route in &bundle.routes {
            sqlx::query(
                "INSERT INTO routes (route_id, agency_id, route_short_name, route_long_name,
                 route_desc, route_type, route_url, route_color, route_text_color)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&route.route_id)
            .bind(&route.agency_id)
            .bind(&route.route_short_name)
            .bind(&route.route_long_name)
            .bind(&route.route_desc)
            .bind(route.route_type)
            .bind(&route.route_url)
            .bind(&route.route_color)
            .bind(&route.route_text_color)
            .execute(&mut *tx)
            .await?;
        }
        info!(count = bundle.routes.len(), "Loaded routes table");

        for trip in &bundle.trips {
            sqlx::query(
                "INSERT INTO trips (route_id, service_id, trip_id, trip_headsign, trip_short_name,
                 direction_id, block_id, shape_id, wheelchair_accessible, bikes_allowed,
                 vehicle_journey_code)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&trip.route_id)
            .bind(&trip.service_id)
            .bind(&trip.trip_id)
            .bind(&trip.trip_headsign)
            .bind(&trip.trip_short_name)
            .bind(trip.direction_id)
            .bind(&trip.block_id)
            .bind(&trip.shape_id)
            .bind(trip.wheelchair_accessible)
            .bind(trip.bikes_allowed)
            .bind(&trip.vehicle_journey_code)
            .execute(&mut *tx)
            .await?;
        }
        info!(count = bundle.trips.len(), "Loaded trips table");

        for stop_time in &bundle.stop_times {
            sqlx::query(
                "INSERT INTO stop_times (trip_id, arrival_time, departure_time, stop_id,
                 stop_sequence, stop_headsign, pickup_type, drop_off_type, shape_dist_traveled,
                 timepoint)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&stop_time.trip_id)
            .bind(&stop_time.arrival_time)
            .bind(&stop_time.departure_time)
            .bind(&stop_time.stop_id)
            .bind(stop_time.stop_sequence)
            .bind(&stop_time.stop_headsign)
            .bind(stop_time.pickup_type)
            .bind(stop_time.drop_off_type)
            .bind(stop_time.shape_dist_traveled)
            .bind(stop_time.timepoint)
            .execute(&mut *tx)
            .await?;
        }
        info!(count = bundle.stop_times.len(), "Loaded stop_times table");

        for rule in &bundle.calendar {
            sqlx::query(
                "INSERT INTO calendar (service_id, monday, tuesday, wednesday, thursday, friday,
                 saturday, sunday, start_date, end_date)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&rule.service_id)
            .bind(rule.days[0] as i64)
            .bind(rule.days[1] as i64)
            .bind(rule.days[2] as i64)
            .bind(rule.days[3] as i64)
            .bind(rule.days[4] as i64)
            .bind(rule.days[5] as i64)
            .bind(rule.days[6] as i64)
            .bind(rule.start_date.format("%Y%m%d").to_string())
            .bind(rule.end_date.format("%Y%m%d").to_string())
            .execute(&mut *tx)
            .await?;
        }
        info!(count = bundle.calendar.len(), "Loaded calendar table");

        for exception in &bundle.calendar_dates {
            sqlx::query(
                "INSERT INTO calendar_dates (service_id, date, exception_type) VALUES (?, ?, ?)",
            )
            .bind(&exception.service_id)
            .bind(exception.date.format("%Y%m%d").to_string())
            .bind(exception.kind.code())
            .execute(&mut *tx)
            .await?;
        }
        info!(
            count = bundle.calendar_dates.len(),
            "Loaded calendar_dates table"
        );

        for point in &bundle.shapes {
            sqlx::query(
                "INSERT INTO shapes (shape_id, shape_pt_lat, shape_pt_lon, shape_pt_sequence,
                 shape_dist_traveled)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&point.shape_id)
            .bind(&point.shape_pt_lat)
            .bind(&point.shape_pt_lon)
            .bind(point.shape_pt_sequence)
            .bind(&point.shape_dist_traveled)
            .execute(&mut *tx)
            .await?;
        }
        info!(count = bundle.shapes.len(), "Loaded shapes table");

        if let Some(feed_info) = &bundle.feed_info {
            sqlx::query(
                "INSERT INTO feed_info (feed_publisher_name, feed_publisher_url, feed_lang,
                 feed_start_date, feed_end_date, feed_version)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&feed_info.feed_publisher_name)
            .bind(&feed_info.feed_publisher_url)
            .bind(&feed_info.feed_lang)
            .bind(&feed_info.feed_start_date)
            .bind(&feed_info.feed_end_date)
            .bind(&feed_info.feed_version)
            .execute(&mut *tx)
            .await?;
            info!("Loaded feed_info table");
        }

        tx.commit().await?;
        Ok(())
    }

    /// Point lookup of a trip by primary key.
    pub async fn trip(&self, trip_id: &str) -> Result<Option<Trip>, StoreError> {
        type TripRow = (
            String,
            String,
            String,
            Option<String>,
            Option<String>,
            Option<i64>,
            Option<String>,
            Option<String>,
            Option<i64>,
            Option<i64>,
            Option<String>,
        );
        let row: Option<TripRow> = sqlx::query_as(
            "SELECT route_id, service_id, trip_id, trip_headsign, trip_short_name, direction_id,
             block_id, shape_id, wheelchair_accessible, bikes_allowed, vehicle_journey_code
             FROM trips WHERE trip_id = ?",
        )
        .bind(trip_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(
            |(
                route_id,
                service_id,
                trip_id,
                trip_headsign,
                trip_short_name,
                direction_id,
                block_id,
                shape_id,
                wheelchair_accessible,
                bikes_allowed,
                vehicle_journey_code,
            )| Trip {
                route_id,
                service_id,
                trip_id,
                trip_headsign,
                trip_short_name,
                direction_id,
                block_id,
                shape_id,
                wheelchair_accessible,
                bikes_allowed,
                vehicle_journey_code,
            },
        ))
    }

    /// Point lookup of a route by primary key.
    pub async fn route(&self, route_id: &str) -> Result<Option<Route>, StoreError> {
        type RouteRow = (
            String,
            String,
            Option<String>,
            Option<String>,
            Option<String>,
            i64,
            Option<String>,
            Option<String>,
            Option<String>,
        );
        let row: Option<RouteRow> = sqlx::query_as(
            "SELECT route_id, agency_id, route_short_name, route_long_name, route_desc,
             route_type, route_url, route_color, route_text_color
             FROM routes WHERE route_id = ?",
        )
        .bind(route_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(
            |(
                route_id,
                agency_id,
                route_short_name,
                route_long_name,
                route_desc,
                route_type,
                route_url,
                route_color,
                route_text_color,
            )| Route {
                route_id,
                agency_id,
                route_short_name,
                route_long_name,
                route_desc,
                route_type,
                route_url,
                route_color,
                route_text_color,
            },
        ))
    }

    /// Scan calendar and calendar_dates into the resolution engine's form.
    pub async fn service_calendar(&self) -> Result<ServiceCalendar, StoreError> {
        let rule_rows: Vec<(String, i64, i64, i64, i64, i64, i64, i64, String, String)> =
            sqlx::query_as(
                "SELECT service_id, monday, tuesday, wednesday, thursday, friday, saturday,
                 sunday, start_date, end_date FROM calendar",
            )
            .fetch_all(&self.pool)
            .await?;

        let mut rules = Vec::with_capacity(rule_rows.len());
        for (service_id, mon, tue, wed, thu, fri, sat, sun, start, end) in rule_rows {
            let start_date = parse_service_date(&start).ok_or(StoreError::Corrupt {
                table: "calendar",
                column: "start_date",
                value: start.clone(),
            })?;
            let end_date = parse_service_date(&end).ok_or(StoreError::Corrupt {
                table: "calendar",
                column: "end_date",
                value: end.clone(),
            })?;
            rules.push(CalendarRule {
                service_id,
                days: [
                    mon != 0,
                    tue != 0,
                    wed != 0,
                    thu != 0,
                    fri != 0,
                    sat != 0,
                    sun != 0,
                ],
                start_date,
                end_date,
            });
        }

        let exception_rows: Vec<(String, String, i64)> =
            sqlx::query_as("SELECT service_id, date, exception_type FROM calendar_dates")
                .fetch_all(&self.pool)
                .await?;

        let mut exceptions = Vec::with_capacity(exception_rows.len());
        for (service_id, date, code) in exception_rows {
            let date = parse_service_date(&date).ok_or(StoreError::Corrupt {
                table: "calendar_dates",
                column: "date",
                value: date.clone(),
            })?;
            let kind = ExceptionKind::from_code(code).ok_or(StoreError::Corrupt {
                table: "calendar_dates",
                column: "exception_type",
                value: code.to_string(),
            })?;
            exceptions.push(CalendarException {
                service_id,
                date,
                kind,
            });
        }

        Ok(ServiceCalendar::new(rules, exceptions))
    }

    /// Define a named view, replacing any previous definition of that name.
    pub async fn create_view(
        tx: &mut Transaction<'_, Sqlite>,
        name: &str,
        select_sql: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(&format!("DROP VIEW IF EXISTS \"{name}\""))
            .execute(&mut **tx)
            .await?;
        sqlx::query(&format!("CREATE VIEW \"{name}\" AS {select_sql}"))
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Close the pool, keeping the store file on disk.
    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Close the pool and delete the store file. Used when a run fails
    /// after the store was created, so no partial store is left queryable.
    pub async fn destroy(self) -> Result<(), StoreError> {
        self.pool.close().await;
        std::fs::remove_file(&self.path)?;
        // Journal siblings may exist depending on the journal mode.
        let _ = std::fs::remove_file(format!("{}-wal", self.path.display()));
        let _ = std::fs::remove_file(format!("{}-shm", self.path.display()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sqlx::Row;

    use crate::gtfs::records::{Agency, ShapePoint, Stop, StopTime};

    fn run_timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 7, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn agency(id: &str) -> Agency {
        Agency {
            agency_id: id.to_string(),
            agency_name: Some("East Anglia Buses".into()),
            agency_url: None,
            agency_timezone: Some("Europe/London".into()),
            agency_lang: None,
            agency_phone: None,
            agency_fare_url: None,
            agency_noc: None,
        }
    }

    fn sample_bundle() -> Bundle {
        Bundle {
            agencies: vec![agency("A1")],
            stops: vec![Stop {
                stop_id: "S1".into(),
                stop_code: None,
                stop_name: Some("High Street".into()),
                stop_desc: None,
                stop_lat: Some("52.2053".into()),
                stop_lon: Some("0.1218".into()),
                zone_id: None,
                stop_url: None,
                location_type: None,
                parent_station: None,
                stop_timezone: None,
                wheelchair_boarding: None,
                platform_code: None,
            }],
            routes: vec![Route {
                route_id: "R1".into(),
                agency_id: "A1".into(),
                route_short_name: Some("10".into()),
                route_long_name: None,
                route_desc: None,
                route_type: 3,
                route_url: None,
                route_color: None,
                route_text_color: None,
            }],
            trips: vec![Trip {
                route_id: "R1".into(),
                service_id: "WD".into(),
                trip_id: "T1".into(),
                trip_headsign: Some("City Centre".into()),
                trip_short_name: None,
                direction_id: Some(0),
                block_id: None,
                shape_id: None,
                wheelchair_accessible: None,
                bikes_allowed: None,
                vehicle_journey_code: None,
            }],
            stop_times: vec![StopTime {
                trip_id: "T1".into(),
                arrival_time: Some("08:00:00".into()),
                departure_time: Some("08:00:00".into()),
                stop_id: "S1".into(),
                stop_sequence: 1,
                stop_headsign: None,
                pickup_type: None,
                drop_off_type: None,
                shape_dist_traveled: None,
                timepoint: None,
            }],
            calendar: vec![CalendarRule {
                service_id: "WD".into(),
                days: [true, true, true, true, true, false, false],
                start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            }],
            calendar_dates: vec![CalendarException {
                service_id: "WD".into(),
                date: NaiveDate::from_ymd_opt(2024, 7, 4).unwrap(),
                kind: ExceptionKind::Removed,
            }],
            shapes: vec![ShapePoint {
                shape_id: "SH1".into(),
                shape_pt_lat: "52.2053".into(),
                shape_pt_lon: "0.1218".into(),
                shape_pt_sequence: 1,
                shape_dist_traveled: None,
            }],
            feed_info: None,
        }
    }

    #[tokio::test]
    async fn create_names_store_from_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::create(dir.path(), run_timestamp()).await.unwrap();
        assert_eq!(store.name(), "gtfs_data_20240701_120000");
        assert!(store.path().ends_with("gtfs_data_20240701_120000.db"));
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn load_then_point_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::create(dir.path(), run_timestamp()).await.unwrap();
        store.load_bundle(&sample_bundle()).await.unwrap();

        let trip = store.trip("T1").await.unwrap().unwrap();
        assert_eq!(trip.route_id, "R1");
        assert_eq!(trip.service_id, "WD");
        assert_eq!(trip.trip_headsign.as_deref(), Some("City Centre"));

        let route = store.route("R1").await.unwrap().unwrap();
        assert_eq!(route.agency_id, "A1");
        assert_eq!(route.route_type, 3);

        assert!(store.trip("NOPE").await.unwrap().is_none());
        assert!(store.route("NOPE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn load_is_all_or_nothing_on_duplicate_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::create(dir.path(), run_timestamp()).await.unwrap();

        // Constructed directly, so bundle validation never saw the
        // duplicate; the store's primary key is the backstop.
        let mut bundle = sample_bundle();
        bundle.agencies.push(agency("A1"));

        assert!(store.load_bundle(&bundle).await.is_err());

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM agency")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM trips")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn service_calendar_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::create(dir.path(), run_timestamp()).await.unwrap();
        store.load_bundle(&sample_bundle()).await.unwrap();

        let calendar = store.service_calendar().await.unwrap();
        assert!(calendar.is_active("WD", NaiveDate::from_ymd_opt(2024, 7, 3).unwrap()));
        assert!(!calendar.is_active("WD", NaiveDate::from_ymd_opt(2024, 7, 4).unwrap()));
        assert!(!calendar.is_active("WD", NaiveDate::from_ymd_opt(2024, 7, 6).unwrap()));
    }

    #[tokio::test]
    async fn create_view_replaces_existing_definition() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::create(dir.path(), run_timestamp()).await.unwrap();

        let mut tx = store.pool().begin().await.unwrap();
        Store::create_view(&mut tx, "v_test", "SELECT 1 AS n").await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.pool().begin().await.unwrap();
        Store::create_view(&mut tx, "v_test", "SELECT 2 AS n").await.unwrap();
        tx.commit().await.unwrap();

        let row = sqlx::query("SELECT n FROM v_test")
            .fetch_one(store.pool())
            .await
            .unwrap();
        let n: i64 = row.get("n");
        assert_eq!(n, 2);
    }

    #[tokio::test]
    async fn destroy_removes_store_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::create(dir.path(), run_timestamp()).await.unwrap();
        let path = store.path().to_path_buf();
        assert!(path.exists());

        store.destroy().await.unwrap();
        assert!(!path.exists());
    }
}
