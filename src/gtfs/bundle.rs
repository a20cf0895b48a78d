use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::NaiveDate;
use tracing::info;

use super::error::BundleError;
use super::records::{
    Agency, CalendarException, CalendarRule, ExceptionKind, FeedInfo, Route, ShapePoint, Stop,
    StopTime, Trip, parse_service_date,
};

/// Table files every bundle must contain.
const REQUIRED_FILES: [&str; 8] = [
    "agency.txt",
    "stops.txt",
    "routes.txt",
    "trips.txt",
    "stop_times.txt",
    "calendar.txt",
    "calendar_dates.txt",
    "shapes.txt",
];

/// Table files a bundle may contain.
const OPTIONAL_FILES: [&str; 1] = ["feed_info.txt"];

/// The fully parsed and validated content of one schedule bundle.
///
/// Row order matches file order; for shapes that order is the traversal
/// order of each polyline and is preserved through to the store.
#[derive(Debug)]
pub struct Bundle {
    pub agencies: Vec<Agency>,
    pub stops: Vec<Stop>,
    pub routes: Vec<Route>,
    pub trips: Vec<Trip>,
    pub stop_times: Vec<StopTime>,
    pub calendar: Vec<CalendarRule>,
    pub calendar_dates: Vec<CalendarException>,
    pub shapes: Vec<ShapePoint>,
    pub feed_info: Option<FeedInfo>,
}

/// Read a bundle zip into typed records (blocking — call on spawn_blocking).
///
/// The archive's tables are staged into a scratch directory that is removed
/// when this function returns, whether it succeeds or fails. Any parse or
/// validation failure aborts the whole read; no partial bundle is returned.
pub fn read_bundle(zip_path: &Path) -> Result<Bundle, BundleError> {
    let file = std::fs::File::open(zip_path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    let scratch = tempfile::TempDir::new()?;
    extract_tables(&mut archive, scratch.path())?;
    let dir = scratch.path();

    let agencies = parse_agencies(dir)?;
    info!(count = agencies.len(), "Parsed agency records");

    let stops = parse_stops(dir)?;
    info!(count = stops.len(), "Parsed stop records");

    let routes = parse_routes(dir)?;
    info!(count = routes.len(), "Parsed route records");

    let trips = parse_trips(dir)?;
    info!(count = trips.len(), "Parsed trip records");

    let stop_times = parse_stop_times(dir)?;
    info!(count = stop_times.len(), "Parsed stop_time records");

    let calendar = parse_calendar(dir)?;
    info!(count = calendar.len(), "Parsed calendar rules");

    let calendar_dates = parse_calendar_dates(dir)?;
    info!(count = calendar_dates.len(), "Parsed calendar exceptions");

    let shapes = parse_shapes(dir)?;
    info!(count = shapes.len(), "Parsed shape points");

    let feed_info = parse_feed_info(dir)?;

    let bundle = Bundle {
        agencies,
        stops,
        routes,
        trips,
        stop_times,
        calendar,
        calendar_dates,
        shapes,
        feed_info,
    };
    validate(&bundle)?;
    Ok(bundle)
}

/// Stage the known table files out of the archive, then check that every
/// required file made it.
fn extract_tables(
    archive: &mut zip::ZipArchive<std::fs::File>,
    scratch: &Path,
) -> Result<(), BundleError> {
    for name in REQUIRED_FILES.iter().chain(OPTIONAL_FILES.iter()) {
        let mut entry = match archive.by_name(name) {
            Ok(entry) => entry,
            Err(zip::result::ZipError::FileNotFound) => continue,
            Err(e) => return Err(e.into()),
        };
        let mut out = std::fs::File::create(scratch.join(name))?;
        std::io::copy(&mut entry, &mut out)?;
    }
    for name in REQUIRED_FILES {
        if !scratch.join(name).exists() {
            return Err(BundleError::MissingFile(name));
        }
    }
    Ok(())
}

// --- Field helpers ---

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() { None } else { Some(s.to_string()) }
}

fn open_table(dir: &Path, file: &'static str) -> Result<csv::Reader<std::fs::File>, BundleError> {
    let f = std::fs::File::open(dir.join(file))?;
    Ok(csv::Reader::from_reader(f))
}

fn headers(
    rdr: &mut csv::Reader<std::fs::File>,
    file: &'static str,
) -> Result<csv::StringRecord, BundleError> {
    rdr.headers()
        .map(|h| h.clone())
        .map_err(|e| BundleError::Csv { file, source: e })
}

fn require_column(
    headers: &csv::StringRecord,
    file: &'static str,
    column: &'static str,
) -> Result<usize, BundleError> {
    headers
        .iter()
        .position(|h| h == column)
        .ok_or(BundleError::MissingColumn { file, column })
}

fn required_text(
    record: &csv::StringRecord,
    idx: usize,
    file: &'static str,
    row: usize,
    column: &'static str,
) -> Result<String, BundleError> {
    match record.get(idx) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(BundleError::MissingValue { file, row, column }),
    }
}

fn optional_text(record: &csv::StringRecord, idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| record.get(i)).and_then(non_empty)
}

fn required_int(
    record: &csv::StringRecord,
    idx: usize,
    file: &'static str,
    row: usize,
    column: &'static str,
) -> Result<i64, BundleError> {
    let v = required_text(record, idx, file, row, column)?;
    v.parse().map_err(|_| BundleError::MalformedValue {
        file,
        row,
        column,
        value: v,
    })
}

fn optional_int(
    record: &csv::StringRecord,
    idx: Option<usize>,
    file: &'static str,
    row: usize,
    column: &'static str,
) -> Result<Option<i64>, BundleError> {
    match idx.and_then(|i| record.get(i)).and_then(non_empty) {
        None => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| BundleError::MalformedValue {
                file,
                row,
                column,
                value: v,
            }),
    }
}

fn optional_float(
    record: &csv::StringRecord,
    idx: Option<usize>,
    file: &'static str,
    row: usize,
    column: &'static str,
) -> Result<Option<f64>, BundleError> {
    match idx.and_then(|i| record.get(i)).and_then(non_empty) {
        None => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| BundleError::MalformedValue {
                file,
                row,
                column,
                value: v,
            }),
    }
}

fn required_date(
    record: &csv::StringRecord,
    idx: usize,
    file: &'static str,
    row: usize,
    column: &'static str,
) -> Result<NaiveDate, BundleError> {
    let v = required_text(record, idx, file, row, column)?;
    parse_service_date(&v).ok_or(BundleError::MalformedValue {
        file,
        row,
        column,
        value: v,
    })
}

/// Day-of-week flags are exactly "0" or "1" in the source format.
fn required_day_flag(
    record: &csv::StringRecord,
    idx: usize,
    file: &'static str,
    row: usize,
    column: &'static str,
) -> Result<bool, BundleError> {
    let v = required_text(record, idx, file, row, column)?;
    match v.as_str() {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(BundleError::MalformedValue {
            file,
            row,
            column,
            value: v,
        }),
    }
}

// --- Per-file parsers ---

fn parse_agencies(dir: &Path) -> Result<Vec<Agency>, BundleError> {
    const FILE: &str = "agency.txt";
    let mut rdr = open_table(dir, FILE)?;
    let headers = headers(&mut rdr, FILE)?;

    let idx_id = require_column(&headers, FILE, "agency_id")?;
    let idx_name = headers.iter().position(|h| h == "agency_name");
    let idx_url = headers.iter().position(|h| h == "agency_url");
    let idx_tz = headers.iter().position(|h| h == "agency_timezone");
    let idx_lang = headers.iter().position(|h| h == "agency_lang");
    let idx_phone = headers.iter().position(|h| h == "agency_phone");
    let idx_fare = headers.iter().position(|h| h == "agency_fare_url");
    let idx_noc = headers.iter().position(|h| h == "agency_noc");

    let mut agencies = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let row = i + 1;
        let record = result.map_err(|e| BundleError::Csv { file: FILE, source: e })?;
        agencies.push(Agency {
            agency_id: required_text(&record, idx_id, FILE, row, "agency_id")?,
            agency_name: optional_text(&record, idx_name),
            agency_url: optional_text(&record, idx_url),
            agency_timezone: optional_text(&record, idx_tz),
            agency_lang: optional_text(&record, idx_lang),
            agency_phone: optional_text(&record, idx_phone),
            agency_fare_url: optional_text(&record, idx_fare),
            agency_noc: optional_text(&record, idx_noc),
        });
    }
    Ok(agencies)
}

fn parse_stops(dir: &Path) -> Result<Vec<Stop>, BundleError> {
    const FILE: &str = "stops.txt";
    let mut rdr = open_table(dir, FILE)?;
    let headers = headers(&mut rdr, FILE)?;

    let idx_id = require_column(&headers, FILE, "stop_id")?;
    let idx_code = headers.iter().position(|h| h == "stop_code");
    let idx_name = headers.iter().position(|h| h == "stop_name");
    let idx_desc = headers.iter().position(|h| h == "stop_desc");
    let idx_lat = headers.iter().position(|h| h == "stop_lat");
    let idx_lon = headers.iter().position(|h| h == "stop_lon");
    let idx_zone = headers.iter().position(|h| h == "zone_id");
    let idx_url = headers.iter().position(|h| h == "stop_url");
    let idx_loc = headers.iter().position(|h| h == "location_type");
    let idx_parent = headers.iter().position(|h| h == "parent_station");
    let idx_tz = headers.iter().position(|h| h == "stop_timezone");
    let idx_wheelchair = headers.iter().position(|h| h == "wheelchair_boarding");
    let idx_platform = headers.iter().position(|h| h == "platform_code");

    let mut stops = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let row = i + 1;
        let record = result.map_err(|e| BundleError::Csv { file: FILE, source: e })?;
        stops.push(Stop {
            stop_id: required_text(&record, idx_id, FILE, row, "stop_id")?,
            stop_code: optional_text(&record, idx_code),
            stop_name: optional_text(&record, idx_name),
            stop_desc: optional_text(&record, idx_desc),
            stop_lat: optional_text(&record, idx_lat),
            stop_lon: optional_text(&record, idx_lon),
            zone_id: optional_text(&record, idx_zone),
            stop_url: optional_text(&record, idx_url),
            location_type: optional_int(&record, idx_loc, FILE, row, "location_type")?,
            parent_station: optional_text(&record, idx_parent),
            stop_timezone: optional_text(&record, idx_tz),
            wheelchair_boarding: optional_int(
                &record,
                idx_wheelchair,
                FILE,
                row,
                "wheelchair_boarding",
            )?,
            platform_code: optional_text(&record, idx_platform),
        });
    }
    Ok(stops)
}

fn parse_routes(dir: &Path) -> Result<Vec<Route>, BundleError> {
    const FILE: &str = "routes.txt";
    let mut rdr = open_table(dir, FILE)?;
    let headers = headers(&mut rdr, FILE)?;

    let idx_id = require_column(&headers, FILE, "route_id")?;
    let idx_agency = require_column(&headers, FILE, "agency_id")?;
    let idx_type = require_column(&headers, FILE, "route_type")?;
    let idx_short = headers.iter().position(|h| h == "route_short_name");
    let idx_long = headers.iter().position(|h| h == "route_long_name");
    let idx_desc = headers.iter().position(|h| h == "route_desc");
    let idx_url = headers.iter().position(|h| h == "route_url");
    let idx_color = headers.iter().position(|h| h == "route_color");
    let idx_text_color = headers.iter().position(|h| h == "route_text_color");

    let mut routes = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let row = i + 1;
        let record = result.map_err(|e| BundleError::Csv { file: FILE, source: e })?;
        routes.push(Route {
            route_id: required_text(&record, idx_id, FILE, row, "route_id")?,
            agency_id: required_text(&record, idx_agency, FILE, row, "agency_id")?,
            route_short_name: optional_text(&record, idx_short),
            route_long_name: optional_text(&record, idx_long),
            route_desc: optional_text(&record, idx_desc),
            route_type: required_int(&record, idx_type, FILE, row, "route_type")?,
            route_url: optional_text(&record, idx_url),
            route_color: optional_text(&record, idx_color),
            route_text_color: optional_text(&record, idx_text_color),
        });
    }
    Ok(routes)
}

fn parse_trips(dir: &Path) -> Result<Vec<Trip>, BundleError> {
    const FILE: &str = "trips.txt";
    let mut rdr = open_table(dir, FILE)?;
    let headers = headers(&mut rdr, FILE)?;

    let idx_route = require_column(&headers, FILE, "route_id")?;
    let idx_service = require_column(&headers, FILE, "service_id")?;
    let idx_trip = require_column(&headers, FILE, "trip_id")?;
    let idx_headsign = headers.iter().position(|h| h == "trip_headsign");
    let idx_short = headers.iter().position(|h| h == "trip_short_name");
    let idx_dir = headers.iter().position(|h| h == "direction_id");
    let idx_block = headers.iter().position(|h| h == "block_id");
    let idx_shape = headers.iter().position(|h| h == "shape_id");
    let idx_wheelchair = headers.iter().position(|h| h == "wheelchair_accessible");
    let idx_bikes = headers.iter().position(|h| h == "bikes_allowed");
    let idx_vjc = headers.iter().position(|h| h == "vehicle_journey_code");

    let mut trips = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let row = i + 1;
        let record = result.map_err(|e| BundleError::Csv { file: FILE, source: e })?;
        trips.push(Trip {
            route_id: required_text(&record, idx_route, FILE, row, "route_id")?,
            service_id: required_text(&record, idx_service, FILE, row, "service_id")?,
            trip_id: required_text(&record, idx_trip, FILE, row, "trip_id")?,
            trip_headsign: optional_text(&record, idx_headsign),
            trip_short_name: optional_text(&record, idx_short),
            direction_id: optional_int(&record, idx_dir, FILE, row, "direction_id")?,
            block_id: optional_text(&record, idx_block),
            shape_id: optional_text(&record, idx_shape),
            wheelchair_accessible: optional_int(
                &record,
                idx_wheelchair,
                FILE,
                row,
                "wheelchair_accessible",
            )?,
            bikes_allowed: optional_int(&record, idx_bikes, FILE, row, "bikes_allowed")?,
            vehicle_journey_code: optional_text(&record, idx_vjc),
        });
    }
    Ok(trips)
}

fn parse_stop_times(dir: &Path) -> Result<Vec<StopTime>, BundleError> {
    const FILE: &str = "stop_times.txt";
    let mut rdr = open_table(dir, FILE)?;
    let headers = headers(&mut rdr, FILE)?;

    let idx_trip = require_column(&headers, FILE, "trip_id")?;
    let idx_stop = require_column(&headers, FILE, "stop_id")?;
    let idx_seq = require_column(&headers, FILE, "stop_sequence")?;
    let idx_arr = headers.iter().position(|h| h == "arrival_time");
    let idx_dep = headers.iter().position(|h| h == "departure_time");
    let idx_headsign = headers.iter().position(|h| h == "stop_headsign");
    let idx_pickup = headers.iter().position(|h| h == "pickup_type");
    let idx_dropoff = headers.iter().position(|h| h == "drop_off_type");
    let idx_dist = headers.iter().position(|h| h == "shape_dist_traveled");
    let idx_timepoint = headers.iter().position(|h| h == "timepoint");

    let mut stop_times = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let row = i + 1;
        let record = result.map_err(|e| BundleError::Csv { file: FILE, source: e })?;
        stop_times.push(StopTime {
            trip_id: required_text(&record, idx_trip, FILE, row, "trip_id")?,
            arrival_time: optional_text(&record, idx_arr),
            departure_time: optional_text(&record, idx_dep),
            stop_id: required_text(&record, idx_stop, FILE, row, "stop_id")?,
            stop_sequence: required_int(&record, idx_seq, FILE, row, "stop_sequence")?,
            stop_headsign: optional_text(&record, idx_headsign),
            pickup_type: optional_int(&record, idx_pickup, FILE, row, "pickup_type")?,
            drop_off_type: optional_int(&record, idx_dropoff, FILE, row, "drop_off_type")?,
            shape_dist_traveled: optional_float(&record, idx_dist, FILE, row, "shape_dist_traveled")?,
            timepoint: optional_int(&record, idx_timepoint, FILE, row, "timepoint")?,
        });
    }
    Ok(stop_times)
}

fn parse_calendar(dir: &Path) -> Result<Vec<CalendarRule>, BundleError> {
    const FILE: &str = "calendar.txt";
    const DAY_COLUMNS: [&str; 7] = [
        "monday",
        "tuesday",
        "wednesday",
        "thursday",
        "friday",
        "saturday",
        "sunday",
    ];
    let mut rdr = open_table(dir, FILE)?;
    let headers = headers(&mut rdr, FILE)?;

    let idx_service = require_column(&headers, FILE, "service_id")?;
    let idx_start = require_column(&headers, FILE, "start_date")?;
    let idx_end = require_column(&headers, FILE, "end_date")?;
    let mut idx_days = [0usize; 7];
    for (d, column) in DAY_COLUMNS.iter().enumerate() {
        idx_days[d] = require_column(&headers, FILE, column)?;
    }

    let mut rules = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let row = i + 1;
        let record = result.map_err(|e| BundleError::Csv { file: FILE, source: e })?;
        let mut days = [false; 7];
        for (d, column) in DAY_COLUMNS.iter().enumerate() {
            days[d] = required_day_flag(&record, idx_days[d], FILE, row, column)?;
        }
        rules.push(CalendarRule {
            service_id: required_text(&record, idx_service, FILE, row, "service_id")?,
            days,
            start_date: required_date(&record, idx_start, FILE, row, "start_date")?,
            end_date: required_date(&record, idx_end, FILE, row, "end_date")?,
        });
    }
    Ok(rules)
}

fn parse_calendar_dates(dir: &Path) -> Result<Vec<CalendarException>, BundleError> {
    const FILE: &str = "calendar_dates.txt";
    let mut rdr = open_table(dir, FILE)?;
    let headers = headers(&mut rdr, FILE)?;

    let idx_service = require_column(&headers, FILE, "service_id")?;
    let idx_date = require_column(&headers, FILE, "date")?;
    let idx_type = require_column(&headers, FILE, "exception_type")?;

    let mut exceptions = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let row = i + 1;
        let record = result.map_err(|e| BundleError::Csv { file: FILE, source: e })?;
        let code = required_int(&record, idx_type, FILE, row, "exception_type")?;
        let kind = ExceptionKind::from_code(code).ok_or(BundleError::MalformedValue {
            file: FILE,
            row,
            column: "exception_type",
            value: code.to_string(),
        })?;
        exceptions.push(CalendarException {
            service_id: required_text(&record, idx_service, FILE, row, "service_id")?,
            date: required_date(&record, idx_date, FILE, row, "date")?,
            kind,
        });
    }
    Ok(exceptions)
}

fn parse_shapes(dir: &Path) -> Result<Vec<ShapePoint>, BundleError> {
    const FILE: &str = "shapes.txt";
    let mut rdr = open_table(dir, FILE)?;
    let headers = headers(&mut rdr, FILE)?;

    let idx_id = require_column(&headers, FILE, "shape_id")?;
    let idx_lat = require_column(&headers, FILE, "shape_pt_lat")?;
    let idx_lon = require_column(&headers, FILE, "shape_pt_lon")?;
    let idx_seq = require_column(&headers, FILE, "shape_pt_sequence")?;
    let idx_dist = headers.iter().position(|h| h == "shape_dist_traveled");

    let mut points = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let row = i + 1;
        let record = result.map_err(|e| BundleError::Csv { file: FILE, source: e })?;
        points.push(ShapePoint {
            shape_id: required_text(&record, idx_id, FILE, row, "shape_id")?,
            shape_pt_lat: required_text(&record, idx_lat, FILE, row, "shape_pt_lat")?,
            shape_pt_lon: required_text(&record, idx_lon, FILE, row, "shape_pt_lon")?,
            shape_pt_sequence: required_int(&record, idx_seq, FILE, row, "shape_pt_sequence")?,
            shape_dist_traveled: optional_text(&record, idx_dist),
        });
    }
    Ok(points)
}

fn parse_feed_info(dir: &Path) -> Result<Option<FeedInfo>, BundleError> {
    const FILE: &str = "feed_info.txt";
    if !dir.join(FILE).exists() {
        return Ok(None);
    }
    let mut rdr = open_table(dir, FILE)?;
    let headers = headers(&mut rdr, FILE)?;

    let idx_name = headers.iter().position(|h| h == "feed_publisher_name");
    let idx_url = headers.iter().position(|h| h == "feed_publisher_url");
    let idx_lang = headers.iter().position(|h| h == "feed_lang");
    let idx_start = headers.iter().position(|h| h == "feed_start_date");
    let idx_end = headers.iter().position(|h| h == "feed_end_date");
    let idx_version = headers.iter().position(|h| h == "feed_version");

    let mut feed_info = None;
    for (i, result) in rdr.records().enumerate() {
        let row = i + 1;
        let record = result.map_err(|e| BundleError::Csv { file: FILE, source: e })?;
        if feed_info.is_some() {
            return Err(BundleError::MultipleFeedInfo { row });
        }
        feed_info = Some(FeedInfo {
            feed_publisher_name: optional_text(&record, idx_name),
            feed_publisher_url: optional_text(&record, idx_url),
            feed_lang: optional_text(&record, idx_lang),
            feed_start_date: optional_text(&record, idx_start),
            feed_end_date: optional_text(&record, idx_end),
            feed_version: optional_text(&record, idx_version),
        });
    }
    Ok(feed_info)
}

// --- Cross-table validation ---

/// Enforce key uniqueness, referential consistency, stop ordering, and
/// exception uniqueness before any store exists.
fn validate(bundle: &Bundle) -> Result<(), BundleError> {
    let mut agency_ids = HashSet::new();
    for (i, agency) in bundle.agencies.iter().enumerate() {
        if !agency_ids.insert(agency.agency_id.as_str()) {
            return Err(BundleError::DuplicateKey {
                file: "agency.txt",
                row: i + 1,
                column: "agency_id",
                value: agency.agency_id.clone(),
            });
        }
    }

    let mut stop_ids = HashSet::new();
    for (i, stop) in bundle.stops.iter().enumerate() {
        if !stop_ids.insert(stop.stop_id.as_str()) {
            return Err(BundleError::DuplicateKey {
                file: "stops.txt",
                row: i + 1,
                column: "stop_id",
                value: stop.stop_id.clone(),
            });
        }
    }

    let mut route_ids = HashSet::new();
    for (i, route) in bundle.routes.iter().enumerate() {
        if !route_ids.insert(route.route_id.as_str()) {
            return Err(BundleError::DuplicateKey {
                file: "routes.txt",
                row: i + 1,
                column: "route_id",
                value: route.route_id.clone(),
            });
        }
        if !agency_ids.contains(route.agency_id.as_str()) {
            return Err(BundleError::DanglingReference {
                file: "routes.txt",
                row: i + 1,
                column: "agency_id",
                value: route.agency_id.clone(),
                target: "agency",
            });
        }
    }

    let mut trip_ids = HashSet::new();
    for (i, trip) in bundle.trips.iter().enumerate() {
        if !trip_ids.insert(trip.trip_id.as_str()) {
            return Err(BundleError::DuplicateKey {
                file: "trips.txt",
                row: i + 1,
                column: "trip_id",
                value: trip.trip_id.clone(),
            });
        }
        if !route_ids.contains(trip.route_id.as_str()) {
            return Err(BundleError::DanglingReference {
                file: "trips.txt",
                row: i + 1,
                column: "route_id",
                value: trip.route_id.clone(),
                target: "routes",
            });
        }
    }

    // Sequence numbers must strictly increase within a trip in file order.
    let mut last_sequence: HashMap<&str, i64> = HashMap::new();
    for (i, stop_time) in bundle.stop_times.iter().enumerate() {
        if !trip_ids.contains(stop_time.trip_id.as_str()) {
            return Err(BundleError::DanglingReference {
                file: "stop_times.txt",
                row: i + 1,
                column: "trip_id",
                value: stop_time.trip_id.clone(),
                target: "trips",
            });
        }
        if let Some(last) = last_sequence.get(stop_time.trip_id.as_str()) {
            if stop_time.stop_sequence <= *last {
                return Err(BundleError::StopSequenceOrder {
                    row: i + 1,
                    trip_id: stop_time.trip_id.clone(),
                    sequence: stop_time.stop_sequence,
                });
            }
        }
        last_sequence.insert(stop_time.trip_id.as_str(), stop_time.stop_sequence);
    }

    let mut service_ids = HashSet::new();
    for (i, rule) in bundle.calendar.iter().enumerate() {
        if !service_ids.insert(rule.service_id.as_str()) {
            return Err(BundleError::DuplicateKey {
                file: "calendar.txt",
                row: i + 1,
                column: "service_id",
                value: rule.service_id.clone(),
            });
        }
    }

    // A duplicate (service_id, date) pair would make exception precedence
    // ambiguous; resolution assumes this never happens.
    let mut exception_keys = HashSet::new();
    for (i, exception) in bundle.calendar_dates.iter().enumerate() {
        if !exception_keys.insert((exception.service_id.as_str(), exception.date)) {
            return Err(BundleError::DuplicateException {
                row: i + 1,
                service_id: exception.service_id.clone(),
                date: exception.date,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn fixture_files() -> Vec<(&'static str, String)> {
        vec![
            (
                "agency.txt",
                "agency_id,agency_name,agency_url,agency_timezone\n\
                 A1,East Anglia Buses,https://example.com,Europe/London\n"
                    .into(),
            ),
            (
                "stops.txt",
                "stop_id,stop_name,stop_lat,stop_lon\n\
                 S1,High Street,52.2053,0.1218\n\
                 S2,Station Road,52.1951,0.1313\n"
                    .into(),
            ),
            (
                "routes.txt",
                "route_id,agency_id,route_short_name,route_type\n\
                 R1,A1,10,3\n"
                    .into(),
            ),
            (
                "trips.txt",
                "route_id,service_id,trip_id,trip_headsign\n\
                 R1,WD,T1,City Centre\n\
                 R1,SPECIAL,T2,Depot\n"
                    .into(),
            ),
            (
                "stop_times.txt",
                "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
                 T1,08:00:00,08:00:00,S1,1\n\
                 T1,08:10:00,08:10:00,S2,2\n\
                 T2,09:00:00,09:00:00,S1,1\n"
                    .into(),
            ),
            (
                "calendar.txt",
                "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\n\
                 WD,1,1,1,1,1,0,0,20240101,20241231\n"
                    .into(),
            ),
            (
                "calendar_dates.txt",
                "service_id,date,exception_type\n\
                 WD,20240704,2\n\
                 SPECIAL,20240704,1\n"
                    .into(),
            ),
            (
                "shapes.txt",
                "shape_id,shape_pt_lat,shape_pt_lon,shape_pt_sequence\n\
                 SH1,52.2053,0.1218,1\n\
                 SH1,52.1951,0.1313,2\n"
                    .into(),
            ),
            (
                "feed_info.txt",
                "feed_publisher_name,feed_publisher_url,feed_lang,feed_version\n\
                 Example Transit,https://example.com,en,1.0\n"
                    .into(),
            ),
        ]
    }

    fn write_zip(dir: &Path, files: &[(&str, String)]) -> PathBuf {
        let path = dir.join("bundle.zip");
        let file = std::fs::File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for (name, content) in files {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
        path
    }

    fn with_file(mut files: Vec<(&'static str, String)>, name: &'static str, content: &str) -> Vec<(&'static str, String)> {
        files.retain(|(n, _)| *n != name);
        files.push((name, content.to_string()));
        files
    }

    fn without_file(mut files: Vec<(&'static str, String)>, name: &str) -> Vec<(&'static str, String)> {
        files.retain(|(n, _)| *n != name);
        files
    }

    #[test]
    fn reads_complete_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_zip(dir.path(), &fixture_files());

        let bundle = read_bundle(&path).unwrap();
        assert_eq!(bundle.agencies.len(), 1);
        assert_eq!(bundle.stops.len(), 2);
        assert_eq!(bundle.routes.len(), 1);
        assert_eq!(bundle.trips.len(), 2);
        assert_eq!(bundle.stop_times.len(), 3);
        assert_eq!(bundle.calendar.len(), 1);
        assert_eq!(bundle.calendar_dates.len(), 2);
        assert_eq!(bundle.shapes.len(), 2);
        assert!(bundle.feed_info.is_some());

        let rule = &bundle.calendar[0];
        assert_eq!(rule.service_id, "WD");
        assert_eq!(rule.days, [true, true, true, true, true, false, false]);

        // Shape points keep file order.
        assert_eq!(bundle.shapes[0].shape_pt_sequence, 1);
        assert_eq!(bundle.shapes[1].shape_pt_sequence, 2);
    }

    #[test]
    fn feed_info_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_zip(dir.path(), &without_file(fixture_files(), "feed_info.txt"));

        let bundle = read_bundle(&path).unwrap();
        assert!(bundle.feed_info.is_none());
    }

    #[test]
    fn missing_stop_times_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_zip(dir.path(), &without_file(fixture_files(), "stop_times.txt"));

        let err = read_bundle(&path).unwrap_err();
        assert!(matches!(err, BundleError::MissingFile("stop_times.txt")));
    }

    #[test]
    fn missing_required_column_fails() {
        let files = with_file(
            fixture_files(),
            "routes.txt",
            "route_id,agency_id,route_short_name\nR1,A1,10\n",
        );
        let dir = tempfile::tempdir().unwrap();
        let path = write_zip(dir.path(), &files);

        let err = read_bundle(&path).unwrap_err();
        assert!(matches!(
            err,
            BundleError::MissingColumn {
                file: "routes.txt",
                column: "route_type"
            }
        ));
    }

    #[test]
    fn malformed_route_type_names_row_and_column() {
        let files = with_file(
            fixture_files(),
            "routes.txt",
            "route_id,agency_id,route_short_name,route_type\nR1,A1,10,tram\n",
        );
        let dir = tempfile::tempdir().unwrap();
        let path = write_zip(dir.path(), &files);

        let err = read_bundle(&path).unwrap_err();
        match err {
            BundleError::MalformedValue {
                file,
                row,
                column,
                value,
            } => {
                assert_eq!(file, "routes.txt");
                assert_eq!(row, 1);
                assert_eq!(column, "route_type");
                assert_eq!(value, "tram");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicate_trip_id_rejected() {
        let files = with_file(
            fixture_files(),
            "trips.txt",
            "route_id,service_id,trip_id\nR1,WD,T1\nR1,WD,T1\n",
        );
        let dir = tempfile::tempdir().unwrap();
        // T2's stop_times would now dangle, so rebuild them for T1 only.
        let files = with_file(
            files,
            "stop_times.txt",
            "trip_id,arrival_time,departure_time,stop_id,stop_sequence\nT1,08:00:00,08:00:00,S1,1\n",
        );
        let path = write_zip(dir.path(), &files);

        let err = read_bundle(&path).unwrap_err();
        match err {
            BundleError::DuplicateKey {
                file, row, value, ..
            } => {
                assert_eq!(file, "trips.txt");
                assert_eq!(row, 2);
                assert_eq!(value, "T1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn dangling_agency_reference_rejected() {
        let files = with_file(
            fixture_files(),
            "routes.txt",
            "route_id,agency_id,route_type\nR1,NOPE,3\n",
        );
        let dir = tempfile::tempdir().unwrap();
        let path = write_zip(dir.path(), &files);

        let err = read_bundle(&path).unwrap_err();
        match err {
            BundleError::DanglingReference {
                file,
                column,
                value,
                target,
                ..
            } => {
                assert_eq!(file, "routes.txt");
                assert_eq!(column, "agency_id");
                assert_eq!(value, "NOPE");
                assert_eq!(target, "agency");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicate_exception_pair_rejected() {
        let files = with_file(
            fixture_files(),
            "calendar_dates.txt",
            "service_id,date,exception_type\nWD,20240704,2\nWD,20240704,1\n",
        );
        let dir = tempfile::tempdir().unwrap();
        let path = write_zip(dir.path(), &files);

        let err = read_bundle(&path).unwrap_err();
        match err {
            BundleError::DuplicateException {
                row,
                service_id,
                date,
            } => {
                assert_eq!(row, 2);
                assert_eq!(service_id, "WD");
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 7, 4).unwrap());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_exception_type_rejected() {
        let files = with_file(
            fixture_files(),
            "calendar_dates.txt",
            "service_id,date,exception_type\nWD,20240704,3\n",
        );
        let dir = tempfile::tempdir().unwrap();
        let path = write_zip(dir.path(), &files);

        let err = read_bundle(&path).unwrap_err();
        assert!(matches!(
            err,
            BundleError::MalformedValue {
                file: "calendar_dates.txt",
                column: "exception_type",
                ..
            }
        ));
    }

    #[test]
    fn out_of_order_stop_sequence_rejected() {
        let files = with_file(
            fixture_files(),
            "stop_times.txt",
            "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
             T1,08:00:00,08:00:00,S1,2\n\
             T1,08:10:00,08:10:00,S2,2\n",
        );
        let dir = tempfile::tempdir().unwrap();
        let path = write_zip(dir.path(), &files);

        let err = read_bundle(&path).unwrap_err();
        match err {
            BundleError::StopSequenceOrder {
                row,
                trip_id,
                sequence,
            } => {
                assert_eq!(row, 2);
                assert_eq!(trip_id, "T1");
                assert_eq!(sequence, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn second_feed_info_record_rejected() {
        let files = with_file(
            fixture_files(),
            "feed_info.txt",
            "feed_publisher_name,feed_version\nExample Transit,1.0\nExample Transit,2.0\n",
        );
        let dir = tempfile::tempdir().unwrap();
        let path = write_zip(dir.path(), &files);

        let err = read_bundle(&path).unwrap_err();
        assert!(matches!(err, BundleError::MultipleFeedInfo { row: 2 }));
    }

    #[test]
    fn missing_required_value_names_row() {
        let files = with_file(
            fixture_files(),
            "trips.txt",
            "route_id,service_id,trip_id\nR1,,T1\n",
        );
        let dir = tempfile::tempdir().unwrap();
        let path = write_zip(dir.path(), &files);

        let err = read_bundle(&path).unwrap_err();
        assert!(matches!(
            err,
            BundleError::MissingValue {
                file: "trips.txt",
                row: 1,
                column: "service_id"
            }
        ));
    }
}
