use chrono::NaiveDate;

/// A transit agency (from agency.txt).
#[derive(Debug, Clone)]
pub struct Agency {
    pub agency_id: String,
    pub agency_name: Option<String>,
    pub agency_url: Option<String>,
    pub agency_timezone: Option<String>,
    pub agency_lang: Option<String>,
    pub agency_phone: Option<String>,
    pub agency_fare_url: Option<String>,
    /// UK national operator code, present in DfT bundles.
    pub agency_noc: Option<String>,
}

/// A stop or station (from stops.txt).
///
/// Coordinates are kept as the feed's decimal text; the store persists them
/// verbatim and nothing in the resolution core does arithmetic on them.
#[derive(Debug, Clone)]
pub struct Stop {
    pub stop_id: String,
    pub stop_code: Option<String>,
    pub stop_name: Option<String>,
    pub stop_desc: Option<String>,
    pub stop_lat: Option<String>,
    pub stop_lon: Option<String>,
    pub zone_id: Option<String>,
    pub stop_url: Option<String>,
    pub location_type: Option<i64>,
    /// Weak self-reference; a parent station may be absent from the feed.
    pub parent_station: Option<String>,
    pub stop_timezone: Option<String>,
    pub wheelchair_boarding: Option<i64>,
    pub platform_code: Option<String>,
}

/// A route (from routes.txt).
#[derive(Debug, Clone)]
pub struct Route {
    pub route_id: String,
    pub agency_id: String,
    pub route_short_name: Option<String>,
    pub route_long_name: Option<String>,
    pub route_desc: Option<String>,
    pub route_type: i64,
    pub route_url: Option<String>,
    pub route_color: Option<String>,
    pub route_text_color: Option<String>,
}

/// A trip (from trips.txt).
///
/// `service_id` is a logical reference into the calendar/exception space,
/// not a foreign key into a single table: a service may be defined by a
/// weekly rule, by exceptions only, or by both.
#[derive(Debug, Clone)]
pub struct Trip {
    pub route_id: String,
    pub service_id: String,
    pub trip_id: String,
    pub trip_headsign: Option<String>,
    pub trip_short_name: Option<String>,
    pub direction_id: Option<i64>,
    pub block_id: Option<String>,
    pub shape_id: Option<String>,
    pub wheelchair_accessible: Option<i64>,
    pub bikes_allowed: Option<i64>,
    pub vehicle_journey_code: Option<String>,
}

/// One scheduled stop within a trip (from stop_times.txt).
///
/// Keyed by (trip_id, stop_sequence). Times are the feed's HH:MM:SS
/// time-of-day text and may exceed 24:00:00 for trips crossing midnight.
#[derive(Debug, Clone)]
pub struct StopTime {
    pub trip_id: String,
    pub arrival_time: Option<String>,
    pub departure_time: Option<String>,
    pub stop_id: String,
    pub stop_sequence: i64,
    pub stop_headsign: Option<String>,
    pub pickup_type: Option<i64>,
    pub drop_off_type: Option<i64>,
    pub shape_dist_traveled: Option<f64>,
    pub timepoint: Option<i64>,
}

/// A recurring weekly service pattern (from calendar.txt).
#[derive(Debug, Clone)]
pub struct CalendarRule {
    pub service_id: String,
    /// Day-of-week flags, Monday first.
    pub days: [bool; 7],
    /// Inclusive.
    pub start_date: NaiveDate,
    /// Inclusive.
    pub end_date: NaiveDate,
}

/// Per-date override of a weekly pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionKind {
    Added,
    Removed,
}

impl ExceptionKind {
    /// GTFS exception_type codes: 1 = added, 2 = removed.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(ExceptionKind::Added),
            2 => Some(ExceptionKind::Removed),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            ExceptionKind::Added => 1,
            ExceptionKind::Removed => 2,
        }
    }
}

/// A service exception (from calendar_dates.txt).
///
/// May reference a service id that has no weekly rule at all; such
/// additive-only services run exactly on their Added dates.
#[derive(Debug, Clone)]
pub struct CalendarException {
    pub service_id: String,
    pub date: NaiveDate,
    pub kind: ExceptionKind,
}

/// One point of a shape polyline (from shapes.txt).
///
/// File order is traversal order and must be preserved end to end.
#[derive(Debug, Clone)]
pub struct ShapePoint {
    pub shape_id: String,
    pub shape_pt_lat: String,
    pub shape_pt_lon: String,
    pub shape_pt_sequence: i64,
    pub shape_dist_traveled: Option<String>,
}

/// Feed metadata (from feed_info.txt). At most one record per bundle.
#[derive(Debug, Clone)]
pub struct FeedInfo {
    pub feed_publisher_name: Option<String>,
    pub feed_publisher_url: Option<String>,
    pub feed_lang: Option<String>,
    pub feed_start_date: Option<String>,
    pub feed_end_date: Option<String>,
    pub feed_version: Option<String>,
}

/// Parse a GTFS service date "YYYYMMDD" to a NaiveDate.
pub fn parse_service_date(s: &str) -> Option<NaiveDate> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = s[0..4].parse().ok()?;
    let month: u32 = s[4..6].parse().ok()?;
    let day: u32 = s[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Format a date in the GTFS "YYYYMMDD" form used by the store and view names.
pub fn format_service_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}
