use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

use crate::calendar::ServiceCalendar;
use crate::gtfs::records::format_service_date;
use crate::store::{Store, StoreError};

#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// View name for one materialized date.
pub fn view_name(date: NaiveDate) -> String {
    format!("upcoming_trips_view_{}", format_service_date(date))
}

/// The contiguous window of dates starting at `start`, inclusive.
///
/// Computed once from the run's captured processing date; materialization
/// never re-samples the clock.
pub fn window_dates(start: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (0..i64::from(days))
        .map(|offset| start + chrono::Duration::days(offset))
        .collect()
}

fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// The stored query for one date's view: every (agency, route, trip)
/// triple whose service operates on that date, in a fixed order so
/// re-materialization reproduces the row set exactly.
fn view_select(date: NaiveDate, active_services: &[&str]) -> String {
    let service_date = format_service_date(date);
    let filter = if active_services.is_empty() {
        "0".to_string()
    } else {
        let ids: Vec<String> = active_services.iter().map(|s| quote_literal(s)).collect();
        format!("t.service_id IN ({})", ids.join(", "))
    };
    format!(
        "SELECT '{service_date}' AS service_date, a.agency_id, r.route_id, t.trip_id \
         FROM trips t \
         JOIN routes r ON t.route_id = r.route_id \
         JOIN agency a ON r.agency_id = a.agency_id \
         WHERE {filter} \
         ORDER BY a.agency_id, r.route_id, t.trip_id"
    )
}

/// Define one view per window date, resolving each date's active services
/// through the calendar engine.
///
/// All definitions run inside a single transaction: either the complete
/// window of views exists afterwards, or none of the new definitions do.
/// Returns per-view row counts for the run summary.
pub async fn materialize(
    store: &Store,
    calendar: &ServiceCalendar,
    dates: &[NaiveDate],
) -> Result<Vec<(String, i64)>, MaterializeError> {
    let mut tx = store.pool().begin().await?;
    let mut names = Vec::with_capacity(dates.len());
    for &date in dates {
        let active = calendar.active_services(date);
        let name = view_name(date);
        Store::create_view(&mut tx, &name, &view_select(date, &active)).await?;
        names.push(name);
    }
    tx.commit().await?;

    let mut counts = Vec::with_capacity(names.len());
    for name in names {
        let (rows,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM \"{name}\""))
            .fetch_one(store.pool())
            .await?;
        info!(view = %name, rows, "Materialized service-date view");
        counts.push((name, rows));
    }
    Ok(counts)
}
