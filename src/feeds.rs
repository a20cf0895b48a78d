//! Interfaces to the real-time side of the system.
//!
//! The ingestion core never calls these. They pin down the contracts the
//! surrounding tooling implements — fetching raw vehicle-position messages
//! and rendering field-presence reports — using the same trip/route
//! vocabulary as the store, so results can be cross-referenced against
//! materialized views.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Feed endpoint returned status {0}")]
    Status(u16),
}

/// Supplies raw binary feed messages from a vehicle-position endpoint.
pub trait PositionFeed {
    /// Fetch the messages observed after `start_time_after`, authorized by
    /// `api_key`. Decoding the wire format is the caller's concern.
    fn fetch_since(
        &self,
        start_time_after: DateTime<Utc>,
        api_key: &str,
    ) -> Result<Vec<u8>, FeedError>;
}

/// Presence counts for one message field across a batch of positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldPresence {
    pub field: String,
    pub present: u64,
    pub absent: u64,
    /// Distribution of values for enumerated fields; empty otherwise.
    pub unique_values: BTreeMap<String, u64>,
}

/// Field-presence summary of one fetched batch, in field order.
#[derive(Debug, Clone, Serialize)]
pub struct PresenceReport {
    pub fields: Vec<FieldPresence>,
}

/// Renders a presence report into a standalone document (HTML, charts).
/// Consumes summaries; never feeds back into resolution.
pub trait ReportRenderer {
    fn render(&self, report: &PresenceReport) -> String;
}
