use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while reading or validating a schedule bundle.
///
/// Row numbers are 1-based data rows (the header line is not counted), so
/// they can be checked against the source file with a text editor.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("CSV error in {file}: {source}")]
    Csv {
        file: &'static str,
        source: csv::Error,
    },
    #[error("Bundle is missing required file {0}")]
    MissingFile(&'static str),
    #[error("{file} is missing required column {column}")]
    MissingColumn {
        file: &'static str,
        column: &'static str,
    },
    #[error("{file} row {row}: missing value for required column {column}")]
    MissingValue {
        file: &'static str,
        row: usize,
        column: &'static str,
    },
    #[error("{file} row {row}: malformed value {value:?} in column {column}")]
    MalformedValue {
        file: &'static str,
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("{file} row {row}: duplicate key {value:?} in column {column}")]
    DuplicateKey {
        file: &'static str,
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("{file} row {row}: {column} {value:?} does not reference an existing {target} row")]
    DanglingReference {
        file: &'static str,
        row: usize,
        column: &'static str,
        value: String,
        target: &'static str,
    },
    #[error(
        "stop_times.txt row {row}: stop_sequence {sequence} for trip {trip_id:?} is not strictly increasing"
    )]
    StopSequenceOrder {
        row: usize,
        trip_id: String,
        sequence: i64,
    },
    #[error("calendar_dates.txt row {row}: duplicate exception for service {service_id:?} on {date}")]
    DuplicateException {
        row: usize,
        service_id: String,
        date: NaiveDate,
    },
    #[error("feed_info.txt row {row}: more than one feed_info record")]
    MultipleFeedInfo { row: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_missing_file() {
        let err = BundleError::MissingFile("stop_times.txt");
        assert_eq!(err.to_string(), "Bundle is missing required file stop_times.txt");
    }

    #[test]
    fn error_display_names_file_row_and_column() {
        let err = BundleError::MalformedValue {
            file: "routes.txt",
            row: 7,
            column: "route_type",
            value: "tram".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("routes.txt"));
        assert!(msg.contains("row 7"));
        assert!(msg.contains("route_type"));
        assert!(msg.contains("tram"));
    }

    #[test]
    fn error_display_duplicate_exception() {
        let err = BundleError::DuplicateException {
            row: 3,
            service_id: "WD".into(),
            date: NaiveDate::from_ymd_opt(2024, 7, 4).unwrap(),
        };
        let msg = err.to_string();
        assert!(msg.contains("WD"));
        assert!(msg.contains("2024-07-04"));
    }

    #[test]
    fn error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such bundle");
        let err: BundleError = io_err.into();
        assert!(err.to_string().contains("no such bundle"));
        assert!(matches!(err, BundleError::Io(_)));
    }
}
