use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Run configuration, loaded from a YAML file in the working directory.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Path to the schedule bundle archive to ingest.
    pub bundle_path: PathBuf,
    /// Directory the store database and schema snapshot are written to.
    #[serde(default = "Config::default_output_dir")]
    pub output_dir: PathBuf,
    /// Number of days to materialize, starting from the processing date
    /// (default: 43, today plus 42).
    #[serde(default = "Config::default_window_days")]
    pub window_days: u32,
    /// Maximum sample rows per table/view in the schema snapshot (default: 5).
    #[serde(default = "Config::default_sample_rows")]
    pub sample_rows: u32,
}

impl Config {
    fn default_output_dir() -> PathBuf {
        PathBuf::from("data")
    }
    fn default_window_days() -> u32 {
        43
    }
    fn default_sample_rows() -> u32 {
        5
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::ReadError(e.to_string()))?;

        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bundle_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("bundle_path must not be empty".into()));
        }
        if self.window_days == 0 {
            return Err(ConfigError::Invalid("window_days must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse config: {0}")]
    ParseError(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn loads_full_config() {
        let (_dir, path) = write_config(
            "bundle_path: gtfs_files/east_anglia.zip\n\
             output_dir: out\n\
             window_days: 14\n\
             sample_rows: 3\n",
        );
        let config = Config::load(&path).unwrap();
        assert_eq!(config.bundle_path, PathBuf::from("gtfs_files/east_anglia.zip"));
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.window_days, 14);
        assert_eq!(config.sample_rows, 3);
        config.validate().unwrap();
    }

    #[test]
    fn defaults_apply_when_omitted() {
        let (_dir, path) = write_config("bundle_path: bundle.zip\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("data"));
        assert_eq!(config.window_days, 43);
        assert_eq!(config.sample_rows, 5);
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = Config::load("does/not/exist.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::ReadError(_)));
    }

    #[test]
    fn malformed_yaml_is_parse_error() {
        let (_dir, path) = write_config("bundle_path: [not, a, path\n");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn zero_window_rejected() {
        let (_dir, path) = write_config("bundle_path: bundle.zip\nwindow_days: 0\n");
        let config = Config::load(&path).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
