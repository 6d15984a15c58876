//! Storage configuration loaded from environment variables.
//!
//! Every setting has a default so the store works with zero configuration;
//! the only thing that changes without `COUNTDOWN_SHARED_DIR` is that the
//! shared container is treated as unavailable.

use std::path::PathBuf;

use countdown_shared::constants::PROJECTION_LIMIT;
use countdown_shared::model::parse_time_zone;
use directories::ProjectDirs;

use crate::error::{Result, StoreError};

/// Storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Process-local data directory (database and fallback projection).
    /// Env: `COUNTDOWN_DATA_DIR`
    /// Default: the platform data directory.
    pub data_dir: Option<PathBuf>,

    /// Directory shared with companion processes.
    /// Env: `COUNTDOWN_SHARED_DIR`
    /// Default: unset (shared container unavailable).
    pub shared_dir: Option<PathBuf>,

    /// Number of countdowns written to the projection (1..=5).
    /// Env: `COUNTDOWN_PROJECTION_LIMIT`
    /// Default: `5`
    pub projection_limit: usize,

    /// IANA zone used for the companion placeholder.
    /// Env: `TZ`
    /// Default: `UTC`
    pub device_time_zone: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            shared_dir: None,
            projection_limit: PROJECTION_LIMIT,
            device_time_zone: "UTC".to_string(),
        }
    }
}

impl StorageConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("COUNTDOWN_DATA_DIR") {
            if !dir.is_empty() {
                config.data_dir = Some(PathBuf::from(dir));
            }
        }

        if let Ok(dir) = std::env::var("COUNTDOWN_SHARED_DIR") {
            if !dir.is_empty() {
                config.shared_dir = Some(PathBuf::from(dir));
            }
        }

        if let Ok(val) = std::env::var("COUNTDOWN_PROJECTION_LIMIT") {
            match val.parse::<usize>() {
                Ok(n) => config.projection_limit = clamp_limit(n),
                Err(_) => {
                    tracing::warn!(
                        value = %val,
                        "Invalid COUNTDOWN_PROJECTION_LIMIT, using default"
                    );
                }
            }
        }

        if let Ok(tz) = std::env::var("TZ") {
            let tz = tz.trim_start_matches(':');
            if parse_time_zone(tz).is_some() {
                config.device_time_zone = tz.to_string();
            } else {
                tracing::warn!(value = %tz, "Unrecognised TZ, using UTC");
            }
        }

        config
    }

    /// The process-local data directory, created if missing.
    ///
    /// Without an explicit `data_dir` this is:
    /// - Linux:   `~/.local/share/countdown`
    /// - macOS:   `~/Library/Application Support/com.countdown.countdown`
    /// - Windows: `{FOLDERID_RoamingAppData}\countdown\countdown\data`
    pub fn local_data_dir(&self) -> Result<PathBuf> {
        let dir = match &self.data_dir {
            Some(dir) => dir.clone(),
            None => ProjectDirs::from("com", "countdown", "countdown")
                .ok_or(StoreError::NoDataDir)?
                .data_dir()
                .to_path_buf(),
        };
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

fn clamp_limit(n: usize) -> usize {
    n.clamp(1, PROJECTION_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StorageConfig::default();
        assert_eq!(config.projection_limit, 5);
        assert!(config.shared_dir.is_none());
        assert_eq!(config.device_time_zone, "UTC");
    }

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(clamp_limit(0), 1);
        assert_eq!(clamp_limit(3), 3);
        assert_eq!(clamp_limit(50), 5);
    }

    #[test]
    fn test_local_data_dir_created() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            data_dir: Some(dir.path().join("nested").join("data")),
            ..StorageConfig::default()
        };
        let resolved = config.local_data_dir().unwrap();
        assert!(resolved.is_dir());
    }
}
