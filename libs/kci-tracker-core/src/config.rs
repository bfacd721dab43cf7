//! Configuration for tracker instances

use chrono_tz::Tz;
use std::path::PathBuf;

use kci_tracker_common::CACHE_NAMESPACE;

/// Per-team tracker configuration
///
/// The reset hour and timezone define when the team's "day" rolls over for
/// due checks and report lookups.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Team identifier, used to key report documents and cache entries
    pub team: String,
    /// Team timezone
    pub timezone: Tz,
    /// Hour of day (0-23) at which the team's day rolls over
    pub reset_hour: u8,
    /// Local cache database path
    pub cache_path: PathBuf,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            team: "default".to_string(),
            timezone: chrono_tz::UTC,
            reset_hour: 0,
            cache_path: PathBuf::from(format!("{CACHE_NAMESPACE}.db")),
        }
    }
}

impl TrackerConfig {
    /// Create a configuration for a named team
    #[must_use]
    pub fn new(team: impl Into<String>) -> Self {
        Self {
            team: team.into(),
            ..Self::default()
        }
    }

    /// Create configuration from environment variables
    ///
    /// Reads `KCI_TRACKER_TEAM`, `KCI_TRACKER_TZ`, `KCI_TRACKER_RESET_HOUR`
    /// and `KCI_TRACKER_CACHE_PATH`. Invalid values fall back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(team) = std::env::var("KCI_TRACKER_TEAM") {
            if !team.trim().is_empty() {
                config.team = team;
            }
        }
        if let Ok(tz) = std::env::var("KCI_TRACKER_TZ") {
            if let Ok(parsed) = tz.parse::<Tz>() {
                config.timezone = parsed;
            }
        }
        if let Ok(hour) = std::env::var("KCI_TRACKER_RESET_HOUR") {
            if let Ok(parsed) = hour.parse::<u8>() {
                if parsed < 24 {
                    config.reset_hour = parsed;
                }
            }
        }
        if let Ok(path) = std::env::var("KCI_TRACKER_CACHE_PATH") {
            if !path.trim().is_empty() {
                config.cache_path = PathBuf::from(path);
            }
        }

        config
    }
}
