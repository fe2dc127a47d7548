//! Capture configuration

use crate::error::{MediaError, MediaResult};
use crate::format::{default_priority, FormatDescriptor};
use std::time::Duration;

/// Default hard limit on one recording
pub const DEFAULT_TIME_LIMIT_SECONDS: u32 = 120;

/// Default recorder data interval
pub const DEFAULT_TIMESLICE: Duration = Duration::from_millis(250);

/// Capture session configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Recording is stopped automatically after this many seconds
    pub time_limit_seconds: u32,
    /// Candidate recording formats, most preferred first
    pub format_priority: Vec<FormatDescriptor>,
    /// How often the recorder delivers data
    pub timeslice: Duration,
    /// Elapsed-time tick period
    pub tick_interval: Duration,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            time_limit_seconds: DEFAULT_TIME_LIMIT_SECONDS,
            format_priority: default_priority(),
            timeslice: DEFAULT_TIMESLICE,
            tick_interval: Duration::from_secs(1),
        }
    }
}

impl CaptureConfig {
    /// Default configuration with a different time limit
    pub fn with_time_limit(time_limit_seconds: u32) -> Self {
        Self {
            time_limit_seconds,
            ..Default::default()
        }
    }

    /// Time limit as a duration
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(u64::from(self.time_limit_seconds))
    }

    /// Validate configuration
    pub fn validate(&self) -> MediaResult<()> {
        if self.time_limit_seconds == 0 {
            return Err(MediaError::InvalidConfiguration {
                message: "time limit must be at least one second".to_string(),
            });
        }
        if self.timeslice.is_zero() {
            return Err(MediaError::InvalidConfiguration {
                message: "timeslice must be non-zero".to_string(),
            });
        }
        if self.tick_interval.is_zero() {
            return Err(MediaError::InvalidConfiguration {
                message: "tick interval must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}
