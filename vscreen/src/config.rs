//! Configuration types and defaults

use vscreen_core::{ClientConfig, ScreeningError, ScreeningResult};
use vscreen_media::CaptureConfig;

#[cfg(feature = "reference-service")]
use vscreen_service::ServiceConfig;

/// Environment variable overriding the API root
pub const ENV_API_BASE: &str = "VSCREEN_API_BASE";
/// Environment variable overriding the candidate-facing origin
pub const ENV_PUBLIC_ORIGIN: &str = "VSCREEN_PUBLIC_ORIGIN";
/// Environment variable overriding the recording limit
pub const ENV_MAX_VIDEO_SECONDS: &str = "VSCREEN_MAX_VIDEO_SECONDS";
/// Environment variable enabling debug logging
pub const ENV_DEBUG: &str = "VSCREEN_DEBUG";

/// Global vscreen configuration
#[derive(Debug, Clone, Default)]
pub struct GlobalConfig {
    /// Enable debug logging
    pub debug_logging: bool,
    /// Screening API client settings
    pub client: ClientConfig,
    /// Candidate capture settings
    pub capture: CaptureConfig,
    /// In-process service settings
    #[cfg(feature = "reference-service")]
    pub service: ServiceConfig,
}

impl GlobalConfig {
    /// Defaults overridden by `VSCREEN_*` environment variables
    pub fn from_env() -> ScreeningResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the `VSCREEN_*` keys
    pub fn from_lookup<F>(lookup: F) -> ScreeningResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(api_base) = lookup(ENV_API_BASE) {
            config.client.api_base = api_base.trim().to_string();
        }
        if let Some(origin) = lookup(ENV_PUBLIC_ORIGIN) {
            config.client.public_origin = origin.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_MAX_VIDEO_SECONDS) {
            let seconds = raw
                .trim()
                .parse::<u32>()
                .map_err(|_| ScreeningError::InvalidConfiguration {
                    message: format!("{} must be whole seconds, got {:?}", ENV_MAX_VIDEO_SECONDS, raw),
                })?;
            config.set_max_video_seconds(seconds);
        }
        if let Some(raw) = lookup(ENV_DEBUG) {
            config.debug_logging = matches!(
                raw.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }

        config.validate()?;
        Ok(config)
    }

    /// Recording limit enforced by the capture session
    pub fn set_max_video_seconds(&mut self, seconds: u32) {
        self.capture.time_limit_seconds = seconds;
    }

    /// Validate configuration
    pub fn validate(&self) -> ScreeningResult<()> {
        self.client.validate()?;
        self.capture.validate()?;
        #[cfg(feature = "reference-service")]
        self.service.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = GlobalConfig::from_lookup(|_| None).unwrap();
        assert!(!config.debug_logging);
        assert_eq!(config.client.api_base, "http://localhost:8000/api/v1");
        assert_eq!(config.capture.time_limit_seconds, 120);
    }

    #[test]
    fn test_environment_overrides() {
        let config = GlobalConfig::from_lookup(lookup(&[
            (ENV_API_BASE, "https://api.example.com/v1"),
            (ENV_PUBLIC_ORIGIN, "https://jobs.example.com"),
            (ENV_MAX_VIDEO_SECONDS, "90"),
            (ENV_DEBUG, "true"),
        ]))
        .unwrap();
        assert!(config.debug_logging);
        assert_eq!(config.client.api_base, "https://api.example.com/v1");
        assert_eq!(config.client.public_origin, "https://jobs.example.com");
        assert_eq!(config.capture.time_limit_seconds, 90);
    }

    #[test]
    fn test_rejects_bad_values() {
        for pairs in [
            [(ENV_MAX_VIDEO_SECONDS, "two minutes")],
            [(ENV_MAX_VIDEO_SECONDS, "0")],
            [(ENV_API_BASE, "ftp://nope")],
        ] {
            let err = GlobalConfig::from_lookup(lookup(&pairs)).unwrap_err();
            assert!(
                matches!(err, ScreeningError::InvalidConfiguration { .. }),
                "{:?} gave {:?}",
                pairs,
                err
            );
            assert_eq!(err.category(), vscreen_core::ErrorCategory::Configuration);
        }
    }
}
