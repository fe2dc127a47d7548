//! Service configuration

use crate::error::{ServiceError, ServiceResult};

/// Reference service limits and policies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Invite token lifetime in minutes
    pub token_ttl_minutes: i64,
    /// Largest accepted upload in megabytes
    pub max_upload_mb: u64,
    /// Accepted upload content types, parameters excluded
    pub allowed_mime_types: Vec<String>,
    /// Root used to build stream URLs
    pub api_base: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            token_ttl_minutes: 10_080,
            max_upload_mb: 50,
            allowed_mime_types: vec!["video/webm".to_string(), "video/mp4".to_string()],
            api_base: "http://localhost:8000/api/v1".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Upload size limit in bytes
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb * 1024 * 1024
    }

    /// Whether `content_type` may be uploaded
    pub fn accepts(&self, content_type: &str) -> bool {
        self.allowed_mime_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(content_type))
    }

    /// Validate configuration
    pub fn validate(&self) -> ServiceResult<()> {
        if self.token_ttl_minutes <= 0 {
            return Err(ServiceError::InvalidConfiguration {
                message: "token TTL must be positive".to_string(),
            });
        }
        if self.max_upload_mb == 0 {
            return Err(ServiceError::InvalidConfiguration {
                message: "upload limit must be positive".to_string(),
            });
        }
        if self.allowed_mime_types.is_empty() {
            return Err(ServiceError::InvalidConfiguration {
                message: "at least one content type must be allowed".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let config = ServiceConfig::default();
        assert_eq!(config.max_upload_bytes(), 52_428_800);
        assert!(config.accepts("video/webm"));
        assert!(config.accepts("VIDEO/MP4"));
        assert!(!config.accepts("video/quicktime"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_allow_list() {
        let config = ServiceConfig {
            allowed_mime_types: Vec::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
