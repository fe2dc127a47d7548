//! Client configuration

use crate::error::{ScreeningError, ScreeningResult};

/// Default screening API root
pub const DEFAULT_API_BASE: &str = "http://localhost:8000/api/v1";

/// Default origin used to build candidate share links
pub const DEFAULT_PUBLIC_ORIGIN: &str = "http://localhost:5173";

/// Screening API client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root, without trailing slash
    pub api_base: String,
    /// Origin of the candidate-facing site, used for share links
    pub public_origin: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            public_origin: DEFAULT_PUBLIC_ORIGIN.to_string(),
            timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    /// Configuration pointing at a specific API root
    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> ScreeningResult<()> {
        if !(self.api_base.starts_with("http://") || self.api_base.starts_with("https://")) {
            return Err(ScreeningError::InvalidConfiguration {
                message: format!("api base must be an http(s) URL, got {:?}", self.api_base),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ScreeningError::InvalidConfiguration {
                message: "request timeout must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// API root with any trailing slash removed
    pub fn api_root(&self) -> &str {
        self.api_base.trim_end_matches('/')
    }

    /// Candidate-facing link for a token
    pub fn share_link(&self, token: &str) -> String {
        format!(
            "{}/r/{}",
            self.public_origin.trim_end_matches('/'),
            urlencoding::encode(token)
        )
    }
}
