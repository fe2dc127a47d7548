//! Recording format negotiation
//!
//! Candidates are tried strictly in the caller's priority order against the
//! engine's support predicate. The order itself is configuration; the
//! default prefers MP4/AVC so the common path needs no transcoding downstream.

use crate::engine::FormatSupport;
use std::fmt;
use tracing::debug;

/// Identifier of a container/codec combination, e.g. `video/webm;codecs=vp9,opus`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormatDescriptor(String);

impl FormatDescriptor {
    /// Wrap a MIME type string
    pub fn new(mime_type: impl Into<String>) -> Self {
        Self(mime_type.into())
    }

    /// Full descriptor, parameters included
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Container without codec parameters
    pub fn container(&self) -> &str {
        self.0.split(';').next().map(str::trim).unwrap_or_default()
    }

    /// Whether the container is MP4
    pub fn is_mp4(&self) -> bool {
        self.container().eq_ignore_ascii_case("video/mp4")
    }
}

impl fmt::Display for FormatDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FormatDescriptor {
    fn from(mime_type: &str) -> Self {
        Self::new(mime_type)
    }
}

/// Default priority: broadly compatible MP4 first, WebM fallbacks after
pub fn default_priority() -> Vec<FormatDescriptor> {
    [
        "video/mp4;codecs=avc1.42E01E,mp4a.40.2",
        "video/mp4;codecs=avc1",
        "video/mp4",
        "video/webm;codecs=vp9,opus",
        "video/webm;codecs=vp8,opus",
        "video/webm",
    ]
    .into_iter()
    .map(FormatDescriptor::new)
    .collect()
}

/// First candidate the engine supports, or `None` to let the engine choose
pub fn select_format<S>(candidates: &[FormatDescriptor], support: &S) -> Option<FormatDescriptor>
where
    S: FormatSupport + ?Sized,
{
    let selected = candidates
        .iter()
        .find(|candidate| support.is_type_supported(candidate.as_str()))
        .cloned();
    match &selected {
        Some(format) => debug!("Negotiated recording format {}", format),
        None => debug!(
            "None of {} candidate formats supported, deferring to engine default",
            candidates.len()
        ),
    }
    selected
}

/// Ordered candidate list bound to a negotiation policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatNegotiator {
    candidates: Vec<FormatDescriptor>,
}

impl FormatNegotiator {
    /// Negotiator over an explicit priority list
    pub fn new(candidates: Vec<FormatDescriptor>) -> Self {
        Self { candidates }
    }

    /// Candidates in priority order
    pub fn candidates(&self) -> &[FormatDescriptor] {
        &self.candidates
    }

    /// Pick the best supported format
    pub fn select<S: FormatSupport + ?Sized>(&self, support: &S) -> Option<FormatDescriptor> {
        select_format(&self.candidates, support)
    }
}

impl Default for FormatNegotiator {
    fn default() -> Self {
        Self::new(default_priority())
    }
}
