//! Finalized recordings handed from capture to upload

use bytes::Bytes;

/// Container used when neither negotiation nor the engine reported one
pub const DEFAULT_MIME_TYPE: &str = "video/webm";

/// Base name of every uploaded recording
pub const RECORDING_BASENAME: &str = "recording";

/// A finished recording, ready for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    data: Bytes,
    mime_type: String,
}

impl Artifact {
    /// Create an artifact from assembled media bytes
    pub fn new(data: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        let mime_type = mime_type.into();
        let mime_type = if mime_type.trim().is_empty() {
            DEFAULT_MIME_TYPE.to_string()
        } else {
            mime_type
        };
        Self {
            data: data.into(),
            mime_type,
        }
    }

    /// Assemble chunks in the given order
    pub fn from_chunks<'a, I>(chunks: I, mime_type: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = &'a Bytes>,
    {
        let mut data = Vec::new();
        for chunk in chunks {
            data.extend_from_slice(chunk);
        }
        Self::new(data, mime_type)
    }

    /// Recorded bytes
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Full format descriptor, codec parameters included
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Format descriptor without parameters, e.g. `video/webm`
    pub fn content_type(&self) -> &str {
        self.mime_type
            .split(';')
            .next()
            .map(str::trim)
            .unwrap_or(DEFAULT_MIME_TYPE)
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True for a degenerate zero-byte recording
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Extension derived from the format: `mp4` or `webm`
    pub fn file_extension(&self) -> &'static str {
        extension_for(&self.mime_type)
    }

    /// Declared upload name, `recording.<ext>`
    pub fn file_name(&self) -> String {
        format!("{}.{}", RECORDING_BASENAME, self.file_extension())
    }
}

/// Map a format descriptor onto the upload file extension
pub fn extension_for(mime_type: &str) -> &'static str {
    if mime_type.to_ascii_lowercase().contains("mp4") {
        "mp4"
    } else {
        "webm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_mapping() {
        assert_eq!(extension_for("video/mp4;codecs=avc1.42E01E,mp4a.40.2"), "mp4");
        assert_eq!(extension_for("video/MP4"), "mp4");
        assert_eq!(extension_for("video/webm;codecs=vp9,opus"), "webm");
        assert_eq!(extension_for("video/x-matroska"), "webm");
    }

    #[test]
    fn test_artifact_naming() {
        let artifact = Artifact::new(vec![1u8, 2, 3], "video/mp4;codecs=avc1");
        assert_eq!(artifact.file_name(), "recording.mp4");
        assert_eq!(artifact.content_type(), "video/mp4");
        assert_eq!(artifact.len(), 3);

        let artifact = Artifact::new(Vec::new(), "");
        assert!(artifact.is_empty());
        assert_eq!(artifact.mime_type(), DEFAULT_MIME_TYPE);
        assert_eq!(artifact.file_name(), "recording.webm");
    }

    #[test]
    fn test_from_chunks_preserves_order() {
        let chunks = vec![
            Bytes::from_static(b"ab"),
            Bytes::from_static(b"c"),
            Bytes::from_static(b"def"),
        ];
        let artifact = Artifact::from_chunks(&chunks, "video/webm");
        assert_eq!(artifact.data().as_ref(), b"abcdef");
    }
}
