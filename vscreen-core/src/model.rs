//! Invite and video records shared by every component

use crate::error::ScreeningError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw identifier
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Identifier of an invite
    InviteId
);

string_id!(
    /// Identifier of an uploaded video
    VideoId
);

/// Capability credential handed to a candidate
///
/// `Debug` only shows the first eight characters so tokens do not end up in
/// logs verbatim.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Wrap a raw token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Borrow the raw token
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading eight characters, as shown in the admin listing
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }

    /// True when the token is empty or whitespace
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({}…)", self.short())
    }
}

impl From<&str> for Token {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

/// Lifecycle of an invite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InviteStatus {
    /// Waiting for the candidate's upload
    #[default]
    Open,
    /// A video was accepted against the token
    Uploaded,
}

impl InviteStatus {
    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            InviteStatus::Open => "OPEN",
            InviteStatus::Uploaded => "UPLOADED",
        }
    }
}

impl fmt::Display for InviteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InviteStatus {
    type Err = ScreeningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OPEN" => Ok(InviteStatus::Open),
            "UPLOADED" => Ok(InviteStatus::Uploaded),
            other => Err(ScreeningError::InvalidState {
                expected: "OPEN or UPLOADED".to_string(),
                actual: other.to_string(),
            }),
        }
    }
}

/// An invitation to record one screening video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invite {
    /// Canonical identifier
    pub invite_id: InviteId,
    /// Candidate e-mail
    pub email: String,
    /// Capability token for the candidate
    pub token: Token,
    /// Current lifecycle state
    pub status: InviteStatus,
}

impl Invite {
    /// Whether the candidate may still upload
    pub fn is_open(&self) -> bool {
        self.status == InviteStatus::Open
    }
}

/// Reviewer classification of a submitted video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    /// Not reviewed yet
    #[default]
    Pending,
    /// Move the candidate forward
    Advance,
    /// Needs another look
    Review,
    /// Do not proceed
    Pass,
}

impl Tag {
    /// Every tag, in display order
    pub const ALL: [Tag; 4] = [Tag::Pending, Tag::Advance, Tag::Review, Tag::Pass];

    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Pending => "pending",
            Tag::Advance => "advance",
            Tag::Review => "review",
            Tag::Pass => "pass",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tag {
    type Err = ScreeningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| ScreeningError::InvalidTag {
                value: s.to_string(),
            })
    }
}

/// A stored screening video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    /// Video identifier
    #[serde(alias = "_id")]
    pub id: VideoId,
    /// Invite the video was uploaded against
    #[serde(alias = "invite_id")]
    pub invite_id: InviteId,
    /// Opaque handle owned by the storage collaborator
    #[serde(alias = "storage_key")]
    pub storage_key: String,
    /// File name the candidate's client declared
    #[serde(alias = "original_name")]
    pub original_name: String,
    /// Review classification; absent or null means pending
    #[serde(default, deserialize_with = "tag_or_pending")]
    pub tag: Tag,
}

fn tag_or_pending<'de, D>(deserializer: D) -> Result<Tag, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Tag>::deserialize(deserializer)?.unwrap_or_default())
}

/// Server acknowledgement of an accepted upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadAck {
    /// Newly created video
    pub video_id: VideoId,
}

/// Successful token check
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedToken {
    /// Invite the token belongs to, when the collaborator reports it
    #[serde(default, alias = "invite_id")]
    pub invite_id: Option<InviteId>,
}
