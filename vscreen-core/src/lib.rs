//! # vscreen core
//!
//! Invite and video lifecycle for asynchronous video screening: the data
//! model, the error taxonomy, the screening API collaborator (trait and HTTP
//! client), and the managers the candidate and administrator flows are built
//! on.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod artifact;
pub mod config;
pub mod error;
pub mod http;
pub mod invites;
pub mod model;
pub mod upload;
pub mod videos;
pub mod wire;

// Re-export main types
pub use api::ScreeningApi;
pub use artifact::{extension_for, Artifact, DEFAULT_MIME_TYPE};
pub use config::ClientConfig;
pub use error::{ErrorCategory, ScreeningError, ScreeningResult};
pub use http::HttpScreeningClient;
pub use invites::{validate_email, InviteManager};
pub use model::{
    Invite, InviteId, InviteStatus, ResolvedToken, Tag, Token, UploadAck, Video, VideoId,
};
pub use upload::{UploadReceipt, UploadSubmitter};
pub use videos::VideoReviewManager;
