//! # vscreen service
//!
//! Reference implementation of the screening service that runs in-process:
//! invite and video records, object storage for recordings, and the upload
//! validation rules of the HTTP API. It implements
//! [`ScreeningApi`](vscreen_core::ScreeningApi), so every manager and flow can
//! run end-to-end without a network.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod config;
pub mod error;
pub mod service;
pub mod storage;
pub mod store;

// Re-export main types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ServiceConfig;
pub use error::{ServiceError, ServiceResult};
pub use service::InMemoryScreeningService;
pub use storage::{LocalFsStorage, MemoryStorage, ObjectStorage, StoredObject};
pub use store::{InviteRecord, InviteStore, VideoStore};
