//! Invite lifecycle management
//!
//! Administrator-side creation and listing of invites, plus the token check the
//! candidate flow runs before it allows recording.

use crate::api::ScreeningApi;
use crate::config::ClientConfig;
use crate::error::{ScreeningError, ScreeningResult};
use crate::model::{Invite, ResolvedToken, Token};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Validate and normalize an invite e-mail
pub fn validate_email(email: &str) -> ScreeningResult<String> {
    let trimmed = email.trim();
    let well_formed = match trimmed.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    };
    if !well_formed {
        return Err(ScreeningError::InvalidEmail {
            email: email.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// Creates, lists and resolves invites
pub struct InviteManager {
    api: Arc<dyn ScreeningApi>,
    config: ClientConfig,
    invites: RwLock<Vec<Invite>>,
    stale: AtomicBool,
}

impl InviteManager {
    /// Create a manager over a collaborator
    pub fn new(api: Arc<dyn ScreeningApi>, config: ClientConfig) -> Self {
        Self {
            api,
            config,
            invites: RwLock::new(Vec::new()),
            stale: AtomicBool::new(true),
        }
    }

    /// Mint an invite for a candidate
    ///
    /// The cached listing is marked stale; call [`Self::list_invites`] to
    /// refresh it.
    pub async fn create_invite(&self, email: &str) -> ScreeningResult<Invite> {
        let email = validate_email(email)?;
        let invite = self.api.create_invite(&email).await?;
        self.stale.store(true, Ordering::Release);
        info!(
            "Created invite {} for {} (token {:?})",
            invite.invite_id, invite.email, invite.token
        );
        Ok(invite)
    }

    /// Fetch every invite and replace the cached listing
    pub async fn list_invites(&self) -> ScreeningResult<Vec<Invite>> {
        let invites = self.api.list_invites().await?;
        debug!("Loaded {} invites", invites.len());
        *self.invites.write() = invites.clone();
        self.stale.store(false, Ordering::Release);
        Ok(invites)
    }

    /// Confirm a candidate's token before recording is allowed
    ///
    /// Callers treat `InvalidToken` as terminal and never retry.
    pub async fn resolve_token(&self, token: &Token) -> ScreeningResult<ResolvedToken> {
        if token.is_blank() {
            return Err(ScreeningError::InvalidToken);
        }
        self.api.resolve_token(token).await
    }

    /// Last listing fetched
    pub fn cached(&self) -> Vec<Invite> {
        self.invites.read().clone()
    }

    /// Whether the cached listing predates the latest mutation
    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::Acquire)
    }

    /// Candidate-facing link for an invite token
    pub fn share_link(&self, token: &Token) -> String {
        self.config.share_link(token.as_str())
    }
}
