//! Tolerant decoding of collaborator records
//!
//! Deployments disagree on how they name the invite identifier (`inviteId`,
//! `invite_id`, `id`, or a document-store `_id`, possibly wrapped as
//! `{"$oid": ...}`). Records are mapped onto [`Invite`] here and nowhere else;
//! a record that matches none of the known shapes is dropped, not reported.

use crate::model::{Invite, InviteId, InviteStatus, Token};
use serde_json::{Map, Value};
use tracing::debug;

/// Identifier keys, in lookup order
pub const INVITE_ID_KEYS: [&str; 4] = ["inviteId", "invite_id", "id", "_id"];

/// Decode a listing, dropping records that cannot be normalized
///
/// Order of the surviving records is preserved.
pub fn decode_invites(records: Vec<Value>) -> Vec<Invite> {
    let total = records.len();
    let invites: Vec<Invite> = records.iter().filter_map(decode_invite).collect();
    if invites.len() != total {
        debug!(
            "Dropped {} of {} invite records without a usable identifier or token",
            total - invites.len(),
            total
        );
    }
    invites
}

/// Decode a single invite record
pub fn decode_invite(record: &Value) -> Option<Invite> {
    let obj = record.as_object()?;
    let invite_id = resolve_identifier(obj)?;
    let token = obj
        .get("token")
        .and_then(Value::as_str)
        .filter(|t| !t.trim().is_empty())?;
    let email = obj
        .get("email")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let status = obj
        .get("status")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<InviteStatus>().ok())
        .unwrap_or_default();

    Some(Invite {
        invite_id: InviteId::new(invite_id),
        email,
        token: Token::new(token),
        status,
    })
}

fn resolve_identifier(obj: &Map<String, Value>) -> Option<String> {
    INVITE_ID_KEYS
        .iter()
        .filter_map(|key| obj.get(*key))
        .find_map(identifier_value)
}

fn identifier_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(inner) => inner.get("$oid").and_then(identifier_value),
        _ => None,
    }
}
