//! Back-end key derivation.
//!
//! Pure, deterministic functions mapping record identity and index values to
//! back-end keys. Identifiers are minted by callers and passed through
//! unchanged; nothing here validates or escapes them.
//!
//! Key layout:
//!
//! | Key | Points at |
//! |---|---|
//! | `<kind>:<id>` | the primary record |
//! | `grant:<grantId>` | list of primary keys sharing the grant |
//! | `userCode:<userCode>` | the primary record id |
//! | `uid:<uid>` | the primary record id |
//!
//! Application-level namespacing (a fixed prefix in front of every key) is
//! the back end's concern, not this module's.

use crate::kind::RecordKind;

/// Primary key for a `(kind, id)` record.
#[must_use]
pub fn primary_key(kind: RecordKind, id: &str) -> String {
    format!("{}:{id}", kind.as_str())
}

/// Key holding the member list of a grant.
#[must_use]
pub fn grant_key(grant_id: &str) -> String {
    format!("grant:{grant_id}")
}

/// Key mapping a user-facing device code to a record id.
#[must_use]
pub fn user_code_key(user_code: &str) -> String {
    format!("userCode:{user_code}")
}

/// Key mapping a session uid to a record id.
#[must_use]
pub fn uid_key(uid: &str) -> String {
    format!("uid:{uid}")
}
