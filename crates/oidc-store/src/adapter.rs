//! The storage adapter trait.
//!
//! This trait defines the contract every back end must implement. It holds
//! no in-process state; all shared state lives in the external store, and
//! concurrency safety is a property of how each implementation batches its
//! writes (each `upsert` and each `revoke_by_grant_id` is one atomic batch).
//!
//! # Implementations
//!
//! Implementations are provided in separate crates:
//!
//! - `oidc-store-redis` - Redis storage backend
//! - `oidc-store-memory` - in-memory backend for tests and development

use std::time::Duration;

use async_trait::async_trait;

use crate::StoreResult;
use crate::kind::RecordKind;
use crate::payload::RecordPayload;

/// Storage contract for short-lived identity and authorization artifacts.
///
/// Records are keyed by `(kind, id)` with caller-minted ids. Three optional
/// payload fields (`grantId`, `userCode`, `uid`) drive secondary-index
/// maintenance inside `upsert`; callers never manage indices directly.
///
/// Missing records are `Ok(None)`, never an error. Secondary lookups are
/// best-effort: an index entry pointing at an expired or destroyed record
/// resolves to `Ok(None)` rather than failing.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Writes the primary record for `(kind, id)` and maintains its indices.
    ///
    /// Consumable kinds are stored as a structured record (payload plus an
    /// initially absent consumed marker); other kinds store the serialized
    /// payload directly. The primary write and every index write it implies
    /// are issued as one atomic batch.
    ///
    /// Upsert is last-write-wins at the primary key, but NOT idempotent at
    /// the grant index: re-upserting with the same `grantId` appends another
    /// pointer. Callers should upsert a given id once per grant association.
    ///
    /// # Errors
    ///
    /// Returns `InvalidExpiry` if `expires_in` is zero, `Serialization` if
    /// the payload cannot be encoded, or `Backend` if the batch fails.
    async fn upsert(
        &self,
        kind: RecordKind,
        id: &str,
        payload: &RecordPayload,
        expires_in: Duration,
    ) -> StoreResult<()>;

    /// Reads the primary record for `(kind, id)`.
    ///
    /// For consumable kinds the returned payload is the caller's original
    /// payload plus the `consumed` field once [`consume`](Self::consume) has
    /// been called.
    ///
    /// # Errors
    ///
    /// Returns `Backend` if the read fails, `Serialization` if the stored
    /// value cannot be decoded.
    async fn find(&self, kind: RecordKind, id: &str) -> StoreResult<Option<RecordPayload>>;

    /// Resolves a user-facing device code to its record.
    ///
    /// Two-hop lookup (index, then primary). Absence at either hop,
    /// including a stale index entry, yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `Backend` if a read fails, `Serialization` if the stored
    /// value cannot be decoded.
    async fn find_by_user_code(
        &self,
        kind: RecordKind,
        user_code: &str,
    ) -> StoreResult<Option<RecordPayload>>;

    /// Resolves a session uid to its record.
    ///
    /// Same two-hop, best-effort resolution as
    /// [`find_by_user_code`](Self::find_by_user_code).
    ///
    /// # Errors
    ///
    /// Returns `Backend` if a read fails, `Serialization` if the stored
    /// value cannot be decoded.
    async fn find_by_uid(&self, kind: RecordKind, uid: &str)
    -> StoreResult<Option<RecordPayload>>;

    /// Deletes the primary key for `(kind, id)`.
    ///
    /// Index entries pointing at it are left in place and become stale;
    /// readers tolerate them. Destroying a missing id is a no-op success.
    ///
    /// # Errors
    ///
    /// Returns `Backend` if the delete fails.
    async fn destroy(&self, kind: RecordKind, id: &str) -> StoreResult<()>;

    /// Deletes every record belonging to a grant, then the grant index
    /// itself, as one atomic batch.
    ///
    /// A grant with no members is a successful no-op.
    ///
    /// # Errors
    ///
    /// Returns `Backend` if the batch fails.
    async fn revoke_by_grant_id(&self, grant_id: &str) -> StoreResult<()>;

    /// Sets the one-way consumed marker on a record.
    ///
    /// Idempotent: consuming an already-consumed record succeeds and leaves
    /// the marker set. Does not touch the record's expiry.
    ///
    /// # Returns
    ///
    /// `true` if the marker is set on a live record, `false` if the record
    /// does not exist or the kind is not consumable (a documented no-op).
    ///
    /// # Errors
    ///
    /// Returns `Backend` if the write fails.
    async fn consume(&self, kind: RecordKind, id: &str) -> StoreResult<bool>;
}

/// Type alias for a shared adapter trait object.
pub type DynAdapter = std::sync::Arc<dyn Adapter>;
