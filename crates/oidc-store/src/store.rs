//! Per-kind store handles.
//!
//! The surrounding authorization server constructs one handle per model it
//! persists, all sharing a single back-end adapter. The handle only binds
//! the kind; it adds no state or behavior of its own.

use std::time::Duration;

use crate::StoreResult;
use crate::adapter::DynAdapter;
use crate::kind::RecordKind;
use crate::payload::RecordPayload;

/// A handle to the store scoped to a single record kind.
///
/// # Example
///
/// ```ignore
/// use oidc_store::{KindStore, RecordKind};
///
/// let codes = KindStore::new(RecordKind::AuthorizationCode, adapter.clone());
/// codes.upsert("code-1", &payload, Duration::from_secs(600)).await?;
/// let found = codes.find("code-1").await?;
/// ```
#[derive(Clone)]
pub struct KindStore {
    kind: RecordKind,
    adapter: DynAdapter,
}

impl KindStore {
    /// Creates a handle for `kind` over a shared adapter.
    #[must_use]
    pub fn new(kind: RecordKind, adapter: DynAdapter) -> Self {
        Self { kind, adapter }
    }

    /// The kind this handle is scoped to.
    #[must_use]
    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// See [`Adapter::upsert`](crate::Adapter::upsert).
    pub async fn upsert(
        &self,
        id: &str,
        payload: &RecordPayload,
        expires_in: Duration,
    ) -> StoreResult<()> {
        self.adapter.upsert(self.kind, id, payload, expires_in).await
    }

    /// See [`Adapter::find`](crate::Adapter::find).
    pub async fn find(&self, id: &str) -> StoreResult<Option<RecordPayload>> {
        self.adapter.find(self.kind, id).await
    }

    /// See [`Adapter::find_by_user_code`](crate::Adapter::find_by_user_code).
    pub async fn find_by_user_code(&self, user_code: &str) -> StoreResult<Option<RecordPayload>> {
        self.adapter.find_by_user_code(self.kind, user_code).await
    }

    /// See [`Adapter::find_by_uid`](crate::Adapter::find_by_uid).
    pub async fn find_by_uid(&self, uid: &str) -> StoreResult<Option<RecordPayload>> {
        self.adapter.find_by_uid(self.kind, uid).await
    }

    /// See [`Adapter::destroy`](crate::Adapter::destroy).
    pub async fn destroy(&self, id: &str) -> StoreResult<()> {
        self.adapter.destroy(self.kind, id).await
    }

    /// See [`Adapter::revoke_by_grant_id`](crate::Adapter::revoke_by_grant_id).
    pub async fn revoke_by_grant_id(&self, grant_id: &str) -> StoreResult<()> {
        self.adapter.revoke_by_grant_id(grant_id).await
    }

    /// See [`Adapter::consume`](crate::Adapter::consume).
    pub async fn consume(&self, id: &str) -> StoreResult<bool> {
        self.adapter.consume(self.kind, id).await
    }
}

impl std::fmt::Debug for KindStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KindStore").field("kind", &self.kind).finish()
    }
}
