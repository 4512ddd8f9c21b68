//! In-memory adapter implementation.
//!
//! The whole state sits behind a single `tokio::sync::RwLock`, so every
//! mutating operation is naturally one atomic batch - the same unit of
//! atomicity the Redis backend gets from MULTI/EXEC pipelines. Expiry is
//! lazy: expired entries are treated as missing on read and physically
//! removed only by [`InMemoryAdapter::cleanup`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use oidc_store::{Adapter, RecordKind, RecordPayload, StoreError, StoreResult, keys};

/// How a record's value is held, mirroring the two persisted shapes.
#[derive(Debug, Clone)]
enum StoredValue {
    /// Serialized payload, stored directly.
    Opaque(String),
    /// Serialized payload plus the one-way consumed marker.
    Structured {
        payload: String,
        consumed: Option<i64>,
    },
}

#[derive(Debug, Clone)]
struct StoredRecord {
    value: StoredValue,
    expires_at: Instant,
}

impl StoredRecord {
    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// A secondary-index entry pointing at a primary record id.
#[derive(Debug, Clone)]
struct IndexEntry {
    id: String,
    expires_at: Instant,
}

impl IndexEntry {
    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// Member list of a grant. Append-only, never deduplicated.
#[derive(Debug, Clone)]
struct GrantEntry {
    members: Vec<String>,
    expires_at: Instant,
}

impl GrantEntry {
    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

#[derive(Debug, Default)]
struct State {
    /// Primary records, keyed by `<kind>:<id>`.
    records: HashMap<String, StoredRecord>,
    /// Grant member lists, keyed by grant id.
    grants: HashMap<String, GrantEntry>,
    /// userCode -> record id.
    user_codes: HashMap<String, IndexEntry>,
    /// uid -> record id.
    uids: HashMap<String, IndexEntry>,
}

/// In-memory implementation of the [`Adapter`] trait.
///
/// Useful for testing and development. Not suitable for production
/// multi-process deployments.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAdapter {
    state: Arc<RwLock<State>>,
    max_grant_members: Option<usize>,
}

impl InMemoryAdapter {
    /// Creates an empty adapter with unbounded grant member lists.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an adapter that trims each grant member list to its newest
    /// `bound` entries on upsert.
    #[must_use]
    pub fn with_grant_bound(bound: usize) -> Self {
        Self {
            state: Arc::new(RwLock::new(State::default())),
            max_grant_members: Some(bound),
        }
    }

    /// Removes all expired entries.
    pub async fn cleanup(&self) {
        let mut state = self.state.write().await;
        state.records.retain(|_, record| !record.is_expired());
        state.grants.retain(|_, grant| !grant.is_expired());
        state.user_codes.retain(|_, entry| !entry.is_expired());
        state.uids.retain(|_, entry| !entry.is_expired());
    }

    /// Number of live primary records.
    pub async fn len(&self) -> usize {
        let state = self.state.read().await;
        state.records.values().filter(|r| !r.is_expired()).count()
    }

    /// Returns `true` if no live primary record exists.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Live member count of a grant, duplicates included. Test hook for
    /// observing index growth and trimming.
    pub async fn grant_members(&self, grant_id: &str) -> usize {
        let state = self.state.read().await;
        state
            .grants
            .get(grant_id)
            .filter(|grant| !grant.is_expired())
            .map_or(0, |grant| grant.members.len())
    }

    /// Remaining lifetime of a grant's member list. Test hook for the
    /// TTL-monotonicity guarantee.
    pub async fn grant_ttl(&self, grant_id: &str) -> Option<Duration> {
        let state = self.state.read().await;
        state
            .grants
            .get(grant_id)
            .filter(|grant| !grant.is_expired())
            .map(|grant| grant.expires_at.saturating_duration_since(Instant::now()))
    }

    fn decode(record: &StoredRecord) -> StoreResult<RecordPayload> {
        match &record.value {
            StoredValue::Opaque(raw) => RecordPayload::from_json(raw),
            StoredValue::Structured { payload, consumed } => {
                let mut decoded = RecordPayload::from_json(payload)?;
                if let Some(at) = consumed {
                    decoded.set_consumed(*at);
                }
                Ok(decoded)
            }
        }
    }

    /// Primary fetch against already-locked state, shared by the one-hop
    /// and two-hop lookups.
    fn find_locked(
        state: &State,
        kind: RecordKind,
        id: &str,
    ) -> StoreResult<Option<RecordPayload>> {
        match state.records.get(&keys::primary_key(kind, id)) {
            Some(record) if !record.is_expired() => Self::decode(record).map(Some),
            _ => Ok(None),
        }
    }
}

fn check_expiry(expires_in: Duration) -> StoreResult<()> {
    if expires_in.is_zero() {
        return Err(StoreError::invalid_expiry(
            "expires_in must be a positive duration",
        ));
    }
    Ok(())
}

#[async_trait]
impl Adapter for InMemoryAdapter {
    async fn upsert(
        &self,
        kind: RecordKind,
        id: &str,
        payload: &RecordPayload,
        expires_in: Duration,
    ) -> StoreResult<()> {
        check_expiry(expires_in)?;
        let serialized = payload.to_json()?;
        let expires_at = Instant::now() + expires_in;
        let primary = keys::primary_key(kind, id);

        // Single write lock = the whole upsert is one atomic batch.
        let mut state = self.state.write().await;

        let value = if kind.is_consumable() {
            // Re-upserting replaces only the payload; a marker already set
            // on the live record is never cleared by this layer. (In Redis,
            // HSET of the payload field leaves the consumed field alone.)
            let consumed = match state.records.get(&primary) {
                Some(record) if !record.is_expired() => match &record.value {
                    StoredValue::Structured { consumed, .. } => *consumed,
                    StoredValue::Opaque(_) => None,
                },
                _ => None,
            };
            StoredValue::Structured {
                payload: serialized,
                consumed,
            }
        } else {
            StoredValue::Opaque(serialized)
        };

        state.records.insert(primary.clone(), StoredRecord { value, expires_at });

        if let Some(grant_id) = payload.grant_id() {
            let grant = state
                .grants
                .entry(grant_id.to_string())
                .or_insert_with(|| GrantEntry {
                    members: Vec::new(),
                    expires_at,
                });
            if grant.is_expired() {
                // An expired list would already be gone in Redis; start over.
                grant.members.clear();
            }
            grant.members.push(primary);
            if let Some(bound) = self.max_grant_members {
                let len = grant.members.len();
                if len > bound {
                    grant.members.drain(..len - bound);
                }
            }
            // Only ever extended, never shortened.
            if expires_at > grant.expires_at || grant.is_expired() {
                grant.expires_at = expires_at;
            }
            tracing::debug!(grant_id = %grant_id, kind = %kind, "grant index appended");
        }

        if let Some(user_code) = payload.user_code() {
            state.user_codes.insert(
                user_code.to_string(),
                IndexEntry {
                    id: id.to_string(),
                    expires_at,
                },
            );
        }

        if let Some(uid) = payload.uid() {
            state.uids.insert(
                uid.to_string(),
                IndexEntry {
                    id: id.to_string(),
                    expires_at,
                },
            );
        }

        Ok(())
    }

    async fn find(&self, kind: RecordKind, id: &str) -> StoreResult<Option<RecordPayload>> {
        let state = self.state.read().await;
        Self::find_locked(&state, kind, id)
    }

    async fn find_by_user_code(
        &self,
        kind: RecordKind,
        user_code: &str,
    ) -> StoreResult<Option<RecordPayload>> {
        let state = self.state.read().await;
        match state.user_codes.get(user_code) {
            Some(entry) if !entry.is_expired() => {
                // The entry may dangle; a stale pointer is not-found.
                let id = entry.id.clone();
                Self::find_locked(&state, kind, &id)
            }
            _ => Ok(None),
        }
    }

    async fn find_by_uid(
        &self,
        kind: RecordKind,
        uid: &str,
    ) -> StoreResult<Option<RecordPayload>> {
        let state = self.state.read().await;
        match state.uids.get(uid) {
            Some(entry) if !entry.is_expired() => {
                let id = entry.id.clone();
                Self::find_locked(&state, kind, &id)
            }
            _ => Ok(None),
        }
    }

    async fn destroy(&self, kind: RecordKind, id: &str) -> StoreResult<()> {
        let mut state = self.state.write().await;
        // Indices pointing here are left in place; readers tolerate them.
        state.records.remove(&keys::primary_key(kind, id));
        Ok(())
    }

    async fn revoke_by_grant_id(&self, grant_id: &str) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if let Some(grant) = state.grants.remove(grant_id) {
            for member in &grant.members {
                state.records.remove(member);
            }
            tracing::debug!(
                grant_id = %grant_id,
                members = grant.members.len(),
                "grant revoked"
            );
        }
        Ok(())
    }

    async fn consume(&self, kind: RecordKind, id: &str) -> StoreResult<bool> {
        if !kind.is_consumable() {
            tracing::debug!(kind = %kind, "consume on non-consumable kind ignored");
            return Ok(false);
        }
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        let mut state = self.state.write().await;
        match state.records.get_mut(&keys::primary_key(kind, id)) {
            Some(record) if !record.is_expired() => {
                if let StoredValue::Structured { consumed, .. } = &mut record.value {
                    // Direct field write, as HSET does: repeated consumes
                    // refresh the timestamp but the marker never clears.
                    *consumed = Some(now);
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
