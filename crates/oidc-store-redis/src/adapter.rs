//! Redis adapter implementation.
//!
//! Key space (all behind the configured application prefix):
//!
//! | Key | Shape | TTL |
//! |---|---|---|
//! | `<kind>:<id>` | string blob, or hash `{payload, consumed}` for consumable kinds | the record's expiry |
//! | `grant:<grantId>` | list of unprefixed `<kind>:<id>` members | >= longest live member |
//! | `userCode:<userCode>` | record id | the record's expiry |
//! | `uid:<uid>` | record id | the record's expiry |
//!
//! Grant list members are stored unprefixed; the prefix is re-applied when
//! revocation deletes them.
//!
//! Each `upsert` and each `revoke_by_grant_id` runs as one MULTI/EXEC
//! pipeline, so concurrent readers never observe a primary record without
//! its index entries. The two-hop lookups hold no lock across the hops; a
//! record vanishing between index resolution and primary fetch reads as
//! not-found.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Connection, Pool};
use redis::AsyncCommands;

use oidc_store::{Adapter, RecordKind, RecordPayload, StoreError, StoreResult, keys};

use crate::config::RedisStoreConfig;

/// Hash field holding the serialized payload of a consumable record.
const HASH_PAYLOAD: &str = "payload";
/// Hash field holding the consumed-at unix timestamp once set.
const HASH_CONSUMED: &str = "consumed";

/// Redis implementation of the [`Adapter`] trait.
///
/// Holds a connection pool and a key prefix; everything else lives in
/// Redis, so the adapter is freely shareable across tasks.
#[derive(Clone)]
pub struct RedisAdapter {
    pool: Pool,
    prefix: String,
    max_grant_members: Option<usize>,
}

impl RedisAdapter {
    /// Creates an adapter over an existing pool with the default `oidc:`
    /// prefix and unbounded grant lists.
    #[must_use]
    pub fn new(pool: Pool) -> Self {
        Self {
            pool,
            prefix: "oidc:".to_string(),
            max_grant_members: None,
        }
    }

    /// Creates an adapter over an existing pool with a custom prefix.
    #[must_use]
    pub fn with_prefix(pool: Pool, prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::new(pool)
        }
    }

    /// Connects a pooled adapter from configuration.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the configuration is invalid or the pool
    /// cannot be created. Connections themselves are established lazily.
    pub fn connect(config: &RedisStoreConfig) -> StoreResult<Self> {
        config.validate().map_err(StoreError::backend)?;

        let mut cfg = deadpool_redis::Config::from_url(&config.url);
        let mut pool_cfg = deadpool_redis::PoolConfig::new(config.pool_size);
        pool_cfg.timeouts.wait = Some(Duration::from_millis(config.timeout_ms));
        cfg.pool = Some(pool_cfg);

        let pool = cfg
            .create_pool(Some(deadpool_redis::Runtime::Tokio1))
            .map_err(|e| StoreError::backend(format!("failed to create Redis pool: {e}")))?;

        Ok(Self {
            pool,
            prefix: config.key_prefix.clone(),
            max_grant_members: config.max_grant_members,
        })
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }

    async fn conn(&self) -> StoreResult<Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::backend(format!("failed to get Redis connection: {e}")))
    }

    /// Decodes a consumable record's hash into a payload with the consumed
    /// marker merged in.
    fn decode_hash(key: &str, mut fields: HashMap<String, String>) -> StoreResult<RecordPayload> {
        let raw = fields.remove(HASH_PAYLOAD).ok_or_else(|| {
            StoreError::serialization(format!("record {key} has no payload field"))
        })?;
        let mut payload = RecordPayload::from_json(&raw)?;
        if let Some(consumed) = fields.get(HASH_CONSUMED) {
            let at = consumed.parse::<i64>().map_err(|_| {
                StoreError::serialization(format!("record {key} has malformed consumed marker"))
            })?;
            payload.set_consumed(at);
        }
        Ok(payload)
    }
}

fn backend_err(err: redis::RedisError) -> StoreError {
    StoreError::backend(err.to_string())
}

/// TTL in whole seconds as Redis expects; sub-second durations round up to
/// one second rather than down to an immediate expiry.
fn ttl_seconds(expires_in: Duration) -> i64 {
    i64::try_from(expires_in.as_secs().max(1)).unwrap_or(i64::MAX)
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
impl Adapter for RedisAdapter {
    async fn upsert(
        &self,
        kind: RecordKind,
        id: &str,
        payload: &RecordPayload,
        expires_in: Duration,
    ) -> StoreResult<()> {
        check_expiry(expires_in)?;
        let serialized = payload.to_json()?;
        let ttl = ttl_seconds(expires_in);

        let key = keys::primary_key(kind, id);
        let primary = self.prefixed(&key);

        let mut conn = self.conn().await?;

        // The grant index TTL is read before the batch; the comparison
        // decides whether this member extends it. -2 (missing) and -1 (no
        // expiry) both compare below any positive ttl.
        let grant = match payload.grant_id() {
            Some(grant_id) => {
                let grant_key = self.prefixed(&keys::grant_key(grant_id));
                let current: i64 = conn.ttl(&grant_key).await.map_err(backend_err)?;
                Some((grant_key, current))
            }
            None => None,
        };

        let mut pipe = redis::pipe();
        pipe.atomic();

        if kind.is_consumable() {
            pipe.hset(&primary, HASH_PAYLOAD, &serialized).ignore();
        } else {
            pipe.set(&primary, &serialized).ignore();
        }
        pipe.expire(&primary, ttl).ignore();

        if let Some((grant_key, current_ttl)) = &grant {
            // Members are stored unprefixed; revocation re-applies the
            // prefix when deleting them.
            pipe.rpush(grant_key, &key).ignore();
            if let Some(bound) = self.max_grant_members {
                pipe.ltrim(grant_key, -(bound as isize), -1).ignore();
            }
            if ttl > *current_ttl {
                pipe.expire(grant_key, ttl).ignore();
            }
            tracing::debug!(grant = %grant_key, member = %key, "grant index appended");
        }

        if let Some(user_code) = payload.user_code() {
            let user_code_key = self.prefixed(&keys::user_code_key(user_code));
            pipe.set(&user_code_key, id).ignore();
            pipe.expire(&user_code_key, ttl).ignore();
        }

        if let Some(uid) = payload.uid() {
            let uid_key = self.prefixed(&keys::uid_key(uid));
            pipe.set(&uid_key, id).ignore();
            pipe.expire(&uid_key, ttl).ignore();
        }

        let _: () = pipe.query_async(&mut conn).await.map_err(backend_err)?;
        Ok(())
    }

    async fn find(&self, kind: RecordKind, id: &str) -> StoreResult<Option<RecordPayload>> {
        let key = self.prefixed(&keys::primary_key(kind, id));
        let mut conn = self.conn().await?;

        if kind.is_consumable() {
            let fields: HashMap<String, String> =
                conn.hgetall(&key).await.map_err(backend_err)?;
            if fields.is_empty() {
                return Ok(None);
            }
            Self::decode_hash(&key, fields).map(Some)
        } else {
            let raw: Option<String> = conn.get(&key).await.map_err(backend_err)?;
            match raw {
                Some(raw) => RecordPayload::from_json(&raw).map(Some),
                None => Ok(None),
            }
        }
    }

    async fn find_by_user_code(
        &self,
        kind: RecordKind,
        user_code: &str,
    ) -> StoreResult<Option<RecordPayload>> {
        let index_key = self.prefixed(&keys::user_code_key(user_code));
        let mut conn = self.conn().await?;
        let id: Option<String> = conn.get(&index_key).await.map_err(backend_err)?;
        drop(conn);

        match id {
            Some(id) => self.find(kind, &id).await,
            None => Ok(None),
        }
    }

    async fn find_by_uid(
        &self,
        kind: RecordKind,
        uid: &str,
    ) -> StoreResult<Option<RecordPayload>> {
        let index_key = self.prefixed(&keys::uid_key(uid));
        let mut conn = self.conn().await?;
        let id: Option<String> = conn.get(&index_key).await.map_err(backend_err)?;
        drop(conn);

        match id {
            Some(id) => self.find(kind, &id).await,
            None => Ok(None),
        }
    }

    async fn destroy(&self, kind: RecordKind, id: &str) -> StoreResult<()> {
        let key = self.prefixed(&keys::primary_key(kind, id));
        let mut conn = self.conn().await?;
        let _: () = conn.del(&key).await.map_err(backend_err)?;
        Ok(())
    }

    async fn revoke_by_grant_id(&self, grant_id: &str) -> StoreResult<()> {
        let grant_key = self.prefixed(&keys::grant_key(grant_id));
        let mut conn = self.conn().await?;

        let members: Vec<String> = conn.lrange(&grant_key, 0, -1).await.map_err(backend_err)?;

        let mut pipe = redis::pipe();
        pipe.atomic();
        for member in &members {
            pipe.del(self.prefixed(member)).ignore();
        }
        pipe.del(&grant_key).ignore();
        let _: () = pipe.query_async(&mut conn).await.map_err(backend_err)?;

        tracing::debug!(grant_id = %grant_id, members = members.len(), "grant revoked");
        Ok(())
    }

    async fn consume(&self, kind: RecordKind, id: &str) -> StoreResult<bool> {
        if !kind.is_consumable() {
            tracing::debug!(kind = %kind, "consume on non-consumable kind ignored");
            return Ok(false);
        }

        let key = self.prefixed(&keys::primary_key(kind, id));
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        let mut conn = self.conn().await?;

        // Direct field write, no read-modify-write: concurrent consumes
        // converge. HSET against a missing key creates a hash with no
        // expiry, which a live record never has, so a TTL of -1 afterwards
        // means the record was already gone and the write is undone.
        let _: () = conn
            .hset(&key, HASH_CONSUMED, now)
            .await
            .map_err(backend_err)?;
        let ttl: i64 = conn.ttl(&key).await.map_err(backend_err)?;
        if ttl == -1 {
            let _: () = conn.del(&key).await.map_err(backend_err)?;
            return Ok(false);
        }
        Ok(true)
    }
}

impl std::fmt::Debug for RedisAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisAdapter")
            .field("prefix", &self.prefix)
            .field("max_grant_members", &self.max_grant_members)
            .finish_non_exhaustive()
    }
}
