//! Redis storage backend for oidc-store.
//!
//! This crate provides a Redis implementation of the `Adapter` trait from
//! `oidc-store`, using `deadpool-redis` connection pools. Upserts and
//! cascading revocations run as atomic MULTI/EXEC pipelines; record expiry
//! is delegated to Redis key TTLs.
//!
//! # Example
//!
//! ```ignore
//! use oidc_store::{Adapter, KindStore, RecordKind};
//! use oidc_store_redis::{RedisAdapter, RedisStoreConfig};
//!
//! let config = RedisStoreConfig {
//!     url: "redis://localhost:6379".into(),
//!     ..Default::default()
//! };
//! let adapter = std::sync::Arc::new(RedisAdapter::connect(&config)?);
//! let sessions = KindStore::new(RecordKind::Session, adapter);
//! ```

pub mod adapter;
pub mod config;

// Re-export the Adapter trait for convenience
pub use oidc_store::{Adapter, RecordKind, RecordPayload, StoreError};

pub use adapter::RedisAdapter;
pub use config::RedisStoreConfig;

/// Creates a pooled Redis adapter as a shareable trait object.
///
/// # Errors
///
/// Returns a backend error if the configuration is invalid or the pool
/// cannot be created.
pub fn create_adapter(config: &RedisStoreConfig) -> oidc_store::StoreResult<oidc_store::DynAdapter> {
    Ok(std::sync::Arc::new(RedisAdapter::connect(config)?))
}
