//! In-memory storage backend for oidc-store.
//!
//! This crate provides an in-memory implementation of the `Adapter` trait
//! from `oidc-store`, holding all state behind a single async `RwLock` so
//! that each mutating operation is one atomic batch. Expired entries are
//! dropped lazily.
//!
//! # Example
//!
//! ```ignore
//! use oidc_store::{Adapter, RecordKind, RecordPayload};
//! use oidc_store_memory::InMemoryAdapter;
//! use std::time::Duration;
//!
//! let adapter = InMemoryAdapter::new();
//! let payload = RecordPayload::from_value(serde_json::json!({
//!     "grantId": "grant-1",
//! }))?;
//! adapter
//!     .upsert(RecordKind::AccessToken, "token-1", &payload, Duration::from_secs(600))
//!     .await?;
//! ```

pub mod adapter;

// Re-export the Adapter trait for convenience
pub use oidc_store::{Adapter, RecordKind, RecordPayload, StoreError};

pub use adapter::InMemoryAdapter;

/// Creates a new in-memory adapter as a shareable trait object.
pub fn create_adapter() -> oidc_store::DynAdapter {
    std::sync::Arc::new(InMemoryAdapter::new())
}
