//! # oidc-store
//!
//! Storage contract for the short-lived identity and authorization artifacts
//! an OIDC/OAuth authorization server issues: codes, tokens, grants,
//! sessions, device-flow records, interaction state.
//!
//! This crate defines the traits and types that all storage backends must
//! implement. It does not contain any I/O - backends are provided by
//! separate crates.
//!
//! ## Overview
//!
//! The main trait is [`Adapter`], which defines the contract for:
//! - upsert with per-record expiry and derived secondary indices
//! - primary and secondary-key lookups (`find`, `find_by_user_code`,
//!   `find_by_uid`)
//! - cascading revocation of everything sharing a grant
//!   (`revoke_by_grant_id`)
//! - one-way consumption marking without deletion (`consume`)
//!
//! ## Modules
//!
//! - [`kind`] - the closed enumeration of record kinds
//! - [`keys`] - pure back-end key derivation
//! - [`payload`] - the caller-supplied payload object
//! - [`adapter`] - the backend trait
//! - [`store`] - per-kind handles over a shared backend
//! - [`error`] - the error taxonomy
//!
//! ## Storage Backends
//!
//! To implement a storage backend, implement the [`Adapter`] trait:
//!
//! ```ignore
//! use async_trait::async_trait;
//! use oidc_store::{Adapter, RecordKind, RecordPayload, StoreResult};
//!
//! struct MyAdapter { /* ... */ }
//!
//! #[async_trait]
//! impl Adapter for MyAdapter {
//!     async fn upsert(
//!         &self,
//!         kind: RecordKind,
//!         id: &str,
//!         payload: &RecordPayload,
//!         expires_in: std::time::Duration,
//!     ) -> StoreResult<()> {
//!         // Implementation
//!     }
//!     // ... other methods
//! }
//! ```

pub mod adapter;
pub mod error;
pub mod keys;
pub mod kind;
pub mod payload;
pub mod store;

pub use adapter::{Adapter, DynAdapter};
pub use error::{ErrorCategory, StoreError};
pub use kind::{RecordKind, UnknownKind};
pub use payload::{
    FIELD_CONSUMED, FIELD_GRANT_ID, FIELD_UID, FIELD_USER_CODE, RecordPayload,
};
pub use store::KindStore;

/// Type alias for a store result.
pub type StoreResult<T> = Result<T, StoreError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use oidc_store::prelude::*;
/// ```
pub mod prelude {
    pub use crate::adapter::{Adapter, DynAdapter};
    pub use crate::error::{ErrorCategory, StoreError};
    pub use crate::keys::{grant_key, primary_key, uid_key, user_code_key};
    pub use crate::kind::RecordKind;
    pub use crate::payload::RecordPayload;
    pub use crate::store::KindStore;
    pub use crate::StoreResult;
}
