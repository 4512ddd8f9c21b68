//! Record kind enumeration.
//!
//! Every stored artifact belongs to exactly one kind, fixed at the set of
//! models an OIDC provider persists. The kind decides two things:
//!
//! - the primary-key namespace (`<kind>:<id>`)
//! - the storage shape: consumable kinds are stored as a structured record
//!   with a one-way `consumed` marker, everything else as an opaque blob

use std::fmt;
use std::str::FromStr;

/// The fixed set of record kinds an authorization server persists.
///
/// Kind names follow the provider's model names verbatim; they appear as-is
/// in the back-end key space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// A persisted grant (the logical grouping other artifacts reference).
    Grant,
    /// A browser session.
    Session,
    /// An issued access token.
    AccessToken,
    /// An authorization code awaiting exchange.
    AuthorizationCode,
    /// A refresh token.
    RefreshToken,
    /// A client-credentials token.
    ClientCredentials,
    /// A dynamically registered client.
    Client,
    /// An initial access token for dynamic registration.
    InitialAccessToken,
    /// A registration access token for dynamic registration management.
    RegistrationAccessToken,
    /// A device-flow code record.
    DeviceCode,
    /// Interaction state for a login/consent flow in progress.
    Interaction,
    /// A replay-detection entry.
    ReplayDetection,
    /// A pushed authorization request.
    PushedAuthorizationRequest,
}

impl RecordKind {
    /// All record kinds, for iteration in tests and diagnostics.
    pub const ALL: [RecordKind; 13] = [
        RecordKind::Grant,
        RecordKind::Session,
        RecordKind::AccessToken,
        RecordKind::AuthorizationCode,
        RecordKind::RefreshToken,
        RecordKind::ClientCredentials,
        RecordKind::Client,
        RecordKind::InitialAccessToken,
        RecordKind::RegistrationAccessToken,
        RecordKind::DeviceCode,
        RecordKind::Interaction,
        RecordKind::ReplayDetection,
        RecordKind::PushedAuthorizationRequest,
    ];

    /// Returns `true` if records of this kind carry a one-way `consumed`
    /// marker and are therefore stored as a structured record rather than
    /// an opaque blob.
    #[must_use]
    pub fn is_consumable(self) -> bool {
        matches!(
            self,
            Self::AuthorizationCode | Self::RefreshToken | Self::DeviceCode
        )
    }

    /// The kind's name as used in back-end keys.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grant => "Grant",
            Self::Session => "Session",
            Self::AccessToken => "AccessToken",
            Self::AuthorizationCode => "AuthorizationCode",
            Self::RefreshToken => "RefreshToken",
            Self::ClientCredentials => "ClientCredentials",
            Self::Client => "Client",
            Self::InitialAccessToken => "InitialAccessToken",
            Self::RegistrationAccessToken => "RegistrationAccessToken",
            Self::DeviceCode => "DeviceCode",
            Self::Interaction => "Interaction",
            Self::ReplayDetection => "ReplayDetection",
            Self::PushedAuthorizationRequest => "PushedAuthorizationRequest",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown kind name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown record kind: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for RecordKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}
