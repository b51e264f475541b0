//! Tracker Error Hierarchy
//!
//! Defines the error types surfaced by the tracker, split by where they come
//! from: the remote management servers, server discovery, and configuration.
//!
//! Most failures are absorbed and logged inside the tracker. Only construction
//! time failures (for example a missing network registry) reach the caller.

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failures reported by a management server or the network registry
    #[error(transparent)]
    Server(#[from] ServerError),

    /// Server discovery failures
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// Configuration loading failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Configuration validation failures
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Unrecoverable failures
    #[error("Fatal error: {0}")]
    Fatal(String),
}

/// Outcome taxonomy of a call into a management server.
///
/// Attach and detach of notification listeners are allowed to fail; the
/// variants below make the expected outcomes explicit so callers do not have
/// to inspect error messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServerError {
    /// Server temporarily unreachable
    #[error("Connection to server failed: {0}")]
    ConnectionFailed(String),

    /// Target object no longer exists, or the listener was never attached
    #[error("Not found: {0}")]
    NotFound(String),

    /// Target object does not emit notifications
    #[error("Notifications not supported by {0}")]
    NotificationsUnsupported(String),

    /// Query or introspection failure
    #[error("Query failed: {0}")]
    Query(String),

    #[error("{0}")]
    Other(String),
}

impl ServerError {
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, ServerError::ConnectionFailed(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ServerError::NotFound(_))
    }

    /// Detach outcomes that are expected when objects or servers go away
    pub(crate) fn is_expected_on_detach(&self) -> bool {
        self.is_connection_failure() || self.is_not_found()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// Network-wide tracking was requested without a network registry
    #[error("No network registry found, required unless tracking local servers only")]
    NetworkRegistryNotFound,

    /// Subscribing to the network registry's gain/loss channel failed
    #[error("Failed to subscribe to network registry: {source}")]
    SubscriptionFailed {
        #[source]
        source: ServerError,
    },

    /// Connecting to a server announced by the network registry failed
    #[error("Failed to connect to server {server_id}: {source}")]
    ConnectFailed {
        server_id: String,
        #[source]
        source: ServerError,
    },
}
