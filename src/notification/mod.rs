//! Notification model shared by management servers, the network registry and
//! the tracker's router.
//!
//! A [`Notification`] is tagged once with a [`NotificationPayload`] so the
//! router can classify it without inspecting runtime types.


use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde_json::Value;

use crate::constants::ATTRIBUTE_CHANGE_TYPE;
use crate::constants::OBJECT_REGISTERED_TYPE;
use crate::constants::OBJECT_UNREGISTERED_TYPE;
use crate::constants::SERVER_ADDED_TYPE;
use crate::constants::SERVER_REMOVED_TYPE;
use crate::ObjectLocator;
use crate::ObjectName;
use crate::ServerId;
use crate::ServerLocator;

/// Where a notification originated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationSource {
    /// Raw object identity, resolved against the handback server on delivery
    Object(ObjectName),
    /// Already resolved locator
    Locator(ObjectLocator),
}

/// Connection details of a server announced by the network registry
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ServerInfo {
    pub id: ServerId,
    pub address: String,
}

/// An object joined or left a server's population
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopulationChange {
    Registered(ObjectName),
    Unregistered(ObjectName),
}

/// A server joined or left the network
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkChange {
    Added(ServerInfo),
    Removed(ServerId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeChange {
    pub attribute: String,
    pub old_value: Value,
    pub new_value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationPayload {
    Population(PopulationChange),
    Network(NetworkChange),
    AttributeChange(AttributeChange),
    Generic(Option<Value>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub notification_type: String,
    pub source: NotificationSource,
    pub sequence: u64,
    pub timestamp_ms: u64,
    pub message: Option<String>,
    pub payload: NotificationPayload,
}

impl Notification {
    pub fn new(
        notification_type: impl Into<String>,
        source: NotificationSource,
        sequence: u64,
        payload: NotificationPayload,
    ) -> Self {
        Self {
            notification_type: notification_type.into(),
            source,
            sequence,
            timestamp_ms: now_ms(),
            message: None,
            payload,
        }
    }

    pub fn with_message(
        mut self,
        message: impl Into<String>,
    ) -> Self {
        self.message = Some(message.into());
        self
    }

    /// An object was registered with the server whose delegate is `delegate`
    pub fn object_registered(
        delegate: ObjectName,
        object: ObjectName,
        sequence: u64,
    ) -> Self {
        Self::new(
            OBJECT_REGISTERED_TYPE,
            NotificationSource::Object(delegate),
            sequence,
            NotificationPayload::Population(PopulationChange::Registered(object)),
        )
    }

    pub fn object_unregistered(
        delegate: ObjectName,
        object: ObjectName,
        sequence: u64,
    ) -> Self {
        Self::new(
            OBJECT_UNREGISTERED_TYPE,
            NotificationSource::Object(delegate),
            sequence,
            NotificationPayload::Population(PopulationChange::Unregistered(object)),
        )
    }

    pub fn server_added(
        registry: ObjectName,
        info: ServerInfo,
        sequence: u64,
    ) -> Self {
        Self::new(
            SERVER_ADDED_TYPE,
            NotificationSource::Object(registry),
            sequence,
            NotificationPayload::Network(NetworkChange::Added(info)),
        )
    }

    pub fn server_removed(
        registry: ObjectName,
        server_id: ServerId,
        sequence: u64,
    ) -> Self {
        Self::new(
            SERVER_REMOVED_TYPE,
            NotificationSource::Object(registry),
            sequence,
            NotificationPayload::Network(NetworkChange::Removed(server_id)),
        )
    }

    pub fn attribute_changed(
        source: NotificationSource,
        attribute: impl Into<String>,
        old_value: Value,
        new_value: Value,
        sequence: u64,
    ) -> Self {
        Self::new(
            ATTRIBUTE_CHANGE_TYPE,
            source,
            sequence,
            NotificationPayload::AttributeChange(AttributeChange {
                attribute: attribute.into(),
                old_value,
                new_value,
            }),
        )
    }

    pub fn generic(
        notification_type: impl Into<String>,
        source: NotificationSource,
        user_data: Option<Value>,
        sequence: u64,
    ) -> Self {
        Self::new(
            notification_type,
            source,
            sequence,
            NotificationPayload::Generic(user_data),
        )
    }
}

/// Opaque value supplied when a listener is attached and handed back on
/// every delivery through that listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handback {
    /// Server-wide population listener
    Server(ServerLocator),
    /// Per-object listener
    Object(ObjectLocator),
    /// Network registry gain/loss subscription
    Network,
}

impl Handback {
    /// The server the delivering listener was attached to, if any
    pub fn server(&self) -> Option<&ServerLocator> {
        match self {
            Handback::Server(server) => Some(server),
            Handback::Object(locator) => Some(locator.server()),
            Handback::Network => None,
        }
    }
}

/// Server-side filter: only the listed notification types are delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationFilter {
    enabled_types: Vec<String>,
}

impl NotificationFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable_type(
        mut self,
        notification_type: impl Into<String>,
    ) -> Self {
        let notification_type = notification_type.into();
        if !self.enabled_types.contains(&notification_type) {
            self.enabled_types.push(notification_type);
        }
        self
    }

    pub fn enabled_types(&self) -> &[String] {
        &self.enabled_types
    }

    /// Filter used for the server-wide listener: population changes only
    pub fn population() -> Self {
        Self::new()
            .enable_type(OBJECT_REGISTERED_TYPE)
            .enable_type(OBJECT_UNREGISTERED_TYPE)
    }

    pub fn is_enabled(
        &self,
        notification: &Notification,
    ) -> bool {
        self.enabled_types.iter().any(|t| *t == notification.notification_type)
    }
}

/// Receiver of notifications delivered by a server transport.
///
/// Implementations must not fail: anything that goes wrong while handling a
/// notification is logged and absorbed.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NotificationHandler: Send + Sync + 'static {
    async fn handle_notification(
        &self,
        notification: Notification,
        handback: Handback,
    );
}

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
