//! Collaborator interfaces the tracker is driven through.
//!
//! The tracker never talks to a transport directly. A [`ManagementServer`]
//! handle answers queries about the objects it hosts and delivers their
//! notifications, and a [`NetworkRegistry`] announces servers joining or
//! leaving the network.

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde_json::Value;

use crate::Handback;
use crate::NotificationFilter;
use crate::NotificationHandler;
use crate::ObjectName;
use crate::ServerError;
use crate::ServerInfo;

pub type ServerResult<T> = std::result::Result<T, ServerError>;

/// What a notification listener is attached to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerTarget {
    /// The server delegate, which emits population changes
    Server,
    /// A single hosted object
    Object(ObjectName),
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ManagementServer: Send + Sync + 'static {
    /// Whether `object` is an instance of any of `classes`
    async fn implements_any(
        &self,
        object: &ObjectName,
        classes: &[String],
    ) -> ServerResult<bool>;

    /// Names of every object currently hosted by the server
    async fn query_names(&self) -> ServerResult<Vec<ObjectName>>;

    /// Attach `handler`; every delivery through it carries `handback`.
    ///
    /// Objects that do not emit notifications answer
    /// [`ServerError::NotificationsUnsupported`].
    async fn add_notification_listener(
        &self,
        target: ListenerTarget,
        filter: Option<NotificationFilter>,
        handback: Handback,
        handler: Arc<dyn NotificationHandler>,
    ) -> ServerResult<()>;

    /// Detach the listener previously attached with `handback`
    async fn remove_notification_listener(
        &self,
        target: ListenerTarget,
        handback: Handback,
    ) -> ServerResult<()>;

    async fn get_attribute(
        &self,
        object: &ObjectName,
        attribute: &str,
    ) -> ServerResult<Value>;
}

/// Cluster-wide announcer of management servers
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NetworkRegistry: Send + Sync + 'static {
    /// Remote servers already known to the registry
    async fn servers(&self) -> ServerResult<Vec<ServerInfo>>;

    /// Build a handle for an announced server
    async fn connect(
        &self,
        info: &ServerInfo,
    ) -> ServerResult<Arc<dyn ManagementServer>>;

    /// Subscribe to server added/removed notifications
    async fn subscribe(
        &self,
        handler: Arc<dyn NotificationHandler>,
        handback: Handback,
    ) -> ServerResult<()>;

    async fn unsubscribe(
        &self,
        handback: Handback,
    ) -> ServerResult<()>;
}
