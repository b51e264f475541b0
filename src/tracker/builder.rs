//! A builder for assembling a [`Tracker`].
//!
//! ## Example
//! ```ignore
//! let tracker = Tracker::builder(local_server)
//!     .classes(["Monitorable"])
//!     .network_registry(registry)
//!     .forward_notifications(true)
//!     .listener(my_listener)
//!     .build()
//!     .await?;
//! ```
//!
//! `build()` discovers the local server, then (unless local-only) subscribes
//! to the network registry and discovers every remote server it already
//! knows. Initial listeners are subscribed before discovery starts, so they
//! observe every `registered` event live.

use std::sync::Arc;

use tracing::info;

use super::tracker::TrackerInner;
use super::tracker::TrackerSettings;
use crate::DiscoveryError;
use crate::NetworkRegistry;
use crate::NotificationFilter;
use crate::ObjectFilter;
use crate::ObjectPredicate;
use crate::Result;
use crate::ServerLocator;
use crate::Tracker;
use crate::TrackerConfig;
use crate::TrackerListener;

pub struct TrackerBuilder {
    local: ServerLocator,
    classes: Vec<String>,
    predicate: Option<Arc<dyn ObjectPredicate>>,
    local_only: bool,
    network: Option<Arc<dyn NetworkRegistry>>,
    notification_filter: Option<NotificationFilter>,
    forward_notifications: bool,
    listeners: Vec<Arc<dyn TrackerListener>>,
}

impl TrackerBuilder {
    pub fn new(local: ServerLocator) -> Self {
        Self {
            local,
            classes: Vec::new(),
            predicate: None,
            local_only: false,
            network: None,
            notification_filter: None,
            forward_notifications: false,
            listeners: Vec::new(),
        }
    }

    /// Applies a loaded configuration; later setter calls still override it
    pub fn with_config(
        mut self,
        config: &TrackerConfig,
    ) -> Self {
        self.classes = config.filter.classes.clone();
        self.local_only = config.discovery.local_only;
        self.forward_notifications = config.notification.forward;
        self.notification_filter = config.notification.filter();
        self
    }

    /// Track objects implementing any of `classes`
    pub fn classes<I, S>(
        mut self,
        classes: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classes = classes.into_iter().map(Into::into).collect();
        self
    }

    /// Additional caller expression, ANDed with the class test
    pub fn predicate(
        mut self,
        predicate: Arc<dyn ObjectPredicate>,
    ) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn local_only(
        mut self,
        local_only: bool,
    ) -> Self {
        self.local_only = local_only;
        self
    }

    pub fn network_registry(
        mut self,
        network: Arc<dyn NetworkRegistry>,
    ) -> Self {
        self.network = Some(network);
        self
    }

    /// Filter passed to every per-object listener
    pub fn notification_filter(
        mut self,
        filter: NotificationFilter,
    ) -> Self {
        self.notification_filter = Some(filter);
        self
    }

    /// Relay generic object notifications to listeners
    pub fn forward_notifications(
        mut self,
        forward: bool,
    ) -> Self {
        self.forward_notifications = forward;
        self
    }

    pub fn listener(
        mut self,
        listener: Arc<dyn TrackerListener>,
    ) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Assembles the tracker and runs initial discovery.
    ///
    /// # Errors
    /// Fails when network-wide tracking is requested without a network
    /// registry, or when subscribing to the registry fails.
    pub async fn build(self) -> Result<Tracker> {
        if !self.local_only && self.network.is_none() {
            return Err(DiscoveryError::NetworkRegistryNotFound.into());
        }

        let inner = TrackerInner::new(TrackerSettings {
            local: self.local,
            filter: ObjectFilter::new(self.classes, self.predicate),
            notification_filter: self.notification_filter,
            forward_notifications: self.forward_notifications,
            local_only: self.local_only,
            network: self.network,
        });
        for listener in self.listeners {
            inner.listeners.add(listener);
        }

        info!(
            local = %inner.local.id(),
            filter = ?inner.filter,
            local_only = inner.local_only,
            "starting tracker"
        );
        inner.found_server(inner.local.clone()).await;
        if !inner.local_only {
            inner.start_network_discovery().await?;
        }

        Ok(Tracker { inner })
    }
}
