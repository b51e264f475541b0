//! The [`Tracker`]: a live, deduplicated view of every object matching a
//! filter across a changing set of management servers.
//!
//! ## Control flow
//! ```text
//! discovery ──> found_server ──> attach population listener + scan
//!                                   │
//!                                   v
//!                             add_object ──> registry ──> listeners (registered)
//!
//! server transport ──> RouterHandle ──> handle_notification ──> classify ──> apply
//! ```
//!
//! The tracker has no scheduler of its own. All work runs on the task that
//! builds it or on the notification-delivery tasks of the server transports.

use std::collections::hash_set;
use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Weak;

use async_trait::async_trait;
use tracing::debug;
use tracing::trace;

use super::TrackerBuilder;
use crate::listener::deliver;
use crate::listener::ListenerSet;
use crate::registry::TrackerRegistry;
use crate::Handback;
use crate::NetworkRegistry;
use crate::Notification;
use crate::NotificationFilter;
use crate::NotificationHandler;
use crate::ObjectFilter;
use crate::ObjectLocator;
use crate::ObjectName;
use crate::ServerId;
use crate::ServerLocator;
use crate::TrackerEvent;
use crate::TrackerListener;

/// Handle to a running tracker. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Tracker {
    pub(crate) inner: Arc<TrackerInner>,
}

pub(crate) struct TrackerInner {
    pub(crate) local: ServerLocator,
    pub(crate) filter: ObjectFilter,
    /// Passed to every per-object listener
    pub(crate) notification_filter: Option<NotificationFilter>,
    pub(crate) forward_notifications: bool,
    pub(crate) local_only: bool,
    pub(crate) network: Option<Arc<dyn NetworkRegistry>>,

    pub(crate) registry: TrackerRegistry,
    pub(crate) listeners: ListenerSet,
    pub(crate) destroyed: AtomicBool,

    /// Given to servers when attaching listeners
    pub(crate) handler: Arc<dyn NotificationHandler>,
}

pub(crate) struct TrackerSettings {
    pub(crate) local: ServerLocator,
    pub(crate) filter: ObjectFilter,
    pub(crate) notification_filter: Option<NotificationFilter>,
    pub(crate) forward_notifications: bool,
    pub(crate) local_only: bool,
    pub(crate) network: Option<Arc<dyn NetworkRegistry>>,
}

impl TrackerInner {
    pub(crate) fn new(settings: TrackerSettings) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<TrackerInner>| TrackerInner {
            local: settings.local,
            filter: settings.filter,
            notification_filter: settings.notification_filter,
            forward_notifications: settings.forward_notifications,
            local_only: settings.local_only,
            network: settings.network,
            registry: TrackerRegistry::new(),
            listeners: ListenerSet::new(),
            destroyed: AtomicBool::new(false),
            handler: Arc::new(RouterHandle { inner: weak.clone() }),
        })
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }
}

/// Notification entry point handed to server transports.
///
/// Holds the tracker weakly so remote subscriptions never keep a dropped
/// tracker alive.
struct RouterHandle {
    inner: Weak<TrackerInner>,
}

#[async_trait]
impl NotificationHandler for RouterHandle {
    async fn handle_notification(
        &self,
        notification: Notification,
        handback: Handback,
    ) {
        match self.inner.upgrade() {
            Some(inner) => inner.handle_notification(notification, handback).await,
            None => trace!(
                notification_type = %notification.notification_type,
                "tracker dropped, notification ignored"
            ),
        }
    }
}

impl Tracker {
    /// Starts configuring a tracker rooted at the local server
    pub fn builder(local: ServerLocator) -> TrackerBuilder {
        TrackerBuilder::new(local)
    }

    pub fn local_server(&self) -> &ServerLocator {
        &self.inner.local
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Number of objects currently tracked across all servers
    pub fn count(&self) -> usize {
        self.inner.registry.count()
    }

    /// Snapshot of every tracked object
    pub fn tracked_objects(&self) -> HashSet<ObjectLocator> {
        self.inner.registry.snapshot()
    }

    /// Iterates a snapshot taken at call time
    pub fn iter(&self) -> hash_set::IntoIter<ObjectLocator> {
        self.tracked_objects().into_iter()
    }

    pub fn contains(
        &self,
        locator: &ObjectLocator,
    ) -> bool {
        self.inner.registry.contains_object(locator)
    }

    /// Servers currently attached
    pub fn servers(&self) -> Vec<ServerLocator> {
        self.inner.registry.servers()
    }

    /// Snapshot of one server's tracked objects, `None` if it is not attached
    pub fn tracked_objects_on(
        &self,
        server_id: &ServerId,
    ) -> Option<HashSet<ObjectLocator>> {
        self.inner.registry.objects_on(server_id)
    }

    /// Subscribes `listener`.
    ///
    /// With `catch_up`, the listener first receives a `registered` event for
    /// every object already tracked, so it observes the same state as a
    /// listener present from the start.
    pub fn add_listener(
        &self,
        listener: Arc<dyn TrackerListener>,
        catch_up: bool,
    ) {
        self.inner.listeners.add(listener.clone());
        if catch_up {
            let known = self.inner.registry.snapshot();
            debug!(objects = known.len(), "catching up new listener");
            for locator in known {
                deliver(&listener, &TrackerEvent::Registered(locator));
            }
        }
    }

    /// Unsubscribes every registration of `listener`; returns whether any existed
    pub fn remove_listener(
        &self,
        listener: &Arc<dyn TrackerListener>,
    ) -> bool {
        self.inner.listeners.remove(listener) > 0
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// Attaches to `server` and scans it. No-op if already attached.
    ///
    /// Returns true when the server ends up newly attached.
    pub async fn found_server(
        &self,
        server: ServerLocator,
    ) -> bool {
        self.inner.found_server(server).await
    }

    /// Drops every object of the server and fires `unregistered` for each.
    ///
    /// Returns how many objects were dropped.
    pub fn lost_server(
        &self,
        server_id: &ServerId,
    ) -> usize {
        self.inner.lost_server(server_id)
    }

    /// Starts tracking `name` on `server`; returns false for duplicates
    pub async fn add_object(
        &self,
        server: &ServerLocator,
        name: ObjectName,
    ) -> bool {
        self.inner.add_object(server, name).await
    }

    /// Stops tracking `name` on `server`; returns false if it was not tracked
    pub async fn remove_object(
        &self,
        server: &ServerLocator,
        name: ObjectName,
    ) -> bool {
        self.inner.remove_object(server, name).await
    }

    pub async fn handle_notification(
        &self,
        notification: Notification,
        handback: Handback,
    ) {
        self.inner.handle_notification(notification, handback).await
    }

    /// Entry point to hand to transports that deliver notifications
    pub fn notification_handler(&self) -> Arc<dyn NotificationHandler> {
        self.inner.handler.clone()
    }

    /// Detaches from the network registry. Later server gain/loss
    /// notifications are ignored. Per-object and per-server listeners are left
    /// in place.
    pub async fn destroy(&self) {
        self.inner.destroy().await
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.is_destroyed()
    }
}

impl IntoIterator for &Tracker {
    type Item = ObjectLocator;
    type IntoIter = hash_set::IntoIter<ObjectLocator>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl std::fmt::Debug for Tracker {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("local", &self.inner.local)
            .field("filter", &self.inner.filter)
            .field("local_only", &self.inner.local_only)
            .field("count", &self.count())
            .finish()
    }
}
