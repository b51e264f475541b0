//! Notification router.
//!
//! Every inbound notification is classified once into a [`Route`], in this
//! precedence order:
//!
//! 1. population change on a server -> add/remove object
//! 2. network added/removed, delivered through the registry subscription ->
//!    found/lost server
//! 3. `State` attribute change of an object -> typed state-change event
//! 4. anything else -> generic notification, when forwarding is enabled
//!
//! Nothing raised while handling a notification escapes the router.

use serde_json::Value;
use tracing::debug;
use tracing::trace;

use super::tracker::TrackerInner;
use crate::constants::STATE_ATTRIBUTE;
use crate::metrics::NOTIFICATIONS_ROUTED;
use crate::Handback;
use crate::NetworkChange;
use crate::Notification;
use crate::NotificationPayload;
use crate::NotificationSource;
use crate::ObjectLocator;
use crate::ObjectName;
use crate::PopulationChange;
use crate::ServerId;
use crate::ServerInfo;
use crate::ServerLocator;
use crate::TrackerEvent;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Route {
    AddObject(ServerLocator, ObjectName),
    RemoveObject(ServerLocator, ObjectName),
    ServerAdded(ServerInfo),
    ServerRemoved(ServerId),
    StateChanged {
        locator: ObjectLocator,
        old_state: Value,
        new_state: Value,
    },
    Forward(ObjectLocator),
    Ignore(&'static str),
}

impl Route {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Route::AddObject(..) => "add_object",
            Route::RemoveObject(..) => "remove_object",
            Route::ServerAdded(_) => "server_added",
            Route::ServerRemoved(_) => "server_removed",
            Route::StateChanged { .. } => "state_changed",
            Route::Forward(_) => "forward",
            Route::Ignore(_) => "ignored",
        }
    }
}

/// Resolves the notification source to a locator, using the handback server
/// when only a raw object name is present.
fn resolve_source(
    source: &NotificationSource,
    handback: &Handback,
) -> Option<ObjectLocator> {
    match source {
        NotificationSource::Locator(locator) => Some(locator.clone()),
        NotificationSource::Object(name) => handback
            .server()
            .map(|server| ObjectLocator::new(server.clone(), name.clone())),
    }
}

impl TrackerInner {
    pub(crate) fn classify(
        &self,
        notification: &Notification,
        handback: &Handback,
    ) -> Route {
        match &notification.payload {
            NotificationPayload::Population(change) => {
                let Some(server) = handback.server() else {
                    return Route::Ignore("population change without a server handback");
                };
                match change {
                    PopulationChange::Registered(name) => Route::AddObject(server.clone(), name.clone()),
                    PopulationChange::Unregistered(name) => Route::RemoveObject(server.clone(), name.clone()),
                }
            }

            NotificationPayload::Network(change) => {
                if *handback != Handback::Network {
                    return Route::Ignore("network change outside the registry subscription");
                }
                if self.local_only {
                    return Route::Ignore("network change on a local-only tracker");
                }
                if self.is_destroyed() {
                    return Route::Ignore("network change after destroy");
                }
                match change {
                    NetworkChange::Added(info) => Route::ServerAdded(info.clone()),
                    NetworkChange::Removed(server_id) => Route::ServerRemoved(server_id.clone()),
                }
            }

            NotificationPayload::AttributeChange(change) if change.attribute == STATE_ATTRIBUTE => {
                match resolve_source(&notification.source, handback) {
                    Some(locator) if !self.listeners.is_empty() => Route::StateChanged {
                        locator,
                        old_state: change.old_value.clone(),
                        new_state: change.new_value.clone(),
                    },
                    Some(_) => Route::Ignore("state change without listeners"),
                    None => self.classify_generic(notification, handback),
                }
            }

            _ => self.classify_generic(notification, handback),
        }
    }

    fn classify_generic(
        &self,
        notification: &Notification,
        handback: &Handback,
    ) -> Route {
        if !self.forward_notifications {
            return Route::Ignore("forwarding disabled");
        }
        if self.listeners.is_empty() {
            return Route::Ignore("no listeners");
        }
        match resolve_source(&notification.source, handback) {
            Some(locator) => Route::Forward(locator),
            None => Route::Ignore("source cannot be resolved to an object"),
        }
    }

    pub(crate) async fn handle_notification(
        &self,
        notification: Notification,
        handback: Handback,
    ) {
        let route = self.classify(&notification, &handback);
        NOTIFICATIONS_ROUTED.with_label_values(&[route.kind()]).inc();
        trace!(
            notification_type = %notification.notification_type,
            sequence = notification.sequence,
            route = route.kind(),
            "routing notification"
        );

        match route {
            Route::AddObject(server, name) => {
                if self.filter.matches(&server, &name).await {
                    self.add_object(&server, name).await;
                }
            }
            Route::RemoveObject(server, name) => {
                self.remove_object(&server, name).await;
            }
            Route::ServerAdded(info) => {
                self.server_added(info).await;
            }
            Route::ServerRemoved(server_id) => {
                self.lost_server(&server_id);
            }
            Route::StateChanged {
                locator,
                old_state,
                new_state,
            } => {
                self.listeners.dispatch(&TrackerEvent::StateChanged {
                    locator,
                    old_state,
                    new_state,
                });
            }
            Route::Forward(locator) => {
                self.listeners.dispatch(&TrackerEvent::Notification {
                    locator,
                    notification,
                    handback,
                });
            }
            Route::Ignore(reason) => {
                debug!(
                    notification_type = %notification.notification_type,
                    "notification ignored: {}",
                    reason
                );
            }
        }
    }
}
