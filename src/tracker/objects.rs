use tracing::debug;
use tracing::trace;

use super::tracker::TrackerInner;
use crate::metrics::OBJECTS_REGISTERED;
use crate::metrics::OBJECTS_UNREGISTERED;
use crate::Handback;
use crate::ListenerTarget;
use crate::ObjectLocator;
use crate::ObjectName;
use crate::ServerError;
use crate::ServerLocator;
use crate::TrackerEvent;

impl TrackerInner {
    pub(crate) async fn add_object(
        &self,
        server: &ServerLocator,
        name: ObjectName,
    ) -> bool {
        let locator = ObjectLocator::new(server.clone(), name);
        if !self.registry.insert_object(&locator) {
            trace!(object = %locator, "already tracked or server not attached");
            return false;
        }
        OBJECTS_REGISTERED.inc();
        debug!(object = %locator, "object registered");

        self.attach_object_listener(&locator).await;
        self.listeners.dispatch(&TrackerEvent::Registered(locator));
        true
    }

    pub(crate) async fn remove_object(
        &self,
        server: &ServerLocator,
        name: ObjectName,
    ) -> bool {
        let locator = ObjectLocator::new(server.clone(), name);
        if !self.registry.remove_object(&locator) {
            trace!(object = %locator, "not tracked");
            return false;
        }
        OBJECTS_UNREGISTERED.inc();
        debug!(object = %locator, "object unregistered");

        self.detach_object_listener(&locator).await;
        self.listeners.dispatch(&TrackerEvent::Unregistered(locator));
        true
    }

    /// Best effort: many objects do not emit notifications at all.
    async fn attach_object_listener(
        &self,
        locator: &ObjectLocator,
    ) {
        let result = locator
            .server()
            .handle()
            .add_notification_listener(
                ListenerTarget::Object(locator.name().clone()),
                self.notification_filter.clone(),
                Handback::Object(locator.clone()),
                self.handler.clone(),
            )
            .await;
        if let Err(e) = result {
            trace!(object = %locator, "no object listener attached: {}", e);
        }
    }

    async fn detach_object_listener(
        &self,
        locator: &ObjectLocator,
    ) {
        let result = locator
            .server()
            .handle()
            .remove_notification_listener(
                ListenerTarget::Object(locator.name().clone()),
                Handback::Object(locator.clone()),
            )
            .await;
        match result {
            Ok(()) => {}
            Err(e) if e.is_expected_on_detach() => {}
            Err(ServerError::NotificationsUnsupported(_)) => {}
            Err(e) => debug!(object = %locator, "failed to detach object listener: {}", e),
        }
    }
}
