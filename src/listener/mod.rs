//! Listener fan-out.
//!
//! Every tracker event is resolved once into a [`TrackerEvent`] and dispatched
//! to the subscribed [`TrackerListener`]s in registration order.
//!
//! # Concurrency
//!
//! Mutations of the listener list are serialized by a mutex and publish a new
//! immutable snapshot. Dispatch iterates the snapshot without holding any lock,
//! so listeners may subscribe or unsubscribe from inside a callback.
//!
//! # Error Handling
//!
//! A listener that returns an error or panics is logged and skipped; the event
//! still reaches the remaining listeners.


use std::panic::catch_unwind;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::error;
use tracing::warn;

use crate::metrics::LISTENER_FAILURES;
use crate::Handback;
use crate::Notification;
use crate::ObjectLocator;

pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;
pub type ListenerResult = std::result::Result<(), ListenerError>;

/// Event delivered to listeners
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    /// Object started being tracked
    Registered(ObjectLocator),
    /// Object stopped being tracked
    Unregistered(ObjectLocator),
    /// The object's `State` attribute changed
    StateChanged {
        locator: ObjectLocator,
        old_state: Value,
        new_state: Value,
    },
    /// Any other notification emitted by a tracked object
    Notification {
        locator: ObjectLocator,
        notification: Notification,
        handback: Handback,
    },
}

impl TrackerEvent {
    pub fn locator(&self) -> &ObjectLocator {
        match self {
            TrackerEvent::Registered(locator) | TrackerEvent::Unregistered(locator) => locator,
            TrackerEvent::StateChanged { locator, .. } | TrackerEvent::Notification { locator, .. } => {
                locator
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TrackerEvent::Registered(_) => "registered",
            TrackerEvent::Unregistered(_) => "unregistered",
            TrackerEvent::StateChanged { .. } => "state_changed",
            TrackerEvent::Notification { .. } => "notification",
        }
    }
}

/// Subscriber callbacks.
///
/// Implement the per-event methods you care about, or override [`on_event`]
/// to consume the tagged event directly.
///
/// [`on_event`]: TrackerListener::on_event
pub trait TrackerListener: Send + Sync + 'static {
    fn on_registered(
        &self,
        _locator: &ObjectLocator,
    ) -> ListenerResult {
        Ok(())
    }

    fn on_unregistered(
        &self,
        _locator: &ObjectLocator,
    ) -> ListenerResult {
        Ok(())
    }

    fn on_notification(
        &self,
        _locator: &ObjectLocator,
        _notification: &Notification,
        _handback: &Handback,
    ) -> ListenerResult {
        Ok(())
    }

    fn on_state_changed(
        &self,
        _locator: &ObjectLocator,
        _old_state: &Value,
        _new_state: &Value,
    ) -> ListenerResult {
        Ok(())
    }

    fn on_event(
        &self,
        event: &TrackerEvent,
    ) -> ListenerResult {
        match event {
            TrackerEvent::Registered(locator) => self.on_registered(locator),
            TrackerEvent::Unregistered(locator) => self.on_unregistered(locator),
            TrackerEvent::StateChanged {
                locator,
                old_state,
                new_state,
            } => self.on_state_changed(locator, old_state, new_state),
            TrackerEvent::Notification {
                locator,
                notification,
                handback,
            } => self.on_notification(locator, notification, handback),
        }
    }
}

/// Same subscription if both handles point at the same listener instance
pub(crate) fn same_listener(
    a: &Arc<dyn TrackerListener>,
    b: &Arc<dyn TrackerListener>,
) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

#[derive(Default)]
pub(crate) struct ListenerSet {
    snapshot: ArcSwap<Vec<Arc<dyn TrackerListener>>>,
    write_lock: Mutex<()>,
}

impl ListenerSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(
        &self,
        listener: Arc<dyn TrackerListener>,
    ) {
        let _guard = self.write_lock.lock();
        let mut next = Vec::clone(&self.snapshot.load());
        next.push(listener);
        self.snapshot.store(Arc::new(next));
    }

    /// Removes every entry of `listener`; returns how many were removed
    pub(crate) fn remove(
        &self,
        listener: &Arc<dyn TrackerListener>,
    ) -> usize {
        let _guard = self.write_lock.lock();
        let current = self.snapshot.load();
        let next: Vec<_> = current.iter().filter(|l| !same_listener(l, listener)).cloned().collect();
        let removed = current.len() - next.len();
        if removed > 0 {
            self.snapshot.store(Arc::new(next));
        }
        removed
    }

    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<dyn TrackerListener>>> {
        self.snapshot.load_full()
    }

    pub(crate) fn len(&self) -> usize {
        self.snapshot.load().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.snapshot.load().is_empty()
    }

    /// Delivers `event` to every listener subscribed at call time
    pub(crate) fn dispatch(
        &self,
        event: &TrackerEvent,
    ) {
        for listener in self.snapshot().iter() {
            deliver(listener, event);
        }
    }
}

/// Delivers one event to one listener, absorbing its failure
pub(crate) fn deliver(
    listener: &Arc<dyn TrackerListener>,
    event: &TrackerEvent,
) {
    match catch_unwind(AssertUnwindSafe(|| listener.on_event(event))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            LISTENER_FAILURES.with_label_values(&[event.kind()]).inc();
            warn!(object = %event.locator(), event = event.kind(), "listener failed: {}", e);
        }
        Err(_) => {
            LISTENER_FAILURES.with_label_values(&[event.kind()]).inc();
            error!(object = %event.locator(), event = event.kind(), "listener panicked");
        }
    }
}

/// Forwards events into a bounded channel for async consumers.
///
/// Events are offered with `try_send`: a full buffer or a dropped receiver is
/// reported as a listener failure and the event is lost for this consumer.
pub struct ChannelListener {
    tx: mpsc::Sender<TrackerEvent>,
}

impl ChannelListener {
    pub fn new(buffer: usize) -> (Arc<Self>, mpsc::Receiver<TrackerEvent>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Arc::new(Self { tx }), rx)
    }
}

impl TrackerListener for ChannelListener {
    fn on_event(
        &self,
        event: &TrackerEvent,
    ) -> ListenerResult {
        self.tx.try_send(event.clone()).map_err(|e| e.to_string().into())
    }
}
