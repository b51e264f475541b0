use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::ListenerResult;
use crate::ObjectLocator;
use crate::TrackerEvent;
use crate::TrackerListener;

/// Captures every event in delivery order
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<TrackerEvent>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<TrackerEvent> {
        self.events.lock().clone()
    }

    pub fn registered(&self) -> Vec<ObjectLocator> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                TrackerEvent::Registered(l) => Some(l.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn unregistered(&self) -> Vec<ObjectLocator> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                TrackerEvent::Unregistered(l) => Some(l.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn state_changes(&self) -> Vec<(ObjectLocator, Value, Value)> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                TrackerEvent::StateChanged {
                    locator,
                    old_state,
                    new_state,
                } => Some((locator.clone(), old_state.clone(), new_state.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn notifications(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, TrackerEvent::Notification { .. }))
            .count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl TrackerListener for RecordingListener {
    fn on_event(
        &self,
        event: &TrackerEvent,
    ) -> ListenerResult {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

/// Fails every callback
pub struct FailingListener;

impl TrackerListener for FailingListener {
    fn on_registered(
        &self,
        locator: &ObjectLocator,
    ) -> ListenerResult {
        Err(format!("cannot handle {}", locator).into())
    }
}

/// Panics on every callback
pub struct PanickingListener;

impl TrackerListener for PanickingListener {
    fn on_event(
        &self,
        event: &TrackerEvent,
    ) -> ListenerResult {
        panic!("listener blew up on {}", event.kind());
    }
}
