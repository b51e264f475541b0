//! Minimal in-memory management servers and network registry built only on
//! the public API.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use d_tracker::Handback;
use d_tracker::ListenerResult;
use d_tracker::ListenerTarget;
use d_tracker::ManagementServer;
use d_tracker::NetworkRegistry;
use d_tracker::Notification;
use d_tracker::NotificationFilter;
use d_tracker::NotificationHandler;
use d_tracker::NotificationSource;
use d_tracker::ObjectName;
use d_tracker::ServerError;
use d_tracker::ServerId;
use d_tracker::ServerInfo;
use d_tracker::ServerLocator;
use d_tracker::ServerResult;
use d_tracker::TrackerEvent;
use d_tracker::TrackerListener;
use d_tracker::STATE_ATTRIBUTE;
use parking_lot::Mutex;
use serde_json::Value;

type Subscription = (ListenerTarget, Option<NotificationFilter>, Handback, Arc<dyn NotificationHandler>);

#[derive(Default)]
struct NodeState {
    objects: BTreeMap<ObjectName, (Vec<String>, Value)>,
    subscriptions: Vec<Subscription>,
    down: bool,
    sequence: u64,
}

pub struct Node {
    id: ServerId,
    state: Mutex<NodeState>,
}

impl Node {
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: ServerId::new(id),
            state: Mutex::new(NodeState::default()),
        })
    }

    pub fn id(&self) -> &ServerId {
        &self.id
    }

    pub fn locator(self: &Arc<Self>) -> ServerLocator {
        ServerLocator::new(self.id.clone(), self.clone())
    }

    pub fn with_object(
        self: Arc<Self>,
        name: &str,
        classes: &[&str],
    ) -> Arc<Self> {
        self.state.lock().objects.insert(
            ObjectName::new(name),
            (classes.iter().map(|c| c.to_string()).collect(), Value::Null),
        );
        self
    }

    pub fn set_down(
        &self,
        down: bool,
    ) {
        self.state.lock().down = down;
    }

    async fn deliver(
        &self,
        target: ListenerTarget,
        notification: Notification,
    ) {
        let receivers: Vec<_> = self
            .state
            .lock()
            .subscriptions
            .iter()
            .filter(|(t, f, _, _)| *t == target && f.as_ref().map(|f| f.is_enabled(&notification)).unwrap_or(true))
            .map(|(_, _, handback, handler)| (handback.clone(), handler.clone()))
            .collect();
        for (handback, handler) in receivers {
            handler.handle_notification(notification.clone(), handback).await;
        }
    }

    fn next_sequence(&self) -> u64 {
        let mut state = self.state.lock();
        state.sequence += 1;
        state.sequence
    }

    pub async fn register(
        &self,
        name: &str,
        classes: &[&str],
    ) {
        self.state.lock().objects.insert(
            ObjectName::new(name),
            (classes.iter().map(|c| c.to_string()).collect(), Value::Null),
        );
        let notification =
            Notification::object_registered(ObjectName::new("delegate"), ObjectName::new(name), self.next_sequence());
        self.deliver(ListenerTarget::Server, notification).await;
    }

    pub async fn unregister(
        &self,
        name: &str,
    ) {
        self.state.lock().objects.remove(&ObjectName::new(name));
        let notification =
            Notification::object_unregistered(ObjectName::new("delegate"), ObjectName::new(name), self.next_sequence());
        self.deliver(ListenerTarget::Server, notification).await;
    }

    pub async fn set_state(
        &self,
        name: &str,
        state: Value,
    ) {
        let object = ObjectName::new(name);
        let old = {
            let mut guard = self.state.lock();
            match guard.objects.get_mut(&object) {
                Some((_, current)) => std::mem::replace(current, state.clone()),
                None => return,
            }
        };
        let notification = Notification::attribute_changed(
            NotificationSource::Object(object.clone()),
            STATE_ATTRIBUTE,
            old,
            state,
            self.next_sequence(),
        );
        self.deliver(ListenerTarget::Object(object), notification).await;
    }

    pub async fn emit(
        &self,
        name: &str,
        notification_type: &str,
        user_data: Value,
    ) {
        let object = ObjectName::new(name);
        let notification = Notification::generic(
            notification_type,
            NotificationSource::Object(object.clone()),
            Some(user_data),
            self.next_sequence(),
        );
        self.deliver(ListenerTarget::Object(object), notification).await;
    }
}

#[async_trait]
impl ManagementServer for Node {
    async fn implements_any(
        &self,
        object: &ObjectName,
        classes: &[String],
    ) -> ServerResult<bool> {
        let state = self.state.lock();
        let (implemented, _) = state
            .objects
            .get(object)
            .ok_or_else(|| ServerError::NotFound(object.to_string()))?;
        Ok(implemented.iter().any(|c| classes.contains(c)))
    }

    async fn query_names(&self) -> ServerResult<Vec<ObjectName>> {
        let state = self.state.lock();
        if state.down {
            return Err(ServerError::ConnectionFailed(self.id.to_string()));
        }
        Ok(state.objects.keys().cloned().collect())
    }

    async fn add_notification_listener(
        &self,
        target: ListenerTarget,
        filter: Option<NotificationFilter>,
        handback: Handback,
        handler: Arc<dyn NotificationHandler>,
    ) -> ServerResult<()> {
        let mut state = self.state.lock();
        if state.down {
            return Err(ServerError::ConnectionFailed(self.id.to_string()));
        }
        state.subscriptions.push((target, filter, handback, handler));
        Ok(())
    }

    async fn remove_notification_listener(
        &self,
        target: ListenerTarget,
        handback: Handback,
    ) -> ServerResult<()> {
        let mut state = self.state.lock();
        let before = state.subscriptions.len();
        state.subscriptions.retain(|(t, _, h, _)| !(*t == target && *h == handback));
        if state.subscriptions.len() == before {
            return Err(ServerError::NotFound(format!("{:?}", target)));
        }
        Ok(())
    }

    async fn get_attribute(
        &self,
        object: &ObjectName,
        attribute: &str,
    ) -> ServerResult<Value> {
        let state = self.state.lock();
        match state.objects.get(object) {
            Some((_, value)) if attribute == STATE_ATTRIBUTE => Ok(value.clone()),
            Some(_) => Err(ServerError::NotFound(attribute.to_string())),
            None => Err(ServerError::NotFound(object.to_string())),
        }
    }
}

/// Network registry over a set of [`Node`]s
#[derive(Default)]
pub struct Mesh {
    nodes: Mutex<BTreeMap<ServerId, Arc<Node>>>,
    subscribers: Mutex<Vec<(Arc<dyn NotificationHandler>, Handback)>>,
}

fn info(id: &ServerId) -> ServerInfo {
    ServerInfo {
        id: id.clone(),
        address: format!("mesh://{}", id),
    }
}

impl Mesh {
    pub fn new(nodes: &[Arc<Node>]) -> Arc<Self> {
        let mesh = Self::default();
        for node in nodes {
            mesh.nodes.lock().insert(node.id().clone(), node.clone());
        }
        Arc::new(mesh)
    }

    pub async fn join(
        &self,
        node: Arc<Node>,
    ) {
        let id = node.id().clone();
        self.nodes.lock().insert(id.clone(), node);
        let subscribers = self.subscribers.lock().clone();
        for (handler, handback) in subscribers {
            handler
                .handle_notification(
                    Notification::server_added(ObjectName::new("mesh"), info(&id), 0),
                    handback,
                )
                .await;
        }
    }

    pub async fn leave(
        &self,
        id: &ServerId,
    ) {
        self.nodes.lock().remove(id);
        let subscribers = self.subscribers.lock().clone();
        for (handler, handback) in subscribers {
            handler
                .handle_notification(
                    Notification::server_removed(ObjectName::new("mesh"), id.clone(), 0),
                    handback,
                )
                .await;
        }
    }

    pub fn subscribers(&self) -> usize {
        self.subscribers.lock().len()
    }
}

#[async_trait]
impl NetworkRegistry for Mesh {
    async fn servers(&self) -> ServerResult<Vec<ServerInfo>> {
        Ok(self.nodes.lock().keys().map(info).collect())
    }

    async fn connect(
        &self,
        server: &ServerInfo,
    ) -> ServerResult<Arc<dyn ManagementServer>> {
        let node = self
            .nodes
            .lock()
            .get(&server.id)
            .cloned()
            .ok_or_else(|| ServerError::NotFound(server.id.to_string()))?;
        let handle: Arc<dyn ManagementServer> = node;
        Ok(handle)
    }

    async fn subscribe(
        &self,
        handler: Arc<dyn NotificationHandler>,
        handback: Handback,
    ) -> ServerResult<()> {
        self.subscribers.lock().push((handler, handback));
        Ok(())
    }

    async fn unsubscribe(
        &self,
        handback: Handback,
    ) -> ServerResult<()> {
        self.subscribers.lock().retain(|(_, h)| *h != handback);
        Ok(())
    }
}

/// Captures every event in delivery order
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<TrackerEvent>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(|e| e.kind()).collect()
    }

    pub fn events(&self) -> Vec<TrackerEvent> {
        self.events.lock().clone()
    }
}

impl TrackerListener for Recorder {
    fn on_event(
        &self,
        event: &TrackerEvent,
    ) -> ListenerResult {
        self.events.lock().push(event.clone());
        Ok(())
    }
}
