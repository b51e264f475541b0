//! Identity keys for management servers and the objects they host.
//!
//! Locators are cheap to clone and are handed to listeners as read-only values.
//! Equality and hashing only consider identities, never the server handle.


use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use crate::ManagementServer;

/// Unique identity of a management server
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServerId(String);

impl ServerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServerId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ServerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identity of an object on a management server
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectName(String);

impl ObjectName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectName {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ObjectName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A discovered management server: its identity plus the handle used to query it
/// and attach notification listeners.
#[derive(Clone)]
pub struct ServerLocator {
    id: ServerId,
    handle: Arc<dyn ManagementServer>,
}

impl ServerLocator {
    pub fn new(
        id: impl Into<ServerId>,
        handle: Arc<dyn ManagementServer>,
    ) -> Self {
        Self {
            id: id.into(),
            handle,
        }
    }

    pub fn id(&self) -> &ServerId {
        &self.id
    }

    pub fn handle(&self) -> &Arc<dyn ManagementServer> {
        &self.handle
    }

    /// Same server id and the same handle instance.
    ///
    /// A server rediscovered after it was lost carries a new handle, so this
    /// tells a fresh attachment apart from a stale one.
    pub fn same_instance(
        &self,
        other: &ServerLocator,
    ) -> bool {
        self.id == other.id
            && std::ptr::eq(
                Arc::as_ptr(&self.handle) as *const (),
                Arc::as_ptr(&other.handle) as *const (),
            )
    }
}

impl PartialEq for ServerLocator {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.id == other.id
    }
}

impl Eq for ServerLocator {}

impl Hash for ServerLocator {
    fn hash<H: Hasher>(
        &self,
        state: &mut H,
    ) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ServerLocator {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("ServerLocator").field("id", &self.id).finish()
    }
}

impl fmt::Display for ServerLocator {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        fmt::Display::fmt(&self.id, f)
    }
}

/// One tracked object on one server. Deduplication key of the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectLocator {
    server: ServerLocator,
    name: ObjectName,
}

impl ObjectLocator {
    pub fn new(
        server: ServerLocator,
        name: ObjectName,
    ) -> Self {
        Self { server, name }
    }

    pub fn server(&self) -> &ServerLocator {
        &self.server
    }

    pub fn server_id(&self) -> &ServerId {
        self.server.id()
    }

    pub fn name(&self) -> &ObjectName {
        &self.name
    }
}

impl fmt::Display for ObjectLocator {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.server.id())
    }
}
