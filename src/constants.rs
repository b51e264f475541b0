// -
// Discovery

/// Attempts to attach to a newly discovered server before it is treated as lost
pub(crate) const ATTACH_MAX_ATTEMPTS: usize = 3;

// -
// Notification types

/// Attribute whose changes are relayed as typed state-change events
pub const STATE_ATTRIBUTE: &str = "State";

/// Emitted by a server when an object is registered with it
pub const OBJECT_REGISTERED_TYPE: &str = "server.object.registered";
/// Emitted by a server when an object is unregistered from it
pub const OBJECT_UNREGISTERED_TYPE: &str = "server.object.unregistered";

/// Emitted by the network registry when a server joins
pub const SERVER_ADDED_TYPE: &str = "network.server.added";
/// Emitted by the network registry when a server leaves
pub const SERVER_REMOVED_TYPE: &str = "network.server.removed";

pub const ATTRIBUTE_CHANGE_TYPE: &str = "attribute.change";

// -
// Config

pub(crate) const CONFIG_ENV_PREFIX: &str = "TRACKER";
pub(crate) const CONFIG_ENV_SEPARATOR: &str = "__";
pub(crate) const CONFIG_PATH_ENV: &str = "CONFIG_PATH";
