//! # d-tracker
//!
//! Tracks manageable objects scattered across a dynamically changing set of
//! management servers, keeps a live deduplicated registry of them, and relays
//! their lifecycle and state-change events to subscribed listeners.
//!
//! The transport used to reach a server is not part of this crate: callers
//! provide [`ManagementServer`] handles and, for network-wide tracking, a
//! [`NetworkRegistry`] that announces servers joining and leaving.

mod config;
mod constants;
mod errors;
mod filter;
mod listener;
mod locator;
mod notification;
mod registry;
mod server;
mod tracker;
pub mod metrics;

pub use self::config::*;
pub use constants::ATTRIBUTE_CHANGE_TYPE;
pub use constants::OBJECT_REGISTERED_TYPE;
pub use constants::OBJECT_UNREGISTERED_TYPE;
pub use constants::SERVER_ADDED_TYPE;
pub use constants::SERVER_REMOVED_TYPE;
pub use constants::STATE_ATTRIBUTE;
pub use errors::*;
pub use filter::*;
pub use listener::ChannelListener;
pub use listener::ListenerError;
pub use listener::ListenerResult;
pub use listener::TrackerEvent;
pub use listener::TrackerListener;
pub use locator::*;
pub use notification::*;
pub use server::*;
pub use tracker::*;

//-----------------------------------------------------------
// Test utils
