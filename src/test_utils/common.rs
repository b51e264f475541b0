use std::sync::Arc;

use super::HostedObject;
use super::InMemoryNetwork;
use super::InMemoryServer;
use crate::ObjectLocator;
use crate::ObjectName;
use crate::ServerLocator;
use crate::Tracker;

pub const MONITORABLE: &str = "Monitorable";

/// Server hosting three objects, two of them Monitorable
pub fn monitorable_server(id: &str) -> Arc<InMemoryServer> {
    let server = InMemoryServer::new(id);
    server.host("app:name=cache", HostedObject::new([MONITORABLE]));
    server.host("app:name=pool", HostedObject::new([MONITORABLE, "Pool"]));
    server.host("app:name=config", HostedObject::new(["Config"]));
    server
}

pub fn locator(
    server: &ServerLocator,
    name: &str,
) -> ObjectLocator {
    ObjectLocator::new(server.clone(), ObjectName::new(name))
}

/// Local-only tracker over `server` with an open filter
pub async fn local_tracker(server: &Arc<InMemoryServer>) -> Tracker {
    Tracker::builder(server.locator())
        .local_only(true)
        .build()
        .await
        .expect("local-only tracker builds")
}

/// Network-wide tracker over `local`, announcing servers through `network`
pub async fn network_tracker(
    local: &Arc<InMemoryServer>,
    network: &Arc<InMemoryNetwork>,
) -> Tracker {
    Tracker::builder(local.locator())
        .network_registry(network.clone())
        .build()
        .await
        .expect("network tracker builds")
}
