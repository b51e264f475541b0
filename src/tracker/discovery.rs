//! Server discovery: attaching to newly found servers, dropping lost ones, and
//! following the network registry's gain/loss channel.
//!
//! Per server: `Unknown -> Attached -> Lost`. A server found again after it
//! was lost is attached as a fresh instance.

use std::sync::atomic::Ordering;

use futures::future::join_all;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::tracker::TrackerInner;
use crate::constants::ATTACH_MAX_ATTEMPTS;
use crate::metrics::ATTACH_RETRIES;
use crate::metrics::OBJECTS_UNREGISTERED;
use crate::metrics::SERVERS_ATTACHED;
use crate::metrics::SERVERS_LOST;
use crate::registry::ServerEntry;
use crate::server::ServerResult;
use crate::DiscoveryError;
use crate::Handback;
use crate::ListenerTarget;
use crate::NotificationFilter;
use crate::Result;
use crate::ServerId;
use crate::ServerInfo;
use crate::ServerLocator;
use crate::TrackerEvent;

impl TrackerInner {
    pub(crate) async fn found_server(
        &self,
        server: ServerLocator,
    ) -> bool {
        if !self.registry.claim_server(&server) {
            debug!(server = %server.id(), "server already attached");
            return false;
        }
        info!(server = %server.id(), "server found");

        let mut listening = false;
        for attempt in 1..=ATTACH_MAX_ATTEMPTS {
            match self.attach_server(&server, &mut listening).await {
                Ok(()) => return self.confirm_attached(&server),
                Err(e) if e.is_connection_failure() => {
                    ATTACH_RETRIES.with_label_values(&[server.id().as_str()]).inc();
                    warn!(
                        server = %server.id(),
                        attempt,
                        max_attempts = ATTACH_MAX_ATTEMPTS,
                        "connection failed while attaching: {}",
                        e
                    );
                }
                Err(e) => {
                    error!(server = %server.id(), "failed to attach: {}", e);
                    return self.confirm_attached(&server);
                }
            }
        }

        warn!(
            server = %server.id(),
            "unreachable after {} attempts, treating as lost",
            ATTACH_MAX_ATTEMPTS
        );
        // Only the instance claimed above; a rediscovered one stays attached.
        match self.registry.seize_server_if(&server) {
            Some(entry) => {
                self.drop_server(server.id(), entry);
            }
            None => debug!(server = %server.id(), "claim superseded, nothing to drop"),
        }
        false
    }

    /// The claim may have been lost and re-taken by a newer instance while
    /// this attach was in flight.
    pub(crate) fn confirm_attached(
        &self,
        server: &ServerLocator,
    ) -> bool {
        if !self.registry.is_claimed_by(server) {
            debug!(server = %server.id(), "claim superseded while attaching");
            return false;
        }
        SERVERS_ATTACHED.inc();
        true
    }

    /// One attach attempt: population listener first, then the initial scan.
    ///
    /// `listening` survives across attempts so a retry never attaches the
    /// population listener twice.
    async fn attach_server(
        &self,
        server: &ServerLocator,
        listening: &mut bool,
    ) -> ServerResult<()> {
        if !*listening {
            server
                .handle()
                .add_notification_listener(
                    ListenerTarget::Server,
                    Some(NotificationFilter::population()),
                    Handback::Server(server.clone()),
                    self.handler.clone(),
                )
                .await?;
            *listening = true;
        }

        let names = server.handle().query_names().await?;
        debug!(server = %server.id(), candidates = names.len(), "scanning server");
        for name in names {
            if !self.registry.is_claimed_by(server) {
                break;
            }
            if self.filter.matches(server, &name).await {
                self.add_object(server, name).await;
            }
        }
        Ok(())
    }

    pub(crate) fn lost_server(
        &self,
        server_id: &ServerId,
    ) -> usize {
        let Some(entry) = self.registry.seize_server(server_id) else {
            debug!(server = %server_id, "lost server was not attached");
            return 0;
        };
        self.drop_server(server_id, entry)
    }

    /// Fires `unregistered` for every object of a seized entry
    fn drop_server(
        &self,
        server_id: &ServerId,
        entry: ServerEntry,
    ) -> usize {
        SERVERS_LOST.inc();
        // Lost is terminal for this instance; its retry series goes with it
        let _ = ATTACH_RETRIES.remove_label_values(&[server_id.as_str()]);
        let dropped = entry.objects.len();
        info!(server = %server_id, objects = dropped, "server lost");

        // Listeners on a lost server are not detached: it is unreachable.
        for locator in entry.objects {
            OBJECTS_UNREGISTERED.inc();
            self.listeners.dispatch(&TrackerEvent::Unregistered(locator));
        }
        dropped
    }

    /// Subscribes to the network registry and discovers the servers it
    /// already knows.
    pub(crate) async fn start_network_discovery(&self) -> Result<()> {
        let network = self.network.as_ref().ok_or(DiscoveryError::NetworkRegistryNotFound)?;

        network
            .subscribe(self.handler.clone(), Handback::Network)
            .await
            .map_err(|source| DiscoveryError::SubscriptionFailed { source })?;

        match network.servers().await {
            Ok(servers) => {
                debug!(count = servers.len(), "enumerating known servers");
                // Known servers attach concurrently
                join_all(servers.into_iter().map(|info| self.server_added(info))).await;
            }
            Err(e) => warn!("failed to enumerate known servers: {}", e),
        }
        Ok(())
    }

    /// Connects to a server announced by the network registry and attaches it
    pub(crate) async fn server_added(
        &self,
        info: ServerInfo,
    ) -> bool {
        if self.registry.contains_server(&info.id) {
            debug!(server = %info.id, "announced server already attached");
            return false;
        }
        let Some(network) = self.network.as_ref() else {
            return false;
        };

        match network.connect(&info).await {
            Ok(handle) => self.found_server(ServerLocator::new(info.id, handle)).await,
            Err(source) => {
                let e = DiscoveryError::ConnectFailed {
                    server_id: info.id.to_string(),
                    source,
                };
                warn!(address = %info.address, "{}", e);
                false
            }
        }
    }

    pub(crate) async fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }
        info!(local = %self.local.id(), "destroying tracker");
        if self.local_only {
            return;
        }
        if let Some(network) = self.network.as_ref() {
            if let Err(e) = network.unsubscribe(Handback::Network).await {
                debug!("failed to unsubscribe from network registry: {}", e);
            }
        }
    }
}
