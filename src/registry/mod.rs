//! Per-server registry of tracked objects.
//!
//! One lock guards the whole map and the live count. It is held only for the
//! duration of a lookup, insert or remove; callers perform server I/O and
//! listener dispatch after releasing it.


use std::collections::HashMap;
use std::collections::HashSet;

use parking_lot::RwLock;
use tracing::trace;

use crate::ObjectLocator;
use crate::ServerId;
use crate::ServerLocator;

/// Tracked objects of one attached server
#[derive(Debug)]
pub struct ServerEntry {
    pub locator: ServerLocator,
    pub objects: HashSet<ObjectLocator>,
}

#[derive(Debug, Default)]
pub struct RegistryState {
    pub servers: HashMap<ServerId, ServerEntry>,
    /// Always equals the sum of every server's set size
    pub count: usize,
}

#[derive(Debug, Default)]
pub struct TrackerRegistry {
    inner: RwLock<RegistryState>,
}

impl TrackerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provides read access to the state
    pub fn blocking_read<R>(
        &self,
        f: impl FnOnce(&RegistryState) -> R,
    ) -> R {
        let guard = self.inner.read();
        f(&guard)
    }

    /// Provides write access to the state
    pub fn blocking_write<R>(
        &self,
        f: impl FnOnce(&mut RegistryState) -> R,
    ) -> R {
        let mut guard = self.inner.write();
        f(&mut guard)
    }

    /// Allocates an empty set for `server`.
    ///
    /// Returns false if the server is already attached, in which case nothing
    /// changes. Check and insert happen under one write lock so two concurrent
    /// discoveries of the same server cannot both claim it.
    pub fn claim_server(
        &self,
        server: &ServerLocator,
    ) -> bool {
        self.blocking_write(|state| {
            if state.servers.contains_key(server.id()) {
                return false;
            }
            state.servers.insert(
                server.id().clone(),
                ServerEntry {
                    locator: server.clone(),
                    objects: HashSet::new(),
                },
            );
            true
        })
    }

    /// Removes the server and hands back everything it tracked
    pub fn seize_server(
        &self,
        server_id: &ServerId,
    ) -> Option<ServerEntry> {
        self.blocking_write(|state| {
            let entry = state.servers.remove(server_id)?;
            state.count -= entry.objects.len();
            trace!(server = %server_id, seized = entry.objects.len(), "server seized");
            Some(entry)
        })
    }

    /// Like [`seize_server`](Self::seize_server), but only when the attached
    /// entry is still the instance `server` claimed
    pub fn seize_server_if(
        &self,
        server: &ServerLocator,
    ) -> Option<ServerEntry> {
        self.blocking_write(|state| {
            match state.servers.get(server.id()) {
                Some(entry) if entry.locator.same_instance(server) => {}
                _ => return None,
            }
            let entry = state.servers.remove(server.id())?;
            state.count -= entry.objects.len();
            trace!(server = %server.id(), seized = entry.objects.len(), "server seized");
            Some(entry)
        })
    }

    /// Whether the attached entry for this id is this exact instance
    pub fn is_claimed_by(
        &self,
        server: &ServerLocator,
    ) -> bool {
        self.blocking_read(|state| {
            state
                .servers
                .get(server.id())
                .map(|entry| entry.locator.same_instance(server))
                .unwrap_or(false)
        })
    }

    pub fn contains_server(
        &self,
        server_id: &ServerId,
    ) -> bool {
        self.blocking_read(|state| state.servers.contains_key(server_id))
    }

    /// Inserts the locator into its server's set.
    ///
    /// Returns true only when newly inserted. Objects of servers that are not
    /// attached are ignored.
    pub fn insert_object(
        &self,
        locator: &ObjectLocator,
    ) -> bool {
        self.blocking_write(|state| {
            let Some(entry) = state.servers.get_mut(locator.server_id()) else {
                return false;
            };
            if entry.objects.insert(locator.clone()) {
                state.count += 1;
                true
            } else {
                false
            }
        })
    }

    /// Returns true only when the locator was present
    pub fn remove_object(
        &self,
        locator: &ObjectLocator,
    ) -> bool {
        self.blocking_write(|state| {
            let Some(entry) = state.servers.get_mut(locator.server_id()) else {
                return false;
            };
            if entry.objects.remove(locator) {
                state.count -= 1;
                true
            } else {
                false
            }
        })
    }

    pub fn contains_object(
        &self,
        locator: &ObjectLocator,
    ) -> bool {
        self.blocking_read(|state| {
            state
                .servers
                .get(locator.server_id())
                .map(|entry| entry.objects.contains(locator))
                .unwrap_or(false)
        })
    }

    pub fn count(&self) -> usize {
        self.blocking_read(|state| state.count)
    }

    /// Every tracked object across all servers
    pub fn snapshot(&self) -> HashSet<ObjectLocator> {
        self.blocking_read(|state| {
            state
                .servers
                .values()
                .flat_map(|entry| entry.objects.iter().cloned())
                .collect()
        })
    }

    pub fn servers(&self) -> Vec<ServerLocator> {
        self.blocking_read(|state| state.servers.values().map(|entry| entry.locator.clone()).collect())
    }

    pub fn objects_on(
        &self,
        server_id: &ServerId,
    ) -> Option<HashSet<ObjectLocator>> {
        self.blocking_read(|state| state.servers.get(server_id).map(|entry| entry.objects.clone()))
    }
}
