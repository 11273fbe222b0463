//! Connection registry
//!
//! Tracks the set of connected centrals so telemetry updates can be fanned
//! out to each of them.

use crate::config::ble::REGISTRY_CAPACITY;
use crate::gatt::types::ConnHandle;
use heapless::FnvIndexSet;
use log::{debug, error, warn};

/// Registry errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionError {
    /// Disconnect for a handle that was never connected
    UnknownConnection(ConnHandle),
    /// No room to track another connection
    RegistryFull(ConnHandle),
}

/// Set of active connection handles
pub struct ConnectionRegistry {
    connections: FnvIndexSet<ConnHandle, REGISTRY_CAPACITY>,
}

impl ConnectionRegistry {
    /// Create an empty registry
    pub const fn new() -> Self {
        Self {
            connections: FnvIndexSet::new(),
        }
    }

    /// Track a new connection.
    ///
    /// Returns `Ok(false)` if the handle was already present; the registry is
    /// a set, so it is left unchanged.
    pub fn add(&mut self, conn: ConnHandle) -> Result<bool, ConnectionError> {
        match self.connections.insert(conn) {
            Ok(true) => {
                debug!("CONNECTION: Added {} ({} active)", conn, self.connections.len());
                Ok(true)
            }
            Ok(false) => {
                warn!("CONNECTION: {} already registered", conn);
                Ok(false)
            }
            Err(_) => {
                error!("CONNECTION: Failed to add {} - registry full", conn);
                Err(ConnectionError::RegistryFull(conn))
            }
        }
    }

    /// Stop tracking a connection
    pub fn remove(&mut self, conn: ConnHandle) -> Result<(), ConnectionError> {
        if !self.connections.remove(&conn) {
            error!("CONNECTION: Attempted to remove unknown connection {}", conn);
            return Err(ConnectionError::UnknownConnection(conn));
        }

        debug!("CONNECTION: Removed {} ({} active)", conn, self.connections.len());
        Ok(())
    }

    /// Check if a connection exists
    pub fn contains(&self, conn: ConnHandle) -> bool {
        self.connections.contains(&conn)
    }

    /// Get the number of active connections
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Iterate over active connection handles
    pub fn iter(&self) -> impl Iterator<Item = ConnHandle> + '_ {
        self.connections.iter().copied()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
