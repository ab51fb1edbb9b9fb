//! Registry of connected client sockets.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::connection::ClientConnection;

/// Connected clients indexed by connection ID.
#[derive(Default)]
pub struct ClientRegistry {
    connections: RwLock<HashMap<String, Arc<ClientConnection>>>,
}

impl ClientRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection.
    pub fn add(&self, connection: Arc<ClientConnection>) {
        let mut conns = self.connections.write();
        let _ = conns.insert(connection.id.clone(), connection);
    }

    /// Remove a connection by ID.
    pub fn remove(&self, connection_id: &str) -> Option<Arc<ClientConnection>> {
        let removed = self.connections.write().remove(connection_id);
        if removed.is_some() {
            debug!(client_id = connection_id, "client removed");
        }
        removed
    }

    /// Number of connected clients.
    pub fn count(&self) -> usize {
        self.connections.read().len()
    }

    /// Total events dropped across connected clients.
    pub fn total_dropped(&self) -> u64 {
        self.connections
            .read()
            .values()
            .map(|c| c.drop_count())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn conn(id: &str, capacity: usize) -> (Arc<ClientConnection>, mpsc::Receiver<Arc<String>>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Arc::new(ClientConnection::new(id.into(), tx)), rx)
    }

    #[test]
    fn add_and_remove() {
        let registry = ClientRegistry::new();
        let (c1, _rx1) = conn("c1", 4);
        let (c2, _rx2) = conn("c2", 4);
        registry.add(c1);
        registry.add(c2);
        assert_eq!(registry.count(), 2);

        assert_eq!(registry.remove("c1").unwrap().id, "c1");
        assert!(registry.remove("c1").is_none());
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn total_dropped_sums_connections() {
        let registry = ClientRegistry::new();
        let (c1, _rx1) = conn("c1", 1);
        assert!(c1.send(Arc::new("a".into())));
        assert!(!c1.send(Arc::new("b".into())));
        registry.add(c1);
        assert_eq!(registry.total_dropped(), 1);
    }
}
