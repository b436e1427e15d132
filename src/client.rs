//! Connected clients and the player roster
//!
//! The roster tracks every connected client and hands out the handles the
//! console broadcasts through. The network side of a connection owns the
//! receiving half of the client's message channel and drains it to the wire;
//! that layer lives outside this crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;

use crate::console::{ClientRegistry, PlayerRegistry};

/// Errors from roster operations.
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("server is full ({0} players)")]
    Full(usize),
}

/// Handle to one connected client.
#[derive(Debug)]
pub struct Client {
    id: u32,
    tx: mpsc::UnboundedSender<String>,
}

impl Client {
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Queue a server message for direct delivery to this client.
    ///
    /// Delivery is fire-and-forget: a client mid-disconnect just drops the
    /// message with its channel.
    pub fn send_server_message(&self, text: &str) {
        let _ = self.tx.send(text.to_string());
    }
}

/// Live registry of connected clients.
///
/// Ids increase monotonically and are never reused within a process. The
/// roster enforces the configured player cap on attach.
pub struct ClientRoster {
    clients: RwLock<HashMap<u32, Arc<Client>>>,
    next_id: AtomicU32,
    max_players: usize,
}

impl ClientRoster {
    pub fn new(max_players: usize) -> ClientRoster {
        ClientRoster {
            clients: RwLock::new(HashMap::new()),
            next_id: AtomicU32::new(1),
            max_players,
        }
    }

    /// Register a new client, returning its handle and the receiving half
    /// of its server-message channel.
    pub fn attach(&self) -> Result<(Arc<Client>, mpsc::UnboundedReceiver<String>), RosterError> {
        let mut clients = self.clients.write().unwrap();
        if clients.len() >= self.max_players {
            return Err(RosterError::Full(self.max_players));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        let client = Arc::new(Client { id, tx });
        clients.insert(id, Arc::clone(&client));
        Ok((client, rx))
    }

    /// Drop a client from the roster. Returns false if it was not present.
    pub fn detach(&self, id: u32) -> bool {
        self.clients.write().unwrap().remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.clients.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.read().unwrap().is_empty()
    }

    pub fn max_players(&self) -> usize {
        self.max_players
    }
}

impl ClientRegistry for ClientRoster {
    fn clients(&self) -> Vec<Arc<Client>> {
        self.clients.read().unwrap().values().cloned().collect()
    }
}

impl PlayerRegistry for ClientRoster {
    fn player_count(&self) -> (usize, usize) {
        (self.len(), self.max_players)
    }
}
