//! The connection registry: which live connection goes by which name.
//!
//! # Concurrency note
//!
//! `ConnectionRegistry` is a plain struct with `&mut self` methods. The
//! server shares one instance as a [`SharedRegistry`]
//! (`Arc<tokio::sync::Mutex<_>>`), so the "is this name free?" check and
//! the insert in [`claim`](ConnectionRegistry::claim) happen under one
//! lock acquisition and two simultaneous claims for the same name can't
//! both succeed.

use std::collections::HashMap;
use std::sync::Arc;

use quizforge_protocol::ServerEvent;
use quizforge_transport::ConnectionId;
use tokio::sync::{Mutex, mpsc};

use crate::SessionError;

/// The sending half of a connection's outbound event queue.
///
/// Unbounded on purpose: pushing into it never waits, so room actors can
/// fan out without blocking on any one client.
pub type Outbox = mpsc::UnboundedSender<ServerEvent>;

/// The registry as shared between the server, the orchestrator, and
/// every room actor.
pub type SharedRegistry = Arc<Mutex<ConnectionRegistry>>;

/// One registered connection.
#[derive(Debug)]
struct Registered {
    name: String,
    outbox: Outbox,
}

/// Bidirectional map between live connections and unique player names.
///
/// ```text
/// claim(conn, "ann") ──→ [conn-1 ⇄ "ann"] ──→ release(conn-1)
///                                                  │
///                                                  ▼
///                                 "ann" may be claimed again at once
/// ```
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// Connection → name and outbox.
    connections: HashMap<ConnectionId, Registered>,

    /// Name → connection. Kept in sync with `connections`; lets
    /// room-scoped fan-out go from roster names to outboxes in O(1).
    names: HashMap<String, ConnectionId>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a fresh registry for sharing.
    pub fn shared() -> SharedRegistry {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Registers `name` for `conn`, along with the outbox that reaches it.
    ///
    /// Names are compared exactly (case-sensitive, no trimming).
    ///
    /// # Errors
    /// - [`SessionError::InvalidName`]: `name` is empty or whitespace
    /// - [`SessionError::AlreadyRegistered`]: `conn` already has a name
    /// - [`SessionError::DuplicateName`]: another connection holds `name`
    pub fn claim(
        &mut self,
        conn: ConnectionId,
        name: &str,
        outbox: Outbox,
    ) -> Result<(), SessionError> {
        if name.trim().is_empty() {
            return Err(SessionError::InvalidName);
        }
        if self.connections.contains_key(&conn) {
            return Err(SessionError::AlreadyRegistered(conn));
        }
        if self.names.contains_key(name) {
            return Err(SessionError::DuplicateName(name.to_owned()));
        }

        self.names.insert(name.to_owned(), conn);
        self.connections.insert(
            conn,
            Registered {
                name: name.to_owned(),
                outbox,
            },
        );

        tracing::info!(conn_id = %conn, player = %name, "name claimed");
        Ok(())
    }

    /// Forgets `conn` and frees its name. Returns the released name.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if `conn` holds no name.
    pub fn release(&mut self, conn: ConnectionId) -> Result<String, SessionError> {
        let registered = self
            .connections
            .remove(&conn)
            .ok_or(SessionError::NotFound(conn))?;
        self.names.remove(&registered.name);

        tracing::info!(conn_id = %conn, player = %registered.name, "name released");
        Ok(registered.name)
    }

    /// The name `conn` claimed.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if `conn` holds no name.
    pub fn name_of(&self, conn: ConnectionId) -> Result<&str, SessionError> {
        self.connections
            .get(&conn)
            .map(|r| r.name.as_str())
            .ok_or(SessionError::NotFound(conn))
    }

    /// The connection currently holding `name`, if any.
    pub fn connection_of(&self, name: &str) -> Option<ConnectionId> {
        self.names.get(name).copied()
    }

    /// Every connected player's name, sorted.
    pub fn connected_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.names.keys().cloned().collect();
        names.sort();
        names
    }

    /// The outbox registered for `conn`.
    pub fn outbox(&self, conn: ConnectionId) -> Option<&Outbox> {
        self.connections.get(&conn).map(|r| &r.outbox)
    }

    /// All registered outboxes, in no particular order.
    pub fn outboxes(&self) -> impl Iterator<Item = (ConnectionId, &Outbox)> {
        self.connections.iter().map(|(conn, r)| (*conn, &r.outbox))
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Returns `true` if nobody is connected.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Naming convention: `test_{function}_{scenario}_{expected}`.

    use super::*;

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    fn outbox() -> Outbox {
        mpsc::unbounded_channel().0
    }

    // =====================================================================
    // claim()
    // =====================================================================

    #[test]
    fn test_claim_free_name_registers_both_directions() {
        let mut reg = ConnectionRegistry::new();
        reg.claim(conn(1), "ann", outbox()).unwrap();

        assert_eq!(reg.name_of(conn(1)).unwrap(), "ann");
        assert_eq!(reg.connection_of("ann"), Some(conn(1)));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_claim_taken_name_returns_duplicate_name() {
        let mut reg = ConnectionRegistry::new();
        reg.claim(conn(1), "ann", outbox()).unwrap();

        let result = reg.claim(conn(2), "ann", outbox());
        assert!(matches!(result, Err(SessionError::DuplicateName(n)) if n == "ann"));
        assert_eq!(reg.connection_of("ann"), Some(conn(1)), "holder unchanged");
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_claim_is_case_sensitive() {
        let mut reg = ConnectionRegistry::new();
        reg.claim(conn(1), "ann", outbox()).unwrap();
        assert!(reg.claim(conn(2), "Ann", outbox()).is_ok());
    }

    #[test]
    fn test_claim_blank_name_returns_invalid_name() {
        let mut reg = ConnectionRegistry::new();
        assert!(matches!(
            reg.claim(conn(1), "", outbox()),
            Err(SessionError::InvalidName)
        ));
        assert!(matches!(
            reg.claim(conn(1), "   ", outbox()),
            Err(SessionError::InvalidName)
        ));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_claim_second_name_for_same_connection_returns_already_registered() {
        let mut reg = ConnectionRegistry::new();
        reg.claim(conn(1), "ann", outbox()).unwrap();

        let result = reg.claim(conn(1), "bob", outbox());
        assert!(matches!(result, Err(SessionError::AlreadyRegistered(c)) if c == conn(1)));
        assert_eq!(reg.connection_of("bob"), None);
    }

    // =====================================================================
    // release()
    // =====================================================================

    #[test]
    fn test_release_returns_name_and_frees_it() {
        let mut reg = ConnectionRegistry::new();
        reg.claim(conn(1), "ann", outbox()).unwrap();

        assert_eq!(reg.release(conn(1)).unwrap(), "ann");
        assert!(reg.is_empty());
        assert_eq!(reg.connection_of("ann"), None);

        // The name is immediately claimable by someone else.
        reg.claim(conn(2), "ann", outbox()).unwrap();
        assert_eq!(reg.connection_of("ann"), Some(conn(2)));
    }

    #[test]
    fn test_release_unknown_connection_returns_not_found() {
        let mut reg = ConnectionRegistry::new();
        assert!(matches!(
            reg.release(conn(9)),
            Err(SessionError::NotFound(c)) if c == conn(9)
        ));
    }

    #[test]
    fn test_release_twice_returns_not_found() {
        let mut reg = ConnectionRegistry::new();
        reg.claim(conn(1), "ann", outbox()).unwrap();
        reg.release(conn(1)).unwrap();
        assert!(reg.release(conn(1)).is_err());
    }

    // =====================================================================
    // lookups
    // =====================================================================

    #[test]
    fn test_name_of_unknown_connection_returns_not_found() {
        let reg = ConnectionRegistry::new();
        assert!(matches!(reg.name_of(conn(1)), Err(SessionError::NotFound(_))));
    }

    #[test]
    fn test_connected_names_are_sorted() {
        let mut reg = ConnectionRegistry::new();
        reg.claim(conn(1), "cid", outbox()).unwrap();
        reg.claim(conn(2), "ann", outbox()).unwrap();
        reg.claim(conn(3), "bob", outbox()).unwrap();

        assert_eq!(reg.connected_names(), vec!["ann", "bob", "cid"]);
    }

    #[tokio::test]
    async fn test_shared_concurrent_claims_only_one_wins() {
        let reg = ConnectionRegistry::shared();

        let mut tasks = Vec::new();
        for id in 0..16 {
            let reg = reg.clone();
            tasks.push(tokio::spawn(async move {
                reg.lock().await.claim(conn(id), "ann", outbox()).is_ok()
            }));
        }

        let mut winners = 0;
        for task in tasks {
            if task.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(reg.lock().await.len(), 1);
    }
}
