//! User record definition
//!
//! The hub's view of one identifier: display name, online flag, and a
//! reference to the outbound queue of whichever connection last carried a
//! message from this identifier.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::message::Message;

/// Sender half of a per-connection outbound queue.
pub type OutboundSender = mpsc::Sender<Message>;

/// A registered user
///
/// The record outlives any single connection: on disconnect only the online
/// flag and the outbound reference change. The sender is a non-owning
/// reference refreshed by the hub on every inbound request, so events routed
/// to this user reach their current connection; it is never serialized.
#[derive(Debug, Serialize, Deserialize)]
pub struct User {
    /// Display name shown on responses and events
    pub name: String,
    /// Whether a connection has carried a message from this user since the
    /// hub last saw it disconnect
    pub online: bool,
    /// Outbound queue of the user's current connection
    #[serde(skip)]
    pub sender: Option<OutboundSender>,
}

impl User {
    /// Create a user bound to the given outbound queue.
    pub fn new(name: String, sender: Option<OutboundSender>) -> Self {
        Self {
            name,
            online: true,
            sender,
        }
    }

    /// Push an event onto the user's current outbound queue.
    ///
    /// Returns false when the event was dropped: no connection is bound, or
    /// the queue is full or closed. Never blocks.
    pub fn try_send(&self, msg: Message) -> bool {
        match &self.sender {
            Some(tx) => tx.try_send(msg).is_ok(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_creation() {
        let (tx, _rx) = mpsc::channel(32);
        let user = User::new("alice".to_string(), Some(tx));
        assert_eq!(user.name, "alice");
        assert!(user.online);
        assert!(user.sender.is_some());
    }

    #[test]
    fn test_try_send_delivers_to_bound_queue() {
        let (tx, mut rx) = mpsc::channel(32);
        let user = User::new("alice".to_string(), Some(tx));
        assert!(user.try_send(Message::default()));
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_try_send_drops_when_unbound_or_closed() {
        let user = User::new("alice".to_string(), None);
        assert!(!user.try_send(Message::default()));

        let (tx, rx) = mpsc::channel(32);
        drop(rx);
        let user = User::new("alice".to_string(), Some(tx));
        assert!(!user.try_send(Message::default()));
    }

    #[test]
    fn test_sender_is_not_serialized() {
        let (tx, _rx) = mpsc::channel(32);
        let user = User::new("alice".to_string(), Some(tx));
        let encoded = serde_json::to_string(&user).unwrap();
        assert!(!encoded.contains("sender"));

        let decoded: User = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.name, "alice");
        assert!(decoded.sender.is_none());
    }
}
