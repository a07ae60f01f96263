//! Room record definition
//!
//! A named group with a creator, a subscriber set, and an append-only
//! message log.

use std::collections::HashSet;

use crate::message::Message;
use crate::types::ClientId;

/// A chat room
///
/// Subscribers are identifiers into the hub's user registry; the room never
/// holds connection state itself. The message log is append-only and strictly
/// ordered by insertion.
#[derive(Debug)]
pub struct Room {
    /// Identifier of the user who created the room
    pub creator: ClientId,
    /// Current subscriber set
    subscribers: HashSet<ClientId>,
    /// Ordered record of everything broadcast to the room
    messages: Vec<Message>,
}

impl Room {
    /// Create an empty room owned by the given creator.
    pub fn new(creator: ClientId) -> Self {
        Self {
            creator,
            subscribers: HashSet::new(),
            messages: Vec::new(),
        }
    }

    /// Add a user to the subscriber set.
    ///
    /// Returns false if the user was already subscribed.
    pub fn subscribe(&mut self, id: ClientId) -> bool {
        self.subscribers.insert(id)
    }

    /// Remove a user from the subscriber set.
    ///
    /// Returns false if the user was not subscribed.
    pub fn unsubscribe(&mut self, id: &ClientId) -> bool {
        self.subscribers.remove(id)
    }

    /// Check whether a user is in the subscriber set.
    pub fn is_subscribed(&self, id: &ClientId) -> bool {
        self.subscribers.contains(id)
    }

    pub fn subscribers(&self) -> impl Iterator<Item = &ClientId> {
        self.subscribers.iter()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Append an event record to the room log.
    pub fn append(&mut self, msg: Message) {
        self.messages.push(msg);
    }

    /// The room log, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_creation() {
        let room = Room::new(ClientId::from("u1"));
        assert_eq!(room.creator, ClientId::from("u1"));
        assert_eq!(room.subscriber_count(), 0);
        assert!(room.messages().is_empty());
    }

    #[test]
    fn test_subscribe_is_idempotent_on_membership() {
        let mut room = Room::new(ClientId::from("u1"));

        assert!(room.subscribe(ClientId::from("u2")));
        assert!(room.is_subscribed(&ClientId::from("u2")));
        assert_eq!(room.subscriber_count(), 1);

        // a second subscribe must not produce a duplicate entry
        assert!(!room.subscribe(ClientId::from("u2")));
        assert_eq!(room.subscriber_count(), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let mut room = Room::new(ClientId::from("u1"));
        room.subscribe(ClientId::from("u2"));

        assert!(room.unsubscribe(&ClientId::from("u2")));
        assert!(!room.is_subscribed(&ClientId::from("u2")));

        // unsubscribing a non-member reports false
        assert!(!room.unsubscribe(&ClientId::from("u3")));
    }

    #[test]
    fn test_log_preserves_insertion_order() {
        let mut room = Room::new(ClientId::from("u1"));
        for text in ["first", "second", "third"] {
            let mut msg = Message::default();
            msg.text = text.to_string();
            room.append(msg);
        }

        let texts: Vec<&str> = room.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["first", "second", "third"]);
    }
}
