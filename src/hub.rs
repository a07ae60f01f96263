//! Hub request processor
//!
//! The central actor that owns all hub state: the user registry and the room
//! registry. Endpoints submit decoded frames through one shared request
//! queue; this single consumer applies each command to state, responds to
//! the requester, and fans events out to room subscribers.
//!
//! Exactly one request is in flight at any instant, so no locking is needed
//! anywhere: registries are plain maps, and the per-connection outbound
//! queues are the only synchronization boundary with the endpoint tasks.

use std::collections::HashMap;
use std::path::PathBuf;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::RequestError;
use crate::message::{kind, Message};
use crate::room::Room;
use crate::snapshot;
use crate::types::ClientId;
use crate::user::{OutboundSender, User};

/// Rooms recreated on every startup when seeding is requested.
pub const SEED_ROOMS: [&str; 2] = ["room_1", "room_2"];

/// Creator recorded on seeded rooms.
const SEED_CREATOR: &str = "admin";

/// Requests consumed by the hub's processor loop
#[derive(Debug)]
pub enum HubRequest {
    /// A decoded wire frame plus the outbound queue of the connection that
    /// carried it. Synthetic requests (disconnect exits) carry no queue.
    Frame {
        message: Message,
        reply: Option<OutboundSender>,
    },
    /// Finish queued requests, persist the user registry, and stop.
    Shutdown,
}

/// The request processor
///
/// Owns both registries and consumes the request queue. All state mutation
/// happens on this task; endpoints only ever see it through the responses
/// and events pushed into their outbound queues.
pub struct Hub {
    /// All registered users: identifier -> record
    users: HashMap<ClientId, User>,
    /// All live rooms: name -> record
    rooms: HashMap<String, Room>,
    /// Request receiver channel
    receiver: mpsc::UnboundedReceiver<HubRequest>,
    /// Where the user registry is persisted on shutdown
    snapshot_path: PathBuf,
}

impl Hub {
    /// Create a hub over the given request receiver, starting from a
    /// (possibly restored) user registry.
    pub fn new(
        receiver: mpsc::UnboundedReceiver<HubRequest>,
        users: HashMap<ClientId, User>,
        snapshot_path: PathBuf,
    ) -> Self {
        Self {
            users,
            rooms: HashMap::new(),
            receiver,
            snapshot_path,
        }
    }

    /// Recreate the well-known seed rooms. Room state is never persisted, so
    /// this runs on each startup.
    pub fn seed_rooms(&mut self) {
        for name in SEED_ROOMS {
            self.rooms
                .entry(name.to_string())
                .or_insert_with(|| Room::new(ClientId::from(SEED_CREATOR)));
        }
    }

    /// Run the processor event loop.
    ///
    /// Consumes requests until a `Shutdown` arrives or every submitter is
    /// gone, then stores the user registry snapshot.
    pub async fn run(mut self) {
        info!("hub started");

        while let Some(request) = self.receiver.recv().await {
            match request {
                HubRequest::Frame { message, reply } => self.process(message, reply),
                HubRequest::Shutdown => {
                    info!("hub shutdown requested");
                    break;
                }
            }
        }

        if let Err(e) = snapshot::store(&self.snapshot_path, &self.users).await {
            error!("could not store user snapshot: {}", e);
        }

        info!("hub stopped");
    }

    /// Apply a single command to state.
    fn process(&mut self, request: Message, reply: Option<OutboundSender>) {
        let kind_tag = request.kind.clone();
        let mut response = Message::response(&request.kind, &request.room);

        // Pre-validation: rebind the user's outbound reference to the
        // connection that carried this request and stamp the response with
        // their display name.
        if let Some(user) = self.users.get_mut(&request.target_uuid) {
            user.sender = reply.clone();
            user.online = reply.is_some();
            response.username = user.name.clone();
        } else if kind_tag != kind::SET_NAME {
            response.error = RequestError::UnknownIdentity.to_string();
            respond(&reply, response);
            return;
        }

        match kind_tag.as_str() {
            kind::SET_NAME => self.handle_set_name(request, response, reply),
            kind::LIST => self.handle_list(response, reply),
            kind::CREATE => self.handle_create(request, response, reply),
            kind::DESTROY => self.handle_destroy(request, response, reply),
            kind::JOIN => self.handle_join(request, response, reply),
            kind::LEAVE => self.handle_leave(request, response, reply),
            kind::NEW_MSG => self.handle_new_msg(request, response, reply),
            kind::EXIT => self.handle_exit(request, response),
            _ => {
                response.error = RequestError::UnrecognisedRequest.to_string();
                respond(&reply, response);
            }
        }
    }

    /// Insert or overwrite the requester's user record.
    fn handle_set_name(
        &mut self,
        request: Message,
        mut response: Message,
        reply: Option<OutboundSender>,
    ) {
        let name = request.text;
        self.users.insert(
            request.target_uuid.clone(),
            User::new(name.clone(), reply.clone()),
        );
        info!(
            "user with UUID '{}' set their name to '{}'",
            request.target_uuid, name
        );

        response.username = name.clone();
        response.text = format!("user name successfully set to '{}'", name);
        respond(&reply, response);
    }

    /// Report all room names to the requester.
    fn handle_list(&self, mut response: Message, reply: Option<OutboundSender>) {
        let names: Vec<&str> = self.rooms.keys().map(String::as_str).collect();
        response.text = names.join(", ");
        respond(&reply, response);
    }

    /// Create a new empty room owned by the requester.
    fn handle_create(
        &mut self,
        request: Message,
        mut response: Message,
        reply: Option<OutboundSender>,
    ) {
        if self.rooms.contains_key(&request.room) {
            response.error = RequestError::NameTaken.to_string();
        } else {
            self.rooms
                .insert(request.room.clone(), Room::new(request.target_uuid));
            info!("user '{}' created room '{}'", response.username, request.room);
            response.text = format!("room '{}' successfully created", request.room);
        }
        respond(&reply, response);
    }

    /// Remove a room, notifying everyone who was subscribed to it.
    ///
    /// Ownership is not enforced: any known user may destroy any room.
    fn handle_destroy(
        &mut self,
        request: Message,
        mut response: Message,
        reply: Option<OutboundSender>,
    ) {
        let Some(room) = self.rooms.remove(&request.room) else {
            response.error = RequestError::NoSuchRoom.to_string();
            respond(&reply, response);
            return;
        };

        info!("room '{}' destroyed by '{}'", request.room, response.username);
        response.text = format!("room '{}' destroyed", request.room);

        // the event reaches every former subscriber, and the requester too
        // when they were not subscribed themselves
        let requester_subscribed = room.is_subscribed(&request.target_uuid);
        self.broadcast_to(&room, response.clone());
        if !requester_subscribed {
            respond(&reply, response);
        }
    }

    /// Subscribe the requester to a room and announce it.
    fn handle_join(
        &mut self,
        request: Message,
        mut response: Message,
        reply: Option<OutboundSender>,
    ) {
        let Some(room) = self.rooms.get_mut(&request.room) else {
            response.error = RequestError::NoSuchRoom.to_string();
            respond(&reply, response);
            return;
        };
        if room.is_subscribed(&request.target_uuid) {
            response.error = RequestError::AlreadySubscribed.to_string();
            respond(&reply, response);
            return;
        }

        room.subscribe(request.target_uuid);
        response.text = format!(
            "user '{}' added to the '{}' room",
            response.username, request.room
        );
        room.append(response.clone());

        self.broadcast(&request.room, response);
    }

    /// Announce the requester's departure, then unsubscribe them.
    fn handle_leave(
        &mut self,
        request: Message,
        mut response: Message,
        reply: Option<OutboundSender>,
    ) {
        let Some(room) = self.rooms.get_mut(&request.room) else {
            response.error = RequestError::NoSuchRoom.to_string();
            respond(&reply, response);
            return;
        };
        if !room.is_subscribed(&request.target_uuid) {
            response.error = RequestError::NotSubscribed.to_string();
            respond(&reply, response);
            return;
        }

        response.text = format!(
            "user '{}' removed from the '{}' room",
            response.username, request.room
        );
        room.append(response.clone());

        // broadcast precedes removal so the leaver also receives the event
        self.broadcast(&request.room, response);
        if let Some(room) = self.rooms.get_mut(&request.room) {
            room.unsubscribe(&request.target_uuid);
        }
    }

    /// Record a chat message in the room log and fan it out.
    fn handle_new_msg(
        &mut self,
        request: Message,
        mut response: Message,
        reply: Option<OutboundSender>,
    ) {
        let Some(room) = self.rooms.get_mut(&request.room) else {
            response.error = RequestError::NoSuchRoom.to_string();
            respond(&reply, response);
            return;
        };
        if !room.is_subscribed(&request.target_uuid) {
            response.error = RequestError::NotSubscribed.to_string();
            respond(&reply, response);
            return;
        }

        response.text = request.text.clone();
        room.append(response.clone());
        debug!(
            "user '{}' messaged the '{}' room",
            response.username, request.room
        );

        self.broadcast(&request.room, response);
    }

    /// Clean up after a disconnected client.
    ///
    /// Synthesized by endpoints; there is no one to respond to. Removes the
    /// requester from every room they were subscribed to, announcing each
    /// departure to the remaining subscribers.
    fn handle_exit(&mut self, request: Message, response: Message) {
        let uuid = request.target_uuid;

        let joined: Vec<String> = self
            .rooms
            .iter()
            .filter(|(_, room)| room.is_subscribed(&uuid))
            .map(|(name, _)| name.clone())
            .collect();

        for name in joined {
            let mut event = response.clone();
            event.kind = kind::LEAVE.to_string();
            event.room = name.clone();
            event.text = format!(
                "user '{}' removed from the '{}' room",
                response.username, name
            );

            if let Some(room) = self.rooms.get_mut(&name) {
                room.unsubscribe(&uuid);
                room.append(event.clone());
            }
            self.broadcast(&name, event);
        }

        if let Some(user) = self.users.get_mut(&uuid) {
            user.online = false;
            user.sender = None;
            info!("user '{}' disconnected", user.name);
        }
    }

    /// Submit an event to every current subscriber of a room.
    fn broadcast(&self, room_name: &str, event: Message) {
        if let Some(room) = self.rooms.get(room_name) {
            self.broadcast_to(room, event);
        }
    }

    /// Fan an event out to a room's subscribers via their current outbound
    /// queues. A full or closed queue drops the event for that subscriber
    /// only; the processor never blocks here.
    fn broadcast_to(&self, room: &Room, event: Message) {
        for id in room.subscribers() {
            match self.users.get(id) {
                Some(user) => {
                    if !user.try_send(event.clone()) {
                        debug!("event for '{}' dropped: outbound queue full or closed", id);
                    }
                }
                None => warn!("subscriber '{}' has no user record", id),
            }
        }
    }
}

/// Send a response to the requester only. Drops silently when the request
/// carried no reply queue or the queue is full or closed.
fn respond(reply: &Option<OutboundSender>, response: Message) {
    if let Some(tx) = reply {
        if tx.try_send(response).is_err() {
            debug!("requester outbound queue full or closed; response dropped");
        }
    }
}
