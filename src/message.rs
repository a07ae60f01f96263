//! Wire protocol definitions
//!
//! A single flat record shape is reused in both directions: requests from
//! clients and responses/events from the hub. One record is one UTF-8 JSON
//! object per newline-terminated line. All fields are optional on the wire
//! and decode to empty strings when missing; encoding always emits every
//! field so that empty and missing are indistinguishable to peers.

use serde::{Deserialize, Serialize};

use crate::types::ClientId;

/// Request kind tags carried in the `Type` field.
///
/// Responses and events echo the request's tag verbatim, including tags the
/// hub does not recognise.
pub mod kind {
    pub const SET_NAME: &str = "set_name";
    pub const LIST: &str = "list";
    pub const CREATE: &str = "create";
    pub const DESTROY: &str = "destroy";
    pub const JOIN: &str = "join";
    pub const LEAVE: &str = "leave";
    pub const NEW_MSG: &str = "new_msg";
    /// Internal: synthesized by an endpoint when its connection drops.
    pub const EXIT: &str = "exit";
}

/// Timestamp format for the `DateTime` field: space-padded day, two-digit
/// year, 24h clock (e.g. " 6/08/26 14:03").
const TIMESTAMP_FORMAT: &str = "%e/%m/%y %H:%M";

/// A formatted date & time stamp in local time.
pub fn timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// A single command, response or event record.
///
/// `DateTime` is client-assigned on requests and overwritten by the hub on
/// every response. `Username` and `Error` are hub-populated and ignored on
/// inbound records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "TargetUUID")]
    pub target_uuid: ClientId,
    #[serde(rename = "Room")]
    pub room: String,
    #[serde(rename = "Text")]
    pub text: String,
    #[serde(rename = "DateTime")]
    pub date_time: String,
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Error")]
    pub error: String,
}

impl Message {
    /// A client-originated request with a fresh local timestamp.
    pub fn request(kind: &str, target_uuid: ClientId) -> Self {
        Self {
            kind: kind.to_string(),
            target_uuid,
            date_time: timestamp(),
            ..Self::default()
        }
    }

    /// A hub-originated response echoing the request's kind and room, with
    /// the server-assigned timestamp.
    pub fn response(kind: &str, room: &str) -> Self {
        Self {
            kind: kind.to_string(),
            room: room.to_string(),
            date_time: timestamp(),
            ..Self::default()
        }
    }

    /// Encode into a single JSON line (without the trailing newline).
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode a single line into a record.
    ///
    /// Framing failures are not errors at this layer: a non-JSON line decodes
    /// to the all-empty record, which the hub rejects as an unrecognised
    /// request.
    pub fn decode(line: &str) -> Self {
        serde_json::from_str(line.trim()).unwrap_or_default()
    }
}
