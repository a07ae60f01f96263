//! Multi-Room Chat Hub Library
//!
//! A line-delimited JSON chat service over TCP (with a best-effort UDP
//! variant) built on tokio, using the Actor pattern for state management.
//!
//! # Features
//! - Newline-framed JSON wire protocol shared by requests and events
//! - Self-asserted client identifiers with a persistent user registry
//! - Client-named rooms with subscriber sets and append-only message logs
//! - Broadcast fan-out that never blocks on slow consumers
//! - Synthetic exit cleanup when connections drop
//! - User registry snapshot across restarts
//! - Interactive terminal client with per-user identity files
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `Hub` is the central actor owning the user and room registries
//! - Each connection runs a reader task (frames → request queue) and a
//!   writer task (outbound queue → socket)
//! - No locks needed - all state access goes through message passing
//!
//! # Example
//! ```ignore
//! use std::collections::HashMap;
//! use tokio::net::TcpListener;
//! use tokio::sync::mpsc;
//! use roomhub::{endpoint, Hub};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (request_tx, request_rx) = mpsc::unbounded_channel();
//!     let hub = Hub::new(request_rx, HashMap::new(), "data/users.json".into());
//!     tokio::spawn(hub.run());
//!
//!     let listener = TcpListener::bind("127.0.0.1:8000").await.unwrap();
//!     while let Ok((stream, _)) = listener.accept().await {
//!         let request_tx = request_tx.clone();
//!         tokio::spawn(endpoint::handle_connection(stream, request_tx));
//!     }
//! }
//! ```

pub mod client;
pub mod endpoint;
pub mod error;
pub mod hub;
pub mod message;
pub mod room;
pub mod server;
pub mod snapshot;
pub mod types;
pub mod user;

// Re-export main types for convenience
pub use client::ClientConfig;
pub use error::{AppError, RequestError};
pub use hub::{Hub, HubRequest};
pub use message::Message;
pub use room::Room;
pub use server::ServerConfig;
pub use types::ClientId;
pub use user::{OutboundSender, User};
