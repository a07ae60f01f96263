//! Connection endpoints
//!
//! Bridges sockets and the hub's request queue. Each accepted TCP connection
//! runs two cooperating tasks: a reader that decodes newline-framed records
//! and submits them to the queue, and a writer that drains the connection's
//! outbound queue back onto the socket. A best-effort UDP endpoint treats
//! each datagram as a single frame with a single-response reply queue.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpStream, UdpSocket};
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LinesCodec};
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::hub::HubRequest;
use crate::message::{kind, Message};
use crate::types::ClientId;

/// Outbound queue depth per connection. Broadcast drops events once a slow
/// consumer falls this far behind.
pub const OUTBOUND_CAPACITY: usize = 32;

/// Upper bound on one wire frame.
pub const MAX_LINE_LENGTH: usize = 8 * 1024;

/// Largest accepted datagram.
const MAX_DATAGRAM: usize = 2048;

/// Handle one accepted TCP connection until it drops.
///
/// The reader runs on this task; the writer is spawned. On end-of-stream or
/// read error a synthetic exit for the last identifier seen on this
/// connection is submitted so the hub can clean up subscriptions. The writer
/// lingers until the hub releases its reference to the outbound queue.
pub async fn handle_connection(
    stream: TcpStream,
    request_tx: mpsc::UnboundedSender<HubRequest>,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    info!("{} TCP client connection established", peer_addr);

    let framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));
    let (mut sink, mut lines) = framed.split();

    let (outbound_tx, mut outbound_rx) = mpsc::channel::<Message>(OUTBOUND_CAPACITY);

    // Writer task: drain the outbound queue onto the socket. A write failure
    // does not poison hub state; the queue closes and broadcast discards
    // further events for this connection.
    let writer = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            match msg.encode() {
                Ok(line) => {
                    if sink.send(line).await.is_err() {
                        debug!("socket write failed, ending writer task");
                        break;
                    }
                }
                Err(e) => error!("failed to encode outbound frame: {}", e),
            }
        }
        debug!("writer task ended");
    });

    // Reader loop: one newline-terminated frame at a time. The most recent
    // identifier seen here names the synthetic exit on teardown.
    let mut last_seen = ClientId::default();
    while let Some(item) = lines.next().await {
        let line = match item {
            Ok(line) => line,
            Err(e) => {
                warn!("read error from {}: {}", peer_addr, e);
                break;
            }
        };

        let message = Message::decode(&line);
        if !message.target_uuid.is_empty() {
            last_seen = message.target_uuid.clone();
        }

        let submitted = request_tx.send(HubRequest::Frame {
            message,
            reply: Some(outbound_tx.clone()),
        });
        if submitted.is_err() {
            debug!("hub closed, ending reader for {}", peer_addr);
            return Err(AppError::QueueClosed);
        }
    }

    info!("{} TCP client connection dropped", peer_addr);

    // Synthetic exit so the hub unsubscribes the user everywhere. With no
    // identifier seen on this connection it is a no-op in the hub.
    let exit = Message {
        kind: kind::EXIT.to_string(),
        target_uuid: last_seen,
        ..Message::default()
    };
    let _ = request_tx.send(HubRequest::Frame {
        message: exit,
        reply: None,
    });

    drop(outbound_tx);
    let _ = writer.await;
    Ok(())
}

/// Serve single-frame requests over UDP.
///
/// Each datagram gets a fresh outbound queue that carries exactly one
/// response back to the source address; events broadcast to it later are
/// dropped. No per-peer state is retained between datagrams.
pub async fn run_udp_endpoint(socket: Arc<UdpSocket>, request_tx: mpsc::UnboundedSender<HubRequest>) {
    let mut buffer = [0u8; MAX_DATAGRAM];
    loop {
        let (len, addr) = match socket.recv_from(&mut buffer).await {
            Ok(received) => received,
            Err(e) => {
                warn!("UDP receive error: {}", e);
                continue;
            }
        };
        debug!("{} UDP client request received", addr);

        let request = String::from_utf8_lossy(&buffer[..len]);
        let message = Message::decode(&request);

        let (outbound_tx, mut outbound_rx) = mpsc::channel::<Message>(1);
        let submitted = request_tx.send(HubRequest::Frame {
            message,
            reply: Some(outbound_tx),
        });
        if submitted.is_err() {
            return;
        }

        let socket = Arc::clone(&socket);
        tokio::spawn(async move {
            if let Some(msg) = outbound_rx.recv().await {
                match msg.encode() {
                    Ok(line) => {
                        if let Err(e) = socket.send_to(format!("{}\n", line).as_bytes(), addr).await
                        {
                            warn!("couldn't send UDP response to {}: {}", addr, e);
                        }
                    }
                    Err(e) => error!("failed to encode UDP response: {}", e),
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    use crate::hub::Hub;

    async fn endpoint_pair(
        request_tx: mpsc::UnboundedSender<HubRequest>,
    ) -> Result<TcpStream, AppError> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            if let Ok((stream, _)) = listener.accept().await {
                let _ = handle_connection(stream, request_tx).await;
            }
        });
        Ok(TcpStream::connect(addr).await?)
    }

    #[tokio::test]
    async fn test_reader_submits_decoded_frames() {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel();
        let mut client = endpoint_pair(request_tx).await.unwrap();

        client
            .write_all(b"{\"Type\":\"list\",\"TargetUUID\":\"u1\"}\n")
            .await
            .unwrap();

        let Some(HubRequest::Frame { message, reply }) = request_rx.recv().await else {
            panic!("expected a frame request");
        };
        assert_eq!(message.kind, kind::LIST);
        assert_eq!(message.target_uuid, ClientId::from("u1"));
        assert!(reply.is_some());
    }

    #[tokio::test]
    async fn test_disconnect_submits_synthetic_exit_with_last_seen_id() {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel();
        let mut client = endpoint_pair(request_tx).await.unwrap();

        client
            .write_all(b"{\"Type\":\"list\",\"TargetUUID\":\"u1\"}\n")
            .await
            .unwrap();
        client.shutdown().await.unwrap();
        drop(client);

        // first the list frame, then the synthesized exit
        let Some(HubRequest::Frame { message, .. }) = request_rx.recv().await else {
            panic!("expected the list frame");
        };
        assert_eq!(message.kind, kind::LIST);

        let Some(HubRequest::Frame { message, reply }) = request_rx.recv().await else {
            panic!("expected the synthetic exit");
        };
        assert_eq!(message.kind, kind::EXIT);
        assert_eq!(message.target_uuid, ClientId::from("u1"));
        assert!(reply.is_none());
    }

    #[tokio::test]
    async fn test_writer_flushes_outbound_queue_to_socket() {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel();
        let client = endpoint_pair(request_tx).await.unwrap();
        let (read_half, mut write_half) = client.into_split();

        write_half
            .write_all(b"{\"Type\":\"list\",\"TargetUUID\":\"u1\"}\n")
            .await
            .unwrap();

        let Some(HubRequest::Frame { reply, .. }) = request_rx.recv().await else {
            panic!("expected a frame request");
        };
        let mut response = Message::response(kind::LIST, "");
        response.text = "room_1".to_string();
        reply.unwrap().try_send(response).unwrap();

        let mut lines = BufReader::new(read_half).lines();
        let line = lines.next_line().await.unwrap().unwrap();
        let decoded = Message::decode(&line);
        assert_eq!(decoded.kind, kind::LIST);
        assert_eq!(decoded.text, "room_1");
    }

    #[tokio::test]
    async fn test_set_name_round_trip_through_a_live_hub() {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let hub = Hub::new(
            request_rx,
            HashMap::new(),
            std::env::temp_dir().join("roomhub-endpoint-test.json"),
        );
        tokio::spawn(hub.run());

        let client = endpoint_pair(request_tx).await.unwrap();
        let (read_half, mut write_half) = client.into_split();

        write_half
            .write_all(b"{\"Type\":\"set_name\",\"TargetUUID\":\"u1\",\"Text\":\"alice\"}\n")
            .await
            .unwrap();

        let mut lines = BufReader::new(read_half).lines();
        let line = lines.next_line().await.unwrap().unwrap();
        let response = Message::decode(&line);
        assert_eq!(response.kind, kind::SET_NAME);
        assert_eq!(response.username, "alice");
        assert_eq!(response.text, "user name successfully set to 'alice'");
        assert!(response.error.is_empty());
    }

    #[tokio::test]
    async fn test_udp_datagram_gets_a_single_response() {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let hub = Hub::new(
            request_rx,
            HashMap::new(),
            std::env::temp_dir().join("roomhub-udp-test.json"),
        );
        tokio::spawn(hub.run());

        let server = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let server_addr = server.local_addr().unwrap();
        tokio::spawn(run_udp_endpoint(server, request_tx));

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client
            .send_to(
                b"{\"Type\":\"set_name\",\"TargetUUID\":\"u9\",\"Text\":\"dora\"}",
                server_addr,
            )
            .await
            .unwrap();

        let mut buffer = [0u8; MAX_DATAGRAM];
        let (len, _) = client.recv_from(&mut buffer).await.unwrap();
        let response = Message::decode(&String::from_utf8_lossy(&buffer[..len]));
        assert_eq!(response.kind, kind::SET_NAME);
        assert_eq!(response.username, "dora");
    }
}
