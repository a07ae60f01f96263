//! Terminal chat client
//!
//! Connects a stream to the hub, renders incoming events, and translates
//! console commands into wire requests. Identity is a UUID kept in a
//! per-user file under the data directory: reused when the file exists,
//! freshly generated (and registered with a `set_name`) when it does not.

use std::path::{Path, PathBuf};

use futures_util::{SinkExt, StreamExt};
use tokio::fs;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LinesCodec};
use tracing::info;
use uuid::Uuid;

use crate::endpoint::MAX_LINE_LENGTH;
use crate::error::AppError;
use crate::message::{kind, Message};
use crate::types::ClientId;

/// Client-side configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding per-user identity files
    pub data_dir: PathBuf,
}

/// The client's resolved identity.
struct Identity {
    uuid: ClientId,
    name: String,
    /// True when the identifier was just generated and the hub has not seen
    /// it yet
    fresh: bool,
}

/// What one line of console input asks for.
#[derive(Debug, PartialEq)]
enum ConsoleAction {
    /// Send this request to the hub
    Request(Message),
    /// Disconnect and terminate
    Exit,
    /// Blank line
    Empty,
    /// Anything the console grammar cannot express
    Unrecognised,
}

/// Run the interactive client until the user exits or the hub goes away.
pub async fn run(config: ClientConfig) -> Result<(), AppError> {
    let addr = format!("{}:{}", config.host, config.port);
    let stream = TcpStream::connect(&addr).await?;
    info!("connected to hub at {}", addr);

    let framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));
    let (mut sink, mut events) = framed.split();

    let mut console = BufReader::new(tokio::io::stdin()).lines();
    let identity = init_identity(&config.data_dir, &mut console).await?;
    if identity.fresh {
        let mut msg = Message::request(kind::SET_NAME, identity.uuid.clone());
        msg.text = identity.name.clone();
        sink.send(msg.encode()?).await?;
    }

    // render events as they arrive
    let username = identity.name.clone();
    let reader = tokio::spawn(async move {
        while let Some(item) = events.next().await {
            match item {
                Ok(line) => render_event(&Message::decode(&line), &username),
                Err(_) => break,
            }
        }
        println!("> server closed connection");
    });

    // ask for the room list up front
    sink.send(Message::request(kind::LIST, identity.uuid.clone()).encode()?)
        .await?;

    while let Ok(Some(input)) = console.next_line().await {
        match parse_console_input(input.trim(), &identity.uuid) {
            ConsoleAction::Request(msg) => sink.send(msg.encode()?).await?,
            ConsoleAction::Exit => break,
            ConsoleAction::Empty => {}
            ConsoleAction::Unrecognised => println!(
                "> commands: list, create <room>, destroy <room>, join <room>, leave <room>, <room> <message>, exit"
            ),
        }
    }

    reader.abort();
    Ok(())
}

/// Read the identity file for the prompted user name, or mint a fresh
/// identifier and save it.
async fn init_identity(
    data_dir: &Path,
    console: &mut Lines<BufReader<Stdin>>,
) -> Result<Identity, AppError> {
    let name = loop {
        let input = prompt(console, "Enter new or previously used user name").await?;
        if !input.is_empty() {
            break input;
        }
    };

    let path = data_dir.join(format!("{}.dat", name));
    match fs::read_to_string(&path).await {
        Ok(contents) => Ok(Identity {
            uuid: ClientId::from(contents.trim()),
            name,
            fresh: false,
        }),
        Err(_) => {
            let uuid = Uuid::new_v4().to_string();
            fs::create_dir_all(data_dir).await?;
            fs::write(&path, &uuid).await?;
            Ok(Identity {
                uuid: ClientId::from(uuid),
                name,
                fresh: true,
            })
        }
    }
}

/// Print an input requirement and read one console line.
async fn prompt(
    console: &mut Lines<BufReader<Stdin>>,
    text: &str,
) -> Result<String, AppError> {
    println!("> {}:", text);
    match console.next_line().await? {
        Some(line) => Ok(line.trim().to_string()),
        None => Err(AppError::Identity),
    }
}

/// Translate one console line into an action.
///
/// Command keywords take precedence: a room literally named `create` cannot
/// be messaged from the console.
fn parse_console_input(input: &str, uuid: &ClientId) -> ConsoleAction {
    if input.is_empty() {
        return ConsoleAction::Empty;
    }
    if input == "exit" {
        return ConsoleAction::Exit;
    }
    if input == "list" {
        return ConsoleAction::Request(Message::request(kind::LIST, uuid.clone()));
    }

    let (head, rest) = match input.split_once(' ') {
        Some((head, rest)) => (head, rest.trim()),
        None => (input, ""),
    };
    if rest.is_empty() {
        return ConsoleAction::Unrecognised;
    }

    match head {
        "create" | "destroy" | "join" | "leave" => {
            let kind_tag = match head {
                "create" => kind::CREATE,
                "destroy" => kind::DESTROY,
                "join" => kind::JOIN,
                _ => kind::LEAVE,
            };
            let mut msg = Message::request(kind_tag, uuid.clone());
            msg.room = rest.to_string();
            ConsoleAction::Request(msg)
        }
        room => {
            let mut msg = Message::request(kind::NEW_MSG, uuid.clone());
            msg.room = room.to_string();
            msg.text = rest.to_string();
            ConsoleAction::Request(msg)
        }
    }
}

/// Print one hub event for the user.
fn render_event(event: &Message, username: &str) {
    if !event.error.is_empty() {
        println!("> request error: {}", event.error);
        return;
    }

    match event.kind.as_str() {
        kind::SET_NAME | kind::CREATE | kind::DESTROY => println!("{}", event.text),
        kind::LIST => {
            if event.text.is_empty() {
                println!("No rooms available");
            } else {
                println!("Available chat rooms: {}", event.text);
            }
        }
        kind::JOIN => {
            if event.username == username {
                println!("[{}] {}: You have joined the room.", event.room, event.username);
            } else {
                println!("[{}] {}: Joined the room.", event.room, event.username);
            }
        }
        kind::LEAVE => {
            if event.username == username {
                println!("[{}] {}: You are leaving the room.", event.room, event.username);
            } else {
                println!("[{}] {}: Left the room.", event.room, event.username);
            }
        }
        kind::NEW_MSG => println!("[{}] {}: {}", event.room, event.username, event.text),
        _ => println!("> response type not recognised"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uuid() -> ClientId {
        ClientId::from("u1")
    }

    #[test]
    fn test_parse_exit_and_blank_lines() {
        assert_eq!(parse_console_input("exit", &uuid()), ConsoleAction::Exit);
        assert_eq!(parse_console_input("", &uuid()), ConsoleAction::Empty);
    }

    #[test]
    fn test_parse_list() {
        let ConsoleAction::Request(msg) = parse_console_input("list", &uuid()) else {
            panic!("expected a request");
        };
        assert_eq!(msg.kind, kind::LIST);
        assert_eq!(msg.target_uuid, uuid());
    }

    #[test]
    fn test_parse_room_commands() {
        for (input, expected) in [
            ("create lobby", kind::CREATE),
            ("destroy lobby", kind::DESTROY),
            ("join lobby", kind::JOIN),
            ("leave lobby", kind::LEAVE),
        ] {
            let ConsoleAction::Request(msg) = parse_console_input(input, &uuid()) else {
                panic!("expected a request for {input}");
            };
            assert_eq!(msg.kind, expected);
            assert_eq!(msg.room, "lobby");
        }
    }

    #[test]
    fn test_parse_room_message() {
        let ConsoleAction::Request(msg) =
            parse_console_input("lobby hello over there", &uuid())
        else {
            panic!("expected a request");
        };
        assert_eq!(msg.kind, kind::NEW_MSG);
        assert_eq!(msg.room, "lobby");
        assert_eq!(msg.text, "hello over there");
    }

    #[test]
    fn test_parse_rejects_bare_words_and_missing_arguments() {
        assert_eq!(
            parse_console_input("join", &uuid()),
            ConsoleAction::Unrecognised
        );
        assert_eq!(
            parse_console_input("lobby", &uuid()),
            ConsoleAction::Unrecognised
        );
    }
}
