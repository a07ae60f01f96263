//! User registry snapshot I/O
//!
//! Persists the user registry to a single JSON file so registered names
//! survive hub restarts. Room state is deliberately ephemeral. Writes go to
//! a temp file in the same directory followed by a rename, so a crash
//! mid-write never leaves a truncated snapshot behind.

use std::collections::HashMap;
use std::path::Path;

use tokio::fs;

use crate::error::AppError;
use crate::types::ClientId;
use crate::user::User;

/// Load a user registry snapshot.
///
/// A missing file is an ordinary error for the caller to log and ignore.
/// Restored users carry no outbound reference until their next request.
pub async fn load(path: &Path) -> Result<HashMap<ClientId, User>, AppError> {
    let contents = fs::read(path).await?;
    Ok(serde_json::from_slice(&contents)?)
}

/// Store the user registry snapshot atomically.
pub async fn store(path: &Path, users: &HashMap<ClientId, User>) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let encoded = serde_json::to_vec_pretty(users)?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, &encoded).await?;
    fs::rename(&tmp, path).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_snapshot(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("roomhub-{}-{}.json", name, std::process::id()))
    }

    #[tokio::test]
    async fn test_store_then_load_round_trips() {
        let path = temp_snapshot("round-trip");

        let mut users = HashMap::new();
        users.insert(ClientId::from("u1"), User::new("alice".to_string(), None));
        users.insert(
            ClientId::from("u2"),
            User {
                name: "bob".to_string(),
                online: false,
                sender: None,
            },
        );

        store(&path, &users).await.unwrap();
        let restored = load(&path).await.unwrap();

        assert_eq!(restored.len(), 2);
        assert_eq!(restored[&ClientId::from("u1")].name, "alice");
        assert!(restored[&ClientId::from("u1")].online);
        assert!(!restored[&ClientId::from("u2")].online);
        assert!(restored[&ClientId::from("u1")].sender.is_none());

        fs::remove_file(&path).await.ok();
    }

    #[tokio::test]
    async fn test_load_missing_file_is_an_error() {
        let path = temp_snapshot("missing");
        assert!(load(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_store_replaces_existing_snapshot() {
        let path = temp_snapshot("replace");

        let mut users = HashMap::new();
        users.insert(ClientId::from("u1"), User::new("alice".to_string(), None));
        store(&path, &users).await.unwrap();

        users.insert(ClientId::from("u2"), User::new("bob".to_string(), None));
        store(&path, &users).await.unwrap();

        let restored = load(&path).await.unwrap();
        assert_eq!(restored.len(), 2);

        fs::remove_file(&path).await.ok();
    }
}
