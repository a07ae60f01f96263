//! Multi-Room Chat Hub - Entry Point
//!
//! Runs either the hub (`server`) or the interactive terminal client
//! (`client`) against a configured host/port.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use roomhub::{client, server, AppError, ClientConfig, ServerConfig};

#[derive(Parser)]
#[command(name = "roomhub", about = "Multi-room chat hub and terminal client")]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Run the chat hub
    Server {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 8000)]
        port: u16,
        /// Directory for the user registry snapshot
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },
    /// Run the terminal client
    Client {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 8000)]
        port: u16,
        /// Directory for identity files
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Use RUST_LOG to control log level, e.g. RUST_LOG=roomhub=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("roomhub=info")),
        )
        .init();

    match Cli::parse().mode {
        Mode::Server {
            host,
            port,
            data_dir,
        } => {
            server::run(ServerConfig {
                host,
                port,
                data_dir,
            })
            .await
        }
        Mode::Client {
            host,
            port,
            data_dir,
        } => {
            client::run(ClientConfig {
                host,
                port,
                data_dir,
            })
            .await
        }
    }
}
