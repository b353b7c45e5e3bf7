//! Game server: session bookkeeping, the game state machine and the TCP
//! multiplexer that feeds it.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::{DEFAULT_BIND, LEADERBOARD_FILE, MAX_CLIENTS, MAX_SESSIONS};
use crate::transport::tcp::DEFAULT_WRITE_TIMEOUT;

pub mod game;
pub mod mux;
pub mod sessions;

pub use game::{Effect, GameServer, Player};
pub use mux::Server;
pub use sessions::{Phase, PlayerId, SessionId, SessionSummary, SessionTable};

/// Frames queued for one client before it is treated as stalled.
pub const SEND_QUEUE_DEPTH: usize = 64;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub max_clients: usize,
    pub max_sessions: usize,
    pub leaderboard_path: PathBuf,
    /// Seed for automatic placement; random when absent.
    pub seed: Option<u64>,
    /// Outgoing frames a client may have pending; beyond that it is dropped.
    pub send_queue: usize,
    /// A client whose socket accepts no frame for this long is dropped.
    pub write_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: DEFAULT_BIND.to_string(),
            max_clients: MAX_CLIENTS,
            max_sessions: MAX_SESSIONS,
            leaderboard_path: PathBuf::from(LEADERBOARD_FILE),
            seed: None,
            send_queue: SEND_QUEUE_DEPTH,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}
