#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod model;
pub mod protocol;

#[cfg(feature = "std")]
pub mod arena;
#[cfg(feature = "std")]
pub mod client;
#[cfg(feature = "std")]
pub mod leaderboard;
#[cfg(feature = "std")]
mod logging;
#[cfg(feature = "std")]
pub mod server;
#[cfg(feature = "std")]
pub mod transport;

pub use model::*;
pub use protocol::*;

#[cfg(feature = "std")]
pub use arena::{Arena, Handle};
#[cfg(feature = "std")]
pub use leaderboard::{FileLeaderboard, MemoryLeaderboard, ScoreEntry, ScoreStore};
#[cfg(feature = "std")]
pub use logging::init_logging;
#[cfg(feature = "std")]
pub use transport::tcp::TcpTransport;
