//! Scripted client that joins automatically, places ships automatically
//! and fires at random unexplored cells. Used by the self-play harness.

use anyhow::{bail, Context};
use log::{debug, info};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

use crate::leaderboard::{MemoryLeaderboard, ScoreEntry, ScoreStore};
use crate::protocol::{GameOverReason, JoinTarget, PlacementMode, Reply, Request};
use crate::server::{Server, ServerConfig};
use crate::transport::{FrameSink, FrameSource, TcpTransport};
use crate::{CellState, Coord, Field};

#[derive(Debug, Clone, Serialize)]
pub struct BotReport {
    pub nickname: String,
    pub outcome: String,
    pub shots: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelfPlayReport {
    pub seed: u64,
    pub winner: Option<String>,
    pub bots: Vec<BotReport>,
    pub leaderboard: Vec<ScoreEntry>,
}

/// Play one game over `transport` and report how it ended.
pub async fn play_bot<T>(mut transport: T, nickname: &str, seed: u64) -> anyhow::Result<BotReport>
where
    T: FrameSource + FrameSink,
{
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut targets: Vec<Coord> = Coord::all().collect();
    targets.shuffle(&mut rng);
    let mut fog = Field::new();
    let mut shots = 0;

    transport.send(&Request::SetNick(nickname.to_string()).to_packet()).await?;
    transport.send(&Request::JoinSession(JoinTarget::Auto).to_packet()).await?;

    loop {
        let packet = transport.recv().await.context("server went away mid-game")?;
        let Ok(reply) = Reply::from_packet(&packet) else {
            debug!("{} ignoring {}", nickname, packet);
            continue;
        };
        match reply {
            Reply::PlacementStart(_) => {
                transport
                    .send(&Request::PlacementChoice(PlacementMode::Auto).to_packet())
                    .await?;
            }
            Reply::EnemyFogUpdate(cells) => fog = Field::decode(&cells)?,
            Reply::YourTurn => {
                let target = loop {
                    let Some(coord) = targets.pop() else {
                        bail!("{} ran out of targets", nickname);
                    };
                    if fog.get(coord) == CellState::Empty {
                        break coord;
                    }
                };
                shots += 1;
                transport.send(&Request::Shot(target.to_string()).to_packet()).await?;
            }
            Reply::GameOver(reason) => {
                let outcome = match reason {
                    GameOverReason::Win => "WIN",
                    GameOverReason::Lose => "LOSE",
                    GameOverReason::ServerShutdown => "SERVER_SHUTDOWN",
                };
                return Ok(BotReport {
                    nickname: nickname.to_string(),
                    outcome: outcome.to_string(),
                    shots,
                });
            }
            Reply::OpponentDisconnected => {
                return Ok(BotReport {
                    nickname: nickname.to_string(),
                    outcome: "OPPONENT_DISCONNECTED".to_string(),
                    shots,
                });
            }
            Reply::Error(reason) => bail!("{} got server error {}", nickname, reason),
            _ => {}
        }
    }
}

/// Run a server on an ephemeral local port and let two bots play it out.
pub async fn run_selfplay(seed: u64) -> anyhow::Result<SelfPlayReport> {
    let config = ServerConfig {
        bind: "127.0.0.1:0".to_string(),
        seed: Some(seed),
        ..ServerConfig::default()
    };
    let server = Server::bind_with_store(&config, MemoryLeaderboard::new()).await?;
    let addr = server.local_addr()?;
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server_task = tokio::spawn(server.run(async {
        let _ = stop_rx.await;
    }));

    let first = TcpTransport::connect(addr).await?;
    let second = TcpTransport::connect(addr).await?;
    let (a, b) = tokio::try_join!(
        play_bot(first, "alpha", seed.wrapping_add(1)),
        play_bot(second, "bravo", seed.wrapping_add(2)),
    )?;
    let _ = stop_tx.send(());
    let scores = server_task.await??;

    let winner = [&a, &b]
        .into_iter()
        .find(|r| r.outcome == "WIN")
        .map(|r| r.nickname.clone());
    info!("self-play finished, winner {:?}", winner);
    Ok(SelfPlayReport {
        seed,
        winner,
        bots: vec![a, b],
        leaderboard: scores.entries()?,
    })
}
