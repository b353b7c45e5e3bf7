//! Connection multiplexer.
//!
//! One task owns the [`GameServer`]. Each accepted socket gets a reader task
//! that forwards decoded frames over a channel and a writer task that drains
//! a bounded outgoing queue, so the owner never blocks on a single client.
//! A client whose queue overflows, or whose socket stops taking frames, is
//! dropped.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use log::{debug, info, warn};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

use crate::leaderboard::{FileLeaderboard, ScoreStore};
use crate::protocol::Packet;
use crate::server::game::{Effect, GameServer};
use crate::server::sessions::PlayerId;
use crate::server::ServerConfig;
use crate::transport::{FrameSink, FrameSource, TcpTransport, TransportError};

/// How long shutdown waits for queued farewells to reach clients.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug)]
enum ConnEvent {
    Frame { player: PlayerId, packet: Packet },
    Closed { player: PlayerId, reason: String },
}

struct Connection {
    addr: SocketAddr,
    outgoing: mpsc::Sender<Packet>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

pub struct Server<S> {
    listener: TcpListener,
    game: GameServer<S>,
    connections: HashMap<PlayerId, Connection>,
    events_tx: mpsc::UnboundedSender<ConnEvent>,
    events_rx: mpsc::UnboundedReceiver<ConnEvent>,
    draining: Vec<JoinHandle<()>>,
    send_queue: usize,
    write_timeout: Duration,
}

impl Server<FileLeaderboard> {
    /// Bind with the file leaderboard named in `config`.
    pub async fn bind(config: &ServerConfig) -> anyhow::Result<Self> {
        let scores = FileLeaderboard::new(config.leaderboard_path.clone());
        Self::bind_with_store(config, scores).await
    }
}

impl<S: ScoreStore + 'static> Server<S> {
    pub async fn bind_with_store(config: &ServerConfig, scores: S) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(&config.bind)
            .await
            .with_context(|| format!("failed to bind {}", config.bind))?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Ok(Server {
            listener,
            game: GameServer::new(config, scores),
            connections: HashMap::new(),
            events_tx,
            events_rx,
            draining: Vec::new(),
            send_queue: config.send_queue.max(1),
            write_timeout: config.write_timeout,
        })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until `shutdown` resolves, then notify every client and close.
    /// Hands back the score store.
    pub async fn run<F>(mut self, shutdown: F) -> anyhow::Result<S>
    where
        F: Future<Output = ()>,
    {
        info!("listening on {}", self.local_addr()?);
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => self.accept(stream, addr),
                    Err(e) => warn!("accept failed: {}", e),
                },
                Some(event) = self.events_rx.recv() => self.on_event(event),
            }
        }

        info!("shutting down, notifying {} client(s)", self.connections.len());
        let effects = self.game.shutdown();
        self.apply(effects);
        let pending = std::mem::take(&mut self.draining);
        let flush = async {
            for writer in pending {
                let _ = writer.await;
            }
        };
        if tokio::time::timeout(FLUSH_TIMEOUT, flush).await.is_err() {
            warn!("some clients did not receive the shutdown notice in time");
        }
        Ok(self.game.into_scores())
    }

    fn accept(&mut self, stream: TcpStream, addr: SocketAddr) {
        let Some((player, effects)) = self.game.connect() else {
            warn!("max clients reached, rejecting connection from {}", addr);
            drop(stream);
            return;
        };
        info!("accepted {} as player {}", addr, player);
        let (mut source, mut sink) = TcpTransport::new(stream).into_split();

        let events = self.events_tx.clone();
        let reader = tokio::spawn(async move {
            loop {
                match source.recv().await {
                    Ok(packet) => {
                        if events.send(ConnEvent::Frame { player, packet }).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        let _ = events.send(ConnEvent::Closed {
                            player,
                            reason: e.to_string(),
                        });
                        break;
                    }
                }
            }
        });

        let (outgoing, mut queue) = mpsc::channel::<Packet>(self.send_queue);
        let events = self.events_tx.clone();
        let write_timeout = self.write_timeout;
        let writer = tokio::spawn(async move {
            while let Some(packet) = queue.recv().await {
                let sent = match tokio::time::timeout(write_timeout, sink.send(&packet)).await {
                    Ok(sent) => sent,
                    Err(_) => Err(TransportError::Io(io::Error::new(
                        io::ErrorKind::TimedOut,
                        "client stopped reading",
                    ))),
                };
                if let Err(e) = sent {
                    let _ = events.send(ConnEvent::Closed {
                        player,
                        reason: e.to_string(),
                    });
                    return;
                }
            }
            let _ = sink.shutdown().await;
        });

        self.connections.insert(
            player,
            Connection {
                addr,
                outgoing,
                reader,
                writer,
            },
        );
        self.apply(effects);
    }

    fn on_event(&mut self, event: ConnEvent) {
        match event {
            ConnEvent::Frame { player, packet } => {
                if self.connections.contains_key(&player) {
                    let effects = self.game.handle(player, &packet);
                    self.apply(effects);
                }
            }
            ConnEvent::Closed { player, reason } => {
                if let Some(conn) = self.connections.get(&player) {
                    info!("client {} (player {}) closed: {}", conn.addr, player, reason);
                    self.close(player);
                    let effects = self.game.disconnect(player);
                    self.apply(effects);
                }
            }
        }
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        let mut queue: VecDeque<Effect> = effects.into();
        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::Send { to, reply } => {
                    let Some(conn) = self.connections.get(&to) else { continue };
                    let packet = reply.to_packet();
                    debug!("player {} <- {}", to, packet.command());
                    match conn.outgoing.try_send(packet) {
                        Ok(()) => {}
                        Err(TrySendError::Full(_)) => {
                            warn!("client {} (player {}) is not reading, dropping it", conn.addr, to);
                            queue.push_back(Effect::Close(to));
                        }
                        // The writer already failed; its Closed event is on the way.
                        Err(TrySendError::Closed(_)) => {}
                    }
                }
                Effect::Close(player) => {
                    if self.close(player) {
                        queue.extend(self.game.disconnect(player));
                    }
                }
            }
        }
    }

    /// Stop reading from `player` and let its writer drain and hang up.
    fn close(&mut self, player: PlayerId) -> bool {
        let Some(conn) = self.connections.remove(&player) else {
            return false;
        };
        conn.reader.abort();
        drop(conn.outgoing);
        self.draining.retain(|w| !w.is_finished());
        self.draining.push(conn.writer);
        true
    }
}
