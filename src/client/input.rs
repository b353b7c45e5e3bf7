//! Merging keyboard lines with server packets.
//!
//! A blocking thread reads stdin lines and a task reads frames; both feed
//! bounded channels that [`InputMux`] waits on together. Packets always go
//! first: every packet that has arrived is applied before a queued line is
//! handed out, and while waiting for the user, packets keep being applied as
//! they come in.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinHandle;

use crate::protocol::Packet;
use crate::transport::{FrameSource, TransportError};

pub const LINE_QUEUE_DEPTH: usize = 16;
pub const PACKET_QUEUE_DEPTH: usize = 64;

/// How often a blocked wait re-checks the stop flag.
pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// What the packet handler wants after a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Abandon the current prompt; a queued line stays queued.
    Interrupt,
}

pub trait PacketHandler {
    fn apply(&mut self, packet: Packet) -> Flow;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    /// A packet changed what the user should be asked.
    Interrupted,
    /// The server connection or stdin is gone, or a stop was requested.
    Closed,
}

enum Woken {
    Packet(Option<Packet>),
    Line(Option<String>),
    Tick,
}

pub struct InputMux {
    lines: mpsc::Receiver<String>,
    packets: mpsc::Receiver<Packet>,
    held_line: Option<String>,
    held_packet: Option<Packet>,
    lines_open: bool,
    packets_open: bool,
    stop: Arc<AtomicBool>,
}

impl InputMux {
    pub fn new(lines: mpsc::Receiver<String>, packets: mpsc::Receiver<Packet>, stop: Arc<AtomicBool>) -> Self {
        InputMux {
            lines,
            packets,
            held_line: None,
            held_packet: None,
            lines_open: true,
            packets_open: true,
            stop,
        }
    }

    /// Wait for the next user line, applying packets meanwhile.
    pub async fn next_input<H: PacketHandler + ?Sized>(&mut self, handler: &mut H) -> Input {
        loop {
            if self.drain_packets(handler) == Flow::Interrupt {
                return Input::Interrupted;
            }
            if let Some(line) = self.held_line.take() {
                return Input::Line(line);
            }
            match self.lines.try_recv() {
                Ok(line) => return Input::Line(line),
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => self.lines_open = false,
            }
            if !self.packets_open || !self.lines_open || self.stop.load(Ordering::SeqCst) {
                return Input::Closed;
            }

            let woken = tokio::time::timeout(POLL_INTERVAL, async {
                tokio::select! {
                    biased;
                    packet = self.packets.recv() => Woken::Packet(packet),
                    line = self.lines.recv() => Woken::Line(line),
                }
            })
            .await
            .unwrap_or(Woken::Tick);

            match woken {
                Woken::Packet(Some(packet)) => self.held_packet = Some(packet),
                Woken::Packet(None) => self.packets_open = false,
                Woken::Line(Some(line)) => self.held_line = Some(line),
                Woken::Line(None) => self.lines_open = false,
                Woken::Tick => {}
            }
        }
    }

    /// Like [`next_input`](Self::next_input) but rides through interrupts.
    pub async fn next_line<H: PacketHandler + ?Sized>(&mut self, handler: &mut H) -> Option<String> {
        loop {
            match self.next_input(handler).await {
                Input::Line(line) => return Some(line),
                Input::Interrupted => continue,
                Input::Closed => return None,
            }
        }
    }

    /// Apply every packet already received, stopping early on an interrupt.
    fn drain_packets<H: PacketHandler + ?Sized>(&mut self, handler: &mut H) -> Flow {
        if let Some(packet) = self.held_packet.take() {
            if handler.apply(packet) == Flow::Interrupt {
                return Flow::Interrupt;
            }
        }
        loop {
            match self.packets.try_recv() {
                Ok(packet) => {
                    if handler.apply(packet) == Flow::Interrupt {
                        return Flow::Interrupt;
                    }
                }
                Err(TryRecvError::Empty) => return Flow::Continue,
                Err(TryRecvError::Disconnected) => {
                    self.packets_open = false;
                    return Flow::Continue;
                }
            }
        }
    }
}

/// Read lines on a plain thread, since stdin reads cannot be cancelled.
/// The thread ends at end of input, on a read error, or once the receiver
/// is gone.
pub fn spawn_line_reader<R>(reader: R, tx: mpsc::Sender<String>, stop: Arc<AtomicBool>) -> thread::JoinHandle<()>
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || {
        for line in reader.lines() {
            if stop.load(Ordering::SeqCst) {
                break;
            }
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("stdin read failed: {}", e);
                    break;
                }
            }
        }
        debug!("line reader finished");
    })
}

/// Forward frames from `source` until it fails or the receiver is gone.
pub fn spawn_frame_reader<S>(mut source: S, tx: mpsc::Sender<Packet>, stop: Arc<AtomicBool>) -> JoinHandle<()>
where
    S: FrameSource + 'static,
{
    tokio::spawn(async move {
        while !stop.load(Ordering::SeqCst) {
            match source.recv().await {
                Ok(packet) => {
                    if tx.send(packet).await.is_err() {
                        break;
                    }
                }
                Err(TransportError::Closed) => {
                    debug!("server closed the connection");
                    break;
                }
                Err(e) => {
                    warn!("connection error: {}", e);
                    break;
                }
            }
        }
    })
}
