//! Terminal client.

use std::io::{self, BufRead, BufReader, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use log::{debug, info};
use tokio::sync::mpsc;

use crate::protocol::sanitize_nickname;
use crate::transport::TcpTransport;

pub mod bot;
pub mod input;
pub mod render;
pub mod ui;
pub mod view;

pub use input::{Flow, Input, InputMux, PacketHandler};
pub use render::{LineSink, StdoutSink};
pub use ui::ClientApp;
pub use view::{ClientView, Prompt, SessionEnd};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// `host:port` of the server.
    pub server: String,
    /// Asked for on stdin when absent.
    pub nickname: Option<String>,
}

fn ask_nickname() -> anyhow::Result<String> {
    print!("Enter your nickname: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Connect and play one interactive game on the terminal. Only startup
/// failures are errors; a connection lost mid-game ends as
/// [`SessionEnd::Disconnected`].
pub async fn run_client(config: ClientConfig) -> anyhow::Result<SessionEnd> {
    let nickname = match config.nickname {
        Some(name) => name,
        None => ask_nickname()?,
    };
    let nickname = sanitize_nickname(&nickname);

    let transport = TcpTransport::connect(&config.server)
        .await
        .with_context(|| format!("could not connect to {}", config.server))?;
    info!("connected to {}", config.server);
    let (source, sink) = transport.into_split();

    let stop = Arc::new(AtomicBool::new(false));
    let (line_tx, line_rx) = mpsc::channel(input::LINE_QUEUE_DEPTH);
    let (packet_tx, packet_rx) = mpsc::channel(input::PACKET_QUEUE_DEPTH);
    let stdin_reader = input::spawn_line_reader(BufReader::new(io::stdin()), line_tx, stop.clone());
    let frame_reader = input::spawn_frame_reader(source, packet_tx, stop.clone());

    let mux = InputMux::new(line_rx, packet_rx, stop.clone());
    let mut app = ClientApp::new(nickname, mux, sink, StdoutSink);
    let end = tokio::select! {
        end = app.run() => end,
        _ = tokio::signal::ctrl_c() => {
            println!();
            SessionEnd::Quit
        }
    };

    stop.store(true, Ordering::SeqCst);
    frame_reader.abort();
    let _ = frame_reader.await;
    // A thread blocked on stdin cannot be woken; it exits with the process.
    if stdin_reader.is_finished() {
        let _ = stdin_reader.join();
    } else {
        debug!("leaving stdin reader blocked");
    }
    Ok(end)
}
