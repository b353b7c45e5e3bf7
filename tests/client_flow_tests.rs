use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use seabattle::client::input::{spawn_frame_reader, InputMux};
use seabattle::client::{ClientApp, SessionEnd};
use seabattle::protocol::*;
use seabattle::transport::in_memory::{InMemorySink, InMemorySource};
use seabattle::transport::{FrameSink, FrameSource, InMemoryTransport};
use seabattle::{Board, Packet};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Duration};

const LAYOUT: [&str; 10] = [
    "K1-K4", "K7-K9", "F1-H1", "A8-A9", "D7-D8", "F4-F5", "B4", "D1", "H9", "H6",
];

type AppResult = (SessionEnd, Vec<String>);

struct Scripted {
    from_client: InMemorySource,
    to_client: InMemorySink,
    keyboard: mpsc::Sender<String>,
    app: JoinHandle<AppResult>,
}

impl Scripted {
    fn start() -> Self {
        let (server_end, client_end) = InMemoryTransport::pair();
        let (from_client, to_client) = server_end.into_split();
        let (source, sink) = client_end.into_split();
        let stop = Arc::new(AtomicBool::new(false));
        let (keyboard, line_rx) = mpsc::channel(8);
        let (packet_tx, packet_rx) = mpsc::channel(64);
        spawn_frame_reader(source, packet_tx, stop.clone());
        let mux = InputMux::new(line_rx, packet_rx, stop);
        let mut app = ClientApp::new("ann", mux, sink, Vec::<String>::new());
        let app = tokio::spawn(async move {
            let end = app.run().await;
            (end, app.into_view().into_output())
        });
        Scripted {
            from_client,
            to_client,
            keyboard,
            app,
        }
    }

    async fn push(&mut self, command: &str, arg1: &str, arg2: &str) {
        self.to_client.send(&Packet::new(command, arg1, arg2)).await.unwrap();
    }

    /// Type a line once the client has had time to process earlier packets.
    async fn type_line(&mut self, line: &str) {
        sleep(Duration::from_millis(100)).await;
        self.keyboard.send(line.to_string()).await.unwrap();
    }

    async fn expect(&mut self, command: &str) -> Packet {
        let packet = timeout(Duration::from_secs(5), self.from_client.recv())
            .await
            .expect("client went quiet")
            .expect("client hung up");
        assert_eq!(packet.command(), command, "got {}", packet);
        packet
    }

    async fn greet(&mut self) {
        assert_eq!(self.expect(SET_NICK).await.arg1(), "ann");
        self.push(WELCOME, "Welcome to Battleship! Choose a session:", "").await;
        self.push(SESSION_LIST, "Session 0: EMPTY (0/2 players)\n", "").await;
        self.push(LEADERBOARD, LEADERBOARD_EMPTY, "").await;
    }

    async fn finish(self) -> AppResult {
        timeout(Duration::from_secs(5), self.app)
            .await
            .expect("client did not finish")
            .expect("client panicked")
    }
}

fn layout_cells() -> String {
    let mut board = Board::new();
    for ship in LAYOUT {
        board.place_manual(ship).unwrap();
    }
    board.field().encode()
}

#[tokio::test(flavor = "multi_thread")]
async fn auto_game_to_victory() {
    let mut s = Scripted::start();
    s.greet().await;

    s.type_line("auto").await;
    assert_eq!(s.expect(JOIN_SESSION).await.arg1(), "-1");
    s.push(SESSION_CREATED, "0", "").await;
    s.push(PLAYER_ASSIGNED, "1", "").await;
    s.push(WAIT, "Waiting for opponent...", "").await;
    s.push(PLACEMENT_START, "1", "").await;

    s.type_line("1").await;
    assert_eq!(s.expect(PLACEMENT_CHOICE).await.arg1(), "auto");
    s.push(FIELD_UPDATE, &layout_cells(), "").await;
    s.push(PLACEMENT_DONE, "", "").await;
    s.push(GAME_START, "1", "").await;
    s.push(ENEMY_FOG_UPDATE, &"0".repeat(100), "").await;
    s.push(YOUR_TURN, "", "").await;

    // rejected locally, never sent
    s.type_line("J4").await;
    s.type_line("B4").await;
    assert_eq!(s.expect(SHOT).await.arg1(), "B4");
    s.push(SHOT_RESULT, "B4", "HIT").await;
    s.push(GAME_OVER, "WIN", "").await;

    let (end, output) = s.finish().await;
    assert_eq!(end, SessionEnd::Won);
    assert!(output.iter().any(|l| l == "You won!"));
    assert!(output.iter().any(|l| l.contains("B4 -> HIT")));
}

#[tokio::test(flavor = "multi_thread")]
async fn manual_placement_uploads_layout() {
    let mut s = Scripted::start();
    s.greet().await;
    s.type_line("0").await;
    assert_eq!(s.expect(JOIN_SESSION).await.arg1(), "0");
    s.push(SESSION_CREATED, "0", "").await;
    s.push(PLAYER_ASSIGNED, "2", "").await;
    s.push(PLACEMENT_START, "2", "").await;

    s.type_line("2").await;
    assert_eq!(s.expect(PLACEMENT_CHOICE).await.arg1(), "manual");
    s.push(MANUAL_PLACEMENT, "", "").await;

    s.type_line("A1-B2").await;
    for (i, ship) in LAYOUT.iter().enumerate() {
        s.type_line(ship).await;
        if i == 0 {
            // a second four-cell ship is over quota
            s.type_line("C1-C4").await;
        }
    }
    assert_eq!(s.expect(FIELD_UPLOAD).await.arg1(), layout_cells());
    s.expect(SHIP_PLACED).await;

    s.push(PLACEMENT_DONE, "", "").await;
    s.push(OPPONENT_DISCONNECTED, "", "").await;
    let (end, output) = s.finish().await;
    assert_eq!(end, SessionEnd::OpponentLeft);
    assert!(output.iter().any(|l| l == "No ships of that length left."));
}

#[tokio::test(flavor = "multi_thread")]
async fn join_error_returns_to_session_prompt() {
    let mut s = Scripted::start();
    s.greet().await;
    s.type_line("5").await;
    s.expect(JOIN_SESSION).await;
    s.push(ERROR, "Session is full or unavailable", "").await;
    s.push(SESSION_LIST, "Session 5: a vs b (2/2 players)\n", "").await;

    s.type_line("auto").await;
    assert_eq!(s.expect(JOIN_SESSION).await.arg1(), "-1");

    s.type_line("quit").await;
    s.expect(DISCONNECT).await;
    let (end, _) = s.finish().await;
    assert_eq!(end, SessionEnd::Quit);
}

#[tokio::test(flavor = "multi_thread")]
async fn server_hangup_ends_client() {
    let mut s = Scripted::start();
    s.greet().await;
    let Scripted { to_client, from_client, keyboard, app } = s;
    drop(to_client);
    let (end, _) = timeout(Duration::from_secs(5), app).await.unwrap().unwrap();
    assert_eq!(end, SessionEnd::Disconnected);
    drop((from_client, keyboard));
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_send_ends_as_disconnected() {
    let mut s = Scripted::start();
    s.greet().await;
    let Scripted { from_client, to_client, keyboard, app } = s;
    // nobody is reading what the client sends any more
    drop(from_client);
    sleep(Duration::from_millis(100)).await;
    keyboard.send("auto".to_string()).await.unwrap();
    let (end, _) = timeout(Duration::from_secs(5), app).await.unwrap().unwrap();
    assert_eq!(end, SessionEnd::Disconnected);
    drop((to_client, keyboard));
}
