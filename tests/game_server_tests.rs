use seabattle::protocol::{
    GameOverReason, JoinTarget, PlacementMode, Reply, Request, FIELD_UPLOAD_INVALID, GAME_IS_OVER,
    GAME_NOT_STARTED, NO_FIELD_UPLOADED, UNKNOWN_COMMAND, WAITING_FOR_OPPONENT,
};
use seabattle::server::game::{Effect, GameServer};
use seabattle::server::{Phase, PlayerId, ServerConfig};
use seabattle::{Board, CellState, Coord, MemoryLeaderboard, Packet, PlayerNumber, ScoreStore, ShotOutcome};

const LAYOUT: [&str; 10] = [
    "K1-K4", "K7-K9", "F1-H1", "A8-A9", "D7-D8", "F4-F5", "B4", "D1", "H9", "H6",
];

fn layout() -> Board {
    let mut board = Board::new();
    for ship in LAYOUT {
        board.place_manual(ship).unwrap();
    }
    board
}

fn server(max_clients: usize) -> GameServer<MemoryLeaderboard> {
    let config = ServerConfig {
        max_clients,
        max_sessions: 2,
        seed: Some(11),
        ..ServerConfig::default()
    };
    GameServer::new(&config, MemoryLeaderboard::new())
}

fn to(effects: &[Effect], who: PlayerId) -> Vec<Reply> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Send { to, reply } if *to == who => Some(reply.clone()),
            _ => None,
        })
        .collect()
}

fn send(game: &mut GameServer<MemoryLeaderboard>, who: PlayerId, request: Request) -> Vec<Effect> {
    game.handle(who, &request.to_packet())
}

fn connect(game: &mut GameServer<MemoryLeaderboard>, nick: &str) -> PlayerId {
    let (id, effects) = game.connect().unwrap();
    let replies = to(&effects, id);
    assert!(matches!(replies[0], Reply::Welcome(_)));
    assert!(matches!(replies[1], Reply::SessionList(_)));
    assert!(matches!(replies[2], Reply::Leaderboard(_)));
    send(game, id, Request::SetNick(nick.to_string()));
    id
}

fn upload(game: &mut GameServer<MemoryLeaderboard>, who: PlayerId) -> Vec<Effect> {
    let effects = send(game, who, Request::FieldUpload(layout().field().encode()));
    assert_eq!(to(&effects, who), vec![Reply::FieldUpdate(layout().field().encode())]);
    send(game, who, Request::ShipPlaced)
}

/// Two players seated in session 0 with the known layout, game running.
fn started() -> (GameServer<MemoryLeaderboard>, PlayerId, PlayerId) {
    let mut game = server(4);
    let a = connect(&mut game, "ann");
    let b = connect(&mut game, "bob");
    send(&mut game, a, Request::JoinSession(JoinTarget::Auto));
    send(&mut game, b, Request::JoinSession(JoinTarget::Auto));
    upload(&mut game, a);
    let effects = upload(&mut game, b);
    assert_eq!(to(&effects, a).last(), Some(&Reply::YourTurn));
    assert_eq!(to(&effects, b).last(), Some(&Reply::OpponentTurn));
    (game, a, b)
}

#[test]
fn join_and_placement_sequence() {
    let mut game = server(4);
    let a = connect(&mut game, "ann");
    let b = connect(&mut game, "bob");

    let effects = send(&mut game, a, Request::JoinSession(JoinTarget::Auto));
    assert_eq!(
        to(&effects, a),
        vec![
            Reply::SessionCreated(0),
            Reply::PlayerAssigned(PlayerNumber::One),
            Reply::Wait("Waiting for opponent...".to_string()),
        ]
    );
    // b is still choosing and sees the refreshed list
    match &to(&effects, b)[..] {
        [Reply::SessionList(list)] => assert!(list.starts_with("Session 0: ann vs Waiting... (1/2 players)")),
        other => panic!("unexpected {:?}", other),
    }

    let effects = send(&mut game, b, Request::JoinSession(JoinTarget::Auto));
    assert_eq!(
        to(&effects, b),
        vec![
            Reply::SessionCreated(0),
            Reply::PlayerAssigned(PlayerNumber::Two),
            Reply::Welcome("Game starting soon!".to_string()),
            Reply::Wait("Opponent is placing ships".to_string()),
        ]
    );
    assert_eq!(to(&effects, a), vec![Reply::PlacementStart(PlayerNumber::One)]);
    assert_eq!(game.sessions().get(0).unwrap().phase, Phase::Placement);

    let effects = send(&mut game, a, Request::PlacementChoice(PlacementMode::Auto));
    let replies = to(&effects, a);
    assert!(matches!(replies[0], Reply::FieldUpdate(_)));
    assert_eq!(replies[1], Reply::PlacementDone);
    assert_eq!(to(&effects, b), vec![Reply::PlacementStart(PlayerNumber::Two)]);
    assert!(game.player(a).unwrap().board().ships().is_complete());

    let effects = send(&mut game, b, Request::PlacementChoice(PlacementMode::Manual));
    assert_eq!(to(&effects, b), vec![Reply::ManualPlacement]);

    let effects = upload(&mut game, b);
    let replies = to(&effects, a);
    assert_eq!(replies[0], Reply::GameStart(PlayerNumber::One));
    assert!(matches!(replies[1], Reply::FieldUpdate(_)));
    assert_eq!(replies[2], Reply::EnemyFogUpdate("0".repeat(100)));
    assert_eq!(replies[3], Reply::YourTurn);
    let replies = to(&effects, b);
    assert!(replies.contains(&Reply::GameStart(PlayerNumber::Two)));
    assert_eq!(replies.last(), Some(&Reply::OpponentTurn));
    assert_eq!(game.sessions().get(0).unwrap().phase, Phase::Active);
}

#[test]
fn hit_on_single_ship_keeps_turn_and_marks_neighbours() {
    let (mut game, a, b) = started();
    let effects = send(&mut game, a, Request::Shot("B4".to_string()));

    let replies = to(&effects, a);
    assert_eq!(
        replies[0],
        Reply::ShotResult {
            coord: "B4".to_string(),
            outcome: ShotOutcome::Hit
        }
    );
    let Reply::EnemyFogUpdate(fog) = &replies[1] else {
        panic!("expected fog, got {:?}", replies[1]);
    };
    let b4 = Coord::parse("B4").unwrap().index();
    assert_eq!(fog.as_bytes()[b4], b'3');
    for n in ["A3", "A4", "A5", "B3", "B5", "C3", "C4", "C5"] {
        assert_eq!(fog.as_bytes()[Coord::parse(n).unwrap().index()], b'2', "{}", n);
    }
    // fog never reveals ships
    assert!(!fog.contains('1'));
    assert_eq!(replies[2], Reply::YourTurn);

    let replies = to(&effects, b);
    assert_eq!(
        replies[0],
        Reply::OpponentShot {
            coord: "B4".to_string(),
            outcome: ShotOutcome::Hit
        }
    );
    assert!(replies.contains(&Reply::OpponentTurn));
    assert_eq!(game.sessions().get(0).unwrap().turn, PlayerNumber::One);
}

#[test]
fn miss_passes_turn() {
    let (mut game, a, b) = started();
    let effects = send(&mut game, b, Request::Shot("A1".to_string()));
    assert_eq!(to(&effects, b), vec![Reply::NotYourTurn]);
    assert!(to(&effects, a).is_empty());

    let effects = send(&mut game, a, Request::Shot("E5".to_string()));
    assert!(to(&effects, a).contains(&Reply::OpponentTurn));
    assert!(to(&effects, b).contains(&Reply::YourTurn));
    assert_eq!(game.sessions().get(0).unwrap().turn, PlayerNumber::Two);

    let effects = send(&mut game, a, Request::Shot("E6".to_string()));
    assert_eq!(to(&effects, a), vec![Reply::NotYourTurn]);
}

#[test]
fn invalid_shot_keeps_turn_and_changes_nothing() {
    let (mut game, a, b) = started();
    let before = game.player(b).unwrap().board().clone();
    let effects = send(&mut game, a, Request::Shot("Z99".to_string()));
    let replies = to(&effects, a);
    assert_eq!(
        replies[0],
        Reply::ShotResult {
            coord: "Z99".to_string(),
            outcome: ShotOutcome::Invalid
        }
    );
    assert!(replies.contains(&Reply::YourTurn));
    assert!(!to(&effects, b).iter().any(|r| matches!(r, Reply::OpponentShot { .. })));
    assert_eq!(game.player(b).unwrap().board(), &before);
}

#[test]
fn sinking_the_fleet_ends_the_game() {
    let (mut game, a, b) = started();
    let targets: Vec<String> = Coord::all()
        .filter(|&c| layout().field().get(c) == CellState::Ship)
        .map(|c| c.to_string())
        .collect();
    let mut last = Vec::new();
    for target in targets {
        last = send(&mut game, a, Request::Shot(target));
    }
    assert_eq!(to(&last, a).last(), Some(&Reply::GameOver(GameOverReason::Win)));
    assert_eq!(to(&last, b).last(), Some(&Reply::GameOver(GameOverReason::Lose)));
    assert_eq!(game.sessions().get(0).unwrap().phase, Phase::Over);

    let entries = game.scores().entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!((entries[0].name.as_str(), entries[0].score), ("ann", 1));

    let effects = send(&mut game, a, Request::Shot("E5".to_string()));
    assert_eq!(to(&effects, a), vec![Reply::Error(GAME_IS_OVER.to_string())]);
}

#[test]
fn disconnect_notifies_opponent_and_frees_session() {
    let (mut game, a, b) = started();
    let effects = game.disconnect(a);
    let replies = to(&effects, b);
    assert_eq!(replies[0], Reply::OpponentDisconnected);
    assert!(matches!(replies[1], Reply::SessionList(_)));
    assert!(game.player(a).is_none());
    assert!(game.sessions().get(0).is_none());
    assert_eq!(game.player(b).unwrap().session(), None);

    // the freed id is immediately reusable
    let c = connect(&mut game, "cid");
    let effects = send(&mut game, c, Request::JoinSession(JoinTarget::Id(0)));
    assert_eq!(to(&effects, c)[0], Reply::SessionCreated(0));
    assert_eq!(to(&effects, c)[1], Reply::PlayerAssigned(PlayerNumber::One));
}

#[test]
fn stale_handle_is_ignored() {
    let mut game = server(1);
    let a = connect(&mut game, "ann");
    game.disconnect(a);
    let b = connect(&mut game, "bob");
    assert_eq!(a.index(), b.index());
    assert!(send(&mut game, a, Request::RequestField).is_empty());
    assert!(game.disconnect(a).is_empty());
    assert!(game.player(b).is_some());
}

#[test]
fn quit_leaves_session_but_stays_connected() {
    let (mut game, a, b) = started();
    let effects = send(&mut game, a, Request::Quit);
    let replies = to(&effects, a);
    assert_eq!(replies[0], Reply::Bye);
    assert!(matches!(replies[1], Reply::SessionList(_)));
    assert_eq!(to(&effects, b)[0], Reply::OpponentDisconnected);
    assert!(!effects.iter().any(|e| matches!(e, Effect::Close(_))));
    assert!(game.player(a).is_some());
}

#[test]
fn disconnect_request_says_bye_then_closes() {
    let mut game = server(2);
    let a = connect(&mut game, "ann");
    let effects = send(&mut game, a, Request::Disconnect);
    assert_eq!(
        effects,
        vec![
            Effect::Send {
                to: a,
                reply: Reply::Bye
            },
            Effect::Close(a),
        ]
    );
}

#[test]
fn capacity_is_enforced() {
    let mut game = server(2);
    connect(&mut game, "ann");
    connect(&mut game, "bob");
    assert!(game.connect().is_none());
    assert_eq!(game.player_count(), 2);
}

#[test]
fn phase_errors() {
    let mut game = server(4);
    let a = connect(&mut game, "ann");

    let effects = game.handle(a, &Packet::new("DANCE", "", ""));
    assert_eq!(to(&effects, a), vec![Reply::Error(UNKNOWN_COMMAND.to_string())]);

    let effects = send(&mut game, a, Request::JoinSession(JoinTarget::Id(7)));
    let replies = to(&effects, a);
    assert_eq!(replies[0], Reply::Error("Invalid session number".to_string()));
    assert!(matches!(replies[1], Reply::SessionList(_)));

    send(&mut game, a, Request::JoinSession(JoinTarget::Id(1)));
    let effects = send(&mut game, a, Request::PlacementChoice(PlacementMode::Auto));
    assert_eq!(to(&effects, a), vec![Reply::Error(WAITING_FOR_OPPONENT.to_string())]);
    let effects = send(&mut game, a, Request::Shot("A1".to_string()));
    assert_eq!(to(&effects, a), vec![Reply::Error(GAME_NOT_STARTED.to_string())]);

    let b = connect(&mut game, "bob");
    send(&mut game, b, Request::JoinSession(JoinTarget::Id(1)));
    let effects = send(&mut game, a, Request::ShipPlaced);
    assert_eq!(to(&effects, a), vec![Reply::Error(NO_FIELD_UPLOADED.to_string())]);

    let mut bad = layout();
    bad.resolve_shot("B4");
    let effects = send(&mut game, a, Request::FieldUpload(bad.field().encode()));
    assert_eq!(to(&effects, a), vec![Reply::Error(FIELD_UPLOAD_INVALID.to_string())]);

    let c = connect(&mut game, "cid");
    let effects = send(&mut game, c, Request::JoinSession(JoinTarget::Id(1)));
    assert_eq!(
        to(&effects, c)[0],
        Reply::Error("Session is full or unavailable".to_string())
    );
}

#[test]
fn shutdown_reaches_everyone() {
    let mut game = server(4);
    let a = connect(&mut game, "ann");
    let b = connect(&mut game, "bob");
    let effects = game.shutdown();
    for who in [a, b] {
        assert_eq!(to(&effects, who), vec![Reply::GameOver(GameOverReason::ServerShutdown)]);
        assert!(effects.contains(&Effect::Close(who)));
    }
}
