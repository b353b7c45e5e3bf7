use seabattle::config::{PACKET_ARG1_SIZE, PACKET_COMMAND_SIZE, PACKET_SIZE};
use seabattle::protocol::*;
use seabattle::{PlayerNumber, ShotOutcome};

#[test]
fn frame_is_fixed_size_and_zero_padded() {
    let frame = Packet::new("SHOT", "B4", "").encode();
    assert_eq!(frame.len(), PACKET_SIZE);
    assert_eq!(&frame[..4], b"SHOT");
    assert!(frame[4..PACKET_COMMAND_SIZE].iter().all(|&b| b == 0));
    assert_eq!(&frame[PACKET_COMMAND_SIZE..PACKET_COMMAND_SIZE + 2], b"B4");
}

#[test]
fn oversized_fields_are_truncated_with_terminator() {
    let long = "x".repeat(1000);
    let frame = Packet::new(long.as_str(), long.as_str(), long.as_str()).encode();
    assert_eq!(frame[PACKET_COMMAND_SIZE - 1], 0);
    assert_eq!(frame[PACKET_COMMAND_SIZE + PACKET_ARG1_SIZE - 1], 0);
    assert_eq!(frame[PACKET_SIZE - 1], 0);
    let decoded = Packet::decode(&frame);
    assert_eq!(decoded.command().len(), PACKET_COMMAND_SIZE - 1);
    assert_eq!(decoded.arg1().len(), PACKET_ARG1_SIZE - 1);
}

#[test]
fn truncation_keeps_utf8_intact() {
    let name = "é".repeat(60);
    let decoded = Packet::decode(&Packet::new(SET_NICK, "", name.as_str()).encode());
    assert_eq!(decoded.arg2().chars().count(), 47);
    assert!(decoded.arg2().chars().all(|c| c == 'é'));
}

#[test]
fn decode_stops_at_first_nul() {
    let mut frame = [0u8; PACKET_SIZE];
    frame[..3].copy_from_slice(b"BYE");
    frame[4] = b'Z';
    assert_eq!(Packet::decode(&frame).command(), "BYE");
}

#[test]
fn requests_parse() {
    let join = Packet::new(JOIN_SESSION, "-1", "");
    assert_eq!(Request::from_packet(&join), Ok(Request::JoinSession(JoinTarget::Auto)));
    let join3 = Packet::new(JOIN_SESSION, "3", "");
    assert_eq!(Request::from_packet(&join3), Ok(Request::JoinSession(JoinTarget::Id(3))));
    let bad = Packet::new(JOIN_SESSION, "three", "");
    assert_eq!(
        Request::from_packet(&bad),
        Err(ProtocolError::InvalidArgument(JOIN_SESSION))
    );
    let manual = Packet::new(PLACEMENT_CHOICE, "manual", "");
    assert_eq!(
        Request::from_packet(&manual),
        Ok(Request::PlacementChoice(PlacementMode::Manual))
    );
    assert_eq!(
        Request::from_packet(&Packet::new("DANCE", "", "")),
        Err(ProtocolError::UnknownCommand("DANCE".to_string()))
    );
}

#[test]
fn request_packets_round_trip() {
    let requests = [
        Request::SetNick("ann".to_string()),
        Request::JoinSession(JoinTarget::Id(4)),
        Request::PlacementChoice(PlacementMode::Auto),
        Request::Shot("K10".to_string()),
        Request::ShipPlaced,
        Request::Disconnect,
    ];
    for request in requests {
        let packet = Packet::decode(&request.to_packet().encode());
        assert_eq!(Request::from_packet(&packet), Ok(request));
    }
}

#[test]
fn reply_packets_carry_their_arguments() {
    let result = Reply::ShotResult {
        coord: "B4".to_string(),
        outcome: ShotOutcome::Hit,
    }
    .to_packet();
    assert_eq!((result.command(), result.arg1(), result.arg2()), (SHOT_RESULT, "B4", "HIT"));

    let over = Reply::GameOver(GameOverReason::ServerShutdown).to_packet();
    assert_eq!(over.arg1(), "SERVER_SHUTDOWN");

    let empty = Reply::Leaderboard(None).to_packet();
    assert_eq!(empty.arg1(), LEADERBOARD_EMPTY);
    assert_eq!(Reply::from_packet(&empty), Ok(Reply::Leaderboard(None)));

    let assigned = Packet::new(PLAYER_ASSIGNED, "2", "");
    assert_eq!(Reply::from_packet(&assigned), Ok(Reply::PlayerAssigned(PlayerNumber::Two)));
    assert!(Reply::from_packet(&Packet::new(PLAYER_ASSIGNED, "3", "")).is_err());
    assert!(Reply::from_packet(&Packet::new("MYSTERY", "", "")).is_err());
}

#[test]
fn nicknames_are_cleaned() {
    assert_eq!(sanitize_nickname("  "), "player");
    assert_eq!(sanitize_nickname("ann lee"), "ann_lee");
    assert_eq!(sanitize_nickname(&"n".repeat(100)).len(), 63);
    // cut falls inside a two-byte char
    let name = sanitize_nickname(&"é".repeat(40));
    assert_eq!(name.len(), 62);
    assert!(name.chars().all(|c| c == 'é'));
}
