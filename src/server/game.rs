//! The game state machine.
//!
//! [`GameServer`] owns every player record, the session table and the
//! leaderboard. It consumes one request at a time and answers with a list of
//! [`Effect`]s for the connection layer to carry out, so the whole game can
//! be driven without a network.

use log::{debug, info, warn};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::arena::Arena;
use crate::config::DEFAULT_NICKNAME;
use crate::leaderboard::{format_leaderboard, ScoreStore};
use crate::protocol::{
    sanitize_nickname, GameOverReason, JoinTarget, Packet, PlacementMode, ProtocolError, Reply, Request, ALREADY_IN_SESSION,
    ALREADY_READY, FIELD_UPLOAD_INVALID, GAME_ALREADY_STARTED, GAME_IS_OVER, GAME_NOT_STARTED, JOIN_SESSION, NOT_IN_SESSION,
    NO_FIELD_UPLOADED, UNKNOWN_COMMAND, WAITING_FOR_OPPONENT,
};
use crate::server::sessions::{format_session_list, JoinError, Phase, PlayerId, SessionId, SessionTable};
use crate::server::ServerConfig;
use crate::{Board, Field, PlayerNumber, ShotOutcome};

const WELCOME_TEXT: &str = "Welcome to Battleship! Choose a session:";
const WAITING_TEXT: &str = "Waiting for opponent...";
const STARTING_TEXT: &str = "Game starting soon!";
const OPPONENT_PLACING_TEXT: &str = "Opponent is placing ships";

/// Something the connection layer must do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Send { to: PlayerId, reply: Reply },
    /// Tear down the connection, then report it through [`GameServer::disconnect`].
    Close(PlayerId),
}

/// Per-connection player record.
#[derive(Debug, Clone)]
pub struct Player {
    name: String,
    session: Option<SessionId>,
    number: Option<PlayerNumber>,
    board: Board,
    uploaded: bool,
    ready: bool,
    prompted: bool,
}

impl Player {
    fn new() -> Self {
        Player {
            name: DEFAULT_NICKNAME.to_string(),
            session: None,
            number: None,
            board: Board::new(),
            uploaded: false,
            ready: false,
            prompted: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn session(&self) -> Option<SessionId> {
        self.session
    }

    pub fn number(&self) -> Option<PlayerNumber> {
        self.number
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    fn leave_session(&mut self) {
        self.session = None;
        self.number = None;
        self.board.reset();
        self.uploaded = false;
        self.ready = false;
        self.prompted = false;
    }
}

#[derive(Default)]
struct Outbox(Vec<Effect>);

impl Outbox {
    fn send(&mut self, to: PlayerId, reply: Reply) {
        self.0.push(Effect::Send { to, reply });
    }

    fn error(&mut self, to: PlayerId, reason: &str) {
        self.send(to, Reply::Error(reason.to_string()));
    }

    fn close(&mut self, to: PlayerId) {
        self.0.push(Effect::Close(to));
    }
}

pub struct GameServer<S> {
    players: Arena<Player>,
    sessions: SessionTable,
    scores: S,
    rng: SmallRng,
}

impl<S: ScoreStore> GameServer<S> {
    pub fn new(config: &ServerConfig, scores: S) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_rng(&mut rand::rng()),
        };
        GameServer {
            players: Arena::with_capacity(config.max_clients),
            sessions: SessionTable::new(config.max_sessions),
            scores,
            rng,
        }
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn sessions(&self) -> &SessionTable {
        &self.sessions
    }

    pub fn scores(&self) -> &S {
        &self.scores
    }

    pub fn into_scores(self) -> S {
        self.scores
    }

    /// Register a new connection. `None` when the client table is full.
    pub fn connect(&mut self) -> Option<(PlayerId, Vec<Effect>)> {
        let id = self.players.insert(Player::new())?;
        info!("player {} connected ({}/{})", id, self.players.len(), self.players.capacity());
        let mut out = Outbox::default();
        out.send(id, Reply::Welcome(WELCOME_TEXT.to_string()));
        out.send(id, Reply::SessionList(self.session_list()));
        out.send(id, Reply::Leaderboard(self.leaderboard_text()));
        Some((id, out.0))
    }

    /// Forget a connection that has gone away, releasing its seat.
    pub fn disconnect(&mut self, id: PlayerId) -> Vec<Effect> {
        let mut out = Outbox::default();
        if !self.players.contains(id) {
            return out.0;
        }
        self.leave_session(id, &mut out);
        if let Some(player) = self.players.remove(id) {
            info!("player {} ({}) disconnected", id, player.name);
        }
        self.broadcast_session_list(&mut out);
        out.0
    }

    /// Tell every connected player the server is going away and close them.
    pub fn shutdown(&mut self) -> Vec<Effect> {
        let mut out = Outbox::default();
        for id in self.players.handles() {
            out.send(id, Reply::GameOver(GameOverReason::ServerShutdown));
            out.close(id);
        }
        out.0
    }

    /// Process one packet from `id`.
    pub fn handle(&mut self, id: PlayerId, packet: &Packet) -> Vec<Effect> {
        let mut out = Outbox::default();
        if !self.players.contains(id) {
            return out.0;
        }
        debug!("player {} -> {}", id, packet.command());
        match Request::from_packet(packet) {
            Ok(request) => self.dispatch(id, request, &mut out),
            Err(ProtocolError::UnknownCommand(cmd)) => {
                warn!("player {} sent unknown command {:?}", id, cmd);
                out.error(id, UNKNOWN_COMMAND);
            }
            Err(e @ (ProtocolError::InvalidArgument(JOIN_SESSION) | ProtocolError::MissingArgument(JOIN_SESSION))) => {
                debug!("player {}: {}", id, e);
                out.error(id, &JoinError::OutOfRange.to_string());
                out.send(id, Reply::SessionList(self.session_list()));
            }
            Err(e) => out.error(id, &e.to_string()),
        }
        out.0
    }

    fn dispatch(&mut self, id: PlayerId, request: Request, out: &mut Outbox) {
        match request {
            Request::SetNick(name) => self.set_nick(id, &name, out),
            Request::JoinSession(target) => self.join(id, target, out),
            Request::PlacementChoice(mode) => self.placement_choice(id, mode, out),
            Request::FieldUpload(cells) => self.field_upload(id, &cells, out),
            Request::ShipPlaced => self.ship_placed(id, out),
            Request::Shot(coord) => self.shot(id, &coord, out),
            Request::RequestField => self.request_field(id, out),
            Request::Quit => {
                out.send(id, Reply::Bye);
                let was_seated = self.players.get(id).is_some_and(|p| p.session.is_some());
                self.leave_session(id, out);
                if was_seated {
                    self.broadcast_session_list(out);
                } else {
                    out.send(id, Reply::SessionList(self.session_list()));
                }
            }
            Request::Disconnect => {
                out.send(id, Reply::Bye);
                out.close(id);
            }
        }
    }

    fn set_nick(&mut self, id: PlayerId, raw: &str, out: &mut Outbox) {
        let name = sanitize_nickname(raw);
        if let Some(player) = self.players.get_mut(id) {
            info!("player {} is now known as {}", id, name);
            player.name = name;
        }
        out.send(id, Reply::SessionList(self.session_list()));
    }

    fn join(&mut self, id: PlayerId, target: JoinTarget, out: &mut Outbox) {
        if self.players.get(id).is_some_and(|p| p.session.is_some()) {
            out.error(id, ALREADY_IN_SESSION);
            return;
        }
        let (sid, number) = match self.sessions.assign(id, target) {
            Ok(seat) => seat,
            Err(e) => {
                debug!("player {} failed to join {:?}: {:?}", id, target, e);
                out.error(id, &e.to_string());
                out.send(id, Reply::SessionList(self.session_list()));
                return;
            }
        };
        if let Some(player) = self.players.get_mut(id) {
            player.leave_session();
            player.session = Some(sid);
            player.number = Some(number);
            info!("player {} ({}) joined session {} as player {}", id, player.name, sid, number);
        }
        out.send(id, Reply::SessionCreated(sid));
        out.send(id, Reply::PlayerAssigned(number));

        let full = self.sessions.get(sid).is_some_and(|s| s.is_full());
        if full {
            out.send(id, Reply::Welcome(STARTING_TEXT.to_string()));
            self.begin_placement(sid, out);
        } else {
            out.send(id, Reply::Wait(WAITING_TEXT.to_string()));
        }
        self.broadcast_session_list(out);
    }

    fn begin_placement(&mut self, sid: SessionId, out: &mut Outbox) {
        let Some(session) = self.sessions.get_mut(sid) else { return };
        session.phase = Phase::Placement;
        let first = session.occupant(PlayerNumber::One);
        let second = session.occupant(PlayerNumber::Two);
        info!("session {} entering placement", sid);
        if let Some(p1) = first {
            self.prompt_placement(p1, out);
        }
        if let Some(p2) = second {
            out.send(p2, Reply::Wait(OPPONENT_PLACING_TEXT.to_string()));
        }
    }

    fn prompt_placement(&mut self, id: PlayerId, out: &mut Outbox) {
        let Some(player) = self.players.get_mut(id) else { return };
        if player.prompted || player.ready {
            return;
        }
        player.prompted = true;
        if let Some(number) = player.number {
            out.send(id, Reply::PlacementStart(number));
        }
    }

    /// Phase guard for placement requests. Returns the session on success.
    fn placement_session(&self, id: PlayerId, out: &mut Outbox) -> Option<SessionId> {
        let player = self.players.get(id)?;
        let Some(sid) = player.session else {
            out.error(id, NOT_IN_SESSION);
            return None;
        };
        let phase = self.sessions.get(sid)?.phase;
        match phase {
            Phase::Forming => out.error(id, WAITING_FOR_OPPONENT),
            Phase::Active | Phase::Over => out.error(id, GAME_ALREADY_STARTED),
            Phase::Placement if player.ready => out.error(id, ALREADY_READY),
            Phase::Placement => return Some(sid),
        }
        None
    }

    fn placement_choice(&mut self, id: PlayerId, mode: PlacementMode, out: &mut Outbox) {
        let Some(sid) = self.placement_session(id, out) else { return };
        match mode {
            PlacementMode::Auto => {
                let Some(player) = self.players.get_mut(id) else { return };
                player.board.place_auto(&mut self.rng);
                player.ready = true;
                debug!("player {} placed ships automatically", id);
                out.send(id, Reply::FieldUpdate(player.board.field().encode()));
                out.send(id, Reply::PlacementDone);
                self.after_ready(sid, id, out);
            }
            PlacementMode::Manual => out.send(id, Reply::ManualPlacement),
        }
    }

    fn field_upload(&mut self, id: PlayerId, cells: &str, out: &mut Outbox) {
        if self.placement_session(id, out).is_none() {
            return;
        }
        let board = Field::decode(cells).and_then(|field| Board::from_layout(&field));
        let Some(player) = self.players.get_mut(id) else { return };
        match board {
            Ok(board) => {
                player.board = board;
                player.uploaded = true;
                out.send(id, Reply::FieldUpdate(player.board.field().encode()));
            }
            Err(e) => {
                debug!("player {} uploaded a bad layout: {}", id, e);
                out.error(id, FIELD_UPLOAD_INVALID);
            }
        }
    }

    fn ship_placed(&mut self, id: PlayerId, out: &mut Outbox) {
        let Some(sid) = self.placement_session(id, out) else { return };
        let Some(player) = self.players.get_mut(id) else { return };
        if !player.uploaded {
            out.error(id, NO_FIELD_UPLOADED);
            return;
        }
        player.ready = true;
        debug!("player {} placed ships manually", id);
        out.send(id, Reply::FieldUpdate(player.board.field().encode()));
        out.send(id, Reply::PlacementDone);
        self.after_ready(sid, id, out);
    }

    fn after_ready(&mut self, sid: SessionId, id: PlayerId, out: &mut Outbox) {
        let Some(opponent) = self.opponent(sid, id) else { return };
        if self.players.get(opponent).is_some_and(|p| p.ready) {
            self.start_game(sid, out);
            return;
        }
        out.send(id, Reply::Wait(OPPONENT_PLACING_TEXT.to_string()));
        self.prompt_placement(opponent, out);
    }

    fn start_game(&mut self, sid: SessionId, out: &mut Outbox) {
        let Some(session) = self.sessions.get_mut(sid) else { return };
        if session.phase != Phase::Placement {
            return;
        }
        session.phase = Phase::Active;
        session.turn = PlayerNumber::One;
        let seats: Vec<_> = session.occupants().collect();
        info!("session {} game started", sid);
        for &(number, id) in &seats {
            out.send(id, Reply::GameStart(number));
        }
        for &(_, id) in &seats {
            if let Some(p) = self.players.get(id) {
                out.send(id, Reply::FieldUpdate(p.board.field().encode()));
            }
        }
        for &(_, id) in &seats {
            if let Some(fog) = self.opponent_fog(sid, id) {
                out.send(id, Reply::EnemyFogUpdate(fog));
            }
        }
        for &(number, id) in &seats {
            let reply = if number == PlayerNumber::One { Reply::YourTurn } else { Reply::OpponentTurn };
            out.send(id, reply);
        }
    }

    fn shot(&mut self, id: PlayerId, coord: &str, out: &mut Outbox) {
        let Some(player) = self.players.get(id) else { return };
        let (Some(sid), Some(number)) = (player.session, player.number) else {
            out.error(id, NOT_IN_SESSION);
            return;
        };
        let Some(session) = self.sessions.get(sid) else { return };
        match session.phase {
            Phase::Active => {}
            Phase::Over => return out.error(id, GAME_IS_OVER),
            Phase::Forming | Phase::Placement => return out.error(id, GAME_NOT_STARTED),
        }
        if session.turn != number {
            out.send(id, Reply::NotYourTurn);
            return;
        }
        let Some(target) = session.occupant(number.other()) else { return };
        let shooter_name = player.name.clone();

        let Some(victim) = self.players.get_mut(target) else { return };
        let outcome = victim.board.resolve_shot(coord);
        let coord = coord.trim().to_string();
        debug!("session {} player {} shot {} -> {}", sid, number, coord, outcome);

        out.send(id, Reply::ShotResult { coord: coord.clone(), outcome });
        if outcome != ShotOutcome::Invalid {
            out.send(target, Reply::OpponentShot { coord, outcome });
        }
        out.send(id, Reply::EnemyFogUpdate(victim.board.fog_view().encode()));
        out.send(target, Reply::FieldUpdate(victim.board.field().encode()));

        if victim.board.all_sunk() {
            if let Some(session) = self.sessions.get_mut(sid) {
                session.phase = Phase::Over;
            }
            info!("session {} won by {}", sid, shooter_name);
            if let Err(e) = self.scores.record_win(&shooter_name) {
                warn!("failed to record win for {}: {}", shooter_name, e);
            }
            out.send(id, Reply::GameOver(GameOverReason::Win));
            out.send(target, Reply::GameOver(GameOverReason::Lose));
            return;
        }

        if outcome == ShotOutcome::Miss {
            if let Some(session) = self.sessions.get_mut(sid) {
                session.turn = number.other();
            }
        }
        let shooter_keeps_turn = outcome != ShotOutcome::Miss;
        let (mover, waiter) = if shooter_keeps_turn { (id, target) } else { (target, id) };
        out.send(mover, Reply::YourTurn);
        out.send(waiter, Reply::OpponentTurn);
        for p in [id, target] {
            if let Some(player) = self.players.get(p) {
                out.send(p, Reply::FieldUpdate(player.board.field().encode()));
            }
        }
    }

    fn request_field(&mut self, id: PlayerId, out: &mut Outbox) {
        let Some(player) = self.players.get(id) else { return };
        out.send(id, Reply::FieldUpdate(player.board.field().encode()));
        let Some(sid) = player.session else { return };
        let started = self
            .sessions
            .get(sid)
            .is_some_and(|s| matches!(s.phase, Phase::Active | Phase::Over));
        if started {
            if let Some(fog) = self.opponent_fog(sid, id) {
                out.send(id, Reply::EnemyFogUpdate(fog));
            }
        }
    }

    /// Take `id` out of its session. A remaining opponent is told and
    /// detached too, so the session is freed at once.
    fn leave_session(&mut self, id: PlayerId, out: &mut Outbox) {
        let Some(sid) = self.players.get(id).and_then(|p| p.session) else { return };
        let released = self.sessions.release(sid, id);
        if let Some(player) = self.players.get_mut(id) {
            player.leave_session();
        }
        if let Some(opponent) = released.opponent {
            out.send(opponent, Reply::OpponentDisconnected);
            self.sessions.release(sid, opponent);
            if let Some(p) = self.players.get_mut(opponent) {
                p.leave_session();
            }
        }
        info!("session {} freed", sid);
    }

    fn opponent(&self, sid: SessionId, id: PlayerId) -> Option<PlayerId> {
        let session = self.sessions.get(sid)?;
        let number = session.number_of(id)?;
        session.occupant(number.other())
    }

    fn opponent_fog(&self, sid: SessionId, id: PlayerId) -> Option<String> {
        let opponent = self.opponent(sid, id)?;
        Some(self.players.get(opponent)?.board.fog_view().encode())
    }

    pub fn session_list(&self) -> String {
        let summaries = self.sessions.summaries(|p| self.players.get(p).map(|p| p.name.as_str()));
        format_session_list(&summaries)
    }

    fn leaderboard_text(&self) -> Option<String> {
        match self.scores.entries() {
            Ok(entries) => format_leaderboard(&entries),
            Err(e) => {
                warn!("failed to read leaderboard: {}", e);
                None
            }
        }
    }

    /// Re-send the session list to everyone not seated in a session.
    fn broadcast_session_list(&self, out: &mut Outbox) {
        let list = self.session_list();
        for (id, player) in self.players.iter() {
            if player.session.is_none() {
                out.send(id, Reply::SessionList(list.clone()));
            }
        }
    }
}
