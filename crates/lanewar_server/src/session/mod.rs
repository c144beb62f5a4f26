//! # Match Session
//!
//! Per-match orchestrator around the [`Simulation`].
//!
//! ## Tick
//!
//! ```text
//! tick(dt)
//!   ├─ playback window countdown
//!   ├─ expiration clocks        (idle teardown, forfeit)
//!   ├─ turn timer               (Play and not resolving)
//!   ├─ start check              (Connecting, all seats connected + ready)
//!   └─ dequeue one command      (not resolving)
//! ```
//!
//! ## Admission
//!
//! A command arriving while the engine is resolving, or while earlier
//! commands still wait, is appended to a FIFO queue. At most one queued
//! command is applied per tick, and only once resolution has finished, so
//! every command applies in arrival order.
//!
//! Outbound traffic goes to a bounded channel drained by the transport.

pub mod client;

use std::collections::{BTreeMap, VecDeque};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use lanewar_core::{MatchState, SeatId};
use lanewar_protocol::{
    DiffBatch, Envelope, GameAction, GameSnapshot, MsgAfterConnected, MsgPlayer, MsgPlayerConnect,
    MsgPlayerSettings, NO_PLAYER,
};

use crate::engine::{Command, Effect, Simulation};
use crate::error::{ServerError, ServerResult};
use crate::traits::MatchRecorder;
use crate::OUTBOUND_QUEUE_DEPTH;

pub use client::{ClientId, ClientSlot};

// ============================================================================
// OUTBOUND
// ============================================================================

/// Who receives an outbound envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recipient {
    /// Every registered client.
    All,
    /// One client.
    Client(ClientId),
}

/// Envelope addressed by the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outbound {
    /// Destination.
    pub recipient: Recipient,
    /// Message.
    pub envelope: Envelope,
}

/// What happened to an inbound envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// Applied immediately.
    Dispatched,
    /// Held until the current turn resolves.
    Queued,
    /// No handler for this tag.
    Ignored,
}

/// Session counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Turns executed.
    pub turns_executed: u64,
    /// Commands applied.
    pub commands_dispatched: u64,
    /// Commands that waited in the queue.
    pub commands_queued: u64,
    /// Commands rejected by validation or decode.
    pub commands_rejected: u64,
    /// Envelopes dropped on a full outbound channel.
    pub outbound_dropped: u64,
}

#[derive(Debug)]
struct QueuedCommand {
    client: ClientId,
    seat: SeatId,
    command: Command,
}

// ============================================================================
// SESSION
// ============================================================================

/// One match: engine, client registry, command queue and timers.
pub struct MatchSession {
    engine: Simulation,
    recorder: Box<dyn MatchRecorder>,
    clients: BTreeMap<ClientId, ClientSlot>,
    queue: VecDeque<QueuedCommand>,
    outbound: Sender<Outbound>,
    turn_timer: f32,
    expiration: f32,
    win_expiration: f32,
    stats: SessionStats,
}

impl std::fmt::Debug for MatchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchSession")
            .field("engine", &self.engine)
            .field("clients", &self.clients.len())
            .field("queued", &self.queue.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl MatchSession {
    /// Creates a session and the receiving end of its outbound channel.
    #[must_use]
    pub fn new(engine: Simulation, recorder: Box<dyn MatchRecorder>) -> (Self, Receiver<Outbound>) {
        let (outbound, receiver) = bounded(OUTBOUND_QUEUE_DEPTH);
        let turn_timer = engine.world().config().turn_duration;
        tracing::info!("Match {} created", engine.world().game_uid());
        let session = Self {
            engine,
            recorder,
            clients: BTreeMap::new(),
            queue: VecDeque::new(),
            outbound,
            turn_timer,
            expiration: 0.0,
            win_expiration: 0.0,
            stats: SessionStats::default(),
        };
        (session, receiver)
    }

    /// Match id.
    #[must_use]
    pub fn game_uid(&self) -> &str {
        self.engine.world().game_uid()
    }

    /// The engine.
    #[must_use]
    pub const fn engine(&self) -> &Simulation {
        &self.engine
    }

    /// Mutable engine, for setup and tooling.
    pub fn engine_mut(&mut self) -> &mut Simulation {
        &mut self.engine
    }

    /// Counters.
    #[must_use]
    pub const fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Registry entry for `client`.
    #[must_use]
    pub fn client(&self, client: ClientId) -> Option<&ClientSlot> {
        self.clients.get(&client)
    }

    /// Connected clients, observers included.
    #[must_use]
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Commands waiting for the current turn to resolve.
    #[must_use]
    pub fn queued_commands(&self) -> usize {
        self.queue.len()
    }

    /// Seconds until the timer forces the next turn.
    #[must_use]
    pub const fn turn_timer(&self) -> f32 {
        self.turn_timer
    }

    /// True once the idle clock ran past `game_expire_secs`.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expiration > self.engine.world().config().game_expire_secs
    }

    // ========================================================================
    // CLIENTS
    // ========================================================================

    /// Registers a client and seats it if possible.
    ///
    /// Returns the seat, or `None` for an observer.
    ///
    /// # Errors
    ///
    /// `UnknownMatch` if the message names another match.
    pub fn connect(&mut self, client: ClientId, msg: &MsgPlayerConnect) -> ServerResult<Option<SeatId>> {
        if !msg.game_uid.is_empty() && msg.game_uid != self.game_uid() {
            return Err(ServerError::UnknownMatch(msg.game_uid.clone()));
        }

        let world = self.engine.world_mut();
        let returning = world.seat_of_user(&msg.user_id);
        let seat = if msg.observer {
            None
        } else {
            returning.or_else(|| world.free_seat())
        };

        if let Some(player) = seat.and_then(|s| world.player_mut(s)) {
            player.user_id.clone_from(&msg.user_id);
            if !msg.username.is_empty() {
                player.username.clone_from(&msg.username);
            }
            player.connected = true;
        }
        if seat.is_some() && returning.is_some() {
            self.win_expiration = 0.0;
        }
        self.expiration = 0.0;

        self.clients.insert(
            client,
            ClientSlot {
                seat,
                user_id: msg.user_id.clone(),
                username: msg.username.clone(),
            },
        );
        tracing::info!(
            "Client connected: {} (id: {}, seat: {:?})",
            msg.username,
            client,
            seat
        );

        let reply = MsgAfterConnected {
            success: true,
            player_id: seat.map_or(NO_PLAYER, SeatId::to_wire),
            game_data: GameSnapshot::capture(self.engine.world()),
        };
        match Envelope::new(GameAction::Connected, &reply) {
            Ok(envelope) => self.send(Recipient::Client(client), envelope),
            Err(e) => tracing::error!("Connected reply for {} failed: {}", client, e),
        }
        self.broadcast_refresh();
        Ok(seat)
    }

    /// Removes a client. A seat it held is marked disconnected unless
    /// another client still holds it.
    ///
    /// # Errors
    ///
    /// `UnknownClient` if not registered.
    pub fn disconnect(&mut self, client: ClientId) -> ServerResult<()> {
        let slot = self
            .clients
            .remove(&client)
            .ok_or(ServerError::UnknownClient(client))?;
        tracing::info!("Client disconnected: {} (id: {})", slot.username, client);

        if let Some(seat) = slot.seat {
            let still_held = self.clients.values().any(|c| c.seat == Some(seat));
            if !still_held {
                if let Some(player) = self.engine.world_mut().player_mut(seat) {
                    player.connected = false;
                }
                self.broadcast_refresh();
            }
        }
        Ok(())
    }

    /// Hands `seat` to an AI. Host-side setup, not a client command.
    ///
    /// # Errors
    ///
    /// As [`Simulation::seat_ai`].
    pub fn add_ai(&mut self, seat: SeatId, settings: &MsgPlayerSettings) -> ServerResult<()> {
        let effects = self.engine.seat_ai(seat, settings)?;
        self.apply_effects(effects);
        Ok(())
    }

    // ========================================================================
    // COMMANDS
    // ========================================================================

    /// Admits an inbound envelope from `client`.
    ///
    /// # Errors
    ///
    /// `UnknownClient`, `NotSeated`, a decode failure, or the command's own
    /// rejection when dispatched immediately. Nothing is applied on error.
    pub fn receive(&mut self, client: ClientId, envelope: &Envelope) -> ServerResult<Admission> {
        let slot = self
            .clients
            .get(&client)
            .ok_or(ServerError::UnknownClient(client))?;

        let command = match Command::decode(envelope) {
            Ok(Some(command)) => command,
            Ok(None) => {
                tracing::debug!("Ignored tag {} from {}", envelope.tag, client);
                return Ok(Admission::Ignored);
            }
            Err(e) => {
                self.stats.commands_rejected += 1;
                tracing::error!("Bad payload for tag {} from {}: {}", envelope.tag, client, e);
                return Err(e.into());
            }
        };

        let Some(seat) = slot.seat else {
            self.stats.commands_rejected += 1;
            tracing::warn!("Observer {} sent {}", client, command.name());
            return Err(ServerError::NotSeated(client));
        };

        if self.engine.is_resolving() || !self.queue.is_empty() {
            tracing::debug!(
                "Queued {} from {} ({} waiting)",
                command.name(),
                client,
                self.queue.len() + 1
            );
            self.queue.push_back(QueuedCommand {
                client,
                seat,
                command,
            });
            self.stats.commands_queued += 1;
            return Ok(Admission::Queued);
        }

        self.dispatch(seat, command)?;
        Ok(Admission::Dispatched)
    }

    fn dispatch(&mut self, seat: SeatId, command: Command) -> ServerResult<()> {
        let name = command.name();
        match self.engine.apply_command(command, seat) {
            Ok(effects) => {
                self.stats.commands_dispatched += 1;
                self.apply_effects(effects);
                Ok(())
            }
            Err(e) => {
                self.stats.commands_rejected += 1;
                if !matches!(e, ServerError::Spoofed { .. }) {
                    tracing::warn!("Rejected {} from {}: {}", name, seat, e);
                }
                Err(e)
            }
        }
    }

    fn apply_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Broadcast(envelope) => self.send(Recipient::All, envelope),
                Effect::Refresh => self.broadcast_refresh(),
                Effect::GameEnded(winner) => self.on_game_ended(winner),
            }
        }
    }

    // ========================================================================
    // TICK
    // ========================================================================

    /// Advances timers by `dt` seconds and runs whatever is due.
    pub fn tick(&mut self, dt: f32) {
        self.engine.advance_resolution(dt);

        let world = self.engine.world();
        let config = world.config();
        let connected_seats = world.connected_seats().count();

        if world.has_ended() || self.clients.is_empty() {
            self.expiration += dt;
        }
        if connected_seats == 1 && world.has_started() && !world.has_ended() {
            self.win_expiration += dt;
        }
        if config.dedicated && !world.has_ended() && self.win_expiration > config.win_expire_secs {
            let winner = world.connected_seats().next();
            tracing::info!("Forfeit expiration in {}, winner {:?}", world.game_uid(), winner);
            self.finish(winner);
        }

        let world = self.engine.world();
        if world.state() == MatchState::Play && !self.engine.is_resolving() {
            self.turn_timer -= dt;
            if self.turn_timer <= 0.0 {
                self.run_turn();
                self.turn_timer = self.engine.world().config().turn_duration;
            }
        }

        let world = self.engine.world();
        if world.state() == MatchState::Connecting && world.all_connected() && world.all_ready() {
            self.begin_play();
        }

        if !self.engine.is_resolving() {
            if let Some(queued) = self.queue.pop_front() {
                tracing::debug!("Dequeued {} from {}", queued.command.name(), queued.client);
                // Rejections are logged and counted by dispatch
                let _ = self.dispatch(queued.seat, queued.command);
            }
        }
    }

    fn run_turn(&mut self) {
        let turn = self.engine.world().current_turn();
        let batch = self.engine.execute_turn();
        self.stats.turns_executed += 1;
        tracing::info!(
            "Turn {} executed in {}: {} events",
            turn,
            self.game_uid(),
            batch.len()
        );
        self.send_batch(&batch);
    }

    fn begin_play(&mut self) {
        if !self.engine.start_game() {
            return;
        }
        self.turn_timer = self.engine.world().config().turn_duration;
        self.send(Recipient::All, Envelope::empty(GameAction::GameStart));
        let uid = self.game_uid().to_string();
        self.recorder.match_created(&uid);
        let batch = self.engine.take_batch();
        self.send_batch(&batch);
    }

    /// Ends the match in favor of `winner`. No-op if already ended.
    pub fn finish(&mut self, winner: Option<SeatId>) {
        if self.engine.end_game(winner) {
            self.on_game_ended(winner);
        }
    }

    fn on_game_ended(&mut self, winner: Option<SeatId>) {
        self.queue.clear();
        let msg = MsgPlayer {
            player_id: winner.map_or(NO_PLAYER, SeatId::to_wire),
        };
        match Envelope::new(GameAction::GameEnd, &msg) {
            Ok(envelope) => self.send(Recipient::All, envelope),
            Err(e) => tracing::error!("GameEnd encode failed: {}", e),
        }
        let uid = self.game_uid().to_string();
        self.recorder.match_ended(&uid, winner);
        let batch = self.engine.take_batch();
        self.send_batch(&batch);
    }

    // ========================================================================
    // OUTBOUND
    // ========================================================================

    fn send_batch(&mut self, batch: &DiffBatch) {
        match Envelope::new(GameAction::UpdateMessage, batch) {
            Ok(envelope) => self.send(Recipient::All, envelope),
            Err(e) => tracing::error!("Diff batch encode failed: {}", e),
        }
    }

    fn broadcast_refresh(&mut self) {
        let snapshot = GameSnapshot::capture(self.engine.world());
        match Envelope::new(GameAction::RefreshAll, &snapshot) {
            Ok(envelope) => self.send(Recipient::All, envelope),
            Err(e) => tracing::error!("Snapshot encode failed: {}", e),
        }
    }

    fn send(&mut self, recipient: Recipient, envelope: Envelope) {
        match self.outbound.try_send(Outbound {
            recipient,
            envelope,
        }) {
            Ok(()) => {}
            Err(TrySendError::Full(out)) => {
                self.stats.outbound_dropped += 1;
                tracing::warn!("Outbound queue full, dropped tag {}", out.envelope.tag);
            }
            Err(TrySendError::Disconnected(_)) => {
                self.stats.outbound_dropped += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{NullRecorder, StraightLine};
    use lanewar_core::{Catalog, LaneRoutes, MatchConfig, WorldState};
    use std::sync::Arc;

    fn session(config: MatchConfig) -> (MatchSession, Receiver<Outbound>) {
        let routes = Arc::new(LaneRoutes::builtin());
        let world = WorldState::new("m1", config, &routes).unwrap();
        let engine = Simulation::new(world, routes, Arc::new(Catalog::builtin()), Box::new(StraightLine));
        MatchSession::new(engine, Box::new(NullRecorder))
    }

    fn connect(session: &mut MatchSession, id: u32, user: &str) -> Option<SeatId> {
        session
            .connect(
                ClientId(id),
                &MsgPlayerConnect {
                    user_id: user.into(),
                    username: user.into(),
                    game_uid: "m1".into(),
                    nb_players: 2,
                    observer: false,
                },
            )
            .unwrap()
    }

    fn tags(rx: &Receiver<Outbound>) -> Vec<u16> {
        rx.try_iter().map(|o| o.envelope.tag).collect()
    }

    #[test]
    fn test_connect_assigns_seats_then_observers() {
        let (mut session, rx) = session(MatchConfig::default());
        assert_eq!(connect(&mut session, 1, "alice"), Some(SeatId(0)));
        assert_eq!(connect(&mut session, 2, "bob"), Some(SeatId(1)));
        assert_eq!(connect(&mut session, 3, "carol"), None);
        assert!(session.client(ClientId(3)).unwrap().is_observer());

        let first = rx.try_recv().unwrap();
        assert_eq!(first.recipient, Recipient::Client(ClientId(1)));
        assert_eq!(first.envelope.action(), Some(GameAction::Connected));
        let reply: MsgAfterConnected = first.envelope.read().unwrap();
        assert_eq!(reply.player_id, 0);
        assert_eq!(reply.game_data.players.len(), 2);
        assert_eq!(
            rx.try_recv().unwrap().envelope.action(),
            Some(GameAction::RefreshAll)
        );
    }

    #[test]
    fn test_returning_user_keeps_seat() {
        let (mut session, _rx) = session(MatchConfig::default());
        connect(&mut session, 1, "alice");
        connect(&mut session, 2, "bob");
        session.disconnect(ClientId(1)).unwrap();
        assert!(!session.engine().world().player(SeatId(0)).unwrap().connected);
        assert_eq!(connect(&mut session, 7, "alice"), Some(SeatId(0)));
        assert!(session.engine().world().player(SeatId(0)).unwrap().connected);
    }

    #[test]
    fn test_wrong_match_rejected() {
        let (mut session, _rx) = session(MatchConfig::default());
        let result = session.connect(
            ClientId(1),
            &MsgPlayerConnect {
                game_uid: "other".into(),
                ..MsgPlayerConnect::default()
            },
        );
        assert!(matches!(result, Err(ServerError::UnknownMatch(_))));
        assert_eq!(session.client_count(), 0);
    }

    #[test]
    fn test_unknown_tag_ignored() {
        let (mut session, rx) = session(MatchConfig::default());
        connect(&mut session, 1, "alice");
        let _ = tags(&rx);
        let admission = session
            .receive(
                ClientId(1),
                &Envelope {
                    tag: 9999,
                    payload: Vec::new(),
                },
            )
            .unwrap();
        assert_eq!(admission, Admission::Ignored);
        assert!(tags(&rx).is_empty());
    }

    #[test]
    fn test_observer_cannot_command() {
        let (mut session, _rx) = session(MatchConfig::default());
        session
            .connect(
                ClientId(5),
                &MsgPlayerConnect {
                    observer: true,
                    ..MsgPlayerConnect::default()
                },
            )
            .unwrap();
        let result = session.receive(
            ClientId(5),
            &Envelope::new(GameAction::Resign, &MsgPlayer { player_id: 0 }).unwrap(),
        );
        assert!(matches!(result, Err(ServerError::NotSeated(_))));
    }

    #[test]
    fn test_idle_session_expires() {
        let (mut session, _rx) = session(MatchConfig {
            game_expire_secs: 1.0,
            ..MatchConfig::default()
        });
        for _ in 0..9 {
            session.tick(0.1);
        }
        assert!(!session.is_expired());
        for _ in 0..3 {
            session.tick(0.1);
        }
        assert!(session.is_expired());
    }

    #[test]
    fn test_connect_resets_idle_clock() {
        let (mut session, _rx) = session(MatchConfig {
            game_expire_secs: 1.0,
            ..MatchConfig::default()
        });
        for _ in 0..8 {
            session.tick(0.1);
        }
        connect(&mut session, 1, "alice");
        for _ in 0..8 {
            session.tick(0.1);
        }
        assert!(!session.is_expired());
    }
}
