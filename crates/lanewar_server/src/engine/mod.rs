//! # Simulation Engine
//!
//! Owns one match's [`WorldState`] and advances it a turn at a time.
//!
//! ## Turn
//!
//! ```text
//! execute_turn()
//!   ├─ mark turn start
//!   ├─ spawn waves          (every `wave_spawn_cadence` turns)
//!   ├─ advance heroes/waves (speed × turn_duration)
//!   ├─ combat detection     (snapshot, then damage)
//!   └─ progression          (remove finished waves, expire missions, turn += 1)
//!        │
//!        ▼
//!     DiffBatch
//! ```
//!
//! One call runs one turn and returns. The caller's timer decides when the
//! next one starts; the engine never schedules itself.
//!
//! ## Resolving
//!
//! After a turn the engine stays resolving for `resolve_secs` while clients
//! play the batch back. The session queues commands during that window.

pub mod combat;
pub mod commands;

use std::collections::BTreeSet;
use std::sync::Arc;

use lanewar_core::{
    CardKind, Catalog, CoreError, EntityCategory, HistoryEntry, LaneRoutes, MatchState, Mission,
    SeatId, TaskType, Vec2, WorldState,
};
use lanewar_protocol::{
    DiffBatch, Envelope, GameAction, MsgAssignTask, MsgChat, MsgGameSettings, MsgPlayCard,
    MsgPlayer, MsgPlayerSettings, MsgTaskCompleted,
};

use crate::error::{ServerError, ServerResult};
use crate::traits::PathPlanner;

pub use combat::{detect, detect_naive, CombatHit};
pub use commands::Command;

/// Side effect of a handled command, carried out by the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Send to every client now.
    Broadcast(Envelope),
    /// Send a full snapshot to every client.
    Refresh,
    /// The match ended.
    GameEnded(Option<SeatId>),
}

/// Turn state machine and command handlers for one match.
pub struct Simulation {
    world: WorldState,
    routes: Arc<LaneRoutes>,
    catalog: Arc<Catalog>,
    planner: Box<dyn PathPlanner>,
    resolving: bool,
    resolve_remaining: f32,
    batch: DiffBatch,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("game_uid", &self.world.game_uid())
            .field("state", &self.world.state())
            .field("turn", &self.world.current_turn())
            .field("resolving", &self.resolving)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Wraps a prepared world.
    #[must_use]
    pub fn new(
        world: WorldState,
        routes: Arc<LaneRoutes>,
        catalog: Arc<Catalog>,
        planner: Box<dyn PathPlanner>,
    ) -> Self {
        Self {
            world,
            routes,
            catalog,
            planner,
            resolving: false,
            resolve_remaining: 0.0,
            batch: DiffBatch::new(),
        }
    }

    /// World state.
    #[must_use]
    pub const fn world(&self) -> &WorldState {
        &self.world
    }

    /// Direct world access for setup and tooling.
    pub fn world_mut(&mut self) -> &mut WorldState {
        &mut self.world
    }

    /// Static card and task tables.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// True while a turn is being played back.
    #[inline]
    #[must_use]
    pub const fn is_resolving(&self) -> bool {
        self.resolving
    }

    /// Counts down the playback window.
    pub fn advance_resolution(&mut self, dt: f32) {
        if !self.resolving {
            return;
        }
        self.resolve_remaining -= dt;
        if self.resolve_remaining <= 0.0 {
            self.resolve_remaining = 0.0;
            self.resolving = false;
            tracing::debug!("Turn {} resolved", self.world.current_turn().saturating_sub(1));
        }
    }

    /// Events recorded outside a turn, such as lifecycle changes.
    pub fn take_batch(&mut self) -> DiffBatch {
        self.batch.take()
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Moves `Connecting` to `Play`. Returns false if already started.
    pub fn start_game(&mut self) -> bool {
        if !self.world.advance_state(MatchState::Play) {
            return false;
        }
        self.batch
            .record_state(self.world.current_turn(), MatchState::Play);
        tracing::info!("Game {} started", self.world.game_uid());
        true
    }

    /// Ends the match. Returns false if it had already ended.
    pub fn end_game(&mut self, winner: Option<SeatId>) -> bool {
        if !self.world.end(winner) {
            return false;
        }
        self.resolving = false;
        self.batch
            .record_state(self.world.current_turn(), MatchState::GameEnded);
        tracing::info!(
            "Game {} ended, winner {:?}",
            self.world.game_uid(),
            winner
        );
        true
    }

    // ========================================================================
    // TURN
    // ========================================================================

    /// Runs exactly one turn and returns its events.
    ///
    /// The caller must not invoke this while [`Self::is_resolving`].
    pub fn execute_turn(&mut self) -> DiffBatch {
        self.resolving = true;
        let turn = self.world.current_turn();

        for entity in self.world.entities_mut() {
            entity.mark_turn_start();
        }

        self.spawn_phase(turn);
        self.movement_phase();
        self.combat_phase();
        self.progression_phase();

        let resolve_secs = self.world.config().resolve_secs;
        self.resolve_remaining = resolve_secs;
        self.resolving = resolve_secs > 0.0;

        let batch = self.batch.take();
        tracing::debug!("Turn {} executed: {} events", turn, batch.len());
        batch
    }

    fn spawn_phase(&mut self, turn: u32) {
        let cadence = self.world.config().wave_spawn_cadence.max(1);
        if turn % cadence != 0 {
            return;
        }
        self.world.next_wave_cycle();
        let spawned = match self.world.spawn_waves(&self.routes) {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!("Wave spawn failed on turn {}: {}", turn, e);
                return;
            }
        };
        for id in &spawned {
            if let Some(entity) = self.world.entity(id) {
                self.batch.record_spawned(entity);
            }
        }
    }

    fn movement_phase(&mut self) {
        let elapsed = self.world.config().turn_duration;
        let batch = &mut self.batch;
        for entity in self.world.entities_mut() {
            if entity.advance(elapsed) {
                batch.record_moved(entity);
            }
        }
    }

    fn combat_phase(&mut self) {
        let hits = combat::detect(&self.world, self.world.config().max_attack_range);

        let mut damaged = BTreeSet::new();
        for hit in hits {
            let Some(target) = self.world.entity_mut(&hit.target) else {
                continue;
            };
            if target.is_destroyed() {
                continue;
            }
            match target.take_damage(hit.damage) {
                Ok(change) => {
                    if change.changed() {
                        damaged.insert(hit.target.clone());
                    }
                    if change.destroyed {
                        tracing::debug!("{} destroyed by {}", hit.target, hit.attacker);
                    }
                }
                Err(e) => tracing::warn!("Hit {} -> {} rejected: {}", hit.attacker, hit.target, e),
            }
        }

        for id in &damaged {
            if let Some(entity) = self.world.entity(id) {
                self.batch.record_health(entity);
            }
        }
    }

    fn progression_phase(&mut self) {
        let finished: Vec<String> = self
            .world
            .entities_of(EntityCategory::Wave)
            .filter(|e| e.is_destroyed() || e.as_wave().is_some_and(|w| w.is_route_complete()))
            .map(|e| e.id().to_string())
            .collect();
        for id in finished {
            if let Err(e) = self.world.remove_wave(&id) {
                tracing::warn!("Could not remove wave {}: {}", id, e);
            }
        }

        let turn = self.world.current_turn();
        for athlete in self.world.athletes_mut() {
            if athlete
                .current_mission
                .as_ref()
                .is_some_and(|m| m.is_expired(turn))
            {
                athlete.current_mission = None;
            }
        }

        self.world.next_turn();
    }

    // ========================================================================
    // COMMANDS
    // ========================================================================

    /// Validates and applies a command from `issuer`.
    ///
    /// # Errors
    ///
    /// `Spoofed` if the payload names another seat; handler errors
    /// otherwise. A failed command leaves the world unchanged.
    pub fn apply_command(&mut self, command: Command, issuer: SeatId) -> ServerResult<Vec<Effect>> {
        if let Some(declared) = command.declared_player() {
            if declared != issuer.to_wire() {
                tracing::warn!(
                    "Rejected {} from {}: claims player {}",
                    command.name(),
                    issuer,
                    declared
                );
                return Err(ServerError::Spoofed {
                    seat: issuer,
                    declared,
                });
            }
        }

        match command {
            Command::PlayCard(msg) => self.play_card(&msg, issuer),
            Command::TaskCompleted(msg) => self.task_completed(&msg, issuer),
            Command::Resign(_) => self.resign(issuer),
            Command::Chat(msg) => Self::chat(msg, issuer),
            Command::PlayerSettings(msg) => self.player_settings(&msg, issuer),
            Command::PlayerSettingsAi(msg) => self.player_settings_ai(&msg, issuer),
            Command::GameSettings(msg) => self.game_settings(msg),
        }
    }

    fn require_state(&self, command: &'static str, state: MatchState) -> ServerResult<()> {
        if self.world.state() == state {
            Ok(())
        } else {
            Err(ServerError::WrongState {
                command,
                state: self.world.state(),
            })
        }
    }

    fn play_card(&mut self, msg: &MsgPlayCard, issuer: SeatId) -> ServerResult<Vec<Effect>> {
        self.require_state("play_card", MatchState::Play)?;

        let player = self
            .world
            .player(issuer)
            .ok_or(CoreError::PlayerNotFound {
                seat: issuer.to_wire(),
            })?;
        let card = player
            .hand_card(&msg.card_uid)
            .ok_or_else(|| CoreError::CardNotInHand {
                uid: msg.card_uid.clone(),
            })?
            .clone();
        if card.owner != issuer {
            return Err(ServerError::InvalidCommand(format!(
                "card {} belongs to {}",
                card.uid, card.owner
            )));
        }
        if msg.athlete_ids.is_empty() {
            return Err(ServerError::InvalidCommand("card played on no athletes".into()));
        }
        if !msg.target_position.is_finite() {
            return Err(ServerError::InvalidCommand(format!(
                "non-finite target {:?}",
                msg.target_position
            )));
        }
        if let Some(foreign) = msg.athlete_ids.iter().find(|id| !player.owns_athlete(id)) {
            return Err(ServerError::InvalidCommand(format!(
                "athlete {foreign} not owned by {issuer}"
            )));
        }

        let turn = self.world.current_turn();
        let heroes: Vec<Option<String>> = msg
            .athlete_ids
            .iter()
            .map(|id| {
                self.world
                    .athlete(id)
                    .and_then(|a| a.hero_id())
                    .map(str::to_string)
            })
            .collect();

        let (task_id, task_type) = match &card.kind {
            CardKind::TaskAssignment { task } => {
                let mission = Mission::new(
                    task.clone(),
                    msg.athlete_ids.iter().cloned(),
                    turn,
                    msg.target_position,
                );
                for (athlete_id, hero_id) in msg.athlete_ids.iter().zip(&heroes) {
                    if let Some(athlete) = self.world.athlete_mut(athlete_id) {
                        athlete.current_mission = Some(mission.clone());
                    }
                    if let Some(hero_id) = hero_id {
                        self.route_hero(hero_id, task.task_type, msg.target_position);
                    }
                }
                (task.task_id.clone(), task.task_type)
            }
            CardKind::StatBoost { boost } => {
                #[allow(clippy::cast_precision_loss)]
                let speed = boost.speed_increase as f32 / 10.0;
                for hero_id in heroes.iter().flatten() {
                    if let Some(hero) = self.world.entity_mut(hero_id) {
                        hero.boost(boost.attack_increase, speed);
                        if let Some(state) = hero.as_hero_mut() {
                            state.armor = state.armor.saturating_add(boost.defense_increase.max(0));
                        }
                    }
                }
                (card.card_id.clone(), TaskType::Idle)
            }
        };

        let player = self
            .world
            .player_mut(issuer)
            .ok_or(CoreError::PlayerNotFound {
                seat: issuer.to_wire(),
            })?;
        player.discard_card(&card.uid)?;
        player.add_history(HistoryEntry {
            action: GameAction::AssignTask.tag(),
            turn,
            card_id: card.card_id.clone(),
            card_uid: card.uid.clone(),
            target_uid: None,
            target_player: None,
            target_athletes: msg.athlete_ids.clone(),
        });

        tracing::info!(
            "{} played {} on {} athletes",
            issuer,
            card.card_id,
            msg.athlete_ids.len()
        );

        let mut effects = Vec::with_capacity(1 + msg.athlete_ids.len());
        effects.push(Effect::Broadcast(Envelope::new(GameAction::CardPlayed, msg)?));
        for athlete_id in &msg.athlete_ids {
            effects.push(Effect::Broadcast(Envelope::new(
                GameAction::TaskAssigned,
                &MsgAssignTask {
                    athlete_id: athlete_id.clone(),
                    task_id: task_id.clone(),
                    task_type,
                    target_position: msg.target_position,
                },
            )?));
        }
        Ok(effects)
    }

    fn route_hero(&mut self, hero_id: &str, task_type: TaskType, target: Vec2) {
        let Some(hero) = self.world.entity_mut(hero_id) else {
            return;
        };
        let path = if task_type.moves_hero() {
            self.planner.plan(hero.position(), target)
        } else {
            Vec::new()
        };
        if let Some(state) = hero.as_hero_mut() {
            state.set_path(path);
        }
    }

    fn task_completed(&mut self, msg: &MsgTaskCompleted, issuer: SeatId) -> ServerResult<Vec<Effect>> {
        let owned = self
            .world
            .player(issuer)
            .is_some_and(|p| p.owns_athlete(&msg.athlete_id));
        if !owned {
            return Err(ServerError::InvalidCommand(format!(
                "athlete {} not owned by {}",
                msg.athlete_id, issuer
            )));
        }
        let athlete = self
            .world
            .athlete_mut(&msg.athlete_id)
            .ok_or_else(|| CoreError::AthleteNotFound {
                id: msg.athlete_id.clone(),
            })?;
        if athlete
            .current_mission
            .as_ref()
            .is_some_and(|m| m.data.task_id == msg.task_id)
        {
            athlete.current_mission = None;
            tracing::debug!(
                "{} completed {} (success: {})",
                msg.athlete_id,
                msg.task_id,
                msg.success
            );
        }
        Ok(Vec::new())
    }

    fn resign(&mut self, issuer: SeatId) -> ServerResult<Vec<Effect>> {
        if self.world.has_ended() {
            return Err(ServerError::WrongState {
                command: "resign",
                state: self.world.state(),
            });
        }
        let winner = self.world.opponent_of(issuer);
        tracing::info!("{} resigned", issuer);
        self.end_game(winner);
        Ok(vec![Effect::GameEnded(winner)])
    }

    fn chat(msg: MsgChat, issuer: SeatId) -> ServerResult<Vec<Effect>> {
        let echo = MsgChat {
            player_id: issuer.to_wire(),
            msg: msg.msg,
        };
        Ok(vec![Effect::Broadcast(Envelope::new(
            GameAction::ChatMessage,
            &echo,
        )?)])
    }

    fn player_settings(&mut self, msg: &MsgPlayerSettings, issuer: SeatId) -> ServerResult<Vec<Effect>> {
        self.require_state("player_settings", MatchState::Connecting)?;
        let deck = if msg.deck.is_empty() {
            Catalog::STARTER_DECK
        } else {
            msg.deck.as_str()
        };
        let hand = self.world.assign_deck(issuer, deck, &self.catalog)?;

        let player = self
            .world
            .player_mut(issuer)
            .ok_or(CoreError::PlayerNotFound {
                seat: issuer.to_wire(),
            })?;
        if !msg.username.is_empty() {
            player.username.clone_from(&msg.username);
        }
        player.avatar.clone_from(&msg.avatar);
        player.ready = true;
        tracing::info!("{} ready with deck {} ({} in hand)", issuer, deck, hand);

        Ok(vec![
            Effect::Broadcast(Envelope::new(
                GameAction::PlayerReady,
                &MsgPlayer {
                    player_id: issuer.to_wire(),
                },
            )?),
            Effect::Refresh,
        ])
    }

    fn player_settings_ai(&mut self, msg: &MsgPlayerSettings, issuer: SeatId) -> ServerResult<Vec<Effect>> {
        if self.world.config().dedicated {
            return Err(ServerError::InvalidCommand(
                "AI seats are disabled on a dedicated server".into(),
            ));
        }
        let seat = self
            .world
            .opponent_of(issuer)
            .ok_or(CoreError::PlayerNotFound { seat: -1 })?;
        self.seat_ai(seat, msg)
    }

    /// Hands `seat` to an AI with the given deck and marks it ready.
    ///
    /// # Errors
    ///
    /// `WrongState` after the start, `UnknownDefinition` for a bad deck.
    pub fn seat_ai(&mut self, seat: SeatId, msg: &MsgPlayerSettings) -> ServerResult<Vec<Effect>> {
        self.require_state("player_settings_ai", MatchState::Connecting)?;
        let deck = if msg.deck.is_empty() {
            Catalog::STARTER_DECK
        } else {
            msg.deck.as_str()
        };
        self.world.assign_deck(seat, deck, &self.catalog)?;

        let player = self
            .world
            .player_mut(seat)
            .ok_or(CoreError::PlayerNotFound {
                seat: seat.to_wire(),
            })?;
        player.is_ai = true;
        player.ai_level = msg.ai_level;
        player.username = if msg.username.is_empty() {
            format!("AI{}", seat.0)
        } else {
            msg.username.clone()
        };
        player.avatar.clone_from(&msg.avatar);
        player.ready = true;
        tracing::info!("{} is now AI level {}", seat, msg.ai_level);

        Ok(vec![
            Effect::Broadcast(Envelope::new(
                GameAction::PlayerReady,
                &MsgPlayer {
                    player_id: seat.to_wire(),
                },
            )?),
            Effect::Refresh,
        ])
    }

    fn game_settings(&mut self, msg: MsgGameSettings) -> ServerResult<Vec<Effect>> {
        self.require_state("game_settings", MatchState::Connecting)?;
        if !msg.turn_duration.is_finite() || msg.turn_duration <= 0.0 || msg.wave_spawn_cadence == 0 {
            return Err(ServerError::InvalidCommand(format!(
                "game settings out of range: {msg:?}"
            )));
        }
        let config = self.world.config_mut();
        config.turn_duration = msg.turn_duration;
        config.wave_spawn_cadence = msg.wave_spawn_cadence;
        tracing::info!(
            "Game settings: turn {}s, waves every {} turns",
            msg.turn_duration,
            msg.wave_spawn_cadence
        );
        Ok(vec![Effect::Refresh])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::StraightLine;
    use lanewar_core::{MatchConfig, Team};
    use lanewar_protocol::WireMessage;

    fn simulation(config: MatchConfig) -> Simulation {
        let routes = Arc::new(LaneRoutes::builtin());
        let world = WorldState::new("engine", config, &routes).unwrap();
        Simulation::new(world, routes, Arc::new(Catalog::builtin()), Box::new(StraightLine))
    }

    fn ready(sim: &mut Simulation, seat: SeatId) {
        sim.apply_command(
            Command::PlayerSettings(MsgPlayerSettings {
                username: format!("p{}", seat.0),
                deck: Catalog::STARTER_DECK.into(),
                ..MsgPlayerSettings::default()
            }),
            seat,
        )
        .unwrap();
    }

    fn started() -> Simulation {
        let mut sim = simulation(MatchConfig::default());
        ready(&mut sim, SeatId(0));
        ready(&mut sim, SeatId(1));
        assert!(sim.start_game());
        sim.take_batch();
        sim
    }

    fn task_card(sim: &Simulation, seat: SeatId) -> String {
        let player = sim.world().player(seat).unwrap();
        player
            .hand()
            .iter()
            .find(|uid| {
                matches!(
                    player.card(uid).map(|c| &c.kind),
                    Some(CardKind::TaskAssignment { task }) if task.task_type.moves_hero()
                )
            })
            .cloned()
            .expect("starter hand holds a moving task card")
    }

    #[test]
    fn test_turn_counter_increments_once() {
        let mut sim = started();
        assert_eq!(sim.world().current_turn(), 1);
        sim.execute_turn();
        assert_eq!(sim.world().current_turn(), 2);
        sim.execute_turn();
        assert_eq!(sim.world().current_turn(), 3);
    }

    #[test]
    fn test_waves_spawn_on_cadence() {
        let mut sim = started();
        let initial = sim.world().entities_of(EntityCategory::Wave).count();
        let mut spawned = 0;
        for _ in 0..4 {
            spawned += sim.execute_turn().spawned.len();
        }
        assert_eq!(spawned, 6);
        assert!(sim.world().entities_of(EntityCategory::Wave).count() <= initial + 6);
    }

    #[test]
    fn test_waves_move_and_report() {
        let mut sim = started();
        let batch = sim.execute_turn();
        assert!(batch
            .moved
            .iter()
            .any(|m| m.category == EntityCategory::Wave));
        for moved in &batch.moved {
            let entity = sim.world().entity(&moved.id);
            if let Some(entity) = entity {
                assert_eq!(entity.position(), moved.position);
            }
        }
    }

    #[test]
    fn test_resolving_window() {
        let mut sim = simulation(MatchConfig {
            resolve_secs: 1.0,
            ..MatchConfig::default()
        });
        ready(&mut sim, SeatId(0));
        ready(&mut sim, SeatId(1));
        sim.start_game();

        sim.execute_turn();
        assert!(sim.is_resolving());
        sim.advance_resolution(0.6);
        assert!(sim.is_resolving());
        sim.advance_resolution(0.6);
        assert!(!sim.is_resolving());
    }

    #[test]
    fn test_no_resolve_window_by_default() {
        let mut sim = started();
        sim.execute_turn();
        assert!(!sim.is_resolving());
    }

    #[test]
    fn test_combat_damage_recorded_once() {
        let mut sim = started();
        let tower = sim
            .world()
            .entities_of(EntityCategory::Structure)
            .find(|e| e.team() == Team::TeamA)
            .map(|e| e.id().to_string())
            .unwrap();
        let heroes: Vec<String> = sim
            .world()
            .team_heroes(Team::TeamB)
            .take(2)
            .map(|e| e.id().to_string())
            .collect();

        // Away from every lane
        let spot = Vec2::new(50.0, 50.0);
        sim.world_mut().entity_mut(&tower).unwrap().set_position(spot);
        for id in &heroes {
            sim.world_mut()
                .entity_mut(id)
                .unwrap()
                .set_position(spot + Vec2::new(0.5, 0.0));
        }

        let batch = sim.execute_turn();
        let tower_events = batch.health.iter().filter(|h| h.id == tower).count();
        assert_eq!(tower_events, 1);
        let tower = sim.world().entity(&tower).unwrap();
        assert_eq!(tower.health(), tower.max_health() - 2 * 40);
        for id in &heroes {
            assert_eq!(batch.health.iter().filter(|h| &h.id == id).count(), 1);
        }
    }

    #[test]
    fn test_play_task_card() {
        let mut sim = started();
        let seat = SeatId(0);
        let uid = task_card(&sim, seat);
        let athlete = sim.world().player(seat).unwrap().athletes()[0].clone();
        let target = Vec2::new(-3.0, -3.0);

        let effects = sim
            .apply_command(
                Command::PlayCard(MsgPlayCard {
                    player_id: 0,
                    card_uid: uid.clone(),
                    athlete_ids: vec![athlete.clone()],
                    target_position: target,
                }),
                seat,
            )
            .unwrap();

        assert_eq!(effects.len(), 2);
        let Effect::Broadcast(first) = &effects[0] else {
            panic!("expected broadcast");
        };
        assert_eq!(first.action(), Some(GameAction::CardPlayed));

        let player = sim.world().player(seat).unwrap();
        assert!(player.hand_card(&uid).is_none());
        assert!(player.discard().contains(&uid));
        assert_eq!(player.history().len(), 1);

        assert!(sim.world().athlete(&athlete).unwrap().current_mission.is_some());
        let hero = sim.world().hero_of(&athlete).unwrap();
        assert_eq!(hero.as_hero().unwrap().current_target(), Some(target));
    }

    #[test]
    fn test_card_on_foreign_athlete_rejected() {
        let mut sim = started();
        let uid = task_card(&sim, SeatId(0));
        let foreign = sim.world().player(SeatId(1)).unwrap().athletes()[0].clone();

        let result = sim.apply_command(
            Command::PlayCard(MsgPlayCard {
                player_id: 0,
                card_uid: uid.clone(),
                athlete_ids: vec![foreign],
                target_position: Vec2::ZERO,
            }),
            SeatId(0),
        );
        assert!(matches!(result, Err(ServerError::InvalidCommand(_))));
        assert!(sim.world().player(SeatId(0)).unwrap().hand_card(&uid).is_some());
    }

    #[test]
    fn test_spoofed_command_rejected() {
        let mut sim = started();
        let result = sim.apply_command(Command::Resign(MsgPlayer { player_id: 1 }), SeatId(0));
        assert!(matches!(
            result,
            Err(ServerError::Spoofed {
                seat: SeatId(0),
                declared: 1
            })
        ));
        assert_eq!(sim.world().state(), MatchState::Play);
    }

    #[test]
    fn test_resign_awards_opponent() {
        let mut sim = started();
        let effects = sim
            .apply_command(Command::Resign(MsgPlayer { player_id: 1 }), SeatId(1))
            .unwrap();
        assert_eq!(effects, vec![Effect::GameEnded(Some(SeatId(0)))]);
        assert_eq!(sim.world().winner(), Some(SeatId(0)));
        assert_eq!(
            sim.take_batch().state.map(|s| s.state),
            Some(MatchState::GameEnded)
        );
    }

    #[test]
    fn test_chat_echo_uses_sender_seat() {
        let mut sim = started();
        let effects = sim
            .apply_command(
                Command::Chat(MsgChat {
                    player_id: 1,
                    msg: "gg".into(),
                }),
                SeatId(1),
            )
            .unwrap();
        let Effect::Broadcast(env) = &effects[0] else {
            panic!("expected broadcast");
        };
        let echo = MsgChat::from_bytes(&env.payload).unwrap();
        assert_eq!(echo.player_id, 1);
        assert_eq!(echo.msg, "gg");
    }

    #[test]
    fn test_settings_only_before_start() {
        let mut sim = started();
        let result = sim.apply_command(
            Command::GameSettings(MsgGameSettings {
                turn_duration: 1.0,
                wave_spawn_cadence: 2,
            }),
            SeatId(0),
        );
        assert!(matches!(result, Err(ServerError::WrongState { .. })));
    }

    #[test]
    fn test_settings_reject_unbounded_turn_duration() {
        let mut sim = simulation(MatchConfig::default());
        for turn_duration in [f32::INFINITY, f32::NAN, 0.0, -1.0] {
            let result = sim.apply_command(
                Command::GameSettings(MsgGameSettings {
                    turn_duration,
                    wave_spawn_cadence: 2,
                }),
                SeatId(0),
            );
            assert!(matches!(result, Err(ServerError::InvalidCommand(_))));
        }
        assert_eq!(
            sim.world().config().turn_duration,
            MatchConfig::default().turn_duration
        );

        sim.apply_command(
            Command::GameSettings(MsgGameSettings {
                turn_duration: 2.5,
                wave_spawn_cadence: 3,
            }),
            SeatId(0),
        )
        .unwrap();
        assert_eq!(sim.world().config().turn_duration, 2.5);
        assert_eq!(sim.world().config().wave_spawn_cadence, 3);
    }

    #[test]
    fn test_card_with_non_finite_target_rejected() {
        let mut sim = started();
        let seat = SeatId(0);
        let uid = task_card(&sim, seat);
        let athlete = sim.world().player(seat).unwrap().athletes()[0].clone();

        for target in [Vec2::new(f32::INFINITY, 0.0), Vec2::new(f32::NAN, 0.0)] {
            let result = sim.apply_command(
                Command::PlayCard(MsgPlayCard {
                    player_id: 0,
                    card_uid: uid.clone(),
                    athlete_ids: vec![athlete.clone()],
                    target_position: target,
                }),
                seat,
            );
            assert!(matches!(result, Err(ServerError::InvalidCommand(_))));
        }

        assert!(sim.world().player(seat).unwrap().hand_card(&uid).is_some());
        assert!(sim.world().athlete(&athlete).unwrap().current_mission.is_none());
        for _ in 0..5 {
            sim.execute_turn();
        }
        let hero = sim.world().hero_of(&athlete).unwrap();
        assert!(hero.position().is_finite());
    }

    #[test]
    fn test_ai_rejected_on_dedicated() {
        let mut sim = simulation(MatchConfig::default());
        let result = sim.apply_command(
            Command::PlayerSettingsAi(MsgPlayerSettings::default()),
            SeatId(0),
        );
        assert!(matches!(result, Err(ServerError::InvalidCommand(_))));
        assert!(!sim.world().player(SeatId(1)).unwrap().is_ai);
    }

    #[test]
    fn test_ai_takes_opponent_seat() {
        let mut sim = simulation(MatchConfig {
            dedicated: false,
            ..MatchConfig::default()
        });
        sim.apply_command(
            Command::PlayerSettingsAi(MsgPlayerSettings {
                ai_level: 3,
                ..MsgPlayerSettings::default()
            }),
            SeatId(0),
        )
        .unwrap();
        let ai = sim.world().player(SeatId(1)).unwrap();
        assert!(ai.is_ai && ai.is_ready() && ai.is_connected());
        assert_eq!(ai.ai_level, 3);
    }

    #[test]
    fn test_mission_expires() {
        let mut sim = started();
        let seat = SeatId(0);
        let player = sim.world().player(seat).unwrap();
        let uid = player
            .hand()
            .iter()
            .find(|uid| {
                matches!(
                    player.card(uid).map(|c| &c.kind),
                    Some(CardKind::TaskAssignment { task }) if task.duration > 0
                )
            })
            .cloned();
        let Some(uid) = uid else {
            return;
        };
        let athlete = player.athletes()[0].clone();
        sim.apply_command(
            Command::PlayCard(MsgPlayCard {
                player_id: 0,
                card_uid: uid,
                athlete_ids: vec![athlete.clone()],
                target_position: Vec2::ZERO,
            }),
            seat,
        )
        .unwrap();
        for _ in 0..10 {
            sim.execute_turn();
        }
        assert!(sim.world().athlete(&athlete).unwrap().current_mission.is_none());
    }
}
