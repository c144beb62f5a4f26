//! # World State
//!
//! The canonical aggregate for one match. The global maps are the source
//! of truth; per-team indexes are views kept in step by the factory and
//! removal methods here, which are the only way entities enter or leave.
//!
//! ## Lifecycle
//!
//! ```text
//! Connecting ──all seats connected + ready──▶ Play ──resign/forfeit──▶ GameEnded
//! ```
//!
//! Transitions only move forward.

use std::collections::{BTreeMap, BTreeSet};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::athlete::{default_roster, Athlete, AthleteTraits, Role};
use crate::card::Card;
use crate::catalog::Catalog;
use crate::config::MatchConfig;
use crate::entity::{BaseStats, Entity, EntityCategory, EntityKind, Lane, Team, TowerTier};
use crate::error::{CoreError, CoreResult};
use crate::hero::HeroState;
use crate::player::{Player, SeatId};
use crate::routes::LaneRoutes;
use crate::vector::Vec2;
use crate::wave::WaveState;

/// Match lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum MatchState {
    /// Waiting for seats.
    Connecting = 0,
    /// Turns are running.
    Play = 20,
    /// Finished.
    GameEnded = 99,
}

impl MatchState {
    /// Converts from the wire discriminant.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Connecting),
            20 => Some(Self::Play),
            99 => Some(Self::GameEnded),
            _ => None,
        }
    }
}

/// Tower layout: (x, z, team, tier).
pub const TOWER_LAYOUT: [(f32, f32, Team, TowerTier); 12] = [
    (-7.0, 1.0, Team::TeamA, TowerTier::Tier1),
    (-2.6, -1.3, Team::TeamA, TowerTier::Tier1),
    (0.1, -5.7, Team::TeamA, TowerTier::Tier1),
    (-7.0, -3.2, Team::TeamA, TowerTier::Tier2),
    (-5.4, -4.1, Team::TeamA, TowerTier::Tier2),
    (-5.2, -5.7, Team::TeamA, TowerTier::Tier2),
    (-0.3, 7.9, Team::TeamB, TowerTier::Tier1),
    (2.4, 4.2, Team::TeamB, TowerTier::Tier1),
    (6.6, 1.7, Team::TeamB, TowerTier::Tier1),
    (5.0, 8.2, Team::TeamB, TowerTier::Tier2),
    (5.4, 6.5, Team::TeamB, TowerTier::Tier2),
    (6.9, 5.7, Team::TeamB, TowerTier::Tier2),
];

/// Hero start position per team.
#[must_use]
pub const fn hero_start(team: Team) -> Vec2 {
    match team {
        Team::TeamB => Vec2::new(3.0, 6.0),
        Team::TeamA | Team::None => Vec2::new(0.0, 0.0),
    }
}

#[derive(Clone, Debug, Default)]
struct TeamIndex {
    athletes: BTreeSet<String>,
    entities: BTreeSet<String>,
}

/// Canonical match state.
#[derive(Clone, Debug)]
pub struct WorldState {
    game_uid: String,
    config: MatchConfig,
    state: MatchState,
    current_turn: u32,
    wave_cycle: u32,
    winner: Option<SeatId>,
    players: Vec<Player>,
    athletes: BTreeMap<String, Athlete>,
    entities: BTreeMap<String, Entity>,
    teams: [TeamIndex; 2],
    next_hero_id: u32,
    next_athlete_id: u32,
    rng: ChaCha8Rng,
}

const fn team_slot(team: Team) -> Option<usize> {
    match team {
        Team::TeamA => Some(0),
        Team::TeamB => Some(1),
        Team::None => None,
    }
}

impl WorldState {
    /// Empty world: seats, no entities, no athletes.
    #[must_use]
    pub fn empty(game_uid: impl Into<String>, config: MatchConfig) -> Self {
        let seats = config.seats.max(crate::MIN_SEATS).min(usize::from(u8::MAX));
        let players = (0..seats)
            .filter_map(|i| u8::try_from(i).ok())
            .map(|i| Player::new(SeatId(i)))
            .collect();
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            game_uid: game_uid.into(),
            config,
            state: MatchState::Connecting,
            current_turn: 1,
            wave_cycle: 0,
            winner: None,
            players,
            athletes: BTreeMap::new(),
            entities: BTreeMap::new(),
            teams: [TeamIndex::default(), TeamIndex::default()],
            next_hero_id: 1,
            next_athlete_id: 0,
            rng,
        }
    }

    /// Full match setup: default rosters, towers, one hero per athlete and
    /// the first wave batch.
    ///
    /// # Errors
    ///
    /// `EmptyRoute` if `routes` lacks a lane, or any id collision.
    pub fn new(
        game_uid: impl Into<String>,
        config: MatchConfig,
        routes: &LaneRoutes,
    ) -> CoreResult<Self> {
        let mut world = Self::empty(game_uid, config);

        for team in Team::PLAYABLE {
            for (name, age, role) in default_roster(team) {
                world.create_athlete(name, age, role, team)?;
            }
        }
        world.distribute_athletes();

        for (x, z, team, tier) in TOWER_LAYOUT {
            world.spawn_tower(Vec2::new(x, z), team, tier)?;
        }

        let athlete_ids: Vec<String> = world.athletes.keys().cloned().collect();
        for id in athlete_ids {
            world.create_hero_for_athlete(&id)?;
        }

        world.spawn_waves(routes)?;

        tracing::info!(
            "World {} ready: {} athletes, {} entities",
            world.game_uid,
            world.athletes.len(),
            world.entities.len()
        );
        Ok(world)
    }

    // ========================================================================
    // MATCH STATE
    // ========================================================================

    /// Match id.
    #[must_use]
    pub fn game_uid(&self) -> &str {
        &self.game_uid
    }

    /// Tunables.
    #[must_use]
    pub const fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Mutable tunables. Callers restrict this to the `Connecting` state.
    pub fn config_mut(&mut self) -> &mut MatchConfig {
        &mut self.config
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn state(&self) -> MatchState {
        self.state
    }

    /// Moves the lifecycle forward. Returns false (no change) for a
    /// same-or-backward transition.
    pub fn advance_state(&mut self, next: MatchState) -> bool {
        if next <= self.state {
            return false;
        }
        self.state = next;
        true
    }

    /// Ends the match. Returns false if it had already ended.
    pub fn end(&mut self, winner: Option<SeatId>) -> bool {
        if !self.advance_state(MatchState::GameEnded) {
            return false;
        }
        self.winner = winner;
        true
    }

    /// Winning seat once ended.
    #[must_use]
    pub const fn winner(&self) -> Option<SeatId> {
        self.winner
    }

    /// True after `Connecting`.
    #[must_use]
    pub fn has_started(&self) -> bool {
        self.state != MatchState::Connecting
    }

    /// True once ended.
    #[must_use]
    pub fn has_ended(&self) -> bool {
        self.state == MatchState::GameEnded
    }

    /// Current turn, starting at 1.
    #[must_use]
    pub const fn current_turn(&self) -> u32 {
        self.current_turn
    }

    /// Completes a turn.
    pub fn next_turn(&mut self) {
        self.current_turn += 1;
    }

    /// Wave spawn cycle counter.
    #[must_use]
    pub const fn wave_cycle(&self) -> u32 {
        self.wave_cycle
    }

    /// Advances the wave spawn cycle.
    pub fn next_wave_cycle(&mut self) {
        self.wave_cycle += 1;
    }

    /// Match RNG.
    pub fn rng_mut(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    // ========================================================================
    // PLAYERS
    // ========================================================================

    /// All seats.
    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Seat by id.
    #[must_use]
    pub fn player(&self, seat: SeatId) -> Option<&Player> {
        self.players.get(seat.index())
    }

    /// Mutable seat by id.
    pub fn player_mut(&mut self, seat: SeatId) -> Option<&mut Player> {
        self.players.get_mut(seat.index())
    }

    /// Seat bound to `user_id`.
    #[must_use]
    pub fn seat_of_user(&self, user_id: &str) -> Option<SeatId> {
        self.players
            .iter()
            .find(|p| !p.user_id.is_empty() && p.user_id == user_id)
            .map(|p| p.seat)
    }

    /// First seat with no bound user and no AI.
    #[must_use]
    pub fn free_seat(&self) -> Option<SeatId> {
        self.players
            .iter()
            .find(|p| p.user_id.is_empty() && !p.is_ai)
            .map(|p| p.seat)
    }

    /// Team a seat plays for.
    #[must_use]
    pub const fn team_of_seat(seat: SeatId) -> Team {
        Team::for_seat(seat.index())
    }

    /// Every seat is connected (or AI).
    #[must_use]
    pub fn all_connected(&self) -> bool {
        self.players.iter().filter(|p| p.is_connected()).count() >= self.players.len()
    }

    /// Every seat is ready.
    #[must_use]
    pub fn all_ready(&self) -> bool {
        self.players.iter().filter(|p| p.is_ready()).count() >= self.players.len()
    }

    /// Seats currently connected (AI counts).
    pub fn connected_seats(&self) -> impl Iterator<Item = SeatId> + '_ {
        self.players
            .iter()
            .filter(|p| p.is_connected())
            .map(|p| p.seat)
    }

    /// First seat on the other team.
    #[must_use]
    pub fn opponent_of(&self, seat: SeatId) -> Option<SeatId> {
        let team = Self::team_of_seat(seat);
        self.players
            .iter()
            .map(|p| p.seat)
            .find(|s| Self::team_of_seat(*s) == team.opponent())
    }

    /// Replaces a seat's cards with a shuffled copy of `deck_id` and draws
    /// the opening hand. Card uids are `s<seat>_<n>`.
    ///
    /// Returns the number of cards in the hand.
    ///
    /// # Errors
    ///
    /// `PlayerNotFound` for a bad seat, `UnknownDefinition` for an unknown
    /// deck or card. The seat is untouched on error.
    pub fn assign_deck(&mut self, seat: SeatId, deck_id: &str, catalog: &Catalog) -> CoreResult<usize> {
        let deck = catalog.deck(deck_id)?;
        let cards = deck
            .cards
            .iter()
            .enumerate()
            .map(|(n, card_id)| {
                let def = catalog.card(card_id)?;
                Ok(Card {
                    card_id: def.id.clone(),
                    uid: format!("s{}_{n}", seat.0),
                    owner: seat,
                    name: def.name.clone(),
                    description: def.description.clone(),
                    cost: def.cost,
                    kind: def.effect.clone(),
                })
            })
            .collect::<CoreResult<Vec<Card>>>()?;

        let opening_hand = self.config.opening_hand;
        let player = self
            .players
            .get_mut(seat.index())
            .ok_or(CoreError::PlayerNotFound {
                seat: seat.to_wire(),
            })?;
        player.clear_cards();
        player.deck_id = deck_id.to_string();
        for card in cards {
            player.add_card_to_deck(card);
        }
        player.shuffle_deck(&mut self.rng);
        player.draw_cards(opening_hand);
        Ok(player.hand().len())
    }

    /// Hands each team's athletes to that team's seats in turn.
    fn distribute_athletes(&mut self) {
        for team in Team::PLAYABLE {
            let seats: Vec<usize> = (0..self.players.len())
                .filter(|i| Team::for_seat(*i) == team)
                .collect();
            if seats.is_empty() {
                continue;
            }
            let ids: Vec<String> = self.team_athletes(team).map(|a| a.id().to_string()).collect();
            for (n, id) in ids.into_iter().enumerate() {
                self.players[seats[n % seats.len()]].add_athlete(id);
            }
        }
    }

    // ========================================================================
    // ATHLETES
    // ========================================================================

    /// Creates an athlete with rolled traits and adds it to `team`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::add_athlete_to_team`].
    pub fn create_athlete(
        &mut self,
        name: &str,
        age: u32,
        role: Role,
        team: Team,
    ) -> CoreResult<String> {
        let id = format!("athlete{}", self.next_athlete_id);
        self.next_athlete_id += 1;
        let traits = AthleteTraits::roll(&mut self.rng);
        let athlete = Athlete::new(id.clone(), name.to_string(), age, role, traits);
        self.add_athlete_to_team(athlete, team)?;
        Ok(id)
    }

    /// Adds `athlete` to `team`.
    ///
    /// # Errors
    ///
    /// `AlreadyAssigned` if it already has a team, `DuplicateEntity` if the
    /// id exists, `UnassignedTeam` for `Team::None`.
    pub fn add_athlete_to_team(&mut self, mut athlete: Athlete, team: Team) -> CoreResult<()> {
        if athlete.team() != Team::None {
            return Err(CoreError::AlreadyAssigned {
                id: athlete.id().to_string(),
                team: athlete.team(),
            });
        }
        if self.athletes.contains_key(athlete.id()) {
            return Err(CoreError::DuplicateEntity {
                id: athlete.id().to_string(),
            });
        }
        let slot = team_slot(team).ok_or_else(|| CoreError::UnassignedTeam {
            id: athlete.id().to_string(),
        })?;

        athlete.assign_team(team);
        self.teams[slot].athletes.insert(athlete.id().to_string());
        self.athletes.insert(athlete.id().to_string(), athlete);
        Ok(())
    }

    /// Removes an athlete from its team and the world.
    ///
    /// # Errors
    ///
    /// `AthleteNotFound` if absent.
    pub fn remove_athlete_from_team(&mut self, athlete_id: &str) -> CoreResult<Athlete> {
        let mut athlete = self
            .athletes
            .remove(athlete_id)
            .ok_or_else(|| CoreError::AthleteNotFound {
                id: athlete_id.to_string(),
            })?;
        if let Some(slot) = team_slot(athlete.team()) {
            self.teams[slot].athletes.remove(athlete_id);
        }
        for player in &mut self.players {
            player.remove_athlete(athlete_id);
        }
        athlete.assign_team(Team::None);
        Ok(athlete)
    }

    /// Athlete by id.
    #[must_use]
    pub fn athlete(&self, athlete_id: &str) -> Option<&Athlete> {
        self.athletes.get(athlete_id)
    }

    /// Mutable athlete by id.
    pub fn athlete_mut(&mut self, athlete_id: &str) -> Option<&mut Athlete> {
        self.athletes.get_mut(athlete_id)
    }

    /// All athletes, ordered by id.
    pub fn athletes(&self) -> impl Iterator<Item = &Athlete> {
        self.athletes.values()
    }

    /// Mutable iteration over all athletes.
    pub fn athletes_mut(&mut self) -> impl Iterator<Item = &mut Athlete> {
        self.athletes.values_mut()
    }

    /// Athletes on `team`.
    pub fn team_athletes(&self, team: Team) -> impl Iterator<Item = &Athlete> {
        team_slot(team)
            .map(|slot| &self.teams[slot].athletes)
            .into_iter()
            .flatten()
            .filter_map(|id| self.athletes.get(id))
    }

    // ========================================================================
    // ENTITY FACTORIES
    // ========================================================================

    fn insert_entity(&mut self, entity: Entity) -> CoreResult<String> {
        let id = entity.id().to_string();
        if self.entities.contains_key(&id) {
            return Err(CoreError::DuplicateEntity { id });
        }
        if let Some(slot) = team_slot(entity.team()) {
            self.teams[slot].entities.insert(id.clone());
        }
        self.entities.insert(id.clone(), entity);
        Ok(id)
    }

    /// Creates the hero for an athlete and binds the two.
    ///
    /// # Errors
    ///
    /// `AthleteNotFound`, `UnassignedTeam` for a teamless athlete, or
    /// `DuplicateEntity` if the athlete already has a hero.
    pub fn create_hero_for_athlete(&mut self, athlete_id: &str) -> CoreResult<String> {
        let athlete = self
            .athletes
            .get(athlete_id)
            .ok_or_else(|| CoreError::AthleteNotFound {
                id: athlete_id.to_string(),
            })?;
        if let Some(existing) = athlete.hero_id() {
            return Err(CoreError::DuplicateEntity {
                id: existing.to_string(),
            });
        }
        let team = athlete.team();
        if team == Team::None {
            return Err(CoreError::UnassignedTeam {
                id: athlete_id.to_string(),
            });
        }
        let role = athlete.role();

        let stats = self.config.hero;
        let mut hero = HeroState::new(stats.mana, Some(athlete_id.to_string()));
        hero.types.insert(role.hero_type());

        let id = format!("hero{}", self.next_hero_id);
        self.next_hero_id += 1;
        let entity = Entity::new(
            id,
            format!("{}_{team}", role.hero_prefix()),
            team,
            hero_start(team),
            BaseStats {
                max_health: stats.max_health,
                attack: stats.attack,
                attack_range: stats.attack_range,
                speed: stats.speed,
            },
            EntityKind::Hero(hero),
        );
        let id = self.insert_entity(entity)?;

        if let Some(athlete) = self.athletes.get_mut(athlete_id) {
            athlete.bind_hero(id.clone());
        }
        Ok(id)
    }

    /// Places a tower. Its id is `Tower<Team>_<x>,<z>`.
    ///
    /// # Errors
    ///
    /// `UnassignedTeam` for `Team::None`, `DuplicateEntity` for a taken spot.
    pub fn spawn_tower(&mut self, position: Vec2, team: Team, tier: TowerTier) -> CoreResult<String> {
        let id = format!("Tower{team}_{},{}", position.x, position.z);
        if team == Team::None {
            return Err(CoreError::UnassignedTeam { id });
        }
        let stats = self.config.tower;
        let (max_health, attack) = match tier {
            TowerTier::Tier1 => (stats.tier1_health, stats.tier1_attack),
            TowerTier::Tier2 => (stats.tier2_health, stats.tier2_attack),
        };
        let entity = Entity::new(
            id.clone(),
            id,
            team,
            position,
            BaseStats {
                max_health,
                attack,
                attack_range: stats.attack_range,
                speed: 0.0,
            },
            EntityKind::Structure(tier),
        );
        self.insert_entity(entity)
    }

    /// Spawns one wave per team per routed lane for the current cycle.
    ///
    /// Returns the new ids in spawn order.
    ///
    /// # Errors
    ///
    /// `EmptyRoute` for a missing lane, `DuplicateEntity` if this cycle was
    /// already spawned. Either way no wave of this cycle is left behind.
    pub fn spawn_waves(&mut self, routes: &LaneRoutes) -> CoreResult<Vec<String>> {
        let mut spawned = Vec::with_capacity(Team::PLAYABLE.len() * Lane::ROUTED.len());
        for team in Team::PLAYABLE {
            for lane in Lane::ROUTED {
                let result = routes
                    .route(team, lane)
                    .and_then(|route| self.spawn_wave(team, lane, route));
                match result {
                    Ok(id) => spawned.push(id),
                    Err(e) => {
                        for id in &spawned {
                            let _ = self.remove_entity(id);
                        }
                        return Err(e);
                    }
                }
            }
        }
        Ok(spawned)
    }

    /// Spawns a single wave at route index 1.
    ///
    /// # Errors
    ///
    /// `EmptyRoute` for an empty route, `UnassignedTeam` for `Team::None`,
    /// `DuplicateEntity` on id reuse.
    pub fn spawn_wave(&mut self, team: Team, lane: Lane, route: &[Vec2]) -> CoreResult<String> {
        if route.is_empty() {
            return Err(CoreError::EmptyRoute { team, lane });
        }
        let id = format!("{lane}LaneCreepWave_{}{}", team.suffix(), self.wave_cycle);
        if team == Team::None {
            return Err(CoreError::UnassignedTeam { id });
        }
        let wave = WaveState::new(lane, route.to_vec());
        let position = wave.current_waypoint().unwrap_or(route[0]);
        let stats = self.config.wave;
        let entity = Entity::new(
            id.clone(),
            id,
            team,
            position,
            BaseStats {
                max_health: stats.max_health,
                attack: stats.attack,
                attack_range: stats.attack_range,
                speed: stats.speed,
            },
            EntityKind::Wave(wave),
        );
        self.insert_entity(entity)
    }

    /// Removes an entity from the world and its team view.
    ///
    /// # Errors
    ///
    /// `EntityNotFound` if absent.
    pub fn remove_entity(&mut self, id: &str) -> CoreResult<Entity> {
        let entity = self
            .entities
            .remove(id)
            .ok_or_else(|| CoreError::EntityNotFound { id: id.to_string() })?;
        if let Some(slot) = team_slot(entity.team()) {
            self.teams[slot].entities.remove(id);
        }
        Ok(entity)
    }

    /// Removes a creep wave.
    ///
    /// # Errors
    ///
    /// `EntityNotFound` if absent, `WrongCategory` if not a wave (nothing
    /// is removed).
    pub fn remove_wave(&mut self, id: &str) -> CoreResult<Entity> {
        let category = self.entity_or_err(id)?.category();
        if category != EntityCategory::Wave {
            return Err(CoreError::WrongCategory {
                id: id.to_string(),
                expected: EntityCategory::Wave,
            });
        }
        self.remove_entity(id)
    }

    // ========================================================================
    // ENTITY LOOKUP
    // ========================================================================

    /// Entity by id.
    #[must_use]
    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Mutable entity by id.
    pub fn entity_mut(&mut self, id: &str) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// Entity by id, or `EntityNotFound`.
    ///
    /// # Errors
    ///
    /// `EntityNotFound` if absent.
    pub fn entity_or_err(&self, id: &str) -> CoreResult<&Entity> {
        self.entities
            .get(id)
            .ok_or_else(|| CoreError::EntityNotFound { id: id.to_string() })
    }

    /// All entities, ordered by id.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Mutable iteration over all entities.
    pub fn entities_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    /// Entities of one category.
    pub fn entities_of(&self, category: EntityCategory) -> impl Iterator<Item = &Entity> {
        self.entities.values().filter(move |e| e.category() == category)
    }

    /// Ids of `team`'s entities.
    pub fn team_entity_ids(&self, team: Team) -> impl Iterator<Item = &str> {
        team_slot(team)
            .map(|slot| &self.teams[slot].entities)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// `team`'s entities.
    pub fn team_entities(&self, team: Team) -> impl Iterator<Item = &Entity> {
        self.team_entity_ids(team).filter_map(|id| self.entities.get(id))
    }

    /// `team`'s heroes.
    pub fn team_heroes(&self, team: Team) -> impl Iterator<Item = &Entity> {
        self.team_entities(team)
            .filter(|e| e.category() == EntityCategory::Hero)
    }

    /// `team`'s waves on `lane`.
    pub fn waves_on(&self, team: Team, lane: Lane) -> impl Iterator<Item = &Entity> {
        self.team_entities(team)
            .filter(move |e| e.as_wave().is_some_and(|w| w.lane() == lane))
    }

    /// Hero driven by `athlete_id`.
    #[must_use]
    pub fn hero_of(&self, athlete_id: &str) -> Option<&Entity> {
        self.athletes
            .get(athlete_id)
            .and_then(Athlete::hero_id)
            .and_then(|id| self.entities.get(id))
    }

    /// True if every team view matches the global maps.
    #[must_use]
    pub fn indexes_consistent(&self) -> bool {
        let entity_views = Team::PLAYABLE.iter().all(|team| {
            let view: BTreeSet<&str> = self.team_entity_ids(*team).collect();
            let truth: BTreeSet<&str> = self
                .entities
                .values()
                .filter(|e| e.team() == *team)
                .map(Entity::id)
                .collect();
            view == truth
        });
        let athlete_views = Team::PLAYABLE.iter().all(|team| {
            let view: BTreeSet<&str> = self.team_athletes(*team).map(Athlete::id).collect();
            let truth: BTreeSet<&str> = self
                .athletes
                .values()
                .filter(|a| a.team() == *team)
                .map(Athlete::id)
                .collect();
            view == truth && view.len() == team_slot(*team).map_or(0, |s| self.teams[s].athletes.len())
        });
        entity_views && athlete_views
    }
}
