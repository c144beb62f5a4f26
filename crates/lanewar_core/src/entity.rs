//! # Entity Model
//!
//! Heroes, creep waves and towers share one record with a category
//! payload. Behavior that differs per category is a `match` on
//! [`EntityKind`].
//!
//! ## Health
//!
//! Health is clamped to `[0, max]`. The transition from positive to zero
//! marks the entity destroyed exactly once; it stays destroyed until
//! [`Entity::respawn`] or [`Entity::reset`].

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::hero::HeroState;
use crate::vector::Vec2;
use crate::wave::WaveState;

// ============================================================================
// ENUMS
// ============================================================================

/// Team affiliation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Team {
    /// Unaffiliated.
    #[default]
    None = 0,
    /// First team (seat 0).
    TeamA = 1,
    /// Second team (seat 1).
    TeamB = 2,
}

impl Team {
    /// Both playable teams.
    pub const PLAYABLE: [Self; 2] = [Self::TeamA, Self::TeamB];

    /// Converts from the wire discriminant.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::TeamA),
            2 => Some(Self::TeamB),
            _ => None,
        }
    }

    /// The opposing team. `None` has no opponent.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::TeamA => Self::TeamB,
            Self::TeamB => Self::TeamA,
            Self::None => Self::None,
        }
    }

    /// Short suffix used in generated ids.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::TeamA => "A",
            Self::TeamB => "B",
            Self::None => "",
        }
    }

    /// Team for a seat index. Even seats play TeamA, odd seats TeamB.
    #[must_use]
    pub const fn for_seat(seat: usize) -> Self {
        if seat % 2 == 0 {
            Self::TeamA
        } else {
            Self::TeamB
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::None => "None",
            Self::TeamA => "TeamA",
            Self::TeamB => "TeamB",
        };
        f.write_str(name)
    }
}

/// Named route between the two bases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Lane {
    /// No lane.
    #[default]
    None = 0,
    /// Top lane.
    Top = 1,
    /// Middle lane.
    Mid = 2,
    /// Bottom lane.
    Bottom = 3,
}

impl Lane {
    /// Lanes that carry creep waves.
    pub const ROUTED: [Self; 3] = [Self::Top, Self::Mid, Self::Bottom];

    /// Converts from the wire discriminant.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Top),
            2 => Some(Self::Mid),
            3 => Some(Self::Bottom),
            _ => None,
        }
    }
}

impl std::fmt::Display for Lane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::None => "None",
            Self::Top => "Top",
            Self::Mid => "Mid",
            Self::Bottom => "Bottom",
        };
        f.write_str(name)
    }
}

/// Category tag carried on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EntityCategory {
    /// Creep wave.
    Wave = 0,
    /// Hero.
    Hero = 1,
    /// Tower.
    Structure = 2,
}

impl EntityCategory {
    /// Converts from the wire discriminant.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Wave),
            1 => Some(Self::Hero),
            2 => Some(Self::Structure),
            _ => None,
        }
    }
}

/// Tower tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TowerTier {
    /// Outer tower.
    Tier1 = 1,
    /// Inner tower.
    Tier2 = 2,
}

// ============================================================================
// ENTITY
// ============================================================================

/// Category payload.
#[derive(Clone, Debug, PartialEq)]
pub enum EntityKind {
    /// Mobile unit bound to one athlete.
    Hero(HeroState),
    /// Lane-bound creep group.
    Wave(WaveState),
    /// Fixed tower.
    Structure(TowerTier),
}

/// Outcome of a health mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HealthChange {
    /// Health before.
    pub previous: i32,
    /// Health after.
    pub current: i32,
    /// This change destroyed the entity.
    pub destroyed: bool,
}

impl HealthChange {
    /// True if health actually moved.
    #[inline]
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.previous != self.current
    }
}

/// A combatant unit.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    id: String,
    name: String,
    team: Team,
    max_health: i32,
    health: i32,
    attack: i32,
    attack_range: f32,
    speed: f32,
    position: Vec2,
    previous_position: Vec2,
    spawn_position: Vec2,
    destroyed: bool,
    kind: EntityKind,
}

/// Base stats shared by every category.
#[derive(Clone, Copy, Debug)]
pub(crate) struct BaseStats {
    pub max_health: i32,
    pub attack: i32,
    pub attack_range: f32,
    pub speed: f32,
}

impl Entity {
    pub(crate) fn new(
        id: String,
        name: String,
        team: Team,
        position: Vec2,
        stats: BaseStats,
        kind: EntityKind,
    ) -> Self {
        let max_health = stats.max_health.max(1);
        Self {
            id,
            name,
            team,
            max_health,
            health: max_health,
            attack: stats.attack.max(0),
            attack_range: stats.attack_range.max(0.0),
            speed: stats.speed.max(0.0),
            position,
            previous_position: position,
            spawn_position: position,
            destroyed: false,
            kind,
        }
    }

    /// Unique id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning team.
    #[inline]
    #[must_use]
    pub const fn team(&self) -> Team {
        self.team
    }

    /// Category tag.
    #[must_use]
    pub const fn category(&self) -> EntityCategory {
        match self.kind {
            EntityKind::Hero(_) => EntityCategory::Hero,
            EntityKind::Wave(_) => EntityCategory::Wave,
            EntityKind::Structure(_) => EntityCategory::Structure,
        }
    }

    /// Category payload.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> &EntityKind {
        &self.kind
    }

    /// Hero payload, if this is a hero.
    #[must_use]
    pub const fn as_hero(&self) -> Option<&HeroState> {
        match &self.kind {
            EntityKind::Hero(hero) => Some(hero),
            _ => None,
        }
    }

    /// Mutable hero payload, if this is a hero.
    pub fn as_hero_mut(&mut self) -> Option<&mut HeroState> {
        match &mut self.kind {
            EntityKind::Hero(hero) => Some(hero),
            _ => None,
        }
    }

    /// Wave payload, if this is a creep wave.
    #[must_use]
    pub const fn as_wave(&self) -> Option<&WaveState> {
        match &self.kind {
            EntityKind::Wave(wave) => Some(wave),
            _ => None,
        }
    }

    /// Mutable wave payload, if this is a creep wave.
    pub fn as_wave_mut(&mut self) -> Option<&mut WaveState> {
        match &mut self.kind {
            EntityKind::Wave(wave) => Some(wave),
            _ => None,
        }
    }

    /// Current health.
    #[inline]
    #[must_use]
    pub const fn health(&self) -> i32 {
        self.health
    }

    /// Maximum health.
    #[inline]
    #[must_use]
    pub const fn max_health(&self) -> i32 {
        self.max_health
    }

    /// Damage dealt per hit.
    #[inline]
    #[must_use]
    pub const fn attack(&self) -> i32 {
        self.attack
    }

    /// Attack reach in world units.
    #[inline]
    #[must_use]
    pub const fn attack_range(&self) -> f32 {
        self.attack_range
    }

    /// Movement speed in units per second.
    #[inline]
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Current position.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Position at the start of the current turn.
    #[inline]
    #[must_use]
    pub const fn previous_position(&self) -> Vec2 {
        self.previous_position
    }

    /// Where the entity respawns.
    #[inline]
    #[must_use]
    pub const fn spawn_position(&self) -> Vec2 {
        self.spawn_position
    }

    /// True once health reached zero, until respawn.
    #[inline]
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Alive with a positive reach.
    #[inline]
    #[must_use]
    pub fn can_attack(&self) -> bool {
        !self.destroyed && self.attack_range > 0.0
    }

    /// Alive.
    #[inline]
    #[must_use]
    pub const fn can_be_attacked(&self) -> bool {
        !self.destroyed
    }

    /// Squared-distance range check against `target`.
    #[inline]
    #[must_use]
    pub fn is_within_attack_range(&self, target: Vec2) -> bool {
        self.position.sqr_distance(target) <= self.attack_range * self.attack_range
    }

    // ========================================================================
    // HEALTH
    // ========================================================================

    /// Assigns health, clamped to `[0, max]`.
    ///
    /// Assigning a positive value to a destroyed entity does not revive it.
    pub fn set_health(&mut self, value: i32) -> HealthChange {
        let previous = self.health;
        let target = if self.destroyed { 0 } else { value };
        self.health = target.clamp(0, self.max_health);

        let destroyed = previous > 0 && self.health == 0 && !self.destroyed;
        if destroyed {
            self.destroyed = true;
        }

        HealthChange {
            previous,
            current: self.health,
            destroyed,
        }
    }

    /// Applies `amount` damage.
    ///
    /// # Errors
    ///
    /// `NegativeDamage` for a negative amount, `AlreadyDestroyed` when the
    /// entity is already down. Health is unchanged in both cases.
    pub fn take_damage(&mut self, amount: i32) -> CoreResult<HealthChange> {
        if amount < 0 {
            return Err(CoreError::NegativeDamage { amount });
        }
        if self.destroyed {
            return Err(CoreError::AlreadyDestroyed {
                id: self.id.clone(),
            });
        }
        Ok(self.set_health(self.health.saturating_sub(amount)))
    }

    /// Restores `amount` health, capped at max.
    ///
    /// # Errors
    ///
    /// `NegativeDamage` for a negative amount, `AlreadyDestroyed` when the
    /// entity must be respawned instead.
    pub fn heal(&mut self, amount: i32) -> CoreResult<HealthChange> {
        if amount < 0 {
            return Err(CoreError::NegativeDamage { amount });
        }
        if self.destroyed {
            return Err(CoreError::AlreadyDestroyed {
                id: self.id.clone(),
            });
        }
        Ok(self.set_health(self.health.saturating_add(amount)))
    }

    /// Hits `target` for this entity's attack.
    ///
    /// # Errors
    ///
    /// `AlreadyDestroyed` if either side is down.
    pub fn attack_target(&self, target: &mut Self) -> CoreResult<HealthChange> {
        if self.destroyed {
            return Err(CoreError::AlreadyDestroyed {
                id: self.id.clone(),
            });
        }
        target.take_damage(self.attack)
    }

    /// Revives at `position` with full health and no path.
    pub fn respawn(&mut self, position: Vec2) {
        self.reset(position, self.max_health);
        if let EntityKind::Hero(hero) = &mut self.kind {
            hero.clear_path();
        }
    }

    /// Revives at `position` with `health` (clamped to `[1, max]`).
    pub fn reset(&mut self, position: Vec2, health: i32) {
        self.destroyed = false;
        self.health = health.clamp(1, self.max_health);
        self.position = position;
        self.previous_position = position;
    }

    // ========================================================================
    // MOVEMENT
    // ========================================================================

    /// Teleports without touching the previous position.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Records the current position as the turn's starting point.
    pub fn mark_turn_start(&mut self) {
        self.previous_position = self.position;
    }

    /// Advances along the hero path or wave route for `elapsed` seconds.
    ///
    /// Returns true if the position changed. Destroyed entities and towers
    /// never move.
    pub fn advance(&mut self, elapsed: f32) -> bool {
        if self.destroyed {
            return false;
        }
        let budget = self.speed * elapsed;
        let start = self.position;
        self.position = match &mut self.kind {
            EntityKind::Hero(hero) => hero.step_along_path(start, budget),
            EntityKind::Wave(wave) => wave.step_along_route(start, budget),
            EntityKind::Structure(_) => start,
        };
        self.position != start
    }

    // ========================================================================
    // STAT CHANGES
    // ========================================================================

    pub(crate) fn set_base_stats(&mut self, max_health: i32, attack: i32, speed: f32) {
        self.max_health = max_health.max(1);
        self.health = self.health.min(self.max_health);
        self.attack = attack.max(0);
        self.speed = speed.max(0.0);
    }

    /// Raises attack and speed. Negative boosts are ignored.
    pub fn boost(&mut self, attack: i32, speed: f32) {
        self.attack = self.attack.saturating_add(attack.max(0));
        self.speed += speed.max(0.0);
    }
}
