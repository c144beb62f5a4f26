//! # Match Configuration
//!
//! Tunables for one match, loaded from TOML. Every top-level field has a
//! default so a file only needs the values it overrides.
//!
//! ```toml
//! turn_duration = 0.5
//! seats = 2
//! dedicated = true
//!
//! [hero]
//! max_health = 500
//! attack = 40
//! attack_range = 1.5
//! speed = 3.5
//! mana = 200
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{CoreError, CoreResult};
use crate::{MAX_ATTACK_RANGE, MIN_SEATS, TURN_DURATION_SECS, WAVE_SPAWN_CADENCE};

/// Base stats for one entity category.
///
/// A `[hero]` or `[wave]` table replaces the whole set, so every field but
/// `mana` must be present.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct EntityStats {
    /// Maximum health.
    pub max_health: i32,
    /// Damage per hit.
    pub attack: i32,
    /// Reach in world units.
    pub attack_range: f32,
    /// Units per second.
    pub speed: f32,
    /// Mana pool (heroes only).
    #[serde(default)]
    pub mana: i32,
}

impl EntityStats {
    /// Default hero stats.
    #[must_use]
    pub const fn hero() -> Self {
        Self {
            max_health: 500,
            attack: 40,
            attack_range: 1.5,
            speed: 3.5,
            mana: 200,
        }
    }

    /// Default creep wave stats.
    #[must_use]
    pub const fn wave() -> Self {
        Self {
            max_health: 100,
            attack: 10,
            attack_range: 1.0,
            speed: 2.0,
            mana: 0,
        }
    }
}

/// Tower stats per tier.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TowerStats {
    /// Tier 1 health.
    pub tier1_health: i32,
    /// Tier 1 damage.
    pub tier1_attack: i32,
    /// Tier 2 health.
    pub tier2_health: i32,
    /// Tier 2 damage.
    pub tier2_attack: i32,
    /// Reach for both tiers.
    pub attack_range: f32,
}

impl Default for TowerStats {
    fn default() -> Self {
        Self {
            tier1_health: 100,
            tier1_attack: 10,
            tier2_health: 200,
            tier2_attack: 20,
            attack_range: 2.0,
        }
    }
}

/// Match tunables.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Simulated seconds per turn, also the turn timer period.
    pub turn_duration: f32,
    /// Turns between creep wave spawns.
    pub wave_spawn_cadence: u32,
    /// Seconds the engine stays resolving after a turn while clients play
    /// it back. Commands arriving in this window are queued.
    pub resolve_secs: f32,
    /// Combat detection window half-width.
    pub max_attack_range: f32,
    /// Number of seats.
    pub seats: usize,
    /// Seconds with nobody connected (or after the end) before teardown.
    pub game_expire_secs: f32,
    /// Seconds with a single seat connected before it wins by forfeit.
    pub win_expire_secs: f32,
    /// Forfeit and AI restrictions apply.
    pub dedicated: bool,
    /// Cards drawn when a deck is set.
    pub opening_hand: usize,
    /// Seed for trait rolls and shuffles.
    pub seed: u64,
    /// Hero stats.
    pub hero: EntityStats,
    /// Creep wave stats.
    pub wave: EntityStats,
    /// Tower stats.
    pub tower: TowerStats,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            turn_duration: TURN_DURATION_SECS,
            wave_spawn_cadence: WAVE_SPAWN_CADENCE,
            resolve_secs: 0.0,
            max_attack_range: MAX_ATTACK_RANGE,
            seats: MIN_SEATS,
            game_expire_secs: 30.0,
            win_expire_secs: 120.0,
            dedicated: true,
            opening_hand: 5,
            seed: 0x5eed,
            hero: EntityStats::hero(),
            wave: EntityStats::wave(),
            tower: TowerStats::default(),
        }
    }
}

impl MatchConfig {
    /// Parses and validates a config.
    ///
    /// # Errors
    ///
    /// `Config` on parse failure or a value out of range.
    pub fn from_toml_str(text: &str) -> CoreResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| CoreError::Config(format!("match config: {e}")))?;
        config.validated()
    }

    /// Loads `path`, or defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// `Config` if the file exists but is unreadable or invalid.
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            tracing::info!("No match config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Checks ranges; raises `seats` to the minimum.
    ///
    /// # Errors
    ///
    /// `Config` naming the first bad field.
    pub fn validated(mut self) -> CoreResult<Self> {
        self.seats = self.seats.max(MIN_SEATS);
        if self.seats > usize::from(u8::MAX) {
            return Err(CoreError::Config(format!("seats too large: {}", self.seats)));
        }
        for (name, value) in [
            ("turn_duration", self.turn_duration),
            ("resolve_secs", self.resolve_secs),
            ("max_attack_range", self.max_attack_range),
            ("game_expire_secs", self.game_expire_secs),
            ("win_expire_secs", self.win_expire_secs),
            ("hero.attack_range", self.hero.attack_range),
            ("hero.speed", self.hero.speed),
            ("wave.attack_range", self.wave.attack_range),
            ("wave.speed", self.wave.speed),
            ("tower.attack_range", self.tower.attack_range),
        ] {
            if !value.is_finite() {
                return Err(CoreError::Config(format!("{name} must be finite, got {value}")));
            }
        }
        if self.turn_duration <= 0.0 {
            return Err(CoreError::Config("turn_duration must be positive".into()));
        }
        if self.resolve_secs < 0.0 {
            return Err(CoreError::Config("resolve_secs must not be negative".into()));
        }
        if self.wave_spawn_cadence == 0 {
            return Err(CoreError::Config("wave_spawn_cadence must be positive".into()));
        }
        if self.max_attack_range <= 0.0 {
            return Err(CoreError::Config("max_attack_range must be positive".into()));
        }
        let widest = self
            .hero
            .attack_range
            .max(self.wave.attack_range)
            .max(self.tower.attack_range);
        if widest > self.max_attack_range {
            return Err(CoreError::Config(format!(
                "attack range {widest} exceeds max_attack_range {}",
                self.max_attack_range
            )));
        }
        for (name, stats) in [("hero", &self.hero), ("wave", &self.wave)] {
            if stats.max_health <= 0 || stats.attack < 0 || stats.speed < 0.0 {
                return Err(CoreError::Config(format!("invalid {name} stats")));
            }
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override() {
        let config = MatchConfig::from_toml_str(
            r"
            turn_duration = 1.0
            seats = 1

            [hero]
            max_health = 450
            attack = 55
            attack_range = 1.5
            speed = 3.0
            ",
        )
        .unwrap();
        assert_eq!(config.turn_duration, 1.0);
        assert_eq!(config.seats, 2);
        assert_eq!(config.hero.attack, 55);
        assert_eq!(config.hero.mana, 0);
        assert_eq!(config.tower, TowerStats::default());
        assert_eq!(config.wave, EntityStats::wave());
    }

    #[test]
    fn test_incomplete_stats_table_rejected() {
        let result = MatchConfig::from_toml_str(
            r"
            [wave]
            attack = 5
            ",
        );
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn test_range_beyond_window_rejected() {
        let result = MatchConfig::from_toml_str(
            r"
            [tower]
            attack_range = 3.0
            ",
        );
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn test_non_finite_values_rejected() {
        for text in [
            "turn_duration = inf",
            "turn_duration = nan",
            "resolve_secs = inf",
            "win_expire_secs = nan",
            "[hero]\nmax_health = 10\nattack = 1\nattack_range = 1.0\nspeed = inf\nmana = 0",
        ] {
            let result = MatchConfig::from_toml_str(text);
            assert!(matches!(result, Err(CoreError::Config(_))), "{text} accepted");
        }
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = MatchConfig::load("/definitely/not/here.toml").unwrap();
        assert_eq!(config, MatchConfig::default());
    }

    #[test]
    fn test_shipped_config_is_default() {
        let config = MatchConfig::from_toml_str(include_str!("../../../data/match.toml")).unwrap();
        assert_eq!(config, MatchConfig::default());
    }
}
