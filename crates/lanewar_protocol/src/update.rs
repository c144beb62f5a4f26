//! # Diff Batch
//!
//! Everything one turn changed. The engine appends events while it runs
//! and the session sends the batch as `UpdateMessage` afterwards.
//!
//! ```text
//! moved[] | health[] | spawned[] | state[0..=1]
//! ```

use lanewar_core::{Entity, EntityCategory, Lane, MatchState, Team, Vec2};

use crate::error::{ProtocolError, ProtocolResult};
use crate::messages::WireMessage;
use crate::serialization::{PacketReader, PacketWriter};

/// Entity reached a new position.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityMoved {
    /// Entity id.
    pub id: String,
    /// Category.
    pub category: EntityCategory,
    /// New position.
    pub position: Vec2,
}

/// Entity health changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HealthChanged {
    /// Entity id.
    pub id: String,
    /// Category.
    pub category: EntityCategory,
    /// New health.
    pub health: i32,
}

/// Entity entered the world.
#[derive(Clone, Debug, PartialEq)]
pub struct EntitySpawned {
    /// Entity id.
    pub id: String,
    /// Category.
    pub category: EntityCategory,
    /// Display name.
    pub name: String,
    /// Team.
    pub team: Team,
    /// Spawn position.
    pub position: Vec2,
    /// Lane, `None` for non-waves.
    pub lane: Lane,
    /// Maximum health.
    pub max_health: i32,
    /// Damage per hit.
    pub attack: i32,
    /// Mana pool, 0 for non-heroes.
    pub mana: i32,
}

/// Lifecycle transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateChanged {
    /// Turn at the transition.
    pub turn: u32,
    /// New state.
    pub state: MatchState,
}

/// Events accumulated over one turn.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiffBatch {
    /// Moves.
    pub moved: Vec<EntityMoved>,
    /// Health changes.
    pub health: Vec<HealthChanged>,
    /// Spawns.
    pub spawned: Vec<EntitySpawned>,
    /// At most one lifecycle transition.
    pub state: Option<StateChanged>,
}

impl DiffBatch {
    /// Empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moved.is_empty() && self.health.is_empty() && self.spawned.is_empty() && self.state.is_none()
    }

    /// Total event count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.moved.len() + self.health.len() + self.spawned.len() + usize::from(self.state.is_some())
    }

    /// Records `entity`'s current position.
    pub fn record_moved(&mut self, entity: &Entity) {
        self.moved.push(EntityMoved {
            id: entity.id().to_string(),
            category: entity.category(),
            position: entity.position(),
        });
    }

    /// Records `entity`'s current health.
    pub fn record_health(&mut self, entity: &Entity) {
        self.health.push(HealthChanged {
            id: entity.id().to_string(),
            category: entity.category(),
            health: entity.health(),
        });
    }

    /// Records a spawn.
    pub fn record_spawned(&mut self, entity: &Entity) {
        self.spawned.push(EntitySpawned {
            id: entity.id().to_string(),
            category: entity.category(),
            name: entity.name().to_string(),
            team: entity.team(),
            position: entity.position(),
            lane: entity.as_wave().map_or(Lane::None, |w| w.lane()),
            max_health: entity.max_health(),
            attack: entity.attack(),
            mana: entity.as_hero().map_or(0, |h| h.mana),
        });
    }

    /// Records a lifecycle transition. A later call in the same turn
    /// replaces the earlier one.
    pub fn record_state(&mut self, turn: u32, state: MatchState) {
        self.state = Some(StateChanged { turn, state });
    }

    /// Moves the events out, leaving the batch empty.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }
}

impl WireMessage for DiffBatch {
    fn write(&self, w: &mut PacketWriter) -> ProtocolResult<()> {
        w.write_array("moved", &self.moved, |w, m| {
            w.write_str("moved", &m.id)?;
            w.write_u8(m.category as u8);
            w.write_vec2(m.position);
            Ok(())
        })?;
        w.write_array("health", &self.health, |w, h| {
            w.write_str("health", &h.id)?;
            w.write_u8(h.category as u8);
            w.write_i32(h.health);
            Ok(())
        })?;
        w.write_array("spawned", &self.spawned, |w, s| {
            w.write_str("spawned", &s.id)?;
            w.write_u8(s.category as u8);
            w.write_str("name", &s.name)?;
            w.write_u8(s.team as u8);
            w.write_vec2(s.position);
            w.write_u8(s.lane as u8);
            w.write_i32(s.max_health);
            w.write_i32(s.attack);
            w.write_i32(s.mana);
            Ok(())
        })?;
        let state: Vec<StateChanged> = self.state.into_iter().collect();
        w.write_array("state", &state, |w, s| {
            w.write_u32(s.turn);
            w.write_u8(s.state as u8);
            Ok(())
        })
    }

    fn read(r: &mut PacketReader<'_>) -> ProtocolResult<Self> {
        let moved = r.read_array(|r| {
            Ok(EntityMoved {
                id: r.read_id("moved")?,
                category: r.read_enum("category", EntityCategory::from_u8)?,
                position: r.read_vec2("position")?,
            })
        })?;
        let health = r.read_array(|r| {
            Ok(HealthChanged {
                id: r.read_id("health")?,
                category: r.read_enum("category", EntityCategory::from_u8)?,
                health: r.read_i32()?,
            })
        })?;
        let spawned = r.read_array(|r| {
            Ok(EntitySpawned {
                id: r.read_id("spawned")?,
                category: r.read_enum("category", EntityCategory::from_u8)?,
                name: r.read_string("name")?,
                team: r.read_enum("team", Team::from_u8)?,
                position: r.read_vec2("position")?,
                lane: r.read_enum("lane", Lane::from_u8)?,
                max_health: r.read_i32()?,
                attack: r.read_i32()?,
                mana: r.read_i32()?,
            })
        })?;
        let mut states = r.read_array(|r| {
            Ok(StateChanged {
                turn: r.read_u32()?,
                state: r.read_enum("state", MatchState::from_u8)?,
            })
        })?;
        if states.len() > 1 {
            return Err(ProtocolError::TooLong {
                field: "state",
                len: states.len(),
            });
        }
        Ok(Self {
            moved,
            health,
            spawned,
            state: states.pop(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanewar_core::{LaneRoutes, MatchConfig, WorldState};

    fn sample() -> DiffBatch {
        let world = WorldState::new("diff", MatchConfig::default(), &LaneRoutes::builtin()).unwrap();
        let mut batch = DiffBatch::new();
        let hero = world.entity("hero1").unwrap();
        let wave = world.entity("TopLaneCreepWave_B0").unwrap();
        batch.record_moved(hero);
        batch.record_health(wave);
        batch.record_spawned(wave);
        batch.record_spawned(hero);
        batch.record_state(1, MatchState::Play);
        batch
    }

    #[test]
    fn test_spawn_record_fields() {
        let batch = sample();
        let wave = &batch.spawned[0];
        assert_eq!(wave.lane, Lane::Top);
        assert_eq!(wave.team, Team::TeamB);
        assert_eq!(wave.mana, 0);
        assert_eq!(batch.spawned[1].mana, 200);
        assert_eq!(batch.len(), 5);
    }

    #[test]
    fn test_decode_matches_batch() {
        let batch = sample();
        let bytes = batch.to_bytes().unwrap();
        assert_eq!(DiffBatch::from_bytes(&bytes).unwrap(), batch);
    }

    #[test]
    fn test_empty_batch_is_four_counts() {
        let bytes = DiffBatch::new().to_bytes().unwrap();
        assert_eq!(bytes, vec![0; 8]);
    }

    #[test]
    fn test_two_state_records_rejected() {
        let mut bytes = DiffBatch::new().to_bytes().unwrap();
        bytes.truncate(6);
        bytes.extend_from_slice(&[2, 0, 1, 0, 0, 0, 20, 2, 0, 0, 0, 99]);
        assert!(matches!(
            DiffBatch::from_bytes(&bytes),
            Err(ProtocolError::TooLong { field: "state", len: 2 })
        ));
    }

    #[test]
    fn test_take_empties() {
        let mut batch = sample();
        let taken = batch.take();
        assert!(batch.is_empty());
        assert!(!taken.is_empty());
    }
}
