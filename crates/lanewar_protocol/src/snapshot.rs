//! # Full-State Snapshot
//!
//! Resynchronization payload sent on join and after settings changes.
//!
//! ```text
//! turn u32 | state u8 | players[] | athletes[] | heroes[] | towers[] | waves[]
//! ```
//!
//! Every record but players carries an id; an empty id fails the decode.

use lanewar_core::{Athlete, Entity, EntityCategory, Lane, MatchState, Player, Team, Vec2, WorldState};

use crate::error::ProtocolResult;
use crate::messages::WireMessage;
use crate::serialization::{PacketReader, PacketWriter};

/// One seat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerRecord {
    /// Seat index.
    pub seat: u8,
    /// Display name.
    pub username: String,
    /// Connected or AI.
    pub connected: bool,
    /// Ready with cards.
    pub ready: bool,
}

impl PlayerRecord {
    fn from_player(player: &Player) -> Self {
        Self {
            seat: player.seat.0,
            username: player.username.clone(),
            connected: player.is_connected(),
            ready: player.is_ready(),
        }
    }
}

impl WireMessage for PlayerRecord {
    fn write(&self, w: &mut PacketWriter) -> ProtocolResult<()> {
        w.write_u8(self.seat);
        w.write_str("username", &self.username)?;
        w.write_bool(self.connected);
        w.write_bool(self.ready);
        Ok(())
    }

    fn read(r: &mut PacketReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            seat: r.read_u8()?,
            username: r.read_string("username")?,
            connected: r.read_bool()?,
            ready: r.read_bool()?,
        })
    }
}

/// One athlete.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AthleteRecord {
    /// Athlete id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Team.
    pub team: Team,
    /// Driven hero, if bound.
    pub hero_id: Option<String>,
}

impl AthleteRecord {
    fn from_athlete(athlete: &Athlete) -> Self {
        Self {
            id: athlete.id().to_string(),
            name: athlete.name().to_string(),
            team: athlete.team(),
            hero_id: athlete.hero_id().map(str::to_string),
        }
    }
}

impl WireMessage for AthleteRecord {
    fn write(&self, w: &mut PacketWriter) -> ProtocolResult<()> {
        w.write_str("athlete", &self.id)?;
        w.write_str("name", &self.name)?;
        w.write_u8(self.team as u8);
        w.write_str("hero_id", self.hero_id.as_deref().unwrap_or_default())
    }

    fn read(r: &mut PacketReader<'_>) -> ProtocolResult<Self> {
        let id = r.read_id("athlete")?;
        let name = r.read_string("name")?;
        let team = r.read_enum("team", Team::from_u8)?;
        let hero_id = Some(r.read_string("hero_id")?).filter(|h| !h.is_empty());
        Ok(Self {
            id,
            name,
            team,
            hero_id,
        })
    }
}

/// A hero or tower.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitRecord {
    /// Entity id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Team.
    pub team: Team,
    /// Position.
    pub position: Vec2,
    /// Current health.
    pub health: i32,
    /// Maximum health.
    pub max_health: i32,
}

impl UnitRecord {
    fn from_entity(entity: &Entity) -> Self {
        Self {
            id: entity.id().to_string(),
            name: entity.name().to_string(),
            team: entity.team(),
            position: entity.position(),
            health: entity.health(),
            max_health: entity.max_health(),
        }
    }
}

impl WireMessage for UnitRecord {
    fn write(&self, w: &mut PacketWriter) -> ProtocolResult<()> {
        w.write_str("unit", &self.id)?;
        w.write_str("name", &self.name)?;
        w.write_u8(self.team as u8);
        w.write_vec2(self.position);
        w.write_i32(self.health);
        w.write_i32(self.max_health);
        Ok(())
    }

    fn read(r: &mut PacketReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            id: r.read_id("unit")?,
            name: r.read_string("name")?,
            team: r.read_enum("team", Team::from_u8)?,
            position: r.read_vec2("position")?,
            health: r.read_i32()?,
            max_health: r.read_i32()?,
        })
    }
}

/// A creep wave.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveRecord {
    /// Entity id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Team.
    pub team: Team,
    /// Lane.
    pub lane: Lane,
    /// Damage per hit.
    pub attack: i32,
    /// Position.
    pub position: Vec2,
    /// Current health.
    pub health: i32,
    /// Maximum health.
    pub max_health: i32,
}

impl WaveRecord {
    fn from_entity(entity: &Entity) -> Self {
        Self {
            id: entity.id().to_string(),
            name: entity.name().to_string(),
            team: entity.team(),
            lane: entity.as_wave().map_or(Lane::None, |w| w.lane()),
            attack: entity.attack(),
            position: entity.position(),
            health: entity.health(),
            max_health: entity.max_health(),
        }
    }
}

impl WireMessage for WaveRecord {
    fn write(&self, w: &mut PacketWriter) -> ProtocolResult<()> {
        w.write_str("wave", &self.id)?;
        w.write_str("name", &self.name)?;
        w.write_u8(self.team as u8);
        w.write_u8(self.lane as u8);
        w.write_i32(self.attack);
        w.write_vec2(self.position);
        w.write_i32(self.health);
        w.write_i32(self.max_health);
        Ok(())
    }

    fn read(r: &mut PacketReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            id: r.read_id("wave")?,
            name: r.read_string("name")?,
            team: r.read_enum("team", Team::from_u8)?,
            lane: r.read_enum("lane", Lane::from_u8)?,
            attack: r.read_i32()?,
            position: r.read_vec2("position")?,
            health: r.read_i32()?,
            max_health: r.read_i32()?,
        })
    }
}

/// Complete listing of a match.
#[derive(Clone, Debug, PartialEq)]
pub struct GameSnapshot {
    /// Current turn.
    pub turn: u32,
    /// Lifecycle state.
    pub state: MatchState,
    /// Seats.
    pub players: Vec<PlayerRecord>,
    /// Athletes.
    pub athletes: Vec<AthleteRecord>,
    /// Heroes.
    pub heroes: Vec<UnitRecord>,
    /// Towers.
    pub towers: Vec<UnitRecord>,
    /// Creep waves.
    pub waves: Vec<WaveRecord>,
}

impl GameSnapshot {
    /// Captures `world` in id order.
    #[must_use]
    pub fn capture(world: &WorldState) -> Self {
        Self {
            turn: world.current_turn(),
            state: world.state(),
            players: world.players().iter().map(PlayerRecord::from_player).collect(),
            athletes: world.athletes().map(AthleteRecord::from_athlete).collect(),
            heroes: world
                .entities_of(EntityCategory::Hero)
                .map(UnitRecord::from_entity)
                .collect(),
            towers: world
                .entities_of(EntityCategory::Structure)
                .map(UnitRecord::from_entity)
                .collect(),
            waves: world
                .entities_of(EntityCategory::Wave)
                .map(WaveRecord::from_entity)
                .collect(),
        }
    }
}

impl WireMessage for GameSnapshot {
    fn write(&self, w: &mut PacketWriter) -> ProtocolResult<()> {
        w.write_u32(self.turn);
        w.write_u8(self.state as u8);
        w.write_array("players", &self.players, |w, p| p.write(w))?;
        w.write_array("athletes", &self.athletes, |w, a| a.write(w))?;
        w.write_array("heroes", &self.heroes, |w, h| h.write(w))?;
        w.write_array("towers", &self.towers, |w, t| t.write(w))?;
        w.write_array("waves", &self.waves, |w, v| v.write(w))
    }

    fn read(r: &mut PacketReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            turn: r.read_u32()?,
            state: r.read_enum("state", MatchState::from_u8)?,
            players: r.read_array(PlayerRecord::read)?,
            athletes: r.read_array(AthleteRecord::read)?,
            heroes: r.read_array(UnitRecord::read)?,
            towers: r.read_array(UnitRecord::read)?,
            waves: r.read_array(WaveRecord::read)?,
        })
    }
}
