//! # Message Records
//!
//! Typed payloads carried inside envelopes. Every record encodes its
//! fields in declaration order.

use lanewar_core::{TaskType, Vec2};

use crate::error::ProtocolResult;
use crate::serialization::{PacketReader, PacketWriter};
use crate::snapshot::GameSnapshot;

/// A payload with an explicit binary layout.
pub trait WireMessage: Sized {
    /// Appends this record to `w`.
    ///
    /// # Errors
    ///
    /// `TooLong` for an oversized string or array.
    fn write(&self, w: &mut PacketWriter) -> ProtocolResult<()>;

    /// Reads one record from `r`.
    ///
    /// # Errors
    ///
    /// Any decode failure.
    fn read(r: &mut PacketReader<'_>) -> ProtocolResult<Self>;

    /// Encodes into a fresh buffer.
    ///
    /// # Errors
    ///
    /// As [`WireMessage::write`].
    fn to_bytes(&self) -> ProtocolResult<Vec<u8>> {
        let mut w = PacketWriter::new();
        self.write(&mut w)?;
        Ok(w.into_bytes())
    }

    /// Decodes a whole buffer, rejecting trailing bytes.
    ///
    /// # Errors
    ///
    /// Any decode failure, or `TrailingBytes`.
    fn from_bytes(bytes: &[u8]) -> ProtocolResult<Self> {
        let mut r = PacketReader::new(bytes);
        let message = Self::read(&mut r)?;
        r.finish()?;
        Ok(message)
    }
}

// ============================================================================
// CONNECTION
// ============================================================================

/// First message from a client.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MsgPlayerConnect {
    /// Stable identity from the auth collaborator.
    pub user_id: String,
    /// Display name.
    pub username: String,
    /// Match to join.
    pub game_uid: String,
    /// Seats the client expects.
    pub nb_players: u8,
    /// Spectate instead of taking a seat.
    pub observer: bool,
}

impl WireMessage for MsgPlayerConnect {
    fn write(&self, w: &mut PacketWriter) -> ProtocolResult<()> {
        w.write_str("user_id", &self.user_id)?;
        w.write_str("username", &self.username)?;
        w.write_str("game_uid", &self.game_uid)?;
        w.write_u8(self.nb_players);
        w.write_bool(self.observer);
        Ok(())
    }

    fn read(r: &mut PacketReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            user_id: r.read_string("user_id")?,
            username: r.read_string("username")?,
            game_uid: r.read_string("game_uid")?,
            nb_players: r.read_u8()?,
            observer: r.read_bool()?,
        })
    }
}

/// Reply to a connect: the seat and a full snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct MsgAfterConnected {
    /// Accepted.
    pub success: bool,
    /// Seat, or -1 for an observer.
    pub player_id: i32,
    /// Current state.
    pub game_data: GameSnapshot,
}

impl WireMessage for MsgAfterConnected {
    fn write(&self, w: &mut PacketWriter) -> ProtocolResult<()> {
        w.write_bool(self.success);
        w.write_i32(self.player_id);
        self.game_data.write(w)
    }

    fn read(r: &mut PacketReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            success: r.read_bool()?,
            player_id: r.read_i32()?,
            game_data: GameSnapshot::read(r)?,
        })
    }
}

// ============================================================================
// COMMANDS
// ============================================================================

/// Seat reference; used by resign, player-ready and game-end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MsgPlayer {
    /// Seat, or -1 for none.
    pub player_id: i32,
}

impl WireMessage for MsgPlayer {
    fn write(&self, w: &mut PacketWriter) -> ProtocolResult<()> {
        w.write_i32(self.player_id);
        Ok(())
    }

    fn read(r: &mut PacketReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            player_id: r.read_i32()?,
        })
    }
}

/// Card play on a set of athletes. Carried by `AssignTask` and echoed as
/// `CardPlayed`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MsgPlayCard {
    /// Declared seat; must match the sender.
    pub player_id: i32,
    /// Card instance.
    pub card_uid: String,
    /// Targeted athletes.
    pub athlete_ids: Vec<String>,
    /// Where the mission points.
    pub target_position: Vec2,
}

impl WireMessage for MsgPlayCard {
    fn write(&self, w: &mut PacketWriter) -> ProtocolResult<()> {
        w.write_i32(self.player_id);
        w.write_str("card_uid", &self.card_uid)?;
        w.write_array("athlete_ids", &self.athlete_ids, |w, id| {
            w.write_str("athlete_id", id)
        })?;
        w.write_vec2(self.target_position);
        Ok(())
    }

    fn read(r: &mut PacketReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            player_id: r.read_i32()?,
            card_uid: r.read_string("card_uid")?,
            athlete_ids: r.read_array(|r| r.read_string("athlete_id"))?,
            target_position: r.read_vec2("target_position")?,
        })
    }
}

/// One athlete received a mission.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MsgAssignTask {
    /// Athlete.
    pub athlete_id: String,
    /// Task definition id.
    pub task_id: String,
    /// Task category.
    pub task_type: TaskType,
    /// Mission target.
    pub target_position: Vec2,
}

impl WireMessage for MsgAssignTask {
    fn write(&self, w: &mut PacketWriter) -> ProtocolResult<()> {
        w.write_str("athlete_id", &self.athlete_id)?;
        w.write_str("task_id", &self.task_id)?;
        w.write_u8(self.task_type as u8);
        w.write_vec2(self.target_position);
        Ok(())
    }

    fn read(r: &mut PacketReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            athlete_id: r.read_string("athlete_id")?,
            task_id: r.read_string("task_id")?,
            task_type: r.read_enum("task_type", TaskType::from_u8)?,
            target_position: r.read_vec2("target_position")?,
        })
    }
}

/// Athlete reports its task done.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MsgTaskCompleted {
    /// Athlete.
    pub athlete_id: String,
    /// Task definition id.
    pub task_id: String,
    /// Succeeded.
    pub success: bool,
    /// Free-form outcome.
    pub result: String,
}

impl WireMessage for MsgTaskCompleted {
    fn write(&self, w: &mut PacketWriter) -> ProtocolResult<()> {
        w.write_str("athlete_id", &self.athlete_id)?;
        w.write_str("task_id", &self.task_id)?;
        w.write_bool(self.success);
        w.write_str("result", &self.result)
    }

    fn read(r: &mut PacketReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            athlete_id: r.read_string("athlete_id")?,
            task_id: r.read_string("task_id")?,
            success: r.read_bool()?,
            result: r.read_string("result")?,
        })
    }
}

/// Chat line, also used for server text with seat -1.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MsgChat {
    /// Speaker seat.
    pub player_id: i32,
    /// Text.
    pub msg: String,
}

impl WireMessage for MsgChat {
    fn write(&self, w: &mut PacketWriter) -> ProtocolResult<()> {
        w.write_i32(self.player_id);
        w.write_str("msg", &self.msg)
    }

    fn read(r: &mut PacketReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            player_id: r.read_i32()?,
            msg: r.read_string("msg")?,
        })
    }
}

/// Seat settings. For `PlayerSettingsAI` this describes the AI seat.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MsgPlayerSettings {
    /// Display name.
    pub username: String,
    /// Avatar key.
    pub avatar: String,
    /// Deck id from the catalog.
    pub deck: String,
    /// AI difficulty.
    pub ai_level: u8,
}

impl WireMessage for MsgPlayerSettings {
    fn write(&self, w: &mut PacketWriter) -> ProtocolResult<()> {
        w.write_str("username", &self.username)?;
        w.write_str("avatar", &self.avatar)?;
        w.write_str("deck", &self.deck)?;
        w.write_u8(self.ai_level);
        Ok(())
    }

    fn read(r: &mut PacketReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            username: r.read_string("username")?,
            avatar: r.read_string("avatar")?,
            deck: r.read_string("deck")?,
            ai_level: r.read_u8()?,
        })
    }
}

/// Match tunables a client may set before the start.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MsgGameSettings {
    /// Seconds per turn.
    pub turn_duration: f32,
    /// Turns between wave spawns.
    pub wave_spawn_cadence: u32,
}

impl WireMessage for MsgGameSettings {
    fn write(&self, w: &mut PacketWriter) -> ProtocolResult<()> {
        w.write_f32(self.turn_duration);
        w.write_u32(self.wave_spawn_cadence);
        Ok(())
    }

    fn read(r: &mut PacketReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            turn_duration: r.read_finite_f32("turn_duration")?,
            wave_spawn_cadence: r.read_u32()?,
        })
    }
}
