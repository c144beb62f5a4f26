//! # LANEWAR Protocol
//!
//! Binary synchronization between the authoritative match and its clients.
//!
//! ## Channels
//!
//! ```text
//! CLIENT                                   SERVER
//!   |--- AssignTask / Resign / Chat ------->|
//!   |                                       | <- validated against seat
//!   |<-- UpdateMessage (diff batch) --------|   every turn
//!   |<-- RefreshAll (snapshot) -------------|   on join / settings
//! ```
//!
//! Diff batches are the steady-state channel. Snapshots resynchronize.
//! Every record has an explicit field-by-field layout, see
//! [`serialization`].

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod envelope;
pub mod error;
pub mod messages;
pub mod serialization;
pub mod snapshot;
pub mod tags;
pub mod update;

pub use envelope::Envelope;
pub use error::{ProtocolError, ProtocolResult};
pub use messages::{
    MsgAfterConnected, MsgAssignTask, MsgChat, MsgGameSettings, MsgPlayCard, MsgPlayer,
    MsgPlayerConnect, MsgPlayerSettings, MsgTaskCompleted, WireMessage,
};
pub use serialization::{PacketReader, PacketWriter};
pub use snapshot::{AthleteRecord, GameSnapshot, PlayerRecord, UnitRecord, WaveRecord};
pub use tags::GameAction;
pub use update::{DiffBatch, EntityMoved, EntitySpawned, HealthChanged, StateChanged};

/// Seat id meaning "nobody" on the wire.
pub const NO_PLAYER: i32 = -1;
