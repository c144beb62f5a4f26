//! Card instances.

use serde::{Deserialize, Serialize};

use crate::mission::MissionData;
use crate::player::SeatId;

/// Stat increases granted by a boost card.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBoost {
    /// Added to attack.
    #[serde(default)]
    pub attack_increase: i32,
    /// Added to armor.
    #[serde(default)]
    pub defense_increase: i32,
    /// Added to move speed, in tenths of a unit per second.
    #[serde(default)]
    pub speed_increase: i32,
}

/// What a card does when played.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CardKind {
    /// Hands a mission to the targeted athletes.
    TaskAssignment {
        /// Mission definition.
        task: MissionData,
    },
    /// Raises the targeted athletes' hero stats.
    StatBoost {
        /// Increases.
        boost: StatBoost,
    },
}

/// A card owned by one player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Card {
    /// Definition id.
    pub card_id: String,
    /// Instance id, unique within the match.
    pub uid: String,
    /// Owner.
    pub owner: SeatId,
    /// Display name.
    pub name: String,
    /// Flavor text.
    pub description: String,
    /// Play cost.
    pub cost: u32,
    /// Effect.
    pub kind: CardKind,
}
