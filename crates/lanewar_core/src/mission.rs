//! Missions: task descriptors assigned to athletes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::vector::Vec2;

/// Task category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TaskType {
    /// Stand down.
    #[default]
    Idle = 0,
    /// Move to a point and gather there.
    Gather = 1,
    /// Place vision.
    Ward = 2,
    /// Ambush an enemy hero.
    Gank = 3,
    /// Group up for a fight.
    TeamFight = 4,
    /// Hold a position.
    Defend = 5,
    /// Push a lane.
    Push = 6,
    /// Farm creeps.
    Farm = 7,
    /// Farm the jungle.
    Jungling = 8,
}

impl TaskType {
    /// Converts from the wire discriminant.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Idle),
            1 => Some(Self::Gather),
            2 => Some(Self::Ward),
            3 => Some(Self::Gank),
            4 => Some(Self::TeamFight),
            5 => Some(Self::Defend),
            6 => Some(Self::Push),
            7 => Some(Self::Farm),
            8 => Some(Self::Jungling),
            _ => None,
        }
    }

    /// Every task except `Idle` sends the hero to the target.
    #[must_use]
    pub const fn moves_hero(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// Static task definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionData {
    /// Catalog key.
    pub task_id: String,
    /// Display name.
    pub task_name: String,
    /// Flavor text.
    #[serde(default)]
    pub description: String,
    /// Category.
    pub task_type: TaskType,
    /// Effect duration in turns, 0 for none.
    #[serde(default)]
    pub duration: u32,
}

/// A task handed to a set of athletes.
#[derive(Clone, Debug, PartialEq)]
pub struct Mission {
    /// Definition.
    pub data: MissionData,
    /// Assigned athlete ids.
    pub athletes: BTreeSet<String>,
    /// Turn of assignment.
    pub assigned_turn: u32,
    /// Destination.
    pub target_position: Vec2,
    /// Optional target entity id.
    pub target_entity: Option<String>,
}

impl Mission {
    /// Creates a mission aimed at a position.
    #[must_use]
    pub fn new(
        data: MissionData,
        athletes: impl IntoIterator<Item = String>,
        assigned_turn: u32,
        target_position: Vec2,
    ) -> Self {
        Self {
            data,
            athletes: athletes.into_iter().collect(),
            assigned_turn,
            target_position,
            target_entity: None,
        }
    }

    /// Task category.
    #[must_use]
    pub fn task_type(&self) -> TaskType {
        self.data.task_type
    }

    /// True if the duration has run out by `turn`.
    #[must_use]
    pub fn is_expired(&self, turn: u32) -> bool {
        self.data.duration > 0 && turn >= self.assigned_turn + self.data.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry() {
        let data = MissionData {
            task_id: "push_top".into(),
            task_name: "Push Top".into(),
            description: String::new(),
            task_type: TaskType::Push,
            duration: 3,
        };
        let m = Mission::new(data, ["athlete1".to_string()], 4, Vec2::ZERO);
        assert!(!m.is_expired(6));
        assert!(m.is_expired(7));
        assert!(m.task_type().moves_hero());
        assert!(!TaskType::Idle.moves_hero());
    }
}
