//! # Action Tags
//!
//! The `u16` that opens every envelope. Client commands sit below 2000,
//! server refreshes at 2000 and above.

/// Envelope tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum GameAction {
    // ========================================================================
    // CLIENT -> SERVER
    // ========================================================================
    /// Athlete reports a task finished.
    TaskCompleted = 8,
    /// UI selection of a task.
    SelectTask = 1030,
    /// UI selection of an athlete.
    SelectAthlete = 1032,
    /// UI selection cleared.
    CancelSelect = 1039,
    /// Play a card on athletes.
    AssignTask = 1040,
    /// Concede.
    Resign = 1050,
    /// Chat line.
    ChatMessage = 1090,
    /// Seat settings: name, avatar, deck.
    PlayerSettings = 1100,
    /// Turn the opponent seat into an AI.
    PlayerSettingsAI = 1102,
    /// Match tunables.
    GameSettings = 1105,

    // ========================================================================
    // SERVER -> CLIENT
    // ========================================================================
    /// Reply to a connect.
    Connected = 2000,
    /// A seat became ready.
    PlayerReady = 2001,
    /// Match moved to `Play`.
    GameStart = 2010,
    /// Match ended.
    GameEnd = 2012,
    /// Single entity moved.
    EntityMoved = 2020,
    /// Single entity took damage.
    EntityAttacked = 2030,
    /// A card was played.
    CardPlayed = 2040,
    /// An athlete received a mission.
    TaskAssigned = 2050,
    /// Full-state snapshot.
    RefreshAll = 2100,
    /// Per-turn diff batch.
    UpdateMessage = 2150,
    /// Free-form server text.
    ServerMessage = 2190,
}

impl GameAction {
    /// Every tag.
    pub const ALL: [Self; 21] = [
        Self::TaskCompleted,
        Self::SelectTask,
        Self::SelectAthlete,
        Self::CancelSelect,
        Self::AssignTask,
        Self::Resign,
        Self::ChatMessage,
        Self::PlayerSettings,
        Self::PlayerSettingsAI,
        Self::GameSettings,
        Self::Connected,
        Self::PlayerReady,
        Self::GameStart,
        Self::GameEnd,
        Self::EntityMoved,
        Self::EntityAttacked,
        Self::CardPlayed,
        Self::TaskAssigned,
        Self::RefreshAll,
        Self::UpdateMessage,
        Self::ServerMessage,
    ];

    /// Raw tag value.
    #[inline]
    #[must_use]
    pub const fn tag(self) -> u16 {
        self as u16
    }

    /// Looks up a tag. Unknown values are `None`.
    #[must_use]
    pub fn from_tag(tag: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.tag() == tag)
    }

    /// Sent by clients.
    #[inline]
    #[must_use]
    pub const fn is_command(self) -> bool {
        (self as u16) < 2000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_lookup() {
        assert_eq!(GameAction::from_tag(1040), Some(GameAction::AssignTask));
        assert_eq!(GameAction::from_tag(2150), Some(GameAction::UpdateMessage));
        assert_eq!(GameAction::from_tag(4242), None);
    }

    #[test]
    fn test_tags_unique_and_partitioned() {
        let mut tags: Vec<u16> = GameAction::ALL.iter().map(|a| a.tag()).collect();
        tags.sort_unstable();
        tags.dedup();
        assert_eq!(tags.len(), GameAction::ALL.len());
        assert!(GameAction::Resign.is_command());
        assert!(!GameAction::RefreshAll.is_command());
    }
}
