//! Client commands decoded from envelopes.

use lanewar_protocol::{
    Envelope, GameAction, MsgChat, MsgGameSettings, MsgPlayCard, MsgPlayer, MsgPlayerSettings,
    MsgTaskCompleted, ProtocolResult,
};

/// A decoded client command.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// `AssignTask`: play a card on athletes.
    PlayCard(MsgPlayCard),
    /// `TaskCompleted`.
    TaskCompleted(MsgTaskCompleted),
    /// `Resign`.
    Resign(MsgPlayer),
    /// `ChatMessage`.
    Chat(MsgChat),
    /// `PlayerSettings`.
    PlayerSettings(MsgPlayerSettings),
    /// `PlayerSettingsAI`: the opponent seat becomes an AI.
    PlayerSettingsAi(MsgPlayerSettings),
    /// `GameSettings`.
    GameSettings(MsgGameSettings),
}

impl Command {
    /// Decodes a client envelope.
    ///
    /// Unknown tags, server tags and UI selection tags have no handler and
    /// yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Any payload decode failure for a handled tag.
    pub fn decode(envelope: &Envelope) -> ProtocolResult<Option<Self>> {
        let Some(action) = envelope.action() else {
            return Ok(None);
        };
        let command = match action {
            GameAction::AssignTask => Self::PlayCard(envelope.read()?),
            GameAction::TaskCompleted => Self::TaskCompleted(envelope.read()?),
            GameAction::Resign => Self::Resign(envelope.read()?),
            GameAction::ChatMessage => Self::Chat(envelope.read()?),
            GameAction::PlayerSettings => Self::PlayerSettings(envelope.read()?),
            GameAction::PlayerSettingsAI => Self::PlayerSettingsAi(envelope.read()?),
            GameAction::GameSettings => Self::GameSettings(envelope.read()?),
            _ => return Ok(None),
        };
        Ok(Some(command))
    }

    /// Tag this command arrived under.
    #[must_use]
    pub const fn action(&self) -> GameAction {
        match self {
            Self::PlayCard(_) => GameAction::AssignTask,
            Self::TaskCompleted(_) => GameAction::TaskCompleted,
            Self::Resign(_) => GameAction::Resign,
            Self::Chat(_) => GameAction::ChatMessage,
            Self::PlayerSettings(_) => GameAction::PlayerSettings,
            Self::PlayerSettingsAi(_) => GameAction::PlayerSettingsAI,
            Self::GameSettings(_) => GameAction::GameSettings,
        }
    }

    /// Short name for logs and errors.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PlayCard(_) => "play_card",
            Self::TaskCompleted(_) => "task_completed",
            Self::Resign(_) => "resign",
            Self::Chat(_) => "chat",
            Self::PlayerSettings(_) => "player_settings",
            Self::PlayerSettingsAi(_) => "player_settings_ai",
            Self::GameSettings(_) => "game_settings",
        }
    }

    /// Seat the payload claims to act for, when it names one.
    #[must_use]
    pub const fn declared_player(&self) -> Option<i32> {
        match self {
            Self::PlayCard(msg) => Some(msg.player_id),
            Self::Resign(msg) => Some(msg.player_id),
            Self::Chat(msg) => Some(msg.player_id),
            Self::TaskCompleted(_)
            | Self::PlayerSettings(_)
            | Self::PlayerSettingsAi(_)
            | Self::GameSettings(_) => None,
        }
    }
}
