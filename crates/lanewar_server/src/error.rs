//! # Server Error Types

use lanewar_core::{CoreError, MatchState, SeatId};
use lanewar_protocol::ProtocolError;
use thiserror::Error;

use crate::session::ClientId;

/// Failures of the engine, session and host.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServerError {
    /// Domain rule violated.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Payload could not be decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A command named a seat other than its sender's.
    #[error("Seat {seat} claimed to act as player {declared}")]
    Spoofed {
        /// Authenticated seat.
        seat: SeatId,
        /// Player id in the payload.
        declared: i32,
    },

    /// Command not valid in the current lifecycle state.
    #[error("{command} not allowed while {state:?}")]
    WrongState {
        /// Command name.
        command: &'static str,
        /// Current state.
        state: MatchState,
    },

    /// Command content is unusable.
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// No client with this id.
    #[error("Unknown client {0}")]
    UnknownClient(ClientId),

    /// Client holds no seat.
    #[error("Client {0} is not seated")]
    NotSeated(ClientId),

    /// No match with this uid.
    #[error("Unknown match {0}")]
    UnknownMatch(String),

    /// A match with this uid is already hosted.
    #[error("Match {0} already hosted")]
    DuplicateMatch(String),

    /// The host is at its match limit.
    #[error("Host full: {limit} matches")]
    HostFull {
        /// Configured limit.
        limit: usize,
    },

    /// Server configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(String),

    /// A match channel closed.
    #[error("Channel closed: {0}")]
    ChannelClosed(&'static str),
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
