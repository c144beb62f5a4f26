//! # Core Error Types
//!
//! Domain invariant violations and not-found conditions.

use thiserror::Error;

use crate::entity::{EntityCategory, Lane, Team};

/// Core domain errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Damage amounts must be non-negative.
    #[error("Negative damage rejected: {amount}")]
    NegativeDamage {
        /// Rejected amount.
        amount: i32,
    },

    /// Entity is already destroyed.
    #[error("Entity already destroyed: {id}")]
    AlreadyDestroyed {
        /// Entity id.
        id: String,
    },

    /// An id was inserted twice.
    #[error("Duplicate entity: {id}")]
    DuplicateEntity {
        /// Offending id.
        id: String,
    },

    /// Athlete already belongs to a team.
    #[error("Athlete {id} already assigned to {team:?}")]
    AlreadyAssigned {
        /// Athlete id.
        id: String,
        /// Current team.
        team: Team,
    },

    /// Operation requires a real team.
    #[error("Unassigned team for {id}")]
    UnassignedTeam {
        /// Athlete or entity id.
        id: String,
    },

    /// Attribute outside its allowed domain.
    #[error("Invalid attribute {field}: {value}")]
    InvalidAttribute {
        /// Field name.
        field: &'static str,
        /// Rejected value.
        value: f32,
    },

    /// No route exists for this team and lane.
    #[error("Empty route for {team:?} {lane:?}")]
    EmptyRoute {
        /// Team.
        team: Team,
        /// Lane.
        lane: Lane,
    },

    /// Route index out of bounds.
    #[error("Route index {index} out of bounds (len {len})")]
    RouteIndexOutOfBounds {
        /// Requested index.
        index: usize,
        /// Route length.
        len: usize,
    },

    /// Operation needs a different entity category.
    #[error("Entity {id} is not a {expected:?}")]
    WrongCategory {
        /// Entity id.
        id: String,
        /// Category the operation needs.
        expected: EntityCategory,
    },

    /// Entity lookup failed.
    #[error("Entity not found: {id}")]
    EntityNotFound {
        /// Requested id.
        id: String,
    },

    /// Athlete lookup failed.
    #[error("Athlete not found: {id}")]
    AthleteNotFound {
        /// Requested id.
        id: String,
    },

    /// Seat lookup failed.
    #[error("Player not found: {seat}")]
    PlayerNotFound {
        /// Requested seat.
        seat: i32,
    },

    /// Card is not where the operation needs it.
    #[error("Card {uid} not in hand")]
    CardNotInHand {
        /// Card uid.
        uid: String,
    },

    /// Catalog lookup failed.
    #[error("Unknown {kind}: {id}")]
    UnknownDefinition {
        /// Kind of definition (task, card, deck).
        kind: &'static str,
        /// Requested id.
        id: String,
    },

    /// Configuration could not be parsed or failed validation.
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
