//! # LANEWAR Core
//!
//! Canonical state for one team-vs-team match.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         WorldState                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │  players[seat]         athletes{id}       entities{id}       │
//! │  ┌─────────────┐       ┌────────────┐     ┌───────────────┐  │
//! │  │ deck/hand/  │ owns  │ role, lane │ 1:1 │ Hero | Wave | │  │
//! │  │ discard     │──────▶│ traits     │────▶│ Structure     │  │
//! │  └─────────────┘       └────────────┘     └───────────────┘  │
//! │                                                              │
//! │  team_a / team_b: id views kept in sync with `entities`      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Entities are created only through [`WorldState`] factory methods, so id
//! uniqueness and team index consistency hold at one place.
//!
//! ## Static tables
//!
//! [`LaneRoutes`] and [`Catalog`] are loaded once before a match and shared
//! read-only. Nothing in this crate is process-global.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod athlete;
pub mod card;
pub mod catalog;
pub mod config;
pub mod entity;
pub mod error;
pub mod hero;
pub mod mission;
pub mod player;
pub mod routes;
pub mod vector;
pub mod wave;
pub mod world;

pub use athlete::{Athlete, AthleteTraits, Role};
pub use card::{Card, CardKind, StatBoost};
pub use catalog::{CardDefinition, Catalog, DeckDefinition};
pub use config::{EntityStats, MatchConfig, TowerStats};
pub use entity::{Entity, EntityCategory, EntityKind, HealthChange, Lane, Team, TowerTier};
pub use error::{CoreError, CoreResult};
pub use hero::{HeroAttributes, HeroState, HeroType};
pub use mission::{Mission, MissionData, TaskType};
pub use player::{HistoryEntry, Player, SeatId, Zone};
pub use routes::LaneRoutes;
pub use vector::Vec2;
pub use wave::WaveState;
pub use world::{MatchState, WorldState};

/// Default seconds of simulated time per turn.
pub const TURN_DURATION_SECS: f32 = 0.5;

/// Default number of turns between creep wave spawns.
pub const WAVE_SPAWN_CADENCE: u32 = 4;

/// Widest attack range any entity may have.
///
/// Bounds the x-window and z-filter of combat detection.
pub const MAX_ATTACK_RANGE: f32 = 2.0;

/// Minimum number of seats in a match.
pub const MIN_SEATS: usize = 2;
