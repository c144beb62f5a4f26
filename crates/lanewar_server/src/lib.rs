//! # LANEWAR Server
//!
//! Authoritative match runtime: turn engine, session orchestration and the
//! multi-match host.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                          MatchHost                             │
//! │        one tokio task per match, inputs over mpsc              │
//! ├────────────────────────────────────────────────────────────────┤
//! │                         MatchSession                           │
//! │  ┌──────────────┐   ┌──────────────┐   ┌────────────────────┐  │
//! │  │ client       │   │ FIFO command │   │ timers: turn,      │  │
//! │  │ registry     │   │ queue        │   │ idle, forfeit      │  │
//! │  └──────────────┘   └──────┬───────┘   └─────────┬──────────┘  │
//! │                            ▼                     ▼             │
//! │  ┌──────────────────────────────────────────────────────────┐  │
//! │  │ Simulation: execute_turn / apply_command -> DiffBatch    │  │
//! │  │   combat: sorted-x sweep, both directions                │  │
//! │  └──────────────────────────────────────────────────────────┘  │
//! │                            │                                   │
//! │                            ▼ Outbound { recipient, envelope }  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//!
//! All mutation of one match happens on its own task, inside a tick. The
//! engine's resolving flag is the only gate: commands arriving while it is
//! set wait in the queue.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod engine;
pub mod error;
pub mod host;
pub mod session;
pub mod tick;
pub mod traits;

pub use engine::{Command, CombatHit, Effect, Simulation};
pub use error::{ServerError, ServerResult};
pub use host::{HostConfig, MatchHost, MatchInput, MatchReport};
pub use session::{Admission, ClientId, ClientSlot, MatchSession, Outbound, Recipient, SessionStats};
pub use tick::{TickLoop, TickStats};
pub use traits::{ChannelRecorder, MatchRecord, MatchRecorder, NullRecorder, PathPlanner, StraightLine};

/// Default session ticks per second.
pub const DEFAULT_TICK_RATE: u32 = 20;

/// Outbound envelopes buffered per match before drops.
pub const OUTBOUND_QUEUE_DEPTH: usize = 10_000;

/// Inputs buffered per match task.
pub const INPUT_QUEUE_DEPTH: usize = 1024;
