//! # Match Host
//!
//! Runs every match as its own tokio task.
//!
//! ```text
//!            MatchHost (registry: game_uid -> input sender)
//!              │ send(MatchInput)
//!   ┌──────────┼──────────────┐
//!   ▼          ▼              ▼
//! task m1    task m2   ...  task mN      each owns one MatchSession
//!   │ interval + TickLoop -> session.tick(dt)
//!   └─ exits on Shutdown, closed inputs or expiration
//! ```
//!
//! Matches share nothing mutable; the registry only holds channel ends.

use std::collections::HashMap;
use std::sync::Arc;

use lanewar_core::SeatId;
use lanewar_protocol::{Envelope, MsgPlayerConnect};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::{ServerError, ServerResult};
use crate::session::{ClientId, MatchSession, SessionStats};
use crate::tick::{TickLoop, TickStats};
use crate::{DEFAULT_TICK_RATE, INPUT_QUEUE_DEPTH};

/// Host configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HostConfig {
    /// Session ticks per second.
    pub tick_rate: u32,
    /// Concurrent match limit.
    pub max_matches: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            max_matches: 256,
        }
    }
}

/// Input delivered to a match task.
#[derive(Clone, Debug, PartialEq)]
pub enum MatchInput {
    /// A client joined.
    Connect {
        /// Client handle.
        client: ClientId,
        /// Connect message.
        msg: MsgPlayerConnect,
    },
    /// A client left.
    Disconnect {
        /// Client handle.
        client: ClientId,
    },
    /// Raw envelope from a client.
    Envelope {
        /// Sender.
        client: ClientId,
        /// Frame.
        envelope: Envelope,
    },
    /// Stop the match task.
    Shutdown,
}

/// Final state of a finished match task.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchReport {
    /// Match id.
    pub game_uid: String,
    /// Winner, if the match ended with one.
    pub winner: Option<SeatId>,
    /// Turn the match stopped at.
    pub final_turn: u32,
    /// Session counters.
    pub session: SessionStats,
    /// Tick timing.
    pub ticks: TickStats,
}

struct MatchEntry {
    inputs: mpsc::Sender<MatchInput>,
    task: JoinHandle<MatchReport>,
}

/// Spawns and addresses match tasks.
pub struct MatchHost {
    config: HostConfig,
    matches: Arc<Mutex<HashMap<String, MatchEntry>>>,
}

impl std::fmt::Debug for MatchHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchHost")
            .field("config", &self.config)
            .field("matches", &self.matches.lock().len())
            .finish()
    }
}

impl MatchHost {
    /// Creates an empty host.
    #[must_use]
    pub fn new(config: HostConfig) -> Self {
        Self {
            config,
            matches: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Configuration.
    #[must_use]
    pub const fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Registered matches, finished or not.
    #[must_use]
    pub fn match_count(&self) -> usize {
        self.matches.lock().len()
    }

    /// Ids of registered matches.
    #[must_use]
    pub fn match_ids(&self) -> Vec<String> {
        self.matches.lock().keys().cloned().collect()
    }

    /// Starts a task for `session`. Must be called inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// `HostFull` at the match limit, `DuplicateMatch` if the id is taken.
    pub fn spawn(&self, session: MatchSession) -> ServerResult<()> {
        let game_uid = session.game_uid().to_string();
        let mut matches = self.matches.lock();
        if matches.len() >= self.config.max_matches {
            return Err(ServerError::HostFull {
                limit: self.config.max_matches,
            });
        }
        if matches.contains_key(&game_uid) {
            return Err(ServerError::DuplicateMatch(game_uid));
        }

        let (inputs, receiver) = mpsc::channel(INPUT_QUEUE_DEPTH);
        let task = tokio::spawn(run_match(session, receiver, self.config.tick_rate));
        matches.insert(game_uid.clone(), MatchEntry { inputs, task });
        tracing::info!("Hosting match {} ({} active)", game_uid, matches.len());
        Ok(())
    }

    /// Delivers `input` to a match without waiting.
    ///
    /// # Errors
    ///
    /// `UnknownMatch`, or `ChannelClosed` if the task is gone or its input
    /// queue is full.
    pub fn send(&self, game_uid: &str, input: MatchInput) -> ServerResult<()> {
        let matches = self.matches.lock();
        let entry = matches
            .get(game_uid)
            .ok_or_else(|| ServerError::UnknownMatch(game_uid.to_string()))?;
        entry
            .inputs
            .try_send(input)
            .map_err(|_| ServerError::ChannelClosed("match input"))
    }

    /// Asks every match task to stop.
    pub fn shutdown_all(&self) {
        for (uid, entry) in self.matches.lock().iter() {
            if entry.inputs.try_send(MatchInput::Shutdown).is_err() {
                tracing::debug!("Match {} already stopped", uid);
            }
        }
    }

    /// Waits for a match task to finish and unregisters it.
    ///
    /// # Errors
    ///
    /// `UnknownMatch`, or `ChannelClosed` if the task panicked.
    pub async fn join(&self, game_uid: &str) -> ServerResult<MatchReport> {
        let entry = self
            .matches
            .lock()
            .remove(game_uid)
            .ok_or_else(|| ServerError::UnknownMatch(game_uid.to_string()))?;
        entry
            .task
            .await
            .map_err(|_| ServerError::ChannelClosed("match task"))
    }

    /// Unregisters finished tasks; returns how many were removed.
    pub fn reap(&self) -> usize {
        let mut matches = self.matches.lock();
        let before = matches.len();
        matches.retain(|_, entry| !entry.task.is_finished());
        before - matches.len()
    }
}

fn handle_input(session: &mut MatchSession, input: MatchInput) {
    let result = match input {
        MatchInput::Connect { client, msg } => session.connect(client, &msg).map(|_| ()),
        MatchInput::Disconnect { client } => session.disconnect(client),
        MatchInput::Envelope { client, envelope } => session.receive(client, &envelope).map(|_| ()),
        MatchInput::Shutdown => Ok(()),
    };
    if let Err(e) = result {
        tracing::debug!("Input dropped in {}: {}", session.game_uid(), e);
    }
}

async fn run_match(
    mut session: MatchSession,
    mut inputs: mpsc::Receiver<MatchInput>,
    tick_rate: u32,
) -> MatchReport {
    let mut tick_loop = TickLoop::new(tick_rate);
    let mut interval = tokio::time::interval(tick_loop.tick_duration());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                while tick_loop.should_tick() {
                    let start = tick_loop.begin_tick();
                    session.tick(tick_loop.dt());
                    tick_loop.end_tick(start);
                }
                if session.is_expired() {
                    tracing::info!("Match {} expired", session.game_uid());
                    break;
                }
            }
            input = inputs.recv() => match input {
                Some(MatchInput::Shutdown) | None => break,
                Some(input) => handle_input(&mut session, input),
            },
        }
    }

    let world = session.engine().world();
    MatchReport {
        game_uid: world.game_uid().to_string(),
        winner: world.winner(),
        final_turn: world.current_turn(),
        session: *session.stats(),
        ticks: *tick_loop.stats(),
    }
}
