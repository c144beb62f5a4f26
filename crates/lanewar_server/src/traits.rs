//! # Collaborator Traits
//!
//! Seams between the match runtime and the services around it.
//!
//! ```text
//! Runtime calls:          Collaborator implements:
//! ┌────────────────┐      ┌────────────────────┐
//! │ MatchRecorder  │ ←─── │ persistence / API  │
//! │ PathPlanner    │ ←─── │ navigation         │
//! └────────────────┘      └────────────────────┘
//! ```
//!
//! Recorders are fire-and-forget: a call must return without waiting on I/O.

use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use lanewar_core::{SeatId, Vec2};

/// Queue depth between a [`ChannelRecorder`] and its worker.
pub const RECORDER_QUEUE_DEPTH: usize = 1024;

// ============================================================================
// PERSISTENCE - Match Recorder
// ============================================================================

/// Notification sent to the persistence collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchRecord {
    /// Match entered `Play`.
    Created {
        /// Match id.
        game_uid: String,
    },
    /// Match ended.
    Ended {
        /// Match id.
        game_uid: String,
        /// Winning seat, if any.
        winner: Option<SeatId>,
    },
}

/// Receives match lifecycle notifications.
///
/// Implementations must not block.
pub trait MatchRecorder: Send {
    /// The match started.
    fn match_created(&self, game_uid: &str);

    /// The match ended.
    fn match_ended(&self, game_uid: &str, winner: Option<SeatId>);
}

/// Forwards records over a bounded channel.
///
/// A full queue drops the record with a warning instead of stalling.
#[derive(Clone, Debug)]
pub struct ChannelRecorder {
    sender: Sender<MatchRecord>,
}

impl ChannelRecorder {
    /// Starts a detached worker thread that logs every record.
    #[must_use]
    pub fn spawn() -> Self {
        let (sender, receiver) = bounded(RECORDER_QUEUE_DEPTH);
        thread::spawn(move || record_worker(&receiver));
        Self { sender }
    }

    /// Uses an existing channel; the caller owns the receiving end.
    #[must_use]
    pub const fn with_sender(sender: Sender<MatchRecord>) -> Self {
        Self { sender }
    }

    fn push(&self, record: MatchRecord) {
        match self.sender.try_send(record) {
            Ok(()) => {}
            Err(TrySendError::Full(record)) => {
                tracing::warn!("Recorder queue full, dropping {:?}", record);
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::debug!("Recorder worker gone");
            }
        }
    }
}

fn record_worker(receiver: &Receiver<MatchRecord>) {
    for record in receiver {
        match record {
            MatchRecord::Created { game_uid } => {
                tracing::info!("Recorded match start: {}", game_uid);
            }
            MatchRecord::Ended { game_uid, winner } => {
                tracing::info!("Recorded match end: {} (winner {:?})", game_uid, winner);
            }
        }
    }
}

impl MatchRecorder for ChannelRecorder {
    fn match_created(&self, game_uid: &str) {
        self.push(MatchRecord::Created {
            game_uid: game_uid.to_string(),
        });
    }

    fn match_ended(&self, game_uid: &str, winner: Option<SeatId>) {
        self.push(MatchRecord::Ended {
            game_uid: game_uid.to_string(),
            winner,
        });
    }
}

/// Discards every record.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullRecorder;

impl MatchRecorder for NullRecorder {
    fn match_created(&self, _game_uid: &str) {}

    fn match_ended(&self, _game_uid: &str, _winner: Option<SeatId>) {}
}

// ============================================================================
// NAVIGATION - Path Planner
// ============================================================================

/// Plans hero paths for assigned tasks.
pub trait PathPlanner: Send + Sync {
    /// Waypoints from `from` to `to`, excluding `from`.
    fn plan(&self, from: Vec2, to: Vec2) -> Vec<Vec2>;
}

/// Walks straight to the target.
#[derive(Clone, Copy, Debug, Default)]
pub struct StraightLine;

impl PathPlanner for StraightLine {
    fn plan(&self, from: Vec2, to: Vec2) -> Vec<Vec2> {
        if from == to {
            Vec::new()
        } else {
            vec![to]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_recorder_forwards() {
        let (tx, rx) = bounded(4);
        let recorder = ChannelRecorder::with_sender(tx);
        recorder.match_created("m1");
        recorder.match_ended("m1", Some(SeatId(1)));

        assert_eq!(
            rx.try_recv().unwrap(),
            MatchRecord::Created {
                game_uid: "m1".into()
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            MatchRecord::Ended {
                game_uid: "m1".into(),
                winner: Some(SeatId(1))
            }
        );
    }

    #[test]
    fn test_full_queue_does_not_block() {
        let (tx, rx) = bounded(1);
        let recorder = ChannelRecorder::with_sender(tx);
        recorder.match_created("a");
        recorder.match_created("b");
        assert_eq!(rx.len(), 1);
    }

    #[test]
    fn test_straight_line() {
        let planner = StraightLine;
        let to = Vec2::new(2.0, 3.0);
        assert_eq!(planner.plan(Vec2::ZERO, to), vec![to]);
        assert!(planner.plan(to, to).is_empty());
    }
}
