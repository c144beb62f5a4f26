//! # Server Tick Loop
//!
//! Fixed-timestep accumulator driving a match session.
//!
//! ## Design
//!
//! The caller feeds wall time in through [`TickLoop::should_tick`] and runs
//! one session tick per [`TickLoop::begin_tick`]. A slow host runs several
//! ticks back to back instead of stretching `dt`.

use std::time::{Duration, Instant};

use crate::DEFAULT_TICK_RATE;

/// Fixed-timestep tick loop controller.
#[derive(Debug)]
pub struct TickLoop {
    /// Target tick duration.
    tick_duration: Duration,
    /// Time of last tick.
    last_tick: Instant,
    /// Accumulated time since last tick.
    accumulator: Duration,
    /// Total ticks executed.
    tick_count: u64,
    /// Frame time statistics.
    stats: TickStats,
}

/// Tick timing statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Minimum tick duration observed.
    pub min_tick_us: u64,
    /// Maximum tick duration observed.
    pub max_tick_us: u64,
    /// Average tick duration (rolling).
    pub avg_tick_us: u64,
    /// Ticks that took longer than the budget.
    pub late_ticks: u64,
    /// Total ticks measured.
    pub total_ticks: u64,
}

impl TickStats {
    fn fresh(tick_duration: Duration) -> Self {
        Self {
            min_tick_us: u64::MAX,
            max_tick_us: 0,
            avg_tick_us: duration_us(tick_duration),
            late_ticks: 0,
            total_ticks: 0,
        }
    }

    /// Folds `other` into these totals.
    pub fn merge(&mut self, other: &Self) {
        if other.total_ticks == 0 {
            return;
        }
        if self.total_ticks == 0 {
            *self = *other;
            return;
        }
        let total = self.total_ticks + other.total_ticks;
        self.avg_tick_us = (self.avg_tick_us * self.total_ticks + other.avg_tick_us * other.total_ticks) / total;
        self.min_tick_us = self.min_tick_us.min(other.min_tick_us);
        self.max_tick_us = self.max_tick_us.max(other.max_tick_us);
        self.late_ticks += other.late_ticks;
        self.total_ticks = total;
    }
}

fn duration_us(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

impl TickLoop {
    /// Creates a tick loop at `tick_rate` Hz (minimum 1).
    #[must_use]
    pub fn new(tick_rate: u32) -> Self {
        let tick_duration = Duration::from_micros(1_000_000 / u64::from(tick_rate.max(1)));
        Self {
            tick_duration,
            last_tick: Instant::now(),
            accumulator: Duration::ZERO,
            tick_count: 0,
            stats: TickStats::fresh(tick_duration),
        }
    }

    /// Returns true while a tick is due.
    ///
    /// Call this in a loop until it returns false.
    #[must_use]
    pub fn should_tick(&mut self) -> bool {
        let now = Instant::now();
        self.accumulator += now.duration_since(self.last_tick);
        self.last_tick = now;

        self.accumulator >= self.tick_duration
    }

    /// Marks the start of a tick and returns its start time.
    #[must_use]
    pub fn begin_tick(&mut self) -> Instant {
        self.accumulator = self.accumulator.saturating_sub(self.tick_duration);
        self.tick_count += 1;
        Instant::now()
    }

    /// Marks the end of a tick and records its duration.
    pub fn end_tick(&mut self, start: Instant) {
        let duration = start.elapsed();
        let duration_us = duration_us(duration);

        self.stats.total_ticks += 1;
        self.stats.min_tick_us = self.stats.min_tick_us.min(duration_us);
        self.stats.max_tick_us = self.stats.max_tick_us.max(duration_us);

        // Rolling average
        self.stats.avg_tick_us = (self.stats.avg_tick_us * 15 + duration_us) / 16;

        if duration > self.tick_duration {
            self.stats.late_ticks += 1;
        }
    }

    /// Ticks executed so far.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Timing statistics.
    #[must_use]
    pub const fn stats(&self) -> &TickStats {
        &self.stats
    }

    /// Target tick duration.
    #[must_use]
    pub const fn tick_duration(&self) -> Duration {
        self.tick_duration
    }

    /// Fixed `dt` in seconds handed to each session tick.
    #[must_use]
    pub fn dt(&self) -> f32 {
        self.tick_duration.as_secs_f32()
    }

    /// Resets statistics.
    pub fn reset_stats(&mut self) {
        self.stats = TickStats::fresh(self.tick_duration);
    }
}

impl Default for TickLoop {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_loop_creation() {
        let tick_loop = TickLoop::new(20);
        assert_eq!(tick_loop.tick_count(), 0);
        assert_eq!(tick_loop.tick_duration(), Duration::from_millis(50));
        assert!((tick_loop.dt() - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_tick_execution() {
        let mut tick_loop = TickLoop::new(1000);

        std::thread::sleep(Duration::from_millis(5));
        assert!(tick_loop.should_tick());

        let start = tick_loop.begin_tick();
        tick_loop.end_tick(start);

        assert_eq!(tick_loop.tick_count(), 1);
        assert_eq!(tick_loop.stats().total_ticks, 1);
    }

    #[test]
    fn test_stats_merge() {
        let mut a = TickStats {
            min_tick_us: 10,
            max_tick_us: 50,
            avg_tick_us: 20,
            late_ticks: 1,
            total_ticks: 10,
        };
        let b = TickStats {
            min_tick_us: 5,
            max_tick_us: 90,
            avg_tick_us: 40,
            late_ticks: 2,
            total_ticks: 10,
        };
        a.merge(&b);
        assert_eq!(a.total_ticks, 20);
        assert_eq!(a.avg_tick_us, 30);
        assert_eq!(a.min_tick_us, 5);
        assert_eq!(a.max_tick_us, 90);
        assert_eq!(a.late_ticks, 3);

        let mut empty = TickStats::default();
        empty.merge(&b);
        assert_eq!(empty, b);
    }

    #[test]
    fn test_reset_stats() {
        let mut tick_loop = TickLoop::new(100);
        let start = tick_loop.begin_tick();
        tick_loop.end_tick(start);
        tick_loop.reset_stats();
        assert_eq!(tick_loop.stats().total_ticks, 0);
    }
}
