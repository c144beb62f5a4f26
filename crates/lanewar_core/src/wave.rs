//! Creep wave payload.

use crate::entity::Lane;
use crate::error::{CoreError, CoreResult};
use crate::vector::Vec2;

/// Creep wave state: a lane and a fixed route.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveState {
    lane: Lane,
    route: Vec<Vec2>,
    path_index: usize,
}

impl WaveState {
    /// Index a fresh wave starts at: the first point after the origin.
    pub const START_INDEX: usize = 1;

    /// Creates a wave on `route`, starting at [`Self::START_INDEX`].
    ///
    /// Routes shorter than two points start at their last point.
    pub(crate) fn new(lane: Lane, route: Vec<Vec2>) -> Self {
        let path_index = Self::START_INDEX.min(route.len().saturating_sub(1));
        Self {
            lane,
            route,
            path_index,
        }
    }

    /// Assigned lane.
    #[inline]
    #[must_use]
    pub const fn lane(&self) -> Lane {
        self.lane
    }

    /// Full route.
    #[must_use]
    pub fn route(&self) -> &[Vec2] {
        &self.route
    }

    /// Index of the waypoint currently targeted.
    #[inline]
    #[must_use]
    pub const fn path_index(&self) -> usize {
        self.path_index
    }

    /// Waypoint at the current index.
    #[must_use]
    pub fn current_waypoint(&self) -> Option<Vec2> {
        self.route.get(self.path_index).copied()
    }

    /// True once the last waypoint has been reached.
    #[must_use]
    pub fn is_route_complete(&self) -> bool {
        self.path_index + 1 >= self.route.len()
    }

    /// Jumps to `index`.
    ///
    /// # Errors
    ///
    /// `RouteIndexOutOfBounds` if `index` is past the route.
    pub fn set_path_index(&mut self, index: usize) -> CoreResult<()> {
        if index >= self.route.len() {
            return Err(CoreError::RouteIndexOutOfBounds {
                index,
                len: self.route.len(),
            });
        }
        self.path_index = index;
        Ok(())
    }

    /// Walks `budget` units from `position` toward successive waypoints.
    pub(crate) fn step_along_route(&mut self, mut position: Vec2, mut budget: f32) -> Vec2 {
        while budget > 0.0 {
            let Some(target) = self.current_waypoint() else {
                break;
            };
            let distance = position.distance(target);
            if budget >= distance {
                position = target;
                budget -= distance;
                if self.is_route_complete() {
                    break;
                }
                self.path_index += 1;
            } else {
                position = position.move_towards(target, budget);
                budget = 0.0;
            }
        }
        position
    }
}
