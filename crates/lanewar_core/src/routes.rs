//! # Lane Routes
//!
//! Waypoint lists per (team, lane). Waves walk these from their own base
//! toward the enemy base.
//!
//! ## Format
//!
//! ```toml
//! [[routes]]
//! team = "TeamA"
//! lane = "Top"
//! waypoints = [{ x = -6.5, z = -6.5 }, { x = -7.0, z = 1.0 }]
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::entity::{Lane, Team};
use crate::error::{CoreError, CoreResult};
use crate::vector::Vec2;

#[derive(Deserialize)]
struct RouteEntry {
    team: Team,
    lane: Lane,
    waypoints: Vec<Vec2>,
}

#[derive(Deserialize)]
struct RoutesFile {
    routes: Vec<RouteEntry>,
}

/// Immutable route table.
#[derive(Clone, Debug, Default)]
pub struct LaneRoutes {
    routes: HashMap<(Team, Lane), Vec<Vec2>>,
}

impl LaneRoutes {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the route for `(team, lane)`.
    pub fn insert(&mut self, team: Team, lane: Lane, waypoints: Vec<Vec2>) {
        self.routes.insert((team, lane), waypoints);
    }

    /// Route for `(team, lane)`.
    ///
    /// # Errors
    ///
    /// `EmptyRoute` when missing or empty.
    pub fn route(&self, team: Team, lane: Lane) -> CoreResult<&[Vec2]> {
        match self.routes.get(&(team, lane)) {
            Some(route) if !route.is_empty() => Ok(route),
            _ => Err(CoreError::EmptyRoute { team, lane }),
        }
    }

    /// Parses routes from TOML text. Entries not in the file keep no route.
    ///
    /// # Errors
    ///
    /// `Config` on parse failure or a route with team/lane `None`.
    pub fn from_toml_str(text: &str) -> CoreResult<Self> {
        let file: RoutesFile =
            toml::from_str(text).map_err(|e| CoreError::Config(format!("routes: {e}")))?;
        let mut table = Self::new();
        for entry in file.routes {
            if entry.team == Team::None || entry.lane == Lane::None {
                return Err(CoreError::Config(format!(
                    "route must name a team and lane, got {:?}/{:?}",
                    entry.team, entry.lane
                )));
            }
            table.insert(entry.team, entry.lane, entry.waypoints);
        }
        Ok(table)
    }

    /// Loads a routes file.
    ///
    /// # Errors
    ///
    /// `Config` if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Built-in map: three lanes from base (-6.5, -6.5) to base (7.5, 7.5)
    /// through each lane's towers. TeamB walks them in reverse.
    #[must_use]
    pub fn builtin() -> Self {
        let base_a = Vec2::new(-6.5, -6.5);
        let base_b = Vec2::new(7.5, 7.5);
        let top = vec![
            base_a,
            Vec2::new(-7.0, -3.2),
            Vec2::new(-7.0, 1.0),
            Vec2::new(-0.3, 7.9),
            Vec2::new(5.0, 8.2),
            base_b,
        ];
        let mid = vec![
            base_a,
            Vec2::new(-5.4, -4.1),
            Vec2::new(-2.6, -1.3),
            Vec2::new(2.4, 4.2),
            Vec2::new(5.4, 6.5),
            base_b,
        ];
        let bottom = vec![
            base_a,
            Vec2::new(-5.2, -5.7),
            Vec2::new(0.1, -5.7),
            Vec2::new(6.6, 1.7),
            Vec2::new(6.9, 5.7),
            base_b,
        ];

        let mut table = Self::new();
        for (lane, route) in [(Lane::Top, top), (Lane::Mid, mid), (Lane::Bottom, bottom)] {
            let mut reversed = route.clone();
            reversed.reverse();
            table.insert(Team::TeamA, lane, route);
            table.insert(Team::TeamB, lane, reversed);
        }
        table
    }
}
