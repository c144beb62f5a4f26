//! # Combat Detection
//!
//! Sorted-x sweep between the two teams.
//!
//! ```text
//! defenders sorted by x:   d0   d1   d2 | d3   d4   d5 | d6
//!                                       ^              ^
//!                         lower_bound(x - R)     stop at x + R
//! ```
//!
//! For each attacker the opposing list is binary searched for the first
//! entity with `x >= attacker.x - R`, then scanned while `x <= attacker.x + R`.
//! Candidates outside `|dz| <= R` are skipped before the exact squared
//! distance test against the attacker's own range. `R` is the widest range
//! any entity may have.
//!
//! Both directions run: TeamA against TeamB, then TeamB against TeamA.

use std::cmp::Ordering;

use lanewar_core::{Entity, Team, WorldState};

/// One attacker landing a hit.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct CombatHit {
    /// Attacker id.
    pub attacker: String,
    /// Target id.
    pub target: String,
    /// Damage dealt, the attacker's attack.
    pub damage: i32,
}

impl CombatHit {
    fn between(attacker: &Entity, target: &Entity) -> Self {
        Self {
            attacker: attacker.id().to_string(),
            target: target.id().to_string(),
            damage: attacker.attack(),
        }
    }
}

#[inline]
fn by_x(a: &&Entity, b: &&Entity) -> Ordering {
    a.position().x.total_cmp(&b.position().x)
}

/// Entities of `team` sorted by ascending x.
#[must_use]
pub fn sorted_by_x(world: &WorldState, team: Team) -> Vec<&Entity> {
    let mut entities: Vec<&Entity> = world.team_entities(team).collect();
    entities.sort_by(by_x);
    entities
}

/// Every attacker/target pair in range, both directions.
#[must_use]
pub fn detect(world: &WorldState, max_range: f32) -> Vec<CombatHit> {
    let team_a = sorted_by_x(world, Team::TeamA);
    let team_b = sorted_by_x(world, Team::TeamB);

    let mut hits = Vec::new();
    sweep(&team_a, &team_b, max_range, &mut hits);
    sweep(&team_b, &team_a, max_range, &mut hits);
    hits
}

/// Appends hits of `attackers` on `defenders`. `defenders` must be sorted
/// by x.
pub fn sweep(attackers: &[&Entity], defenders: &[&Entity], max_range: f32, hits: &mut Vec<CombatHit>) {
    for attacker in attackers {
        if !attacker.can_attack() {
            continue;
        }
        let origin = attacker.position();
        let window_min = origin.x - max_range;
        let window_max = origin.x + max_range;

        let start = defenders.partition_point(|d| d.position().x < window_min);
        for defender in &defenders[start..] {
            let target = defender.position();
            if target.x > window_max {
                break;
            }
            if !defender.can_be_attacked() {
                continue;
            }
            if (target.z - origin.z).abs() > max_range {
                continue;
            }
            if attacker.is_within_attack_range(target) {
                hits.push(CombatHit::between(attacker, defender));
            }
        }
    }
}

/// Pairwise reference check, O(n*m).
#[must_use]
pub fn detect_naive(world: &WorldState) -> Vec<CombatHit> {
    let mut hits = Vec::new();
    for (attacking, defending) in [(Team::TeamA, Team::TeamB), (Team::TeamB, Team::TeamA)] {
        for attacker in world.team_entities(attacking) {
            if !attacker.can_attack() {
                continue;
            }
            for defender in world.team_entities(defending) {
                if defender.can_be_attacked() && attacker.is_within_attack_range(defender.position()) {
                    hits.push(CombatHit::between(attacker, defender));
                }
            }
        }
    }
    hits
}
