//! # Athletes
//!
//! Player-controlled operators. Each athlete drives exactly one hero once
//! the world assigns it, plays one role, and carries six behavioral traits.

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::entity::{Lane, Team};
use crate::hero::HeroType;
use crate::mission::Mission;

/// Position in the team composition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Role {
    /// Primary damage dealer.
    Carry = 0,
    /// Middle laner.
    Mid = 1,
    /// Offlaner.
    Offlane = 2,
    /// Main support.
    Sup1 = 3,
    /// Secondary support.
    Sup2 = 4,
}

impl Role {
    /// All roles in importance order.
    pub const ALL: [Self; 5] = [Self::Carry, Self::Mid, Self::Offlane, Self::Sup1, Self::Sup2];

    /// Lane this role plays.
    #[must_use]
    pub const fn lane(self) -> Lane {
        match self {
            Self::Offlane | Self::Sup2 => Lane::Top,
            Self::Mid => Lane::Mid,
            Self::Carry | Self::Sup1 => Lane::Bottom,
        }
    }

    /// Rank 1 (most important) to 5.
    #[must_use]
    pub const fn importance(self) -> u8 {
        match self {
            Self::Carry => 1,
            Self::Mid => 2,
            Self::Offlane => 3,
            Self::Sup1 => 4,
            Self::Sup2 => 5,
        }
    }

    /// Name prefix of the hero this role drives.
    #[must_use]
    pub const fn hero_prefix(self) -> &'static str {
        match self {
            Self::Carry => "CarryHero",
            Self::Mid => "MidHero",
            Self::Offlane => "OfflaneHero",
            Self::Sup1 => "SupportHero1",
            Self::Sup2 => "SupportHero2",
        }
    }

    /// Default archetype for a hero in this role.
    #[must_use]
    pub const fn hero_type(self) -> HeroType {
        match self {
            Self::Carry => HeroType::Marksman,
            Self::Mid => HeroType::Mage,
            Self::Offlane => HeroType::Tank,
            Self::Sup1 | Self::Sup2 => HeroType::Support,
        }
    }
}

/// Behavioral traits, each held inside its declared range.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AthleteTraits {
    aggressiveness: f32,
    reflexes: f32,
    skill: f32,
    decision_making: f32,
    teamwork: f32,
    joker: f32,
}

impl AthleteTraits {
    /// Builds traits, clamping every value.
    #[must_use]
    pub fn new(
        aggressiveness: f32,
        reflexes: f32,
        skill: f32,
        decision_making: f32,
        teamwork: f32,
        joker: f32,
    ) -> Self {
        let mut traits = Self::default();
        traits.set_aggressiveness(aggressiveness);
        traits.set_reflexes(reflexes);
        traits.set_skill(skill);
        traits.set_decision_making(decision_making);
        traits.set_teamwork(teamwork);
        traits.set_joker(joker);
        traits
    }

    /// Rolls every trait uniformly inside its range.
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(0.0..=1.0),
            rng.gen_range(0.0..=1.0),
            rng.gen_range(0.0..=1.0),
            rng.gen_range(0.0..=1.0),
            rng.gen_range(0.0..=1.0),
        )
    }

    /// -1 (cautious) to 1 (aggressive).
    #[must_use]
    pub const fn aggressiveness(&self) -> f32 {
        self.aggressiveness
    }

    /// 0 (slow) to 1 (fast).
    #[must_use]
    pub const fn reflexes(&self) -> f32 {
        self.reflexes
    }

    /// 0 (novice) to 1 (expert).
    #[must_use]
    pub const fn skill(&self) -> f32 {
        self.skill
    }

    /// 0 (poor) to 1 (excellent).
    #[must_use]
    pub const fn decision_making(&self) -> f32 {
        self.decision_making
    }

    /// 0 (individualistic) to 1 (team-oriented).
    #[must_use]
    pub const fn teamwork(&self) -> f32 {
        self.teamwork
    }

    /// 0 (predictable) to 1 (unpredictable).
    #[must_use]
    pub const fn joker(&self) -> f32 {
        self.joker
    }

    /// Sets aggressiveness, clamped to [-1, 1].
    pub fn set_aggressiveness(&mut self, value: f32) {
        self.aggressiveness = value.clamp(-1.0, 1.0);
    }

    /// Sets reflexes, clamped to [0, 1].
    pub fn set_reflexes(&mut self, value: f32) {
        self.reflexes = value.clamp(0.0, 1.0);
    }

    /// Sets skill, clamped to [0, 1].
    pub fn set_skill(&mut self, value: f32) {
        self.skill = value.clamp(0.0, 1.0);
    }

    /// Sets decision making, clamped to [0, 1].
    pub fn set_decision_making(&mut self, value: f32) {
        self.decision_making = value.clamp(0.0, 1.0);
    }

    /// Sets teamwork, clamped to [0, 1].
    pub fn set_teamwork(&mut self, value: f32) {
        self.teamwork = value.clamp(0.0, 1.0);
    }

    /// Sets joker factor, clamped to [0, 1].
    pub fn set_joker(&mut self, value: f32) {
        self.joker = value.clamp(0.0, 1.0);
    }
}

/// A player-controlled operator.
#[derive(Clone, Debug, PartialEq)]
pub struct Athlete {
    id: String,
    name: String,
    age: u32,
    role: Role,
    team: Team,
    hero_id: Option<String>,
    /// Roles the athlete prefers.
    pub preferred_roles: BTreeSet<Role>,
    /// Hero name to mastery level (1-100).
    pub hero_mastery: BTreeMap<String, u8>,
    /// Behavioral traits.
    pub traits: AthleteTraits,
    /// Mission in progress.
    pub current_mission: Option<Mission>,
}

impl Athlete {
    /// Creates an unassigned athlete.
    #[must_use]
    pub fn new(id: String, name: String, age: u32, role: Role, traits: AthleteTraits) -> Self {
        Self {
            id,
            name,
            age,
            role,
            team: Team::None,
            hero_id: None,
            preferred_roles: BTreeSet::from([role]),
            hero_mastery: BTreeMap::new(),
            traits,
            current_mission: None,
        }
    }

    /// Unique id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Age in years.
    #[must_use]
    pub const fn age(&self) -> u32 {
        self.age
    }

    /// Current role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Lane implied by the role.
    #[must_use]
    pub const fn lane(&self) -> Lane {
        self.role.lane()
    }

    /// Importance implied by the role.
    #[must_use]
    pub const fn importance(&self) -> u8 {
        self.role.importance()
    }

    /// Team, `None` until assigned.
    #[must_use]
    pub const fn team(&self) -> Team {
        self.team
    }

    /// Id of the hero this athlete drives.
    #[must_use]
    pub fn hero_id(&self) -> Option<&str> {
        self.hero_id.as_deref()
    }

    /// Changes role; lane and importance follow.
    pub fn assign_role(&mut self, role: Role) {
        self.role = role;
    }

    /// Sets or updates mastery for `hero_name`, clamped to 1..=100.
    pub fn set_hero_mastery(&mut self, hero_name: impl Into<String>, level: u8) {
        self.hero_mastery.insert(hero_name.into(), level.clamp(1, 100));
    }

    pub(crate) fn assign_team(&mut self, team: Team) {
        self.team = team;
    }

    pub(crate) fn bind_hero(&mut self, hero_id: String) {
        self.hero_id = Some(hero_id);
    }
}

/// Default five-a-side roster for a team: (name, age, role).
#[must_use]
pub const fn default_roster(team: Team) -> [(&'static str, u32, Role); 5] {
    match team {
        Team::TeamB => [
            ("Fiona", 26, Role::Carry),
            ("George", 21, Role::Mid),
            ("Hannah", 28, Role::Offlane),
            ("Ian", 24, Role::Sup1),
            ("Jack", 22, Role::Sup2),
        ],
        Team::TeamA | Team::None => [
            ("Alice", 25, Role::Carry),
            ("Bob", 22, Role::Mid),
            ("Charlie", 27, Role::Offlane),
            ("Diana", 24, Role::Sup1),
            ("Ethan", 23, Role::Sup2),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_role_mapping() {
        assert_eq!(Role::Carry.lane(), Lane::Bottom);
        assert_eq!(Role::Sup1.lane(), Lane::Bottom);
        assert_eq!(Role::Mid.lane(), Lane::Mid);
        assert_eq!(Role::Offlane.lane(), Lane::Top);
        assert_eq!(Role::Sup2.lane(), Lane::Top);

        let ranks: Vec<u8> = Role::ALL.iter().map(|r| r.importance()).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_traits_clamped() {
        let t = AthleteTraits::new(-3.0, 2.0, -0.5, 0.5, 9.0, -9.0);
        assert_eq!(t.aggressiveness(), -1.0);
        assert_eq!(t.reflexes(), 1.0);
        assert_eq!(t.skill(), 0.0);
        assert_eq!(t.decision_making(), 0.5);
        assert_eq!(t.teamwork(), 1.0);
        assert_eq!(t.joker(), 0.0);
    }

    #[test]
    fn test_rolled_traits_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..100 {
            let t = AthleteTraits::roll(&mut rng);
            assert!((-1.0..=1.0).contains(&t.aggressiveness()));
            assert!((0.0..=1.0).contains(&t.joker()));
        }
    }

    #[test]
    fn test_mastery_clamped() {
        let mut a = Athlete::new("athlete1".into(), "Alice".into(), 25, Role::Carry, AthleteTraits::default());
        a.set_hero_mastery("CarryHero_TeamA", 250);
        assert_eq!(a.hero_mastery["CarryHero_TeamA"], 100);
    }
}
