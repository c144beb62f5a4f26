//! Hero payload and path following.

use std::collections::{BTreeSet, VecDeque};

use crate::entity::{Entity, EntityCategory};
use crate::error::{CoreError, CoreResult};
use crate::vector::Vec2;

/// Hero archetype.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HeroType {
    /// Frontline.
    Tank,
    /// Damage over time.
    DoT,
    /// Burst damage.
    Burst,
    /// Stealth.
    Stealth,
    /// Mage.
    Mage,
    /// Ranged physical.
    Marksman,
    /// Support.
    Support,
}

/// Hero-specific state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeroState {
    /// Archetypes.
    pub types: BTreeSet<HeroType>,
    /// Current mana.
    pub mana: i32,
    /// Mana cap.
    pub max_mana: i32,
    /// Physical mitigation.
    pub armor: i32,
    /// Magic mitigation.
    pub magic_resistance: i32,
    /// Athlete controlling this hero.
    pub athlete_id: Option<String>,
    path: VecDeque<Vec2>,
}

impl HeroState {
    /// Creates hero state with `mana` and no path.
    #[must_use]
    pub fn new(mana: i32, athlete_id: Option<String>) -> Self {
        Self {
            mana,
            max_mana: mana,
            athlete_id,
            ..Self::default()
        }
    }

    /// True if waypoints remain.
    #[inline]
    #[must_use]
    pub fn has_path(&self) -> bool {
        !self.path.is_empty()
    }

    /// Remaining waypoints, next first.
    pub fn path(&self) -> impl Iterator<Item = &Vec2> {
        self.path.iter()
    }

    /// Next waypoint.
    #[must_use]
    pub fn current_target(&self) -> Option<Vec2> {
        self.path.front().copied()
    }

    /// Replaces the path.
    pub fn set_path(&mut self, waypoints: impl IntoIterator<Item = Vec2>) {
        self.path.clear();
        self.path.extend(waypoints);
    }

    /// Drops all waypoints.
    pub fn clear_path(&mut self) {
        self.path.clear();
    }

    /// Walks `budget` units from `position`, consuming reached waypoints.
    pub(crate) fn step_along_path(&mut self, mut position: Vec2, mut budget: f32) -> Vec2 {
        while budget > 0.0 {
            let Some(target) = self.path.front().copied() else {
                break;
            };
            let distance = position.distance(target);
            if budget >= distance {
                position = target;
                budget -= distance;
                self.path.pop_front();
            } else {
                position += (target - position).normalized() * budget;
                budget = 0.0;
            }
        }
        position
    }
}

/// Full attribute set for [`Entity::set_hero_attributes`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeroAttributes {
    /// Maximum health, must be positive.
    pub max_health: i32,
    /// Mana pool.
    pub mana: i32,
    /// Attack damage.
    pub attack: i32,
    /// Armor.
    pub armor: i32,
    /// Magic resistance.
    pub magic_resistance: i32,
    /// Move speed, must be positive.
    pub move_speed: f32,
}

impl HeroAttributes {
    /// Checks every field against its domain.
    ///
    /// # Errors
    ///
    /// `InvalidAttribute` naming the first offending field.
    #[allow(clippy::cast_precision_loss)]
    pub fn validate(&self) -> CoreResult<()> {
        let checks: [(&'static str, f32, bool); 6] = [
            ("max_health", self.max_health as f32, self.max_health > 0),
            ("mana", self.mana as f32, self.mana >= 0),
            ("attack", self.attack as f32, self.attack >= 0),
            ("armor", self.armor as f32, self.armor >= 0),
            (
                "magic_resistance",
                self.magic_resistance as f32,
                self.magic_resistance >= 0,
            ),
            ("move_speed", self.move_speed, self.move_speed > 0.0),
        ];
        for (field, value, ok) in checks {
            if !ok {
                return Err(CoreError::InvalidAttribute { field, value });
            }
        }
        Ok(())
    }
}

impl Entity {
    /// Replaces a hero's attributes after validating them.
    ///
    /// # Errors
    ///
    /// `InvalidAttribute` on a bad field, `WrongCategory` if this is not a
    /// hero. Nothing changes on error.
    pub fn set_hero_attributes(&mut self, attrs: HeroAttributes) -> CoreResult<()> {
        attrs.validate()?;
        if self.category() != EntityCategory::Hero {
            return Err(CoreError::WrongCategory {
                id: self.id().to_string(),
                expected: EntityCategory::Hero,
            });
        }
        if let Some(hero) = self.as_hero_mut() {
            hero.mana = attrs.mana;
            hero.max_mana = attrs.mana;
            hero.armor = attrs.armor;
            hero.magic_resistance = attrs.magic_resistance;
        }
        self.set_base_stats(attrs.max_health, attrs.attack, attrs.move_speed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_consumes_waypoints() {
        let mut hero = HeroState::new(200, None);
        hero.set_path([Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0)]);

        let pos = hero.step_along_path(Vec2::ZERO, 1.5);
        assert_eq!(pos, Vec2::new(1.0, 0.5));
        assert_eq!(hero.current_target(), Some(Vec2::new(1.0, 1.0)));

        let pos = hero.step_along_path(pos, 10.0);
        assert_eq!(pos, Vec2::new(1.0, 1.0));
        assert!(!hero.has_path());
    }

    #[test]
    fn test_empty_path_no_movement() {
        let mut hero = HeroState::new(0, None);
        assert_eq!(hero.step_along_path(Vec2::new(2.0, 2.0), 5.0), Vec2::new(2.0, 2.0));
    }

    #[test]
    fn test_attribute_validation() {
        let good = HeroAttributes {
            max_health: 500,
            mana: 200,
            attack: 40,
            armor: 5,
            magic_resistance: 5,
            move_speed: 3.5,
        };
        assert!(good.validate().is_ok());

        let bad = HeroAttributes {
            move_speed: 0.0,
            ..good
        };
        assert!(matches!(
            bad.validate(),
            Err(CoreError::InvalidAttribute { field: "move_speed", .. })
        ));

        let bad = HeroAttributes { armor: -1, ..good };
        assert!(matches!(
            bad.validate(),
            Err(CoreError::InvalidAttribute { field: "armor", .. })
        ));
    }
}
