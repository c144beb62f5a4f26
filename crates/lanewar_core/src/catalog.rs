//! # Task and Card Catalog
//!
//! Immutable lookup tables for mission definitions, card definitions and
//! named decks. Loaded once before a match from TOML or built in.
//!
//! ## Format
//!
//! ```toml
//! [[tasks]]
//! task_id = "gather"
//! task_name = "Gather"
//! task_type = "Gather"
//!
//! [[cards]]
//! id = "card_gather"
//! name = "Rally Point"
//! cost = 1
//! effect = { type = "task_assignment", task = { task_id = "gather", task_name = "Gather", task_type = "Gather" } }
//!
//! [[decks]]
//! id = "starter"
//! cards = ["card_gather", "card_gather"]
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::card::{CardKind, StatBoost};
use crate::error::{CoreError, CoreResult};
use crate::mission::{MissionData, TaskType};

/// Static card definition.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CardDefinition {
    /// Definition id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Flavor text.
    #[serde(default)]
    pub description: String,
    /// Play cost.
    #[serde(default)]
    pub cost: u32,
    /// Effect.
    pub effect: CardKind,
}

/// Named list of card definition ids.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct DeckDefinition {
    /// Deck id.
    pub id: String,
    /// Card definition ids, duplicates allowed.
    pub cards: Vec<String>,
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    tasks: Vec<MissionData>,
    #[serde(default)]
    cards: Vec<CardDefinition>,
    #[serde(default)]
    decks: Vec<DeckDefinition>,
}

/// Task, card and deck tables keyed by id.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    tasks: HashMap<String, MissionData>,
    cards: HashMap<String, CardDefinition>,
    decks: HashMap<String, DeckDefinition>,
}

impl Catalog {
    /// Id of the built-in deck.
    pub const STARTER_DECK: &'static str = "starter";

    /// Empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a catalog from TOML text.
    ///
    /// # Errors
    ///
    /// `Config` on parse failure, a duplicate id, or a deck naming an
    /// unknown card.
    pub fn from_toml_str(text: &str) -> CoreResult<Self> {
        let file: CatalogFile =
            toml::from_str(text).map_err(|e| CoreError::Config(format!("catalog: {e}")))?;

        let mut catalog = Self::new();
        for task in file.tasks {
            catalog.register_task(task)?;
        }
        for card in file.cards {
            catalog.register_card(card)?;
        }
        for deck in file.decks {
            catalog.register_deck(deck)?;
        }
        Ok(catalog)
    }

    /// Loads a catalog file.
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

    /// Adds a task definition.
    ///
    /// # Errors
    ///
    /// `Config` on a duplicate task id.
    pub fn register_task(&mut self, task: MissionData) -> CoreResult<()> {
        if self.tasks.contains_key(&task.task_id) {
            return Err(CoreError::Config(format!("duplicate task id {}", task.task_id)));
        }
        self.tasks.insert(task.task_id.clone(), task);
        Ok(())
    }

    /// Adds a card definition.
    ///
    /// # Errors
    ///
    /// `Config` on a duplicate card id.
    pub fn register_card(&mut self, card: CardDefinition) -> CoreResult<()> {
        if self.cards.contains_key(&card.id) {
            return Err(CoreError::Config(format!("duplicate card id {}", card.id)));
        }
        self.cards.insert(card.id.clone(), card);
        Ok(())
    }

    /// Adds a deck.
    ///
    /// # Errors
    ///
    /// `Config` on a duplicate deck id or an unknown card reference.
    pub fn register_deck(&mut self, deck: DeckDefinition) -> CoreResult<()> {
        if self.decks.contains_key(&deck.id) {
            return Err(CoreError::Config(format!("duplicate deck id {}", deck.id)));
        }
        if let Some(missing) = deck.cards.iter().find(|c| !self.cards.contains_key(*c)) {
            return Err(CoreError::Config(format!(
                "deck {} references unknown card {missing}",
                deck.id
            )));
        }
        self.decks.insert(deck.id.clone(), deck);
        Ok(())
    }

    /// Task definition by id.
    ///
    /// # Errors
    ///
    /// `UnknownDefinition` if absent.
    pub fn task(&self, task_id: &str) -> CoreResult<&MissionData> {
        self.tasks.get(task_id).ok_or_else(|| CoreError::UnknownDefinition {
            kind: "task",
            id: task_id.to_string(),
        })
    }

    /// Card definition by id.
    ///
    /// # Errors
    ///
    /// `UnknownDefinition` if absent.
    pub fn card(&self, card_id: &str) -> CoreResult<&CardDefinition> {
        self.cards.get(card_id).ok_or_else(|| CoreError::UnknownDefinition {
            kind: "card",
            id: card_id.to_string(),
        })
    }

    /// Deck by id.
    ///
    /// # Errors
    ///
    /// `UnknownDefinition` if absent.
    pub fn deck(&self, deck_id: &str) -> CoreResult<&DeckDefinition> {
        self.decks.get(deck_id).ok_or_else(|| CoreError::UnknownDefinition {
            kind: "deck",
            id: deck_id.to_string(),
        })
    }

    /// Number of card definitions.
    #[must_use]
    pub fn card_count(&self) -> usize {
        self.cards.len()
    }
}

fn task(id: &str, name: &str, task_type: TaskType, duration: u32) -> MissionData {
    MissionData {
        task_id: id.to_string(),
        task_name: name.to_string(),
        description: String::new(),
        task_type,
        duration,
    }
}

impl Catalog {
    /// Built-in tables: one task per movement category, matching task
    /// cards, two boosts, and a twelve-card starter deck.
    #[must_use]
    pub fn builtin() -> Self {
        let tasks = [
            task("gather", "Gather", TaskType::Gather, 0),
            task("ward", "Ward", TaskType::Ward, 2),
            task("gank", "Gank", TaskType::Gank, 4),
            task("teamfight", "Team Fight", TaskType::TeamFight, 0),
            task("defend", "Defend", TaskType::Defend, 0),
            task("push", "Push", TaskType::Push, 6),
            task("farm", "Farm", TaskType::Farm, 8),
            task("jungle", "Jungle", TaskType::Jungling, 8),
            task("idle", "Stand Down", TaskType::Idle, 0),
        ];

        let mut catalog = Self::new();
        let mut deck = Vec::new();
        for data in tasks {
            let card_id = format!("card_{}", data.task_id);
            deck.push(card_id.clone());
            catalog.cards.insert(
                card_id.clone(),
                CardDefinition {
                    id: card_id,
                    name: data.task_name.clone(),
                    description: data.description.clone(),
                    cost: 1,
                    effect: CardKind::TaskAssignment { task: data.clone() },
                },
            );
            catalog.tasks.insert(data.task_id.clone(), data);
        }

        let boosts = [
            (
                "card_sharpen",
                "Sharpen",
                StatBoost {
                    attack_increase: 10,
                    ..StatBoost::default()
                },
            ),
            (
                "card_haste",
                "Haste",
                StatBoost {
                    speed_increase: 5,
                    ..StatBoost::default()
                },
            ),
            (
                "card_fortify",
                "Fortify",
                StatBoost {
                    defense_increase: 5,
                    ..StatBoost::default()
                },
            ),
        ];
        for (id, name, boost) in boosts {
            deck.push(id.to_string());
            catalog.cards.insert(
                id.to_string(),
                CardDefinition {
                    id: id.to_string(),
                    name: name.to_string(),
                    description: String::new(),
                    cost: 2,
                    effect: CardKind::StatBoost { boost },
                },
            );
        }

        catalog.decks.insert(
            Self::STARTER_DECK.to_string(),
            DeckDefinition {
                id: Self::STARTER_DECK.to_string(),
                cards: deck,
            },
        );
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_starter_deck() {
        let catalog = Catalog::builtin();
        let deck = catalog.deck(Catalog::STARTER_DECK).unwrap();
        assert_eq!(deck.cards.len(), 12);
        assert!(deck.cards.iter().all(|c| catalog.card(c).is_ok()));
        assert_eq!(catalog.task("gather").unwrap().task_type, TaskType::Gather);
    }

    #[test]
    fn test_unknown_lookup() {
        let catalog = Catalog::builtin();
        assert_eq!(
            catalog.task("nope"),
            Err(CoreError::UnknownDefinition {
                kind: "task",
                id: "nope".into()
            })
        );
    }

    #[test]
    fn test_from_toml() {
        let text = r#"
            [[tasks]]
            task_id = "gather"
            task_name = "Gather"
            task_type = "Gather"

            [[cards]]
            id = "card_gather"
            name = "Rally Point"
            cost = 1
            effect = { type = "task_assignment", task = { task_id = "gather", task_name = "Gather", task_type = "Gather" } }

            [[cards]]
            id = "card_boost"
            name = "Boost"
            effect = { type = "stat_boost", boost = { attack_increase = 3 } }

            [[decks]]
            id = "tiny"
            cards = ["card_gather", "card_boost"]
        "#;
        let catalog = Catalog::from_toml_str(text).unwrap();
        assert_eq!(catalog.card_count(), 2);
        assert_eq!(catalog.deck("tiny").unwrap().cards.len(), 2);
        assert!(matches!(
            catalog.card("card_boost").unwrap().effect,
            CardKind::StatBoost { boost: StatBoost { attack_increase: 3, .. } }
        ));
    }

    #[test]
    fn test_deck_with_unknown_card_rejected() {
        let text = r#"
            [[decks]]
            id = "broken"
            cards = ["ghost"]
        "#;
        assert!(matches!(
            Catalog::from_toml_str(text),
            Err(CoreError::Config(_))
        ));
    }
}
