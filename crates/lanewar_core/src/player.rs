//! # Players
//!
//! A seat in the match: connection flags, the athlete roster, and three
//! mutually exclusive card zones backed by one lookup by uid.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::card::Card;
use crate::error::{CoreError, CoreResult};

/// Seat index, 0..N-1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeatId(pub u8);

impl SeatId {
    /// Wire value meaning "no seat".
    pub const NONE_WIRE: i32 = -1;

    /// Index into the seat table.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Wire representation.
    #[inline]
    #[must_use]
    pub const fn to_wire(self) -> i32 {
        self.0 as i32
    }

    /// Parses a wire value; negative or oversized values are no seat.
    #[must_use]
    pub fn from_wire(value: i32) -> Option<Self> {
        u8::try_from(value).ok().map(Self)
    }
}

impl std::fmt::Display for SeatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "seat{}", self.0)
    }
}

/// One played card.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Action tag the card was played with.
    pub action: u16,
    /// Turn it was played on.
    pub turn: u32,
    /// Definition id.
    pub card_id: String,
    /// Instance id.
    pub card_uid: String,
    /// Target card, if any.
    pub target_uid: Option<String>,
    /// Target seat, if any.
    pub target_player: Option<SeatId>,
    /// Athletes the card was applied to.
    pub target_athletes: Vec<String>,
}

/// Where a card currently sits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Zone {
    /// Draw pile.
    Deck,
    /// Playable.
    Hand,
    /// Played.
    Discard,
}

/// A seat and its owned state.
#[derive(Clone, Debug)]
pub struct Player {
    /// Seat.
    pub seat: SeatId,
    /// Display name.
    pub username: String,
    /// Stable identity from the auth collaborator, empty when unbound.
    pub user_id: String,
    /// Avatar key.
    pub avatar: String,
    /// Selected deck id.
    pub deck_id: String,
    /// Controlled by AI.
    pub is_ai: bool,
    /// AI difficulty.
    pub ai_level: u8,
    /// Connected to the session.
    pub connected: bool,
    /// Sent its settings.
    pub ready: bool,
    athletes: Vec<String>,
    cards: HashMap<String, Card>,
    deck: Vec<String>,
    hand: Vec<String>,
    discard: Vec<String>,
    history: Vec<HistoryEntry>,
}

impl Player {
    /// Creates an empty, unbound seat.
    #[must_use]
    pub fn new(seat: SeatId) -> Self {
        Self {
            seat,
            username: format!("Player{}", seat.0),
            user_id: String::new(),
            avatar: String::new(),
            deck_id: String::new(),
            is_ai: false,
            ai_level: 0,
            connected: false,
            ready: false,
            athletes: Vec::new(),
            cards: HashMap::new(),
            deck: Vec::new(),
            hand: Vec::new(),
            discard: Vec::new(),
            history: Vec::new(),
        }
    }

    /// Ready and owning at least one card.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready && !self.cards.is_empty()
    }

    /// Connected, or played by AI.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connected || self.is_ai
    }

    // ========================================================================
    // ATHLETES
    // ========================================================================

    /// Adds an athlete id to the roster, ignoring duplicates.
    pub fn add_athlete(&mut self, athlete_id: impl Into<String>) {
        let id = athlete_id.into();
        if !self.athletes.contains(&id) {
            self.athletes.push(id);
        }
    }

    /// Removes an athlete id from the roster.
    pub fn remove_athlete(&mut self, athlete_id: &str) {
        self.athletes.retain(|a| a != athlete_id);
    }

    /// True if the roster contains `athlete_id`.
    #[must_use]
    pub fn owns_athlete(&self, athlete_id: &str) -> bool {
        self.athletes.iter().any(|a| a == athlete_id)
    }

    /// Roster ids.
    #[must_use]
    pub fn athletes(&self) -> &[String] {
        &self.athletes
    }

    // ========================================================================
    // CARDS
    // ========================================================================

    /// Registers `card` and puts it at the bottom of the deck.
    pub fn add_card_to_deck(&mut self, card: Card) {
        let uid = card.uid.clone();
        if self.cards.insert(uid.clone(), card).is_none() {
            self.deck.push(uid);
        }
    }

    /// Drops every card and zone.
    pub fn clear_cards(&mut self) {
        self.cards.clear();
        self.deck.clear();
        self.hand.clear();
        self.discard.clear();
    }

    /// Moves the top of the deck into the hand.
    pub fn draw_card(&mut self) -> Option<&Card> {
        if self.deck.is_empty() {
            return None;
        }
        let uid = self.deck.remove(0);
        self.hand.push(uid);
        self.hand.last().and_then(|uid| self.cards.get(uid))
    }

    /// Draws up to `count` cards; returns how many moved.
    pub fn draw_cards(&mut self, count: usize) -> usize {
        (0..count).take_while(|_| self.draw_card().is_some()).count()
    }

    /// Moves a card from hand to discard.
    ///
    /// # Errors
    ///
    /// `CardNotInHand` if the uid is not in the hand.
    pub fn discard_card(&mut self, uid: &str) -> CoreResult<()> {
        let index = self
            .hand
            .iter()
            .position(|u| u == uid)
            .ok_or_else(|| CoreError::CardNotInHand {
                uid: uid.to_string(),
            })?;
        let uid = self.hand.remove(index);
        self.discard.push(uid);
        Ok(())
    }

    /// Shuffles the deck in place.
    pub fn shuffle_deck<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.deck.shuffle(rng);
    }

    /// Any owned card by uid.
    #[must_use]
    pub fn card(&self, uid: &str) -> Option<&Card> {
        self.cards.get(uid)
    }

    /// Card by uid if it is in the hand.
    #[must_use]
    pub fn hand_card(&self, uid: &str) -> Option<&Card> {
        self.zone_card(&self.hand, uid)
    }

    /// Card by uid if it is in the deck.
    #[must_use]
    pub fn deck_card(&self, uid: &str) -> Option<&Card> {
        self.zone_card(&self.deck, uid)
    }

    /// Card by uid if it is in the discard pile.
    #[must_use]
    pub fn discard_pile_card(&self, uid: &str) -> Option<&Card> {
        self.zone_card(&self.discard, uid)
    }

    fn zone_card(&self, zone: &[String], uid: &str) -> Option<&Card> {
        zone.iter().find(|u| *u == uid).and_then(|u| self.cards.get(u))
    }

    /// Zone currently holding `uid`.
    #[must_use]
    pub fn zone_of(&self, uid: &str) -> Option<Zone> {
        if self.hand.iter().any(|u| u == uid) {
            Some(Zone::Hand)
        } else if self.deck.iter().any(|u| u == uid) {
            Some(Zone::Deck)
        } else if self.discard.iter().any(|u| u == uid) {
            Some(Zone::Discard)
        } else {
            None
        }
    }

    /// Uids in the deck, top first.
    #[must_use]
    pub fn deck(&self) -> &[String] {
        &self.deck
    }

    /// Uids in the hand.
    #[must_use]
    pub fn hand(&self) -> &[String] {
        &self.hand
    }

    /// Uids in the discard pile.
    #[must_use]
    pub fn discard(&self) -> &[String] {
        &self.discard
    }

    /// Number of owned cards.
    #[must_use]
    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    // ========================================================================
    // HISTORY
    // ========================================================================

    /// Appends to the action log.
    pub fn add_history(&mut self, entry: HistoryEntry) {
        self.history.push(entry);
    }

    /// Action log, oldest first.
    #[must_use]
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{CardKind, StatBoost};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn card(uid: &str) -> Card {
        Card {
            card_id: "card_sharpen".into(),
            uid: uid.into(),
            owner: SeatId(0),
            name: "Sharpen".into(),
            description: String::new(),
            cost: 1,
            kind: CardKind::StatBoost {
                boost: StatBoost::default(),
            },
        }
    }

    fn zones_exclusive(p: &Player) -> bool {
        p.hand()
            .iter()
            .all(|u| !p.deck().contains(u) && !p.discard().contains(u))
            && p.deck().iter().all(|u| !p.discard().contains(u))
    }

    #[test]
    fn test_ready_requires_cards() {
        let mut p = Player::new(SeatId(0));
        p.ready = true;
        assert!(!p.is_ready());
        p.add_card_to_deck(card("c1"));
        assert!(p.is_ready());
    }

    #[test]
    fn test_zones_stay_exclusive() {
        let mut p = Player::new(SeatId(0));
        for i in 0..6 {
            p.add_card_to_deck(card(&format!("c{i}")));
        }
        p.shuffle_deck(&mut ChaCha8Rng::seed_from_u64(1));
        assert_eq!(p.draw_cards(3), 3);
        assert!(zones_exclusive(&p));

        let uid = p.hand()[0].clone();
        p.discard_card(&uid).unwrap();
        assert_eq!(p.zone_of(&uid), Some(Zone::Discard));
        assert!(p.hand_card(&uid).is_none());
        assert!(p.discard_pile_card(&uid).is_some());
        assert!(zones_exclusive(&p));

        assert_eq!(
            p.discard_card(&uid),
            Err(CoreError::CardNotInHand { uid: uid.clone() })
        );
    }

    #[test]
    fn test_draw_from_empty_deck() {
        let mut p = Player::new(SeatId(1));
        assert!(p.draw_card().is_none());
        p.add_card_to_deck(card("only"));
        assert_eq!(p.draw_cards(5), 1);
        assert!(p.deck_card("only").is_none());
    }

    #[test]
    fn test_connected_or_ai() {
        let mut p = Player::new(SeatId(1));
        assert!(!p.is_connected());
        p.is_ai = true;
        assert!(p.is_connected());
    }

    #[test]
    fn test_seat_wire() {
        assert_eq!(SeatId::from_wire(-1), None);
        assert_eq!(SeatId::from_wire(1), Some(SeatId(1)));
        assert_eq!(SeatId(3).to_wire(), 3);
    }
}
