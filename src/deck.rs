//! Swipeable discovery deck.
//!
//! The deck owns an ordered sequence of facts and a cursor pointing at the
//! card on top of the stack. Swiping dismisses the top card and moves the
//! cursor one step down; dismissed cards never come back.
//!
//! Cards are revealed in *runs*. `reset` makes every card one run with the
//! last card on top. Cards appended while a run is showing wait below it;
//! once the run is exhausted (or immediately, if nothing is showing) the
//! waiting cards become the next run, again newest on top.
use crate::model::Fact;

/// Which way a card left the screen. Both directions simply advance the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Left,
    Right,
}

/// Outcome of a successful swipe, forwarded to collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Swipe {
    pub direction: SwipeDirection,
    /// Index of the dismissed card.
    pub index: usize,
    /// Id of the dismissed card.
    pub fact_id: String,
    /// Id of the card one step below the new top, whose cover should be
    /// requested ahead of time.
    pub preload: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckStatus {
    /// Nothing has ever been loaded (or the last reset was empty).
    Empty,
    /// A card is showing.
    Active,
    /// Every card has been swiped; the caller may request a new batch.
    Exhausted,
}

/// Rendering descriptor of a card by its distance from the top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardLayout {
    pub scale: f32,
    /// Upward lift, 15 units per stack step.
    pub lift: u16,
    pub visible: bool,
}

impl CardLayout {
    /// Cards deeper than this are hidden.
    pub const VISIBLE_DEPTH: usize = 3;

    pub fn for_position(position: usize) -> Self {
        let visible = position < Self::VISIBLE_DEPTH;
        let scale = if visible {
            1.0 - position as f32 * 0.05
        } else {
            0.85
        };
        Self {
            scale,
            lift: (position.min(Self::VISIBLE_DEPTH) * 15) as u16,
            visible,
        }
    }
}

#[derive(Debug, Default)]
pub struct Deck {
    items: Vec<Fact>,
    /// Top card, `None` when empty or exhausted.
    cursor: Option<usize>,
    /// Lowest index of the current run.
    floor: usize,
    /// Cards at or above this index have not been revealed yet.
    revealed: usize,
}

impl Deck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every card; the last one becomes the top.
    pub fn reset(&mut self, items: Vec<Fact>) {
        self.items = Vec::with_capacity(items.len());
        for item in items {
            if !self.contains(&item.id) {
                self.items.push(item);
            }
        }
        self.floor = 0;
        self.revealed = self.items.len();
        self.cursor = self.items.len().checked_sub(1);
    }

    /// Add a card unless one with the same id exists. Returns whether it
    /// was added.
    ///
    /// The cursor stays put while a card is showing; if nothing is showing
    /// the waiting cards are revealed.
    pub fn append(&mut self, item: Fact) -> bool {
        if self.contains(&item.id) {
            tracing::debug!(id = %item.id, "Skipping duplicate fact");
            return false;
        }
        self.items.push(item);
        if self.cursor.is_none() {
            self.reveal_waiting();
        }
        true
    }

    /// Dismiss the top card. No-op when nothing is showing.
    pub fn swipe(&mut self, direction: SwipeDirection) -> Option<Swipe> {
        let index = self.cursor?;
        self.on_swiped(index, direction)
    }

    /// Gesture callback: the card at `index` left the screen.
    ///
    /// Only the top card can be swiped; any other index is ignored.
    pub fn on_swiped(&mut self, index: usize, direction: SwipeDirection) -> Option<Swipe> {
        if self.cursor != Some(index) {
            return None;
        }
        self.dismiss(index, direction)
    }

    fn dismiss(&mut self, index: usize, direction: SwipeDirection) -> Option<Swipe> {
        let fact_id = self.items.get(index)?.id.clone();
        self.cursor = if index > self.floor {
            Some(index - 1)
        } else {
            None
        };
        if self.cursor.is_none() {
            self.reveal_waiting();
        }

        let preload = self
            .cursor
            .and_then(|c| c.checked_sub(1))
            .filter(|&i| i >= self.floor)
            .and_then(|i| self.items.get(i))
            .map(|f| f.id.clone());

        Some(Swipe {
            direction,
            index,
            fact_id,
            preload,
        })
    }

    /// Start a new run from the cards appended since the last one.
    fn reveal_waiting(&mut self) {
        if self.revealed < self.items.len() {
            self.floor = self.revealed;
            self.revealed = self.items.len();
            self.cursor = Some(self.items.len() - 1);
            tracing::debug!(
                floor = self.floor,
                top = self.items.len() - 1,
                "Revealed waiting cards"
            );
        }
    }

    pub fn current(&self) -> Option<&Fact> {
        self.cursor.and_then(|i| self.items.get(i))
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn status(&self) -> DeckStatus {
        match (self.cursor, self.items.is_empty()) {
            (Some(_), _) => DeckStatus::Active,
            (None, true) => DeckStatus::Empty,
            (None, false) => DeckStatus::Exhausted,
        }
    }

    /// Cards from the top downward, paired with their stack position.
    pub fn stack(&self, depth: usize) -> impl Iterator<Item = (usize, &Fact)> + '_ {
        let run: &[Fact] = match self.cursor {
            Some(top) => &self.items[self.floor..=top],
            None => &[],
        };
        run.iter().rev().take(depth).enumerate()
    }

    /// Cards left in the current run, including the top card.
    pub fn remaining(&self) -> usize {
        self.cursor.map_or(0, |c| c + 1 - self.floor)
    }

    /// Cards appended but not yet revealed.
    pub fn waiting(&self) -> usize {
        self.items.len() - self.revealed
    }

    pub fn items(&self) -> &[Fact] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Fact> {
        self.items.iter().find(|f| f.id == id)
    }

    fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|f| f.id == id)
    }
}
