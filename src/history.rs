use serde::{
    Deserialize,
    Serialize,
};
use std::{
    collections::VecDeque,
    fmt,
};

/// Classification of a resolved three-dice total.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    High,
    Low,
}

impl Outcome {
    pub fn glyph(self) -> &'static str {
        match self {
            Outcome::High => "🔴",
            Outcome::Low => "🔵",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Outcome::High => "HIGH",
            Outcome::Low => "LOW",
        };
        write!(f, "{name}")
    }
}

pub const HISTORY_CAPACITY: usize = 20;

/// Bounded FIFO of the most recent wager outcomes, oldest first.
/// Exactly one entry is appended per fully-resolved wager.
#[derive(Clone, Debug, Default)]
pub struct HistoryRing {
    entries: VecDeque<Outcome>,
}

impl HistoryRing {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    pub fn from_entries(entries: impl IntoIterator<Item = Outcome>) -> Self {
        let mut ring = Self::new();
        for outcome in entries {
            ring.push(outcome);
        }
        ring
    }

    pub fn push(&mut self, outcome: Outcome) {
        if self.entries.len() == HISTORY_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(outcome);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = Outcome> + '_ {
        self.entries.iter().copied()
    }

    /// Glyph string shown to users, oldest outcome first.
    pub fn glyphs(&self) -> String {
        self.entries.iter().map(|outcome| outcome.glyph()).collect()
    }
}
