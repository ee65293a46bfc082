//! Candidate presentation order
//!
//! Judges see the three candidate solutions in a fresh uniformly random
//! order per (exercise, judge) pair so that positional bias cancels out
//! across the run. The permutation is a pure bijection between slot space
//! and language space and is kept so the verdict can be mapped back.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::exercises::Language;

/// The randomized order in which candidates are shown to one judge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Presentation {
    /// Slot i shows the candidate for `shown[i]`
    shown: Vec<Language>,
}

impl Presentation {
    /// Fixed order, for recomputation and tests
    pub fn new(shown: Vec<Language>) -> Self {
        Self { shown }
    }

    /// Uniformly random order over the roster (Fisher-Yates)
    pub fn shuffled<R: Rng>(rng: &mut R, languages: &[Language]) -> Self {
        let mut shown = languages.to_vec();
        shown.shuffle(rng);
        Self { shown }
    }

    /// Languages in slot order
    pub fn slots(&self) -> &[Language] {
        &self.shown
    }

    /// Forward mapping: slot index -> language tag
    pub fn language_at(&self, slot: usize) -> Option<Language> {
        self.shown.get(slot).copied()
    }

    /// Inverse mapping: language tag -> slot index
    pub fn slot_of(&self, language: Language) -> Option<usize> {
        self.shown.iter().position(|&l| l == language)
    }

    pub fn len(&self) -> usize {
        self.shown.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shown.is_empty()
    }
}
