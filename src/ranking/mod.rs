//! Pairwise ranking core: shuffle, prompt, verdict parsing, consensus
//!
//! Everything in this module is pure and re-entrant; given the same raw
//! verdicts it recomputes the same decisions.

pub mod consensus;
pub mod prompt;
pub mod shuffle;
pub mod verdict;

pub use consensus::{decide_consensus, ConsensusDecision, Placement};
pub use prompt::build_ranking_prompt;
pub use shuffle::Presentation;
pub use verdict::{parse_verdict, ParsedVerdict, RawVerdict, VerdictError};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::exercises::Language;

/// A validated ranking over the language roster: every language carries a
/// rank in {1..=n} and the ranks form a permutation. Judge-level ties are
/// rejected at construction, never coerced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuredRanking {
    ranks: IndexMap<Language, u8>,
}

impl StructuredRanking {
    /// Build from (language, rank) pairs, validating the permutation
    pub fn from_pairs(pairs: &[(Language, u8)]) -> Result<Self, VerdictError> {
        let mut ranks: IndexMap<Language, u8> = IndexMap::new();
        for &(language, rank) in pairs {
            if ranks.insert(language, rank).is_some() {
                return Err(VerdictError::DuplicateLabel(language.to_string()));
            }
        }

        let mut seen: Vec<u8> = ranks.values().copied().collect();
        seen.sort_unstable();
        let expected: Vec<u8> = (1..=ranks.len() as u8).collect();
        if seen != expected {
            return Err(VerdictError::NotAPermutation(seen));
        }

        Ok(Self { ranks })
    }

    pub fn rank_of(&self, language: Language) -> Option<u8> {
        self.ranks.get(&language).copied()
    }

    /// The language holding a given rank
    pub fn language_at_rank(&self, rank: u8) -> Option<Language> {
        self.ranks
            .iter()
            .find(|(_, &r)| r == rank)
            .map(|(&lang, _)| lang)
    }

    pub fn languages(&self) -> impl Iterator<Item = Language> + '_ {
        self.ranks.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}
