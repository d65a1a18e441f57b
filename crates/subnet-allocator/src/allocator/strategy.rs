//! RFC 3531 allocation strategies
//!
//! A strategy is a permutation of candidate indices. It never looks at
//! allocation state; conflict filtering happens afterwards.
//!
//! Centermost ordering walks outward from the midpoint `(N-1)/2`. When two
//! indices are equally far from it, the higher index comes first:
//!
//! ```text
//! N = 8:  4 3 5 2 6 1 7 0
//! N = 5:  2 3 1 4 0
//! ```

use super::enumerator::Candidates;
use crate::models::Block;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::FusedIterator;
use std::str::FromStr;

/// Order in which candidate blocks are handed out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Ascending address order
    Leftmost,
    /// Descending address order
    Rightmost,
    /// Middle of the range first, spreading outward
    #[default]
    Centermost,
}

impl Strategy {
    /// Every strategy, for iteration in tests and tooling
    pub const ALL: [Strategy; 3] = [Strategy::Leftmost, Strategy::Rightmost, Strategy::Centermost];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Leftmost => "leftmost",
            Strategy::Rightmost => "rightmost",
            Strategy::Centermost => "centermost",
        }
    }

    /// Candidate index emitted at `position` for indices `0..=last_index`
    ///
    /// `position` must not exceed `last_index`.
    pub fn index_at(self, position: u128, last_index: u128) -> u128 {
        debug_assert!(position <= last_index);

        match self {
            Strategy::Leftmost => position,
            Strategy::Rightmost => last_index - position,
            Strategy::Centermost => {
                let mid = last_index / 2;
                if last_index % 2 == 0 {
                    // Odd count: one exact middle index
                    if position == 0 {
                        mid
                    } else if position % 2 == 1 {
                        mid + (position + 1) / 2
                    } else {
                        mid - position / 2
                    }
                } else {
                    // Even count: `mid` and `mid + 1` straddle the midpoint
                    let step = position / 2;
                    if position % 2 == 0 {
                        mid + 1 + step
                    } else {
                        mid - step
                    }
                }
            }
        }
    }

    /// Permute `items` into this strategy's order
    pub fn order<T>(self, items: Vec<T>) -> Vec<T> {
        let Some(last) = items.len().checked_sub(1) else {
            return items;
        };

        let mut rank = vec![0usize; items.len()];
        for position in 0..=last {
            let index = self.index_at(position as u128, last as u128) as usize;
            rank[index] = position;
        }

        let mut ranked: Vec<(usize, T)> = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| (rank[index], item))
            .collect();
        ranked.sort_unstable_by_key(|(position, _)| *position);
        ranked.into_iter().map(|(_, item)| item).collect()
    }

    /// Lazily reorder a fresh candidate sequence
    pub fn ordered(self, candidates: Candidates) -> Ordered {
        Ordered::new(candidates, self)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "leftmost" => Ok(Strategy::Leftmost),
            "rightmost" => Ok(Strategy::Rightmost),
            "centermost" | "centremost" => Ok(Strategy::Centermost),
            other => Err(Error::InvalidStrategy(other.to_string())),
        }
    }
}

/// Candidates in strategy order, computed one at a time
#[derive(Debug, Clone)]
pub struct Ordered {
    candidates: Candidates,
    strategy: Strategy,
    last_index: u128,
    /// Next position to emit, `None` once exhausted
    position: Option<u128>,
}

impl Ordered {
    fn new(candidates: Candidates, strategy: Strategy) -> Self {
        let last_index = candidates.last_index();
        Self {
            candidates,
            strategy,
            last_index: last_index.unwrap_or(0),
            position: last_index.map(|_| 0),
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }
}

impl Iterator for Ordered {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        let position = self.position?;
        self.position = (position < self.last_index).then(|| position + 1);

        let index = self.strategy.index_at(position, self.last_index);
        Some(self.candidates.block_at(index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .position
            .map(|position| (self.last_index - position).checked_add(1));
        match remaining {
            None => (0, Some(0)),
            Some(Some(n)) => match usize::try_from(n) {
                Ok(n) => (n, Some(n)),
                Err(_) => (usize::MAX, None),
            },
            Some(None) => (usize::MAX, None),
        }
    }
}

impl FusedIterator for Ordered {}
