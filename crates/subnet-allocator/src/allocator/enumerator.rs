//! Candidate block enumeration
//!
//! Splits a supernet into every same-sized sub-block of a target prefix
//! length, in ascending address order. Candidates are computed from their
//! index on demand, so even very large tilings are never materialized.

use crate::models::{low_mask, Block};
use crate::Result;
use std::iter::FusedIterator;

/// Enumerate the sub-blocks of `supernet` with prefix length `prefix_len`
///
/// Returns an empty sequence when the requested block is larger than the
/// supernet, and exactly `[supernet]` when the sizes match.
pub fn enumerate(supernet: Block, prefix_len: u8) -> Result<Candidates> {
    supernet.family().check_prefix_len(prefix_len)?;
    Ok(Candidates::new(supernet, prefix_len))
}

/// Lazy, double-ended sequence of candidate blocks in address order
///
/// Cloning yields an independent cursor, so a sequence can be restarted by
/// keeping a clone of the fresh value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidates {
    supernet: Block,
    prefix_len: u8,
    /// Highest candidate index, `None` when nothing fits
    last_index: Option<u128>,
    /// Inclusive `(front, back)` window of indices not yet yielded
    window: Option<(u128, u128)>,
}

impl Candidates {
    fn new(supernet: Block, prefix_len: u8) -> Self {
        let last_index = prefix_len
            .checked_sub(supernet.prefix_len())
            .map(low_mask);

        Self {
            supernet,
            prefix_len,
            last_index,
            window: last_index.map(|last| (0, last)),
        }
    }

    pub fn supernet(&self) -> Block {
        self.supernet
    }

    /// Prefix length of every candidate
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Index of the highest-addressed candidate, `None` if there are none
    pub fn last_index(&self) -> Option<u128> {
        self.last_index
    }

    /// Total number of candidates, saturating at `u128::MAX`
    pub fn count_total(&self) -> u128 {
        self.last_index
            .map(|last| last.saturating_add(1))
            .unwrap_or(0)
    }

    /// True if no block of this size fits in the supernet
    pub fn is_empty(&self) -> bool {
        self.last_index.is_none()
    }

    /// Candidate at `index` in address order
    pub fn get(&self, index: u128) -> Option<Block> {
        match self.last_index {
            Some(last) if index <= last => Some(self.block_at(index)),
            _ => None,
        }
    }

    /// Block at an index known to be in range
    pub(crate) fn block_at(&self, index: u128) -> Block {
        let host_bits = self.supernet.width() - self.prefix_len;
        let offset = index.checked_shl(u32::from(host_bits)).unwrap_or(0);
        Block::from_raw(
            self.supernet.family(),
            self.supernet.base() + offset,
            self.prefix_len,
        )
    }

    fn remaining(&self) -> Option<u128> {
        self.window
            .and_then(|(front, back)| (back - front).checked_add(1))
    }
}

impl Iterator for Candidates {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        let (front, back) = self.window?;
        self.window = if front == back {
            None
        } else {
            Some((front + 1, back))
        };
        Some(self.block_at(front))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.window {
            None => (0, Some(0)),
            Some(_) => match self.remaining().and_then(|n| usize::try_from(n).ok()) {
                Some(n) => (n, Some(n)),
                None => (usize::MAX, None),
            },
        }
    }
}

impl DoubleEndedIterator for Candidates {
    fn next_back(&mut self) -> Option<Block> {
        let (front, back) = self.window?;
        self.window = if front == back {
            None
        } else {
            Some((front, back - 1))
        };
        Some(self.block_at(back))
    }
}

impl FusedIterator for Candidates {}
