//! Subnet allocator façade
//!
//! Combines candidate enumeration, strategy ordering and conflict filtering
//! against a snapshot of already-allocated blocks. Every query is a pure
//! function of the supernet, the allocated set, the requested prefix length
//! and the strategy; nothing is recorded between calls.

use super::enumerator::{enumerate, Candidates};
use super::strategy::{Ordered, Strategy};
use crate::config::AllocatorConfig;
use crate::models::Block;
use crate::{Error, Result};
use std::iter::FusedIterator;
use tracing::{debug, instrument, trace};

/// Trait for CIDR block allocation queries
pub trait CidrAllocator: Send + Sync {
    /// The address space blocks are carved from
    fn supernet(&self) -> Block;

    /// All free blocks of the given prefix length, in allocation order
    fn available(&self, prefix_len: u8) -> Result<Vec<Block>>;

    /// The first free block of the given prefix length
    fn first_unused(&self, prefix_len: u8) -> Result<Option<Block>>;

    /// Check if a block conflicts with any allocated block
    fn conflicts(&self, block: &Block) -> bool;

    /// Get the number of free blocks for a given prefix length
    fn available_count(&self, prefix_len: u8) -> Result<u128>;
}

/// RFC 3531 subnet allocator over a fixed supernet
///
/// Holds its own copy of the allocated set, so queries never observe
/// concurrent changes to the caller's data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetAllocator {
    /// Parent address space
    supernet: Block,
    /// Blocks excluded from allocation, in caller order
    allocated: Vec<Block>,
    /// Default ordering for queries
    strategy: Strategy,
}

impl SubnetAllocator {
    /// Create an allocator with the default centermost strategy
    ///
    /// Allocated blocks may repeat or nest. Blocks outside the supernet are
    /// accepted and simply never match, but every block must share the
    /// supernet's address family.
    pub fn new(supernet: Block, allocated: impl IntoIterator<Item = Block>) -> Result<Self> {
        let allocated: Vec<Block> = allocated.into_iter().collect();
        check_widths(supernet, &allocated)?;

        Ok(Self {
            supernet,
            allocated,
            strategy: Strategy::default(),
        })
    }

    /// Create an allocator using a loaded configuration
    pub fn from_config(
        supernet: Block,
        allocated: impl IntoIterator<Item = Block>,
        config: &AllocatorConfig,
    ) -> Result<Self> {
        Ok(Self::new(supernet, allocated)?.with_strategy(config.strategy))
    }

    /// Replace the default strategy
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// The allocated snapshot, in the order it was supplied
    pub fn allocated(&self) -> &[Block] {
        &self.allocated
    }

    /// Free blocks in the order of an explicit strategy
    #[instrument(level = "debug", skip(self), fields(supernet = %self.supernet))]
    pub fn available_with(&self, prefix_len: u8, strategy: Strategy) -> Result<Vec<Block>> {
        let blocks: Vec<Block> = self.iter_available(prefix_len, strategy)?.collect();
        debug!(found = blocks.len(), "Computed available blocks");
        Ok(blocks)
    }

    /// First free block under an explicit strategy
    #[instrument(level = "debug", skip(self), fields(supernet = %self.supernet))]
    pub fn first_unused_with(&self, prefix_len: u8, strategy: Strategy) -> Result<Option<Block>> {
        let block = self.iter_available(prefix_len, strategy)?.next();
        match block {
            Some(block) => debug!(%block, "Found unused block"),
            None => debug!("No unused block"),
        }
        Ok(block)
    }

    /// Lazily walk free blocks in strategy order
    pub fn iter_available(&self, prefix_len: u8, strategy: Strategy) -> Result<Available<'_>> {
        let candidates = enumerate(self.supernet, prefix_len)?;
        Ok(Available::new(strategy.ordered(candidates), &self.allocated))
    }
}

impl CidrAllocator for SubnetAllocator {
    fn supernet(&self) -> Block {
        self.supernet
    }

    fn available(&self, prefix_len: u8) -> Result<Vec<Block>> {
        self.available_with(prefix_len, self.strategy)
    }

    fn first_unused(&self, prefix_len: u8) -> Result<Option<Block>> {
        self.first_unused_with(prefix_len, self.strategy)
    }

    fn conflicts(&self, block: &Block) -> bool {
        conflicts_with(&self.allocated, block)
    }

    fn available_count(&self, prefix_len: u8) -> Result<u128> {
        let candidates = enumerate(self.supernet, prefix_len)?;
        Ok(count_free(&candidates, &self.allocated))
    }
}

/// Free blocks of `supernet` against a per-call allocated set
#[instrument(level = "debug", skip(supernet, allocated), fields(supernet = %supernet, allocated = allocated.len()))]
pub fn available(
    supernet: Block,
    allocated: &[Block],
    prefix_len: u8,
    strategy: Strategy,
) -> Result<Vec<Block>> {
    let blocks: Vec<Block> = iter_available(supernet, allocated, prefix_len, strategy)?.collect();
    debug!(found = blocks.len(), "Computed available blocks");
    Ok(blocks)
}

/// First free block of `supernet` against a per-call allocated set
pub fn first_unused(
    supernet: Block,
    allocated: &[Block],
    prefix_len: u8,
    strategy: Strategy,
) -> Result<Option<Block>> {
    Ok(iter_available(supernet, allocated, prefix_len, strategy)?.next())
}

/// Lazy form of [`available`]
pub fn iter_available(
    supernet: Block,
    allocated: &[Block],
    prefix_len: u8,
    strategy: Strategy,
) -> Result<Available<'_>> {
    check_widths(supernet, allocated)?;
    let candidates = enumerate(supernet, prefix_len)?;
    Ok(Available::new(strategy.ordered(candidates), allocated))
}

/// Ordered candidates with conflicting blocks filtered out
#[derive(Debug, Clone)]
pub struct Available<'a> {
    ordered: Ordered,
    allocated: &'a [Block],
}

impl<'a> Available<'a> {
    fn new(ordered: Ordered, allocated: &'a [Block]) -> Self {
        trace!(strategy = %ordered.strategy(), allocated = allocated.len(), "Filtering candidates");
        Self { ordered, allocated }
    }
}

impl Iterator for Available<'_> {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        for candidate in self.ordered.by_ref() {
            if conflicts_with(self.allocated, &candidate) {
                trace!(%candidate, "Skipping allocated candidate");
                continue;
            }
            return Some(candidate);
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.ordered.size_hint().1)
    }
}

impl FusedIterator for Available<'_> {}

/// True if `block` equals, contains, or is contained by an allocated block
fn conflicts_with(allocated: &[Block], block: &Block) -> bool {
    allocated.iter().any(|existing| block.overlaps(existing))
}

fn check_widths(supernet: Block, allocated: &[Block]) -> Result<()> {
    match allocated.iter().find(|b| b.family() != supernet.family()) {
        Some(mismatched) => Err(Error::WidthMismatch {
            expected: supernet.width(),
            found: mismatched.width(),
        }),
        None => Ok(()),
    }
}

/// Count candidates not covered by any allocated block
///
/// Each allocated block touching the supernet excludes a prefix-aligned run
/// of candidates. Runs are either nested or disjoint, so after dropping
/// nested ones their sizes simply add up.
fn count_free(candidates: &Candidates, allocated: &[Block]) -> u128 {
    let Some(last_index) = candidates.last_index() else {
        return 0;
    };

    let supernet = candidates.supernet();
    let prefix_len = candidates.prefix_len();

    let mut regions: Vec<Block> = Vec::with_capacity(allocated.len());
    for block in allocated {
        if block.contains(&supernet) {
            return 0;
        }
        if !supernet.contains(block) {
            continue;
        }
        // Widen blocks smaller than a candidate to the candidate holding them
        let region = if block.prefix_len() > prefix_len {
            Block::from_raw(
                block.family(),
                block.base() & !crate::models::low_mask(block.width() - prefix_len),
                prefix_len,
            )
        } else {
            *block
        };
        regions.push(region);
    }

    regions.sort_unstable_by_key(|r| (r.base(), r.prefix_len()));

    let mut excluded: u128 = 0;
    let mut outer: Option<Block> = None;
    for region in regions {
        if outer.is_some_and(|o| o.contains(&region)) {
            continue;
        }
        // Disjoint runs overflow only when they tile all 2^128 candidates
        excluded = match excluded.checked_add(1u128 << (prefix_len - region.prefix_len())) {
            Some(sum) => sum,
            None => return 0,
        };
        outer = Some(region);
    }

    // Counted from the last index so a full ::/0 tiling stays exact
    match excluded {
        0 => candidates.count_total(),
        n => last_index - (n - 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(s: &str) -> Block {
        s.parse().unwrap()
    }

    fn blocks(list: &[&str]) -> Vec<Block> {
        list.iter().map(|s| block(s)).collect()
    }

    fn strings(list: &[Block]) -> Vec<String> {
        list.iter().map(|b| b.to_string()).collect()
    }

    fn scenario() -> SubnetAllocator {
        SubnetAllocator::new(
            block("208.79.88.0/21"),
            blocks(&["208.79.89.0/25", "208.79.91.0/24"]),
        )
        .unwrap()
    }

    #[test]
    fn test_allocator_creation() {
        let allocator = scenario();
        assert_eq!(allocator.supernet(), block("208.79.88.0/21"));
        assert_eq!(allocator.strategy(), Strategy::Centermost);
        assert_eq!(
            allocator.allocated(),
            &blocks(&["208.79.89.0/25", "208.79.91.0/24"])[..]
        );
    }

    #[test]
    fn test_first_unused_23() {
        let allocator = scenario();
        assert_eq!(
            allocator.first_unused(23).unwrap(),
            Some(block("208.79.92.0/23"))
        );
    }

    #[test]
    fn test_first_unused_24_leftmost() {
        let allocator = scenario().with_strategy(Strategy::Leftmost);
        assert_eq!(
            allocator.first_unused(24).unwrap(),
            Some(block("208.79.88.0/24"))
        );
    }

    #[test]
    fn test_first_unused_24_centermost() {
        let allocator = scenario();
        assert_eq!(
            allocator.first_unused(24).unwrap(),
            Some(block("208.79.92.0/24"))
        );
    }

    #[test]
    fn test_available_22() {
        let allocator = scenario();
        for strategy in Strategy::ALL {
            assert_eq!(
                strings(&allocator.available_with(22, strategy).unwrap()),
                vec!["208.79.92.0/22"]
            );
        }
    }

    #[test]
    fn test_available_larger_than_supernet() {
        let allocator = scenario();
        assert!(allocator.available(20).unwrap().is_empty());
        assert_eq!(allocator.first_unused(20).unwrap(), None);
        assert_eq!(allocator.available_count(20).unwrap(), 0);
    }

    #[test]
    fn test_available_24_orders() {
        let allocator = scenario();

        assert_eq!(
            strings(&allocator.available(24).unwrap()),
            vec![
                "208.79.92.0/24",
                "208.79.93.0/24",
                "208.79.90.0/24",
                "208.79.94.0/24",
                "208.79.95.0/24",
                "208.79.88.0/24",
            ]
        );

        assert_eq!(
            strings(&allocator.available_with(24, Strategy::Leftmost).unwrap()),
            vec![
                "208.79.88.0/24",
                "208.79.90.0/24",
                "208.79.92.0/24",
                "208.79.93.0/24",
                "208.79.94.0/24",
                "208.79.95.0/24",
            ]
        );

        assert_eq!(
            strings(&allocator.available_with(24, Strategy::Rightmost).unwrap()),
            vec![
                "208.79.95.0/24",
                "208.79.94.0/24",
                "208.79.93.0/24",
                "208.79.92.0/24",
                "208.79.90.0/24",
                "208.79.88.0/24",
            ]
        );
    }

    #[test]
    fn test_available_whole_supernet() {
        let allocator = scenario();
        assert!(allocator.available(21).unwrap().is_empty());

        let empty = SubnetAllocator::new(block("208.79.88.0/21"), Vec::new()).unwrap();
        assert_eq!(
            empty.available(21).unwrap(),
            vec![block("208.79.88.0/21")]
        );
    }

    #[test]
    fn test_invalid_prefix_length() {
        let allocator = scenario();
        let result = allocator.available(33);
        assert!(matches!(
            result,
            Err(Error::InvalidPrefixLength {
                prefix_len: 33,
                width: 32
            })
        ));
        assert!(allocator.first_unused(40).is_err());
        assert!(allocator.available_count(33).is_err());
    }

    #[test]
    fn test_width_mismatch() {
        let result = SubnetAllocator::new(block("10.0.0.0/8"), blocks(&["2001:db8::/32"]));
        assert!(matches!(
            result,
            Err(Error::WidthMismatch {
                expected: 32,
                found: 128
            })
        ));

        let result = available(
            block("2001:db8::/32"),
            &blocks(&["10.0.0.0/8"]),
            48,
            Strategy::Centermost,
        );
        assert!(result.unwrap_err().is_invalid_prefix_length());
    }

    #[test]
    fn test_duplicates_and_nested_allocations() {
        let allocator = SubnetAllocator::new(
            block("10.0.0.0/24"),
            blocks(&["10.0.0.0/26", "10.0.0.0/26", "10.0.0.16/28", "10.0.0.0/25"]),
        )
        .unwrap();

        assert_eq!(
            strings(&allocator.available_with(26, Strategy::Leftmost).unwrap()),
            vec!["10.0.0.128/26", "10.0.0.192/26"]
        );
        assert_eq!(allocator.available_count(26).unwrap(), 2);
        assert_eq!(allocator.available_count(28).unwrap(), 8);
    }

    #[test]
    fn test_allocation_outside_supernet_is_ignored() {
        let allocator =
            SubnetAllocator::new(block("10.0.0.0/24"), blocks(&["192.168.0.0/16"])).unwrap();
        assert_eq!(allocator.available(26).unwrap().len(), 4);
        assert_eq!(allocator.available_count(26).unwrap(), 4);
    }

    #[test]
    fn test_allocation_covering_supernet() {
        let allocator =
            SubnetAllocator::new(block("10.0.0.0/24"), blocks(&["10.0.0.0/16"])).unwrap();
        assert!(allocator.available(26).unwrap().is_empty());
        assert_eq!(allocator.first_unused(32).unwrap(), None);
        assert_eq!(allocator.available_count(30).unwrap(), 0);
    }

    #[test]
    fn test_conflicts() {
        let allocator = scenario();
        assert!(allocator.conflicts(&block("208.79.91.0/24")));
        assert!(allocator.conflicts(&block("208.79.88.0/23")));
        assert!(allocator.conflicts(&block("208.79.89.64/26")));
        assert!(!allocator.conflicts(&block("208.79.89.128/25")));
        assert!(!allocator.conflicts(&block("208.79.92.0/22")));
    }

    #[test]
    fn test_available_count_matches_iteration() {
        let allocator = scenario();
        for prefix_len in 21..=28 {
            let listed = allocator.available(prefix_len).unwrap().len() as u128;
            assert_eq!(
                allocator.available_count(prefix_len).unwrap(),
                listed,
                "prefix /{}",
                prefix_len
            );
        }
    }

    #[test]
    fn test_available_count_large_ipv6() {
        let allocator =
            SubnetAllocator::new(block("2001:db8::/32"), blocks(&["2001:db8:8000::/33"])).unwrap();
        assert_eq!(allocator.available_count(64).unwrap(), 1u128 << 31);
    }

    #[test]
    fn test_available_count_full_ipv6_space() {
        let allocator = SubnetAllocator::new(block("::/0"), blocks(&["::/1"])).unwrap();
        assert_eq!(allocator.available_count(128).unwrap(), 1u128 << 127);

        let allocator =
            SubnetAllocator::new(block("::/0"), blocks(&["::/1", "8000::/128"])).unwrap();
        assert_eq!(allocator.available_count(128).unwrap(), (1u128 << 127) - 1);

        let allocator = SubnetAllocator::new(block("::/0"), blocks(&["::1/128"])).unwrap();
        assert_eq!(allocator.available_count(128).unwrap(), u128::MAX);

        let allocator =
            SubnetAllocator::new(block("::/0"), blocks(&["::/1", "8000::/1"])).unwrap();
        assert_eq!(allocator.available_count(128).unwrap(), 0);

        // Only the single unconstrained 2^128 tiling saturates
        let allocator = SubnetAllocator::new(block("::/0"), Vec::new()).unwrap();
        assert_eq!(allocator.available_count(128).unwrap(), u128::MAX);
    }

    #[test]
    fn test_first_unused_is_lazy_on_huge_space() {
        let allocator = SubnetAllocator::new(block("::/0"), Vec::new()).unwrap();
        assert_eq!(
            allocator.first_unused(128).unwrap(),
            Some(block("8000::/128"))
        );
        assert_eq!(
            allocator.first_unused_with(128, Strategy::Rightmost).unwrap(),
            Some(block("ffff:ffff:ffff:ffff:ffff:ffff:ffff:ffff/128"))
        );
    }

    #[test]
    fn test_free_functions_match_allocator() {
        let allocator = scenario();
        let supernet = block("208.79.88.0/21");
        let allocated = blocks(&["208.79.89.0/25", "208.79.91.0/24"]);

        for strategy in Strategy::ALL {
            assert_eq!(
                available(supernet, &allocated, 24, strategy).unwrap(),
                allocator.available_with(24, strategy).unwrap()
            );
            assert_eq!(
                first_unused(supernet, &allocated, 23, strategy).unwrap(),
                allocator.first_unused_with(23, strategy).unwrap()
            );
        }
    }

    #[test]
    fn test_from_config() {
        let config = AllocatorConfig {
            strategy: Strategy::Rightmost,
        };
        let allocator =
            SubnetAllocator::from_config(block("10.0.0.0/24"), Vec::new(), &config).unwrap();
        assert_eq!(allocator.strategy(), Strategy::Rightmost);
        assert_eq!(
            allocator.first_unused(26).unwrap(),
            Some(block("10.0.0.192/26"))
        );
    }

    #[test]
    fn test_idempotent_queries() {
        let allocator = scenario();
        let first = allocator.available(25).unwrap();
        let second = allocator.available(25).unwrap();
        assert_eq!(first, second);
    }
}
