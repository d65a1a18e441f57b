//! RFC 3531 Subnet Allocator
//!
//! Hands out fixed-size address blocks from a supernet while respecting the
//! blocks already in use:
//! - Candidate enumeration (all same-sized blocks tiling the supernet)
//! - RFC 3531 ordering (centermost, leftmost, rightmost)
//! - Conflict filtering against a caller-supplied allocated set
//!
//! Queries are pure: the allocator never records allocations. Callers commit
//! the returned block to their own records and pass the updated set next time.
//!
//! # Example
//!
//! ```
//! use subnet_allocator::{Block, CidrAllocator, SubnetAllocator};
//!
//! let supernet: Block = "208.79.88.0/21".parse().unwrap();
//! let allocated = ["208.79.89.0/25", "208.79.91.0/24"]
//!     .iter()
//!     .map(|s| s.parse::<Block>().unwrap());
//!
//! let allocator = SubnetAllocator::new(supernet, allocated).unwrap();
//! let block = allocator.first_unused(23).unwrap();
//! assert_eq!(block.unwrap().to_string(), "208.79.92.0/23");
//! ```

pub mod allocator;
pub mod config;
pub mod error;
pub mod models;

// Re-export core types
pub use allocator::{
    enumerate, Available, Candidates, CidrAllocator, Ordered, Strategy, SubnetAllocator,
};
pub use config::AllocatorConfig;
pub use error::{Error, Result};
pub use models::{AddressFamily, Block};
