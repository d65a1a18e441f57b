//! CIDR block allocation
//!
//! Provides the three stages of an RFC 3531 allocation query:
//! - Candidate enumeration (every block of a size inside a supernet)
//! - Strategy ordering (centermost, leftmost, rightmost)
//! - Conflict filtering against already-allocated blocks

mod enumerator;
mod strategy;
mod subnet_allocator;

pub use enumerator::{enumerate, Candidates};
pub use strategy::{Ordered, Strategy};
pub use subnet_allocator::{
    available, first_unused, iter_available, Available, CidrAllocator, SubnetAllocator,
};
