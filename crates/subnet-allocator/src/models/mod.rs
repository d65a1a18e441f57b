//! Data models for subnet allocation

mod block;

pub(crate) use block::low_mask;
pub use block::{AddressFamily, Block};
