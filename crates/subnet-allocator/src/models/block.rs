//! Address block model
//!
//! A [`Block`] is a prefix-aligned address range: a base address plus a
//! prefix length, for a fixed address family. Blocks are always stored in
//! canonical form (host bits zeroed), so derived equality is value equality.

use crate::{Error, Result};
use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// Address family of a block, which fixes its bit width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressFamily {
    /// 32-bit addresses
    V4,
    /// 128-bit addresses
    V6,
}

impl AddressFamily {
    /// Bit width of addresses in this family
    pub const fn width(self) -> u8 {
        match self {
            AddressFamily::V4 => 32,
            AddressFamily::V6 => 128,
        }
    }

    /// Mask covering every valid address bit
    const fn address_mask(self) -> u128 {
        match self {
            AddressFamily::V4 => u32::MAX as u128,
            AddressFamily::V6 => u128::MAX,
        }
    }

    /// Reject prefix lengths wider than the family
    pub fn check_prefix_len(self, prefix_len: u8) -> Result<()> {
        if prefix_len > self.width() {
            return Err(Error::InvalidPrefixLength {
                prefix_len,
                width: self.width(),
            });
        }
        Ok(())
    }
}

/// Mask of the low `host_bits` bits
pub(crate) const fn low_mask(host_bits: u8) -> u128 {
    if host_bits == 0 {
        0
    } else if host_bits >= 128 {
        u128::MAX
    } else {
        (1u128 << host_bits) - 1
    }
}

/// A prefix-aligned address block (CIDR prefix)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Block {
    family: AddressFamily,
    base: u128,
    prefix_len: u8,
}

impl Block {
    /// Create a block, masking off the host bits of `base`
    ///
    /// Fails if `prefix_len` exceeds the family width or `base` does not fit
    /// in it.
    pub fn new(family: AddressFamily, base: u128, prefix_len: u8) -> Result<Self> {
        family.check_prefix_len(prefix_len)?;

        if base & !family.address_mask() != 0 {
            return Err(Error::AddressOutOfRange {
                base,
                width: family.width(),
            });
        }

        let host_bits = family.width() - prefix_len;
        Ok(Self {
            family,
            base: base & !low_mask(host_bits),
            prefix_len,
        })
    }

    /// IPv4 block from an address and prefix length
    pub fn v4(addr: Ipv4Addr, prefix_len: u8) -> Result<Self> {
        Self::new(AddressFamily::V4, u32::from(addr) as u128, prefix_len)
    }

    /// IPv6 block from an address and prefix length
    pub fn v6(addr: Ipv6Addr, prefix_len: u8) -> Result<Self> {
        Self::new(AddressFamily::V6, u128::from(addr), prefix_len)
    }

    /// Build from parts already known to be canonical
    pub(crate) const fn from_raw(family: AddressFamily, base: u128, prefix_len: u8) -> Self {
        Self {
            family,
            base,
            prefix_len,
        }
    }

    pub fn family(&self) -> AddressFamily {
        self.family
    }

    /// Bit width of this block's family
    pub fn width(&self) -> u8 {
        self.family.width()
    }

    /// Normalized base address as an integer
    pub fn base(&self) -> u128 {
        self.base
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Number of host bits below the prefix
    pub fn host_bits(&self) -> u8 {
        self.width() - self.prefix_len
    }

    /// Base address as an `IpAddr`
    pub fn network(&self) -> IpAddr {
        match self.family {
            AddressFamily::V4 => IpAddr::V4(Ipv4Addr::from(self.base as u32)),
            AddressFamily::V6 => IpAddr::V6(Ipv6Addr::from(self.base)),
        }
    }

    /// Highest address in the block as an integer
    pub fn last_address(&self) -> u128 {
        self.base | low_mask(self.host_bits())
    }

    /// Number of addresses covered, saturating at `u128::MAX` for `::/0`
    pub fn size(&self) -> u128 {
        match self.host_bits() {
            128 => u128::MAX,
            bits => 1u128 << bits,
        }
    }

    /// True if `other` lies entirely within this block
    ///
    /// Reflexive and transitive. Blocks of different families never contain
    /// each other.
    pub fn contains(&self, other: &Block) -> bool {
        self.family == other.family
            && self.prefix_len <= other.prefix_len
            && other.base & !low_mask(self.host_bits()) == self.base
    }

    /// True if the blocks are equal or one contains the other
    ///
    /// Prefix-aligned blocks never partially overlap, so this is the full
    /// conflict test.
    pub fn overlaps(&self, other: &Block) -> bool {
        self == other || self.contains(other) || other.contains(self)
    }

    /// Convert to an `ipnet` network
    pub fn to_ipnet(&self) -> IpNet {
        match self.network() {
            IpAddr::V4(addr) => IpNet::V4(Ipv4Net::new_assert(addr, self.prefix_len)),
            IpAddr::V6(addr) => IpNet::V6(Ipv6Net::new_assert(addr, self.prefix_len)),
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network(), self.prefix_len)
    }
}

impl FromStr for Block {
    type Err = Error;

    /// Parse CIDR text; a bare address becomes a single-address block
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.contains('/') {
            let net: IpNet = s.parse()?;
            Ok(Block::from(net))
        } else {
            let addr: IpAddr = s
                .parse()
                .map_err(|e: std::net::AddrParseError| Error::InvalidCidr(format!("{s}: {e}")))?;
            Ok(Block::from(IpNet::from(addr)))
        }
    }
}

impl From<Ipv4Net> for Block {
    fn from(net: Ipv4Net) -> Self {
        let net = net.trunc();
        Block::from_raw(
            AddressFamily::V4,
            u32::from(net.network()) as u128,
            net.prefix_len(),
        )
    }
}

impl From<Ipv6Net> for Block {
    fn from(net: Ipv6Net) -> Self {
        let net = net.trunc();
        Block::from_raw(AddressFamily::V6, u128::from(net.network()), net.prefix_len())
    }
}

impl From<IpNet> for Block {
    fn from(net: IpNet) -> Self {
        match net {
            IpNet::V4(net) => net.into(),
            IpNet::V6(net) => net.into(),
        }
    }
}

impl From<Block> for IpNet {
    fn from(block: Block) -> Self {
        block.to_ipnet()
    }
}

impl Serialize for Block {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
