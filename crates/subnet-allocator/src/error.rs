//! Error types for subnet allocation

use thiserror::Error;

/// Result type for allocation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Subnet allocator errors
///
/// Exhaustion and oversized requests are not errors: they surface as empty
/// results or `None`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    // Block errors
    #[error("Invalid prefix length /{prefix_len}: must be between 0 and {width}")]
    InvalidPrefixLength { prefix_len: u8, width: u8 },

    #[error("Address width mismatch: expected {expected}-bit block, found {found}-bit block")]
    WidthMismatch { expected: u8, found: u8 },

    #[error("Base address {base:#x} does not fit in {width} bits")]
    AddressOutOfRange { base: u128, width: u8 },

    // Boundary errors
    #[error("Invalid CIDR: {0}")]
    InvalidCidr(String),

    #[error("Invalid allocation strategy: {0}")]
    InvalidStrategy(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for prefix-length and width violations
    pub fn is_invalid_prefix_length(&self) -> bool {
        matches!(
            self,
            Error::InvalidPrefixLength { .. } | Error::WidthMismatch { .. }
        )
    }
}

impl From<ipnet::AddrParseError> for Error {
    fn from(e: ipnet::AddrParseError) -> Self {
        Error::InvalidCidr(e.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}
