//! Allocator configuration
//!
//! Loaded from a TOML file such as:
//!
//! ```toml
//! strategy = "centermost"
//! ```

use crate::allocator::Strategy;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables consumed by [`SubnetAllocator`](crate::SubnetAllocator)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AllocatorConfig {
    /// Order in which candidate blocks are handed out
    pub strategy: Strategy,
}

impl AllocatorConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        toml::from_str(&content).map_err(|e: toml::de::Error| {
            Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}

/// Generate example configuration file content
pub fn example_config() -> &'static str {
    r#"# Subnet allocator configuration

# Allocation order for candidate blocks: centermost, leftmost or rightmost.
# Centermost hands out the middle of the supernet first and keeps both
# ends free for neighbouring blocks to grow into.
strategy = "centermost"
"#
}
