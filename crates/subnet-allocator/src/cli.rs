//! Command-line structure for `subnet-alloc`

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use subnet_allocator::{AllocatorConfig, Block, Strategy, SubnetAllocator};

/// Find free subnets inside a supernet using RFC 3531 ordering
#[derive(Parser)]
#[command(name = "subnet-alloc")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format
    #[arg(short, long, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Allocation strategy, overriding the configuration file
    #[arg(short, long, global = true)]
    pub strategy: Option<Strategy>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Plain,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the first unused block of a given size
    First(QueryArgs),

    /// List every unused block of a given size, in allocation order
    Available {
        #[command(flatten)]
        query: QueryArgs,

        /// Stop after this many blocks
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// List candidate blocks in strategy order, ignoring allocations
    Candidates {
        /// Supernet to carve blocks from (e.g. 208.79.88.0/21)
        supernet: Block,

        /// Prefix length of the requested blocks
        size: u8,

        /// Stop after this many blocks
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

/// Supernet, requested size and allocated set shared by the query commands
#[derive(Args)]
pub struct QueryArgs {
    /// Supernet to carve blocks from (e.g. 208.79.88.0/21)
    pub supernet: Block,

    /// Prefix length of the requested block
    pub size: u8,

    /// Block already in use (repeatable)
    #[arg(short, long = "allocated", value_name = "CIDR")]
    pub allocated: Vec<Block>,

    /// File listing blocks in use, one CIDR per line
    #[arg(long, value_name = "PATH")]
    pub allocated_file: Option<PathBuf>,
}

impl QueryArgs {
    /// Build an allocator from the command-line and file allocations
    pub fn allocator(&self, config: &AllocatorConfig) -> Result<SubnetAllocator> {
        let mut allocated = self.allocated.clone();
        if let Some(ref path) = self.allocated_file {
            allocated.extend(read_allocated_file(path)?);
        }

        SubnetAllocator::from_config(self.supernet, allocated, config)
            .with_context(|| format!("Invalid allocation set for {}", self.supernet))
    }
}

/// Read one CIDR per line; blank lines and `#` comments are skipped
pub fn read_allocated_file(path: &Path) -> Result<Vec<Block>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read allocated file: {}", path.display()))?;
    parse_allocated(&content)
        .with_context(|| format!("Failed to parse allocated file: {}", path.display()))
}

fn parse_allocated(content: &str) -> Result<Vec<Block>> {
    content
        .lines()
        .enumerate()
        .map(|(n, line)| (n + 1, line.split('#').next().unwrap_or("").trim()))
        .filter(|(_, line)| !line.is_empty())
        .map(|(n, line)| {
            line.parse::<Block>()
                .with_context(|| format!("line {}: {:?}", n, line))
        })
        .collect()
}
