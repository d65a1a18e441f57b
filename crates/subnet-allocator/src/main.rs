//! subnet-alloc: RFC 3531 subnet allocation from the command line
//!
//! Usage:
//!   subnet-alloc first 208.79.88.0/21 23 -a 208.79.89.0/25 -a 208.79.91.0/24
//!   subnet-alloc available 10.0.0.0/16 24 --allocated-file in-use.txt
//!   subnet-alloc candidates 10.0.0.0/16 20 --strategy leftmost

mod cli;

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use std::process::ExitCode;
use subnet_allocator::{enumerate, AllocatorConfig, Block, Strategy};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands, OutputFormat};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration, command-line strategy wins
    let mut config = match cli.config {
        Some(ref path) => AllocatorConfig::load_from(path)?,
        None => AllocatorConfig::default(),
    };
    if let Some(strategy) = cli.strategy {
        config.strategy = strategy;
    }
    tracing::info!(strategy = %config.strategy, "Configuration loaded");

    match cli.command {
        Commands::First(query) => {
            let allocator = query.allocator(&config)?;
            let found = allocator.first_unused_with(query.size, config.strategy)?;
            let Some(block) = found else {
                eprintln!("No free /{} block in {}", query.size, query.supernet);
                return Ok(ExitCode::FAILURE);
            };
            render(
                cli.format,
                &Report::new(query.supernet, query.size, config.strategy, vec![block]),
            )?;
        }
        Commands::Available { query, limit } => {
            let allocator = query.allocator(&config)?;
            let blocks = match limit {
                Some(limit) => allocator
                    .iter_available(query.size, config.strategy)?
                    .take(limit)
                    .collect(),
                None => allocator.available_with(query.size, config.strategy)?,
            };
            render(
                cli.format,
                &Report::new(query.supernet, query.size, config.strategy, blocks),
            )?;
        }
        Commands::Candidates {
            supernet,
            size,
            limit,
        } => {
            let candidates = enumerate(supernet, size)?;
            let blocks = config
                .strategy
                .ordered(candidates)
                .take(limit.unwrap_or(usize::MAX))
                .collect();
            render(cli.format, &Report::new(supernet, size, config.strategy, blocks))?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Query result as printed or serialized
#[derive(Debug, Serialize)]
struct Report {
    supernet: Block,
    prefix_len: u8,
    strategy: Strategy,
    blocks: Vec<Block>,
}

impl Report {
    fn new(supernet: Block, prefix_len: u8, strategy: Strategy, blocks: Vec<Block>) -> Self {
        Self {
            supernet,
            prefix_len,
            strategy,
            blocks,
        }
    }
}

fn render(format: OutputFormat, report: &Report) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Plain => {
            for block in &report.blocks {
                println!("{}", block);
            }
        }
        OutputFormat::Table => {
            println!(
                "/{} blocks in {} ({}): {}",
                report.prefix_len,
                report.supernet,
                report.strategy,
                report.blocks.len()
            );
            println!();
            println!("{:<4} {:<44} {:<40}", "#", "BLOCK", "LAST ADDRESS");
            for (i, block) in report.blocks.iter().enumerate() {
                let last = Block::new(block.family(), block.last_address(), block.width())?;
                println!("{:<4} {:<44} {:<40}", i + 1, block.to_string(), last.network());
            }
        }
    }
    Ok(())
}
