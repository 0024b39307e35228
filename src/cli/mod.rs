pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "moltpulse")]
#[command(about = "Daily Moltbook community trend reports", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/moltpulse/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the JSON API
    Serve {
        /// Port to listen on (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Crawl interval (e.g., "6h", "1d"); "off" disables scheduled crawls
        #[arg(long)]
        crawl_every: Option<String>,

        /// Crawl once immediately on start
        #[arg(long)]
        crawl_now: bool,
    },
    /// Crawl Moltbook once and print what was found
    Crawl {
        /// Build today's report and store it
        #[arg(long)]
        save: bool,
    },
    /// Print the fallback report as JSON
    Mock,
}
