//! gunkv CLI
//!
//! Reads and writes graph nodes in a local gunkv database.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use gunkv::{Config, GetOptions, GraphAdapter, GunGraph, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// gunkv CLI
#[derive(Parser, Debug)]
#[command(name = "gunkv")]
#[command(about = "Embedded storage for GUN graph nodes")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, global = true, default_value = "./gunkv_data")]
    data_dir: String,

    /// Field count at which a node is stored wide
    #[arg(long, global = true, default_value_t = gunkv::config::DEFAULT_WIDE_NODE_THRESHOLD)]
    wide_threshold: usize,

    /// Maximum fields returned by one wide-node read
    #[arg(long, global = true, default_value_t = gunkv::config::DEFAULT_GET_MAX_KEYS)]
    max_keys: usize,

    /// Map size limit in MB
    #[arg(short = 'm', long, global = true, default_value = "1024")]
    map_size_mb: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a node as JSON
    Get {
        /// Soul of the node
        soul: String,

        /// Only this field
        #[arg(long, conflicts_with_all = ["from", "to"])]
        exact: Option<String>,

        /// First field of the range (inclusive)
        #[arg(long)]
        from: Option<String>,

        /// Last field of the range (inclusive)
        #[arg(long)]
        to: Option<String>,

        /// Print the JSON as produced by the store, without pretty-printing
        #[arg(long)]
        raw: bool,
    },

    /// Merge a graph given as JSON, e.g. '{"soul": {"_": {"#": "soul", ">": {"a": 1}}, "a": 1}}'
    Put {
        /// Graph JSON
        graph: String,
    },

    /// Write a checkpoint and truncate the WAL
    Checkpoint,
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,gunkv=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .wide_node_threshold(args.wide_threshold)
        .get_max_keys(args.max_keys)
        .map_size(args.map_size_mb * 1024 * 1024)
        .build();

    tracing::debug!(data_dir = %args.data_dir, "opening database");
    let adapter = GraphAdapter::open(config)?;

    match args.command {
        Commands::Get {
            soul,
            exact,
            from,
            to,
            raw,
        } => {
            let opts = GetOptions { exact, from, to };
            if raw {
                println!("{}", adapter.get_json_string_sync(&soul, &opts)?);
            } else {
                let node = adapter.get_sync(&soul, &opts)?;
                let json = serde_json::to_string_pretty(&node)
                    .map_err(|e| gunkv::GunKvError::Serialization(e.to_string()))?;
                println!("{}", json);
            }
        }
        Commands::Put { graph } => {
            let graph: GunGraph = serde_json::from_str(&graph)
                .map_err(|e| gunkv::GunKvError::decode(b"<argument>", e))?;
            let diff = adapter.put_sync(&graph)?;
            let json = serde_json::to_string_pretty(&diff)
                .map_err(|e| gunkv::GunKvError::Serialization(e.to_string()))?;
            println!("{}", json);
        }
        Commands::Checkpoint => {
            adapter.engine().checkpoint()?;
            tracing::info!(entries = adapter.engine().entry_count(), "checkpoint written");
        }
    }

    adapter.close()
}
