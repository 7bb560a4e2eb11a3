use std::path::PathBuf;

use clap::Parser;

/// `node-engine-server` command-line arguments: `--host`, `--port`, and
/// `--registry-root`.
#[derive(Debug, Parser)]
#[command(name = "node-engine-server")]
pub struct Cli {
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, default_value = "8080")]
    pub port: u16,

    /// Directory to start `registry.json` resolution from; entries are
    /// also merged from each ancestor directory.
    #[arg(long)]
    pub registry_root: PathBuf,
}
