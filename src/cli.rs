use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "rusty-dash")]
#[command(about = "Interactive dashboard for CSV, Excel, Parquet and JSON tables")]
#[command(version)]
pub struct Cli {
    /// File to load at startup; its extension selects the format
    pub file: Option<PathBuf>,

    /// Path to a JSON configuration file
    #[arg(long, env = "RUSTY_DASH_CONFIG")]
    pub config: Option<PathBuf>,
}
