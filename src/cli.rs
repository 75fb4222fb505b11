use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Local-first project and task tracker.
/// Storage defaults to ~/.taskboard or a directory passed via --dir.
#[derive(Parser)]
#[command(name = "tb", version, about = "Project and task tracker with undo/redo")]
pub struct Cli {
    /// Directory holding the JSON store.
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    /// Name recorded on comments and activity entries.
    #[arg(long, global = true)]
    pub author: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}
