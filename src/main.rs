//! `tb`: command-line front end for the taskboard tracker.
//!
//! ## Quick Start
//!
//! ```bash
//! # Create a project and a task
//! tb project add "Website" --priority high
//! tb task add website "Design landing page" --due "in 3d"
//!
//! # Nest a subtask and view the tree
//! tb task add website "Pick fonts" --parent "design landing page"
//! tb task list website
//!
//! # Work interactively with undo/redo
//! tb shell
//! ```
//!
//! Data is stored in `~/.taskboard/` (override with `--dir` or `TASKBOARD_DIR`).
//! Set `RUST_LOG=debug` to trace every dispatched change.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use taskboard::cli::Cli;
use taskboard::cmd::run;
use taskboard::config::Config;
use taskboard::session::Session;
use taskboard::storage::JsonFileStore;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::resolve(cli.dir, cli.author);

    let store = match JsonFileStore::open(&config.data_dir) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Failed to open data directory {}: {}", config.data_dir.display(), e);
            std::process::exit(1);
        }
    };
    let mut session = Session::open(store, config.author);

    if let Err(e) = run(&mut session, cli.command) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
