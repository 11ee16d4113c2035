//! Interactive query shell over a diary archive.
//!
//! Usage:
//!   diary-shell --data diary-data.csv
//!   diary-shell -c "yr 2021 -a happiness * month" -c "all -s recording"

use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use diary_shell::{RenderConfig, Session, ShellConfig, Status, TerminalPlotter, load_archive};
use rustyline::DefaultEditor;
use tracing::info;

/// Query a diary archive from the command line.
///
/// Without `-c`, reads commands from standard input until `exit`.
#[derive(Parser)]
#[command(name = "diary-shell", version)]
struct Cli {
    /// Archive CSV file
    #[arg(long, default_value = "diary-data.csv")]
    data: PathBuf,

    /// Show at most this many table rows (0 for no limit)
    #[arg(long, default_value_t = 60)]
    max_rows: usize,

    /// Cut cells wider than this (0 for no limit)
    #[arg(long, default_value_t = 50)]
    max_width: usize,

    /// Seed for the random date selector
    #[arg(long)]
    seed: Option<u64>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Run this command instead of reading standard input (repeatable)
    #[arg(short = 'c', long = "command")]
    commands: Vec<String>,

    /// Keep running scripted commands after one fails
    #[arg(long)]
    continue_on_error: bool,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.parse().unwrap_or_default()),
        )
        .init();

    match run(&cli) {
        Ok(Status::Error) => process::exit(1),
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<Status> {
    let archive = load_archive(&cli.data)
        .with_context(|| format!("loading archive '{}'", cli.data.display()))?;

    let config = ShellConfig {
        render: RenderConfig {
            max_rows: cli.max_rows,
            max_width: cli.max_width,
        },
        seed: cli.seed,
    };
    let mut session = Session::new(archive, &config, TerminalPlotter::default());
    info!(entries = session.archive().len(), "session started");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let status = if cli.commands.is_empty() {
        let mut editor = DefaultEditor::new().context("starting line editor")?;
        session
            .run_editor(&mut editor, &mut out)
            .context("reading commands")?;
        Status::Exit
    } else {
        session
            .run_script(&cli.commands, cli.continue_on_error, &mut out)
            .context("running commands")?
    };
    out.flush()?;
    Ok(status)
}
