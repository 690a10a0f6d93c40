//! Interactive terminal for the matchbook matching engine.
//!
//! Wires the engine to its collaborators: the CSV tape, the JSONL
//! event journal, and the console notifier, then hands control to the
//! menu loop. Exit code 0 on clean shutdown; an unrecoverable engine
//! fault (a broken observation pipeline) exits non-zero.

mod menu;
mod term;

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use matchbook_core::{Engine, FanoutSink};
use matchbook_tape::{EventJournal, Notifier, Tape};

#[derive(Parser)]
#[command(name = "matchbook")]
#[command(about = "Interactive terminal for the matchbook matching engine")]
struct Cli {
    /// Directory for the CSV tape, event journal, and notification log
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Engine log file
    #[arg(short, long, default_value = "matchbook.log")]
    log_file: PathBuf,

    /// Disable ANSI colors
    #[arg(long)]
    no_color: bool,

    /// Skip the JSONL event journal
    #[arg(long)]
    no_journal: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&cli.log_file)
        .with_context(|| format!("opening log file {}", cli.log_file.display()))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(log))
        .with_ansi(false)
        .init();

    let tape = Tape::open(&cli.data_dir).context("opening CSV tape")?;

    let mut sink = FanoutSink::new().with(tape.clone());
    if !cli.no_journal {
        let journal = EventJournal::open(cli.data_dir.join("events.jsonl"))
            .context("opening event journal")?;
        sink.push(journal);
    }
    let mut notifier = Notifier::new().with_log(cli.data_dir.join("notifications.log"));
    if cli.no_color {
        notifier = notifier.plain();
    }
    sink.push(notifier);

    let mut engine = Engine::with_sink(sink);

    info!(data_dir = %cli.data_dir.display(), "engine started");
    menu::run(&mut engine, &tape, !cli.no_color)?;
    info!("clean shutdown");
    Ok(())
}
