//! Operator command line: publish command definitions and inspect the
//! snapshot file.

use std::path::PathBuf;

use anyhow::Context;
use bookclub_db::SnapshotFile;
use bookclub_kernel::settings::Settings;
use bookclub_kernel::ClubState;
use bookclub_platform::RestClient;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[clap(name = "bookclub-cli")]
#[clap(about = "Manage the book club bot")]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the platform command definitions as JSON
    Commands,

    /// Install the command definitions as global application commands
    Install,

    /// Show the persisted club state
    State {
        /// Snapshot file; defaults to the configured storage path
        #[clap(long, value_name = "FILE")]
        path: Option<PathBuf>,

        /// Print the raw snapshot JSON
        #[clap(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .try_init()
        .ok();

    let args = Args::parse();
    let settings = Settings::load().with_context(|| "failed to load bookclub settings")?;

    match args.command {
        Command::Commands => {
            let definitions = bookclub_app::registry()?.command_definitions();
            println!("{}", serde_json::to_string_pretty(&definitions)?);
        }
        Command::Install => {
            let definitions = bookclub_app::registry()?.command_definitions();
            let client = RestClient::new(&settings.platform)?;
            client
                .install_commands(&definitions)
                .await
                .context("failed to install commands")?;
            println!("Installed {} commands", definitions.len());
        }
        Command::State { path, json } => {
            let path = path.unwrap_or(settings.storage.state_path);
            let state = SnapshotFile::new(path).read().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else {
                print!("{}", summarize(&state));
            }
        }
    }

    Ok(())
}

fn summarize(state: &ClubState) -> String {
    let mut out = format!("Shortlist ({} books)\n", state.shortlist.len());
    for (i, book) in state.shortlist.books.iter().enumerate() {
        out.push_str(&format!("  {}) {}\n", i + 1, book.describe()));
    }

    out.push_str(&format!("Vote ({} nominees)\n", state.vote.books.len()));
    for entry in state.vote.tally() {
        out.push_str(&format!("  {}\n", entry.render()));
    }

    out.push_str(&format!("Events ({})\n", state.events.len()));
    for (i, event) in state.events.iter().enumerate() {
        out.push_str(&format!("  #{} {} {}\n", i + 1, event.date, event.book.describe()));
    }
    out
}
