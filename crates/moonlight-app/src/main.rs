//! Main application entry point.

use clap::{Parser, Subcommand};
use moonlight_app::{App, AppError, shortcut_table, write_output};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "moonlight", version, about = "Inspect and edit Moonlight SVG documents")]
struct Cli {
    /// Engine configuration (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the document's elements as JSON
    Inspect { file: PathBuf },
    /// Import and re-export a document
    Normalize {
        file: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replay a JSON operation script against a document
    Apply {
        file: PathBuf,
        #[arg(long)]
        script: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List keyboard shortcuts
    Shortcuts,
}

fn run(cli: Cli) -> Result<(), AppError> {
    let app = App::from_config_file(cli.config.as_deref())?;
    match cli.command {
        Command::Inspect { file } => write_output(None, &app.inspect(&file)?),
        Command::Normalize { file, output } => {
            write_output(output.as_deref(), &app.normalize(&file)?)
        }
        Command::Apply {
            file,
            script,
            output,
        } => write_output(output.as_deref(), &app.apply(&file, &script)?),
        Command::Shortcuts => write_output(None, &shortcut_table()),
    }
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Starting Moonlight");

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            eprintln!("moonlight: {err}");
            ExitCode::FAILURE
        }
    }
}
