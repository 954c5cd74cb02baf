use crate::serialization::ProjectError;
use crate::settings::{EditorSettings, SettingsError};
use crate::store::Store;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "shield-editor")]
#[command(about = "Electrical panel project files", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Editor settings file (JSON)
    #[arg(long, global = true, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write an empty project
    New {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Print node, connection and worksheet counts of a project
    Inspect {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Recalculate every worksheet and save the project
    Recalc {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Write here instead of overwriting FILE
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Project(#[from] ProjectError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("failed to encode summary: {0}")]
    Json(#[from] serde_json::Error),
}

/// Runs one command and returns what it prints on success.
pub fn execute(cli: Cli) -> Result<String, CliError> {
    let settings = match &cli.settings {
        Some(path) => EditorSettings::load(path)?,
        None => EditorSettings::default(),
    };
    let mut store = Store::new(settings);

    match cli.command {
        Commands::New { file } => {
            store.save_to_file(&file)?;
            Ok(format!("created {}", file.display()))
        }
        Commands::Inspect { file, json } => {
            store.load_from_file(&file)?;
            let summary = store.summary_uncached();
            if json {
                Ok(serde_json::to_string_pretty(&summary)?)
            } else {
                Ok(summary.to_string())
            }
        }
        Commands::Recalc { file, output } => {
            store.load_from_file(&file)?;
            let count = store.recalculate_all();
            let target = output.unwrap_or(file);
            store.save_to_file(&target)?;
            Ok(format!(
                "recalculated {} worksheets into {}",
                count,
                target.display()
            ))
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,shield_editor=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Entry point used by the native executable.
pub fn run() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match execute(cli) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
