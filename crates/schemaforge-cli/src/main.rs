mod files;
mod logging;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use schemaforge_core::{
    Envelope, Error as CoreError, IdentifyingGraphReport, SchemaEditor, identifying_order,
    validate_database,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
    #[error("invalid snapshot: {0}")]
    Core(#[from] CoreError),
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("failed to initialize logging: {0}")]
    Logging(String),
}

#[derive(Parser, Debug)]
#[command(name = "schemaforge", version, about = "Schema design consistency engine")]
struct Cli {
    /// Append JSON log lines to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply a batch of operations to a snapshot, all or nothing.
    Apply(ApplyArgs),
    /// Check every cross-entity invariant of a snapshot.
    Validate(SnapshotArgs),
    /// Print tables in key-provider order per schema.
    Order(SnapshotArgs),
}

#[derive(Args, Debug)]
struct ApplyArgs {
    /// Database snapshot (JSON).
    #[arg(long)]
    snapshot: PathBuf,
    /// JSON array of operations.
    #[arg(long)]
    ops: PathBuf,
    /// Also write the resulting snapshot here on success.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Editor settings (TOML).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SnapshotArgs {
    /// Database snapshot (JSON).
    #[arg(long)]
    snapshot: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = logging::init_logging(cli.log_file.as_deref()).and_then(|()| match cli.command {
        Command::Apply(args) => run_apply(args),
        Command::Validate(args) => run_validate(args),
        Command::Order(args) => run_order(args),
    });

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

fn run_apply(args: ApplyArgs) -> Result<ExitCode, CliError> {
    let config = files::load_config(args.config.as_deref())?;
    let db = files::load_snapshot(&args.snapshot)?;
    let operations = files::load_operations(&args.ops)?;

    let started = Instant::now();
    let result = SchemaEditor::new(config).apply_all(&db, &operations);
    let elapsed_ms = started.elapsed().as_millis();

    let code = match &result {
        Ok(db) => {
            info!(operations = operations.len(), elapsed_ms, "operations applied");
            if let Some(out) = &args.out {
                files::write_json_atomic(out, db)?;
                info!(path = %out.display(), "snapshot written");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            warn!(code = err.code(), "operation batch rejected");
            ExitCode::FAILURE
        }
    };

    print_json(&Envelope::from(result))?;
    Ok(code)
}

fn run_validate(args: SnapshotArgs) -> Result<ExitCode, CliError> {
    let db = files::read_snapshot(&args.snapshot)?;
    let result = validate_database(&db).map(|()| db);
    let code = match &result {
        Ok(db) => {
            info!(schemas = db.schemas.len(), "snapshot is consistent");
            ExitCode::SUCCESS
        }
        Err(err) => {
            warn!(code = err.code(), "snapshot is inconsistent");
            ExitCode::FAILURE
        }
    };
    print_json(&Envelope::from(result))?;
    Ok(code)
}

#[derive(Serialize)]
struct SchemaOrder {
    schema: String,
    #[serde(flatten)]
    report: IdentifyingGraphReport,
}

fn run_order(args: SnapshotArgs) -> Result<ExitCode, CliError> {
    let db = files::load_snapshot(&args.snapshot)?;
    let reports: Vec<SchemaOrder> = db
        .schemas
        .iter()
        .map(|schema| SchemaOrder {
            schema: schema.name.clone(),
            report: identifying_order(schema),
        })
        .collect();
    print_json(&reports)?;
    Ok(ExitCode::SUCCESS)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}
