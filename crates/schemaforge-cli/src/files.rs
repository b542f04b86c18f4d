//! Snapshot, operation-script and config files.

use std::fs::{OpenOptions, create_dir_all};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use schemaforge_core::{Database, EditorConfig, Operation, validate_database};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::CliError;

pub fn read_snapshot(path: &Path) -> Result<Database, CliError> {
    let db: Database = read_json(path)?;
    debug!(path = %path.display(), schemas = db.schemas.len(), "snapshot loaded");
    Ok(db)
}

/// Read a snapshot and reject it unless every cross-entity invariant holds.
pub fn load_snapshot(path: &Path) -> Result<Database, CliError> {
    let db = read_snapshot(path)?;
    validate_database(&db)?;
    Ok(db)
}

/// Read a JSON array of operations.
pub fn load_operations(path: &Path) -> Result<Vec<Operation>, CliError> {
    let operations: Vec<Operation> = read_json(path)?;
    debug!(path = %path.display(), count = operations.len(), "operations loaded");
    Ok(operations)
}

/// Editor settings from TOML; absent keys keep their defaults.
pub fn load_config(path: Option<&Path>) -> Result<EditorConfig, CliError> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        }
        None => Ok(EditorConfig::default()),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), CliError> {
    let data = serde_json::to_vec_pretty(value)?;
    write_bytes_atomic(path, &data)
}

/// Write through a sibling temp file and rename it over `path`.
fn write_bytes_atomic(path: &Path, data: &[u8]) -> Result<(), CliError> {
    let parent = path.parent().filter(|parent| !parent.as_os_str().is_empty());
    if let Some(parent) = parent {
        create_dir_all(parent)?;
    }

    let tmp_path = temp_path(path)?;
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;

    std::fs::rename(&tmp_path, path)?;
    if let Some(parent) = parent {
        sync_dir(parent)?;
    }
    Ok(())
}

fn temp_path(path: &Path) -> Result<PathBuf, CliError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| CliError::InvalidPath(path.display().to_string()))?;
    let tmp_name = format!("{}.tmp", file_name.to_string_lossy());
    Ok(path.with_file_name(tmp_name))
}

fn sync_dir(path: &Path) -> io::Result<()> {
    let dir = OpenOptions::new().read(true).open(path)?;
    dir.sync_all()
}
