//! Checkpoint manager (§4.8/§6.3): persists progress to a sidecar file so
//! an interrupted run can resume without redoing work a visitor already
//! did.
//!
//! No teacher file performs sidecar persistence directly — the teacher
//! persists to SQLite via a storage module this retrieval pack doesn't
//! include — so the path-derivation scheme here follows §6.3 directly and
//! the atomic write uses the standard Rust write-to-temp-then-rename
//! idiom, not an invented one.

use std::fs;
use std::path::{Path, PathBuf};

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::EngineError;

/// Serialized resume state (§3's "Resume state").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointState {
    /// Hex md5 of the *original* (pre-rename) source, to detect a sidecar
    /// left over from a different input file.
    pub source_hash: String,
    /// Current (possibly partially renamed) source text.
    pub code: String,
    /// Count of bindings processed so far, across every resume of this
    /// run.
    pub current_index: usize,
    /// Count of bindings found in the very first analysis pass.
    pub total_scopes: usize,
    /// Visited-set identity keys (§3), so a resumed run can tell a
    /// skipped binding from an unprocessed one.
    pub visited: Vec<String>,
    /// Accumulated old-name -> new-name rename set, for the final report.
    pub renames: std::collections::HashMap<String, String>,
}

/// Computes the sidecar path for `input_path` under the current scheme:
/// `.{filename}.humanify-resume.{hash8}.json`, alongside the input file.
#[must_use]
pub fn sidecar_path(input_path: &Path) -> PathBuf {
    let dir = input_path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = input_path.file_name().and_then(|n| n.to_str()).unwrap_or("input.js");
    let hash = hex_md5(input_path.to_string_lossy().as_bytes());
    dir.join(format!(".{file_name}.humanify-resume.{}.json", &hash[..8]))
}

fn legacy_sidecar_paths(input_path: &Path) -> Vec<PathBuf> {
    let dir = input_path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = input_path.file_name().and_then(|n| n.to_str()).unwrap_or("input.js");
    vec![
        // Pre-hash scheme: a single dotfile per directory, collides across
        // inputs in the same directory but was the original convention.
        dir.join(format!(".{file_name}.humanify-resume.json")),
        // Pre-dotfile scheme: visible sidecar, no leading dot.
        dir.join(format!("{file_name}.humanify-resume.json")),
    ]
}

/// Hex-encoded md5 digest, used both for the sidecar filename and the
/// stored `source_hash` validation field.
#[must_use]
pub fn hex_md5(bytes: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Loads resume state for `input_path`, checking the current sidecar
/// scheme first and falling back to the two earlier naming conventions.
///
/// Returns `Ok(None)` if no sidecar exists under any scheme.
pub fn load(input_path: &Path) -> Result<Option<CheckpointState>, EngineError> {
    let mut candidates = vec![sidecar_path(input_path)];
    candidates.extend(legacy_sidecar_paths(input_path));

    for path in candidates {
        match fs::read_to_string(&path) {
            Ok(contents) => {
                let state: CheckpointState =
                    serde_json::from_str(&contents).map_err(|e| EngineError::Checkpoint {
                        path: path.clone(),
                        message: format!("malformed checkpoint JSON: {e}"),
                    })?;
                tracing::info!(path = %path.display(), "loaded checkpoint");
                return Ok(Some(state));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => {
                return Err(EngineError::Checkpoint {
                    path,
                    message: e.to_string(),
                })
            }
        }
    }
    Ok(None)
}

/// Atomically writes `state` to the current-scheme sidecar for
/// `input_path`: write to a temp file in the same directory, then rename
/// over the target, so a crash mid-write never leaves a half-written
/// sidecar behind.
pub fn save(input_path: &Path, state: &CheckpointState) -> Result<(), EngineError> {
    let path = sidecar_path(input_path);
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let json = serde_json::to_vec_pretty(state).map_err(|e| EngineError::Checkpoint {
        path: path.clone(),
        message: format!("failed to serialize checkpoint: {e}"),
    })?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| EngineError::io(dir, e))?;
    use std::io::Write as _;
    tmp.write_all(&json).map_err(|e| EngineError::io(&path, e))?;
    tmp.persist(&path).map_err(|e| EngineError::Checkpoint {
        path: path.clone(),
        message: e.to_string(),
    })?;
    tracing::info!(path = %path.display(), "wrote checkpoint");
    Ok(())
}

/// Removes the current-scheme sidecar for `input_path`, if present,
/// called once a run completes successfully.
pub fn delete(input_path: &Path) -> Result<(), EngineError> {
    let path = sidecar_path(input_path);
    match fs::remove_file(&path) {
        Ok(()) => {
            tracing::info!(path = %path.display(), "removed checkpoint");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(EngineError::io(path, e)),
    }
}
