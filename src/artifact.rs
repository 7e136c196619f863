//! # artifact — write the Signal JSON document
//!
//! Pretty-printed (2-space indent) in struct field order, written to a
//! sibling `.tmp` file and renamed over the target so a reader never sees a
//! half-written document.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::SignalError;
use crate::models::Signal;

pub fn render(signal: &Signal) -> Result<String, SignalError> {
    let mut text = serde_json::to_string_pretty(signal)
        .map_err(|e| SignalError::Artifact(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
    text.push('\n');
    Ok(text)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replace the artifact at `path` with `signal`.
pub fn write_signal(path: &Path, signal: &Signal) -> Result<(), SignalError> {
    let text = render(signal)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp = tmp_path(path);
    fs::write(&tmp, text.as_bytes())?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }

    info!(
        path      = %path.display(),
        direction = %signal.direction,
        "Signal artifact written ✅"
    );
    Ok(())
}

#[cfg(test)]
fn read_signal(path: &Path) -> Result<Signal, SignalError> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text)
        .map_err(|e| SignalError::Artifact(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}
