use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::Path;

use tracing::info;

use crate::config::Settings;
use crate::error::AppError;

/// Writes the effective settings to `path` unless the file already exists.
///
/// Returns whether a file was written.
pub fn write_env_file(path: &Path, settings: &Settings) -> Result<bool, AppError> {
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            info!("{} already exists, leaving it untouched", path.display());
            return Ok(false);
        }
        Err(e) => return Err(e.into()),
    };

    writeln!(file, "# Generated by `birthday-greeter install`")?;
    for line in settings.to_env_lines() {
        writeln!(file, "{line}")?;
    }
    info!("Wrote {}", path.display());
    Ok(true)
}
