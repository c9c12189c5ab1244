// Asset build step
// Runs the external build command that regenerates compiled CSS

use crate::error::{Error, Result};
use crate::logger;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Regenerates compiled assets
pub trait AssetBuilder {
    fn build(&self) -> Result<()>;
}

/// Builder backed by an external command run with no arguments
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    command: String,
    output_dir: PathBuf,
}

impl CommandBuilder {
    pub fn new(command: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            output_dir: output_dir.into(),
        }
    }
}

/// Create `dir` and any missing parents; an existing directory counts as success
pub fn ensure_output_dir(dir: &Path) -> std::io::Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    match std::fs::create_dir_all(dir) {
        Ok(()) => {
            logger::log_info(&format!("[Assets] Created {}", dir.display()));
            Ok(())
        }
        // Lost a race with another creator
        Err(_) if dir.is_dir() => Ok(()),
        Err(e) => Err(e),
    }
}

impl AssetBuilder for CommandBuilder {
    fn build(&self) -> Result<()> {
        ensure_output_dir(&self.output_dir)?;

        logger::log_info(&format!("[Assets] Running '{}'", self.command));
        let status = Command::new(&self.command)
            .status()
            .map_err(|e| Error::build(&self.command, e.to_string()))?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::build(&self.command, status.to_string()))
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_missing_destination_created() {
        let dir = tempfile::tempdir().unwrap();
        let css = dir.path().join("css");
        CommandBuilder::new("true", &css).build().unwrap();
        assert!(css.is_dir());
    }

    #[test]
    fn test_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let css = dir.path().join("css");
        std::fs::create_dir(&css).unwrap();
        CommandBuilder::new("true", &css).build().unwrap();
        assert!(css.is_dir());
    }

    #[test]
    fn test_missing_parents_created() {
        let dir = tempfile::tempdir().unwrap();
        let css = dir.path().join("pythonsd/static/css");
        CommandBuilder::new("true", &css).build().unwrap();
        assert!(css.is_dir());
    }

    #[test]
    fn test_file_in_place_of_parent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("static"), "not a directory").unwrap();
        let css = dir.path().join("static").join("css");
        let err = CommandBuilder::new("true", &css).build().unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(!css.exists());
    }

    #[test]
    fn test_file_at_destination() {
        let dir = tempfile::tempdir().unwrap();
        let css = dir.path().join("css");
        std::fs::write(&css, "not a directory").unwrap();
        let err = CommandBuilder::new("true", &css).build().unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_failing_command() {
        let dir = tempfile::tempdir().unwrap();
        let err = CommandBuilder::new("false", dir.path()).build().unwrap_err();
        assert!(matches!(err, Error::Build { ref command, .. } if command == "false"));
    }

    #[test]
    fn test_missing_command() {
        let dir = tempfile::tempdir().unwrap();
        let err = CommandBuilder::new("no-such-build-tool-xyz", dir.path())
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Build { .. }));
    }
}
