use crate::domain::TestgenError;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactWriteError {
    #[error("failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize '{path}': {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<ArtifactWriteError> for TestgenError {
    fn from(error: ArtifactWriteError) -> Self {
        let message = error.to_string();
        match error {
            ArtifactWriteError::CreateDirectory { .. } => {
                TestgenError::io_system("IO.ARTIFACT_DIRECTORY", message)
            }
            ArtifactWriteError::Serialize { .. } => {
                TestgenError::internal("SYS.ARTIFACT_SERIALIZE", message)
            }
            ArtifactWriteError::Write { .. } => TestgenError::io_system("IO.ARTIFACT_WRITE", message),
        }
    }
}

/// Replaces `path` with `content` via a sibling temporary file and a rename.
///
/// A reader never observes a half-written file, and on failure the old file
/// is left as it was. An existing file keeps its permissions; a symlink is
/// written through to its target and stays a link.
pub fn write_text_atomic(path: &Path, content: &str) -> Result<(), ArtifactWriteError> {
    let target = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let parent = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let write_error = |source| ArtifactWriteError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut staged = NamedTempFile::new_in(parent).map_err(write_error)?;
    staged.write_all(content.as_bytes()).map_err(write_error)?;
    staged.as_file().sync_all().map_err(write_error)?;
    if let Ok(metadata) = fs::metadata(&target) {
        fs::set_permissions(staged.path(), metadata.permissions()).map_err(write_error)?;
    }
    staged
        .persist(&target)
        .map_err(|persist| write_error(persist.error))?;
    Ok(())
}

/// Writes `value` as pretty JSON, creating parent directories as needed.
pub fn write_json_artifact<T: Serialize>(path: &Path, value: &T) -> Result<(), ArtifactWriteError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ArtifactWriteError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let json = serde_json::to_string_pretty(value).map_err(|source| ArtifactWriteError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    write_text_atomic(path, &format!("{}\n", json))
}
