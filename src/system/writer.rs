// src/system/writer.rs

//! Writes rendered files to disk.

use crate::core::synthesizer::RenderedFile;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while writing rendered files.
#[derive(Error, Debug)]
pub enum WriteError {
    /// A directory could not be created or resolved.
    #[error("Could not create output directory '{path}': {source}")]
    CreateDir {
        /// The directory.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A file could not be written.
    #[error("Could not write '{path}': {source}")]
    Write {
        /// The file.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Writes every rendered file below `outdir`, creating directories as needed.
/// Files whose contents are already up to date are left untouched.
///
/// Returns the number of files actually written.
pub fn write_files(outdir: &Path, files: &[RenderedFile]) -> Result<usize, WriteError> {
    create_dir(outdir)?;
    let outdir: PathBuf = dunce::canonicalize(outdir).map_err(|e| WriteError::CreateDir {
        path: outdir.display().to_string(),
        source: e,
    })?;

    let mut written = 0;
    for file in files {
        let target = outdir.join(&file.path);
        if let Some(parent) = target.parent() {
            create_dir(parent)?;
        }

        if fs::read_to_string(&target).is_ok_and(|current| current == file.contents) {
            log::trace!("Unchanged: {}", target.display());
            continue;
        }

        fs::write(&target, &file.contents).map_err(|e| WriteError::Write {
            path: target.display().to_string(),
            source: e,
        })?;
        log::debug!("Wrote {}", target.display());
        written += 1;
    }
    Ok(written)
}

fn create_dir(path: &Path) -> Result<(), WriteError> {
    fs::create_dir_all(path).map_err(|e| WriteError::CreateDir {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_files_creates_nested_directories() {
        let dir = TempDir::new().unwrap();
        let files = vec![RenderedFile {
            path: PathBuf::from("packages/api/project.json"),
            contents: "{}\n".to_string(),
        }];

        let written = write_files(dir.path(), &files).unwrap();

        assert_eq!(written, 1);
        let content = fs::read_to_string(dir.path().join("packages/api/project.json")).unwrap();
        assert_eq!(content, "{}\n");
    }

    #[test]
    fn test_unchanged_files_are_not_rewritten() {
        let dir = TempDir::new().unwrap();
        let files = vec![RenderedFile {
            path: PathBuf::from(".gitignore"),
            contents: ".nx/cache\n".to_string(),
        }];

        assert_eq!(write_files(dir.path(), &files).unwrap(), 1);
        assert_eq!(write_files(dir.path(), &files).unwrap(), 0);
    }
}
