use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::{CategoryPath, EvaluationFile, Result, SmellError};

/// Write-once store of labeled results under `{root}/{category}/{file_name}.json`.
///
/// Files are opened with `create_new`, so an existing result is never
/// replaced; at most one writer per output path can succeed.
#[derive(Clone, Debug)]
pub struct ResultStore {
    root: PathBuf,
}

impl ResultStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, category: &CategoryPath, file_name: &str) -> Result<PathBuf> {
        if file_name.is_empty()
            || file_name == "."
            || file_name.contains("..")
            || file_name.contains(['/', '\\'])
        {
            return Err(SmellError::Schema(format!(
                "file_name '{file_name}' cannot be used as an output file name"
            )));
        }
        Ok(self
            .root
            .join(category.to_path())
            .join(format!("{file_name}.json")))
    }

    /// Fail fast before any work is done for a file that cannot be written.
    pub fn preflight(&self, category: &CategoryPath, file_name: &str) -> Result<PathBuf> {
        let path = self.path_for(category, file_name)?;
        check_parent(&path)?;
        if path.exists() {
            return Err(SmellError::Conflict(path));
        }
        Ok(path)
    }

    pub fn persist(&self, category: &CategoryPath, file: &EvaluationFile) -> Result<PathBuf> {
        let path = self.path_for(category, &file.file_name)?;
        check_parent(&path)?;

        // serialize first: nothing touches the disk unless the bytes are ready
        let mut bytes =
            serde_json::to_vec_pretty(file).map_err(|e| SmellError::Ser(e.to_string()))?;
        bytes.push(b'\n');

        let mut out = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(SmellError::Conflict(path))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SmellError::NotFound(format!(
                    "output directory does not exist: {}",
                    path.parent().unwrap_or(&path).display()
                )))
            }
            Err(source) => return Err(SmellError::Io { path, source }),
        };

        if let Err(source) = out.write_all(&bytes).and_then(|_| out.sync_all()) {
            drop(out);
            let _ = fs::remove_file(&path);
            return Err(SmellError::Io { path, source });
        }

        info!(path = %path.display(), claims = file.smell_analysis.len(), "evaluation saved");
        Ok(path)
    }
}

fn check_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if dir.is_dir() => Ok(()),
        Some(dir) => Err(SmellError::NotFound(format!(
            "output directory does not exist: {}",
            dir.display()
        ))),
        None => Err(SmellError::NotFound(format!(
            "output path has no parent directory: {}",
            path.display()
        ))),
    }
}
