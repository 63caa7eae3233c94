//! Append-only writer for shell startup files.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Appends marked snippets to a shell profile such as `~/.bashrc`.
///
/// The only thing ever read back is the marker line, so a snippet is
/// written at most once and existing content is never touched.
#[derive(Debug, Clone)]
pub struct ProfileSink {
    path: PathBuf,
}

impl ProfileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn marker(key: &str) -> String {
        format!("# >>> devstrap: {} >>>", key)
    }

    pub fn contains(&self, key: &str) -> Result<bool> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let marker = Self::marker(key);
                Ok(content.lines().any(|l| l.trim_end() == marker))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Append `snippet` under `key` unless it is already there.
    /// Returns whether anything was written.
    pub fn append_once(&self, key: &str, snippet: &str) -> Result<bool> {
        if self.contains(key)? {
            tracing::debug!("{} already has '{}'", self.path.display(), key);
            return Ok(false);
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        writeln!(file)?;
        writeln!(file, "{}", Self::marker(key))?;
        writeln!(file, "{}", snippet.trim_end())?;
        writeln!(file, "# <<< devstrap: {} <<<", key)?;

        tracing::info!("Added '{}' to {}", key, self.path.display());
        Ok(true)
    }

    /// Put `bin_dir` on PATH for future shells.
    pub fn ensure_path_entry(&self, bin_dir: &Path) -> Result<bool> {
        let snippet = format!(
            "case \":$PATH:\" in\n    *\":{dir}:\"*) ;;\n    *) export PATH=\"{dir}:$PATH\" ;;\nesac",
            dir = bin_dir.display()
        );
        self.append_once("path", &snippet)
    }
}

/// Whether `dir` is one of the entries of the current `PATH`.
pub fn dir_on_path(dir: &Path) -> bool {
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|p| p == dir))
        .unwrap_or(false)
}
