//! File-based pantry storage for the CLI.
//!
//! The whole pantry lives in one pretty-printed JSON file. A missing file is an
//! empty pantry; the file and its parent directories are created on first save.

use anyhow::{Context, Result};
use nutrify_core::Pantry;
use std::fs;
use std::path::PathBuf;

pub struct PantryStore {
    path: PathBuf,
}

impl PantryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<Pantry> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no pantry file yet, starting empty");
            return Ok(Pantry::new());
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let pantry = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        Ok(pantry)
    }

    pub fn save(&self, pantry: &Pantry) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(pantry)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), "pantry saved");
        Ok(())
    }
}
