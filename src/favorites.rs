// Favorites store - the page's only persisted state
//
// An append-only list of favorited pages written as a JSON file under
// the platform data directory. Duplicate URLs are suppressed rather
// than re-appended.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// One favorited page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Favorite {
    pub title: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
}

/// Result of attempting to add a favorite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    Duplicate,
}

/// File-backed favorites list
#[derive(Clone)]
pub struct FavoritesStore {
    path: PathBuf,
}

impl FavoritesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location under the platform data directory
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("agora")
            .join("favorites.json")
    }

    /// Read the stored list; a missing file is an empty list
    pub fn list(&self) -> Result<Vec<Favorite>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path).context("Failed to read favorites file")?;
        serde_json::from_str(&raw).context("Failed to parse favorites file")
    }

    /// Append a favorite unless its URL is already stored
    pub fn add(&self, title: &str, url: &str) -> Result<AddOutcome> {
        let mut favorites = self.list()?;
        if favorites.iter().any(|f| f.url == url) {
            return Ok(AddOutcome::Duplicate);
        }

        favorites.push(Favorite {
            title: title.to_string(),
            url: url.to_string(),
            timestamp: Utc::now(),
        });

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create favorites directory")?;
        }
        let json =
            serde_json::to_string_pretty(&favorites).context("Failed to serialize favorites")?;
        fs::write(&self.path, json).context("Failed to write favorites file")?;

        Ok(AddOutcome::Added)
    }
}
