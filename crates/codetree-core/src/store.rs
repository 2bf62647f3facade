use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::category::CategoryLink;
use crate::coupon::{Coupon, ScrapedCoupon};
use crate::tree::CategoryTree;

pub const DISCOVERED_CATEGORIES_FILE: &str = "discovered_categories.json";
pub const CATEGORY_TREE_FILE: &str = "category_tree.json";
pub const COMPREHENSIVE_COUPONS_FILE: &str = "comprehensive_coupons.json";
pub const EXTRACTED_COUPONS_FILE: &str = "extracted_coupons.json";
pub const RUN_SUMMARY_FILE: &str = "run_summary.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Counters for one `comprehensive` run, persisted next to the artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub categories_processed: usize,
    pub succeeded: usize,
    pub empty: usize,
    pub blocked: usize,
    pub timed_out: usize,
    pub failed: usize,
    pub coupons_collected: usize,
    pub tree_written: bool,
}

/// Reads and writes the JSON artifacts under one data directory.
///
/// Writes go to a temporary file in the same directory which is then
/// renamed over the target, so readers never observe a partial file.
#[derive(Debug, Clone)]
pub struct DataStore {
    dir: PathBuf,
}

impl DataStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path_of(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the directory cannot be created or the file
    /// cannot be written.
    pub fn save_categories(&self, categories: &[CategoryLink]) -> Result<PathBuf, StoreError> {
        self.write_json(DISCOVERED_CATEGORIES_FILE, categories)
    }

    /// Returns `Ok(None)` when no categories have been persisted yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file exists but cannot be read or parsed.
    pub fn load_categories(&self) -> Result<Option<Vec<CategoryLink>>, StoreError> {
        self.read_json(DISCOVERED_CATEGORIES_FILE)
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be written.
    pub fn save_tree(&self, tree: &CategoryTree) -> Result<PathBuf, StoreError> {
        self.write_json(CATEGORY_TREE_FILE, tree)
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the file exists but cannot be read or parsed.
    pub fn load_tree(&self) -> Result<Option<CategoryTree>, StoreError> {
        self.read_json(CATEGORY_TREE_FILE)
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be written.
    pub fn save_comprehensive_coupons(
        &self,
        coupons: &[ScrapedCoupon],
    ) -> Result<PathBuf, StoreError> {
        self.write_json(COMPREHENSIVE_COUPONS_FILE, coupons)
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the file exists but cannot be read or parsed.
    pub fn load_comprehensive_coupons(&self) -> Result<Option<Vec<ScrapedCoupon>>, StoreError> {
        self.read_json(COMPREHENSIVE_COUPONS_FILE)
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be written.
    pub fn save_extracted_coupons(&self, coupons: &[Coupon]) -> Result<PathBuf, StoreError> {
        self.write_json(EXTRACTED_COUPONS_FILE, coupons)
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the file exists but cannot be read or parsed.
    pub fn load_extracted_coupons(&self) -> Result<Option<Vec<Coupon>>, StoreError> {
        self.read_json(EXTRACTED_COUPONS_FILE)
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be written.
    pub fn save_run_summary(&self, summary: &RunSummary) -> Result<PathBuf, StoreError> {
        self.write_json(RUN_SUMMARY_FILE, summary)
    }

    /// Serializes `value` as pretty JSON into `file_name` atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on any filesystem or serialization failure.
    pub fn write_json<T: Serialize + ?Sized>(
        &self,
        file_name: &str,
        value: &T,
    ) -> Result<PathBuf, StoreError> {
        let path = self.path_of(file_name);
        let io_err = |source| StoreError::Io {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(io_err)?;

        let mut body = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        body.push(b'\n');

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        tmp.write_all(&body).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&path).map_err(|e| io_err(e.error))?;

        tracing::debug!(path = %path.display(), bytes = body.len(), "artifact written");
        Ok(path)
    }

    /// Reads `file_name` as JSON, returning `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be read or parsed.
    pub fn read_json<T: DeserializeOwned>(&self, file_name: &str) -> Result<Option<T>, StoreError> {
        let path = self.path_of(file_name);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|source| StoreError::Json { path, source })
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
