use crate::types::ExtractionRow;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Version constants for cache invalidation
pub mod versions {
    pub const FIELDROW_VERSION: &str = "0.1.0";
    pub const EXTRACTION_VERSION: &str = "1.0.0";
}

/// Cache key (document text + rule config → row)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RowCacheKey {
    pub text_hash: String,
    pub config_hash: String,
    pub fieldrow_version: String,
    pub extraction_version: String,
}

impl RowCacheKey {
    pub fn new(text_hash: String, config_hash: String) -> Self {
        Self {
            text_hash,
            config_hash,
            fieldrow_version: versions::FIELDROW_VERSION.to_string(),
            extraction_version: versions::EXTRACTION_VERSION.to_string(),
        }
    }

    /// Compute cache key hash for storage
    pub fn to_cache_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.text_hash);
        hasher.update(&self.config_hash);
        hasher.update(&self.fieldrow_version);
        hasher.update(&self.extraction_version);
        format!("{:x}", hasher.finalize())
    }
}

/// Cache value (extracted row with metadata)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowCacheValue {
    pub row: ExtractionRow,
    pub created_at: DateTime<Utc>,
    pub extraction_time_ms: u64,
    pub cache_version: String,
}

impl RowCacheValue {
    pub fn new(row: ExtractionRow, extraction_time_ms: u64) -> Self {
        Self {
            row,
            created_at: Utc::now(),
            extraction_time_ms,
            cache_version: versions::FIELDROW_VERSION.to_string(),
        }
    }
}

/// Storage abstraction for caching extraction results
pub trait RowStorage {
    fn get_row(&self, cache_key: &RowCacheKey) -> Result<Option<RowCacheValue>>;
    fn store_row(&self, cache_key: &RowCacheKey, cache_value: &RowCacheValue) -> Result<()>;
}

/// File-based storage implementation using local cache directory
pub struct FileStorage {
    cache_dir: String,
}

impl FileStorage {
    pub fn new(cache_dir: &str) -> Result<Self> {
        // Ensure cache directory exists
        fs::create_dir_all(cache_dir)?;
        fs::create_dir_all(format!("{cache_dir}/rows"))?;

        Ok(Self {
            cache_dir: cache_dir.to_string(),
        })
    }

    fn row_path(&self, cache_key: &RowCacheKey) -> String {
        format!("{}/rows/{}.json", self.cache_dir, cache_key.to_cache_hash())
    }
}

impl RowStorage for FileStorage {
    fn get_row(&self, cache_key: &RowCacheKey) -> Result<Option<RowCacheValue>> {
        let path = self.row_path(cache_key);
        if Path::new(&path).exists() {
            let json_str = fs::read_to_string(path)?;
            let cache_value: RowCacheValue = serde_json::from_str(&json_str)
                .map_err(|e| anyhow!("Failed to deserialize cached RowCacheValue: {}", e))?;
            Ok(Some(cache_value))
        } else {
            Ok(None)
        }
    }

    fn store_row(&self, cache_key: &RowCacheKey, cache_value: &RowCacheValue) -> Result<()> {
        let path = self.row_path(cache_key);
        let json_str = serde_json::to_string_pretty(cache_value)
            .map_err(|e| anyhow!("Failed to serialize RowCacheValue: {}", e))?;
        fs::write(path, json_str)?;
        Ok(())
    }
}

/// No-op storage implementation that disables all caching
pub struct NoOpStorage;

impl Default for NoOpStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl NoOpStorage {
    pub fn new() -> Self {
        Self
    }
}

impl RowStorage for NoOpStorage {
    fn get_row(&self, _cache_key: &RowCacheKey) -> Result<Option<RowCacheValue>> {
        Ok(None) // Always cache miss
    }

    fn store_row(&self, _cache_key: &RowCacheKey, _cache_value: &RowCacheValue) -> Result<()> {
        Ok(()) // No-op
    }
}

/// Calculate hash for document text (for cache key)
pub fn calculate_text_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Calculate hash for rule configuration (for cache key)
pub fn calculate_config_hash<T: serde::Serialize>(config: &T) -> Result<String> {
    let config_json = serde_json::to_string(config)
        .map_err(|e| anyhow!("Failed to serialize config for hashing: {}", e))?;

    let mut hasher = Sha256::new();
    hasher.update(config_json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}
