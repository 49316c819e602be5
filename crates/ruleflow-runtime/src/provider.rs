//! Rule source provider boundary
//!
//! Providers supply `(source_id, content, fingerprint)` tuples on demand.
//! They are not responsible for caching; the artifact cache sits above
//! them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ruleflow_core::Fingerprint;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;

/// One fetched rule source
#[derive(Debug, Clone)]
pub struct RuleSource {
    pub source_id: String,
    pub content: String,
    pub fingerprint: Fingerprint,
    pub last_modified: DateTime<Utc>,
}

impl RuleSource {
    pub fn new(source_id: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        let fingerprint = Fingerprint::of_str(&content);
        Self {
            source_id: source_id.into(),
            content,
            fingerprint,
            last_modified: Utc::now(),
        }
    }
}

/// Provider error
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Rule source not found: {0}")]
    NotFound(String),

    #[error("I/O error reading '{source_id}': {source}")]
    Io {
        source_id: String,
        #[source]
        source: std::io::Error,
    },
}

/// Supplies rule-source content on demand
///
/// All implementations must be `Send + Sync` for use across async tasks.
#[async_trait]
pub trait SourceProvider: Send + Sync {
    /// Fetch a source's current content and fingerprint
    async fn fetch(&self, source_id: &str) -> Result<RuleSource, ProviderError>;

    /// Fetch only the current fingerprint, for change detection
    async fn fingerprint(&self, source_id: &str) -> Result<Fingerprint, ProviderError> {
        Ok(self.fetch(source_id).await?.fingerprint)
    }

    /// List all available source ids
    async fn list(&self) -> Result<Vec<String>, ProviderError>;
}

/// In-memory provider for tests and embedded use
#[derive(Default)]
pub struct MemorySourceProvider {
    sources: RwLock<HashMap<String, (String, DateTime<Utc>)>>,
}

impl MemorySourceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a source
    pub fn put(&self, source_id: impl Into<String>, content: impl Into<String>) {
        self.sources
            .write()
            .unwrap()
            .insert(source_id.into(), (content.into(), Utc::now()));
    }

    /// Remove a source
    pub fn remove(&self, source_id: &str) -> bool {
        self.sources.write().unwrap().remove(source_id).is_some()
    }
}

#[async_trait]
impl SourceProvider for MemorySourceProvider {
    async fn fetch(&self, source_id: &str) -> Result<RuleSource, ProviderError> {
        let sources = self.sources.read().unwrap();
        let (content, last_modified) = sources
            .get(source_id)
            .ok_or_else(|| ProviderError::NotFound(source_id.to_string()))?;
        Ok(RuleSource {
            source_id: source_id.to_string(),
            fingerprint: Fingerprint::of_str(content),
            content: content.clone(),
            last_modified: *last_modified,
        })
    }

    async fn list(&self) -> Result<Vec<String>, ProviderError> {
        let mut ids: Vec<String> = self.sources.read().unwrap().keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

/// Provider reading YAML rule sources from a directory.
///
/// Source ids are paths relative to the root; a missing extension resolves
/// against `.yaml` then `.yml`.
pub struct FileSystemSourceProvider {
    root: PathBuf,
}

impl FileSystemSourceProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, source_id: &str) -> PathBuf {
        let direct = self.root.join(source_id);
        if direct.exists() || Path::new(source_id).extension().is_some() {
            return direct;
        }
        let yaml = self.root.join(format!("{}.yaml", source_id));
        if yaml.exists() {
            return yaml;
        }
        self.root.join(format!("{}.yml", source_id))
    }
}

#[async_trait]
impl SourceProvider for FileSystemSourceProvider {
    async fn fetch(&self, source_id: &str) -> Result<RuleSource, ProviderError> {
        let path = self.resolve(source_id);
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ProviderError::NotFound(source_id.to_string())
            } else {
                ProviderError::Io {
                    source_id: source_id.to_string(),
                    source: e,
                }
            }
        })?;

        let last_modified = tokio::fs::metadata(&path)
            .await
            .ok()
            .and_then(|m| m.modified().ok())
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(Utc::now);

        Ok(RuleSource {
            source_id: source_id.to_string(),
            fingerprint: Fingerprint::of_str(&content),
            content,
            last_modified,
        })
    }

    async fn list(&self) -> Result<Vec<String>, ProviderError> {
        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(|e| {
            ProviderError::Io {
                source_id: self.root.display().to_string(),
                source: e,
            }
        })?;

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| ProviderError::Io {
            source_id: self.root.display().to_string(),
            source: e,
        })? {
            let path = entry.path();
            let is_yaml = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext == "yaml" || ext == "yml")
                .unwrap_or(false);
            if is_yaml {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    ids.push(name.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_provider_fetch() {
        let provider = MemorySourceProvider::new();
        provider.put("pricing", "rule: {}");

        let source = provider.fetch("pricing").await.unwrap();
        assert_eq!(source.source_id, "pricing");
        assert_eq!(source.content, "rule: {}");
        assert_eq!(source.fingerprint, Fingerprint::of_str("rule: {}"));

        assert!(matches!(
            provider.fetch("missing").await,
            Err(ProviderError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_memory_provider_update_changes_fingerprint() {
        let provider = MemorySourceProvider::new();
        provider.put("pricing", "v1");
        let fp1 = provider.fingerprint("pricing").await.unwrap();

        provider.put("pricing", "v2");
        let fp2 = provider.fingerprint("pricing").await.unwrap();
        assert_ne!(fp1, fp2);
    }

    #[tokio::test]
    async fn test_memory_provider_list() {
        let provider = MemorySourceProvider::new();
        provider.put("b", "x");
        provider.put("a", "y");
        assert_eq!(provider.list().await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_file_system_provider() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pricing.yaml"), "rule: {}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let provider = FileSystemSourceProvider::new(dir.path());

        // Resolves with and without extension
        let source = provider.fetch("pricing").await.unwrap();
        assert_eq!(source.content, "rule: {}");
        let source = provider.fetch("pricing.yaml").await.unwrap();
        assert_eq!(source.content, "rule: {}");

        assert!(matches!(
            provider.fetch("missing").await,
            Err(ProviderError::NotFound(_))
        ));

        assert_eq!(provider.list().await.unwrap(), vec!["pricing.yaml"]);
    }
}
