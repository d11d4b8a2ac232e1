use crate::error::{DashboardError, Result};
use crate::loader::{LoadReport, Normalizer};
use crate::types::Dataset;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info};

/// Identity of an input file for memoization: path plus modification time
/// and size. A changed file gets a new signature and is loaded again.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileSignature {
    pub path: PathBuf,
    pub modified: Option<DateTime<Utc>>,
    pub len: u64,
}

impl FileSignature {
    pub fn of(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DashboardError::FileNotFound { path: path.to_path_buf() },
            _ => DashboardError::Io(e),
        })?;
        Ok(FileSignature {
            path: path.to_path_buf(),
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
            len: meta.len(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct CachedDataset {
    pub dataset: Rc<Dataset>,
    pub report: LoadReport,
}

/// Caller-owned table of loaded datasets. Each entry is built once by the
/// owned `Normalizer` and then only shared read-only.
#[derive(Debug)]
pub struct DatasetCache {
    normalizer: Normalizer,
    entries: HashMap<FileSignature, CachedDataset>,
    hits: usize,
    misses: usize,
}

impl DatasetCache {
    pub fn new(normalizer: Normalizer) -> Self {
        DatasetCache {
            normalizer,
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn load(&mut self, path: &Path) -> Result<CachedDataset> {
        let sig = FileSignature::of(path)?;
        if let Some(hit) = self.entries.get(&sig) {
            self.hits += 1;
            debug!(path = %path.display(), "Dataset cache hit");
            return Ok(hit.clone());
        }

        self.misses += 1;
        let (dataset, report) = self.normalizer.load_path(path)?;
        // Older signatures of the same path can never match again.
        self.entries.retain(|k, _| k.path != sig.path);
        let entry = CachedDataset { dataset: Rc::new(dataset), report };
        info!(
            path = %path.display(),
            modified = ?sig.modified,
            bytes = sig.len,
            "Dataset loaded"
        );
        self.entries.insert(sig, entry.clone());
        Ok(entry)
    }

    pub fn invalidate(&mut self, path: &Path) {
        self.entries.retain(|k, _| k.path != path);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(hits, misses)` since construction.
    pub fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchemaConfig;
    use std::io::Write;

    fn utf8_cache() -> DatasetCache {
        let cfg = SchemaConfig {
            encoding: "utf-8".to_string(),
            ..SchemaConfig::default()
        };
        DatasetCache::new(Normalizer::new(cfg).unwrap())
    }

    fn write_file(path: &Path, body: &str) {
        let mut f = std::fs::File::create(path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
    }

    const BODY: &str = "기준_년분기_코드,상권_코드_명,서비스_업종_코드_명,당월_매출_금액,당월_매출_건수\n20231,A,카페,100,1\n";

    #[test]
    fn test_second_load_is_shared() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.csv");
        write_file(&path, BODY);

        let mut cache = utf8_cache();
        let a = cache.load(&path).unwrap();
        let b = cache.load(&path).unwrap();

        assert!(Rc::ptr_eq(&a.dataset, &b.dataset));
        assert_eq!(cache.stats(), (1, 1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_changed_file_is_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.csv");
        write_file(&path, BODY);

        let mut cache = utf8_cache();
        let a = cache.load(&path).unwrap();
        write_file(&path, &format!("{}20232,B,바,300,2\n", BODY));
        let b = cache.load(&path).unwrap();

        assert_eq!(a.dataset.records.len(), 1);
        assert_eq!(b.dataset.records.len(), 2);
        assert_eq!(cache.stats(), (0, 2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate_forces_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.csv");
        write_file(&path, BODY);

        let mut cache = utf8_cache();
        cache.load(&path).unwrap();
        cache.invalidate(&path);
        assert!(cache.is_empty());
        cache.load(&path).unwrap();
        assert_eq!(cache.stats(), (0, 2));
    }

    #[test]
    fn test_missing_file_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = utf8_cache();
        let err = cache.load(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, DashboardError::FileNotFound { .. }));
        assert!(cache.is_empty());
    }
}
