use crate::enrichment::EnrichmentCache;
use crate::loader::{Dataset, DatasetLoader, parse_and_enrich};
use std::fs;
use std::path::PathBuf;

/// Re-reads the whole log on every call.
#[derive(Debug, Clone)]
pub struct FullRescanLoader {
    path: PathBuf,
}

impl FullRescanLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetLoader for FullRescanLoader {
    fn load(&mut self, cache: &EnrichmentCache) -> Dataset {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "access log unreadable");
                return Dataset::unreadable();
            }
        };

        let text = String::from_utf8_lossy(&bytes);
        let records = parse_and_enrich(text.lines(), cache);

        tracing::debug!(records = records.len(), "access log rescanned");
        Dataset::read(records)
    }
}
