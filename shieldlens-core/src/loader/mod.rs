//! Dataset loaders.
//!
//! A loader turns the current contents of the access log into enriched
//! records, in file order. Two strategies sit behind [`DatasetLoader`]:
//!
//! - [`FullRescanLoader`] re-reads and re-parses everything on each refresh.
//! - [`TailLoader`] keeps a byte cursor and only parses appended lines.
//!
//! Both produce the same dataset for a file whose last line ends in a
//! newline. An unreadable source is never an error here: the dataset comes
//! back empty and marked [`SourceState::Unreadable`] so the dashboard can
//! show "no data".

mod full_rescan;
mod tail;

#[cfg(test)]
mod tests;

pub use full_rescan::FullRescanLoader;
pub use tail::TailLoader;

use crate::conf::types::LoadStrategy;
use crate::enrichment::EnrichmentCache;
use crate::parse::{parse_access_line, parse_error_line};
use crate::record::{ErrorRecord, RequestRecord};
use std::fs;
use std::path::{Path, PathBuf};

/// Turns the access log into enriched records.
///
/// The strategies differ on an unterminated last line: [`FullRescanLoader`]
/// parses it, [`TailLoader`] holds it back until its newline arrives. While a
/// line is being written the two can disagree by that one record.
pub trait DatasetLoader: Send {
    fn load(&mut self, cache: &EnrichmentCache) -> Dataset;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    Read,
    Unreadable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub records: Vec<RequestRecord>,
    pub source: SourceState,
}

impl Dataset {
    pub fn read(records: Vec<RequestRecord>) -> Self {
        Self {
            records,
            source: SourceState::Read,
        }
    }

    pub fn unreadable() -> Self {
        Self {
            records: Vec::new(),
            source: SourceState::Unreadable,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub fn build_loader(strategy: LoadStrategy, path: impl Into<PathBuf>) -> Box<dyn DatasetLoader> {
    match strategy {
        LoadStrategy::FullRescan => Box::new(FullRescanLoader::new(path)),
        LoadStrategy::Tail => Box::new(TailLoader::new(path)),
    }
}

/// Parse and enrich lines, dropping the ones that do not parse.
fn parse_and_enrich<'a>(
    lines: impl Iterator<Item = &'a str>,
    cache: &EnrichmentCache,
) -> Vec<RequestRecord> {
    lines
        .filter_map(parse_access_line)
        .map(|record| cache.enrich(record))
        .collect()
}

/// Read every client-triggered entry of the error log. Always a full rescan.
pub fn load_error_records(path: &Path) -> Vec<ErrorRecord> {
    match fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes)
            .lines()
            .filter_map(parse_error_line)
            .collect(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "error log unreadable");
            Vec::new()
        }
    }
}
