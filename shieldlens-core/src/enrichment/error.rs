use std::path::PathBuf;
use thiserror::Error;

/// Failures opening enrichment data sources. Individual lookups never fail;
/// they answer "unknown" instead.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("failed to open MaxMind database {path}: {source}")]
    OpenDatabase {
        path: PathBuf,
        #[source]
        source: maxminddb::MaxMindDbError,
    },

    #[error("failed to read user-agent rules {path}: {source}")]
    ReadUaRules {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid user-agent rules in {path}: {message}")]
    ParseUaRules { path: PathBuf, message: String },

    #[error("ua_engine \"uaparser\" requires ua_regexes to be set")]
    MissingUaRules,
}

impl EnrichmentError {
    pub fn open_database(path: impl Into<PathBuf>, source: maxminddb::MaxMindDbError) -> Self {
        Self::OpenDatabase {
            path: path.into(),
            source,
        }
    }
}
