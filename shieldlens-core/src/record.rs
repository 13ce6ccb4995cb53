use chrono::NaiveDateTime;
use serde::Serialize;

/// One access-log request after parsing and enrichment.
///
/// The base fields are always populated; a line that cannot fill them never
/// becomes a record. Enrichment fields stay `None` (or `false` for `is_bot`)
/// when the corresponding source has no answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestRecord {
    pub ip: String,
    /// UTC, offset stripped.
    pub time: NaiveDateTime,
    pub method: String,
    pub url: String,
    pub protocol: String,
    pub status: u16,
    pub size: u64,
    pub referrer: String,
    pub user_agent: String,

    // Enrichment
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_bot: bool,
    pub isp: Option<String>,
    pub usage_type: Option<String>,
}

impl RequestRecord {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

/// One client-triggered error-log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    /// Kept exactly as written by the server.
    pub timestamp: String,
    pub ip: String,
    pub error_message: String,
}
