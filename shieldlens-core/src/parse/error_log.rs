use crate::record::ErrorRecord;
use once_cell::sync::Lazy;
use regex::Regex;

// 2024/01/10 10:00:00 [error] 1234#0: *5 open() "/x" failed, client: 10.0.0.1, server: _
static ERROR_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<timestamp>\d{4}/\d{2}/\d{2} \d{2}:\d{2}:\d{2}) \[error\] \d+#\d+: \*\d+ .*?, client: (?P<ip>[^,\s]+)",
    )
    .expect("error line pattern is valid")
});

/// Parse one error-log line that was triggered by a client request.
///
/// Informational lines, other severities and errors without a `client:` field
/// are skipped by returning `None`.
pub fn parse_error_line(line: &str) -> Option<ErrorRecord> {
    let line = line.trim_end_matches(['\r', '\n']);
    let caps = ERROR_LINE.captures(line)?;

    Some(ErrorRecord {
        timestamp: caps["timestamp"].to_string(),
        ip: caps["ip"].to_string(),
        error_message: line.to_string(),
    })
}
