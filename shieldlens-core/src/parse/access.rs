use crate::record::RequestRecord;
use chrono::{DateTime, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

/// `10/Jan/2024:10:00:00 +0000`
pub const ACCESS_TIME_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

// IP - - [TIME] "METHOD URL PROTOCOL" STATUS SIZE "REFERRER" "USER_AGENT"
static ACCESS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(?P<ip>\S+) - - \[(?P<time>.*?)\] "(?P<method>\S+) (?P<url>\S+) (?P<protocol>[^"]+)" (?P<status>\d{3}) (?P<size>\d+) "(?P<referrer>[^"]*)" "(?P<user_agent>[^"]*)""#,
    )
    .expect("access line pattern is valid")
});

/// Parse one combined-format access-log line.
///
/// Returns `None` when the line does not match the structural pattern, the
/// timestamp does not parse, or size overflows. Enrichment fields are left
/// empty; see [`crate::enrichment::EnrichmentCache::enrich`].
pub fn parse_access_line(line: &str) -> Option<RequestRecord> {
    let line = line.trim_end_matches(['\r', '\n']);
    let caps = ACCESS_LINE.captures(line)?;

    let time = parse_time(&caps["time"])?;
    let status = caps["status"].parse::<u16>().ok()?;
    let size = caps["size"].parse::<u64>().ok()?;

    Some(RequestRecord {
        ip: caps["ip"].to_string(),
        time,
        method: caps["method"].to_string(),
        url: caps["url"].to_string(),
        protocol: caps["protocol"].to_string(),
        status,
        size,
        referrer: caps["referrer"].to_string(),
        user_agent: caps["user_agent"].to_string(),
        country: None,
        latitude: None,
        longitude: None,
        is_bot: false,
        isp: None,
        usage_type: None,
    })
}

/// Offsets are folded into UTC so records from differently configured
/// servers compare on one timeline.
fn parse_time(raw: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_str(raw, ACCESS_TIME_FORMAT)
        .ok()
        .map(|dt| dt.naive_utc())
}
