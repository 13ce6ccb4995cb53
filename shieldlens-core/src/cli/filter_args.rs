use crate::filter::{FilterConfig, TimeWindow, Traffic};
use chrono::NaiveDateTime;
use clap::Args;

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Filter flags shared by `watch` and `query`.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only requests from the last N minutes (overrides --from/--to)
    #[arg(long, value_name = "N")]
    pub last_minutes: Option<u32>,

    /// Earliest request time, UTC (e.g. 2024-01-10T10:00)
    #[arg(long, value_parser = parse_datetime)]
    pub from: Option<NaiveDateTime>,

    /// Latest request time, UTC
    #[arg(long, value_parser = parse_datetime)]
    pub to: Option<NaiveDateTime>,

    /// Client IP contains this text
    #[arg(long)]
    pub ip: Option<String>,

    /// URL contains this text
    #[arg(long)]
    pub url: Option<String>,

    /// User agent contains this text
    #[arg(long = "ua")]
    pub user_agent: Option<String>,

    /// HTTP method (repeatable)
    #[arg(long = "method")]
    pub methods: Vec<String>,

    /// Status code (repeatable)
    #[arg(long = "status")]
    pub statuses: Vec<u16>,

    /// ISO country code (repeatable)
    #[arg(long = "country")]
    pub countries: Vec<String>,

    /// Keep only "bot" or "human" traffic
    #[arg(long, value_parser = parse_traffic)]
    pub traffic: Option<Traffic>,

    /// Histogram bucket width in minutes
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub bucket_minutes: Option<u32>,
}

impl FilterArgs {
    pub fn into_filter(self) -> FilterConfig {
        FilterConfig {
            window: TimeWindow {
                start: self.from,
                end: self.to,
                last_minutes: self.last_minutes,
            },
            ip_contains: self.ip,
            url_contains: self.url,
            user_agent_contains: self.user_agent,
            methods: self.methods.iter().map(|m| m.to_uppercase()).collect(),
            statuses: self.statuses.into_iter().collect(),
            countries: self.countries.iter().map(|c| c.to_uppercase()).collect(),
            traffic: self.traffic,
            bucket_minutes: self.bucket_minutes,
        }
    }
}

pub fn parse_datetime(s: &str) -> Result<NaiveDateTime, String> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .ok_or_else(|| format!("expected YYYY-MM-DDTHH:MM[:SS], got {s:?}"))
}

pub fn parse_traffic(s: &str) -> Result<Traffic, String> {
    match s.to_ascii_lowercase().as_str() {
        "bot" | "bots" => Ok(Traffic::Bot),
        "human" | "humans" => Ok(Traffic::Human),
        _ => Err(format!("expected \"bot\" or \"human\", got {s:?}")),
    }
}
