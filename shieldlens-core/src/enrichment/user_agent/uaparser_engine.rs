use crate::enrichment::EnrichmentError;
use std::fs;
use std::path::Path;
use uaparser::{Parser, UserAgentParser};

pub struct UaParserEngine {
    parser: UserAgentParser,
}

impl UaParserEngine {
    /// Load a `regexes.yaml` rule file from the uap-core project.
    pub fn from_file(path: &Path) -> Result<Self, EnrichmentError> {
        let bytes = fs::read(path).map_err(|e| EnrichmentError::ReadUaRules {
            path: path.to_path_buf(),
            source: e,
        })?;
        let parser =
            UserAgentParser::from_bytes(&bytes).map_err(|e| EnrichmentError::ParseUaRules {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(Self { parser })
    }

    pub fn is_bot(&self, ua: &str) -> bool {
        let client = self.parser.parse(ua);
        let ua_family = client.user_agent.family.to_lowercase();
        let device_family = client.device.family.to_lowercase();

        ua_family.contains("bot")
            || ua_family.contains("crawler")
            || ua_family.contains("spider")
            || device_family == "spider"
    }
}
