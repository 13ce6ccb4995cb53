mod uaparser_engine;
mod woothee_engine;

use crate::enrichment::user_agent::uaparser_engine::UaParserEngine;
use crate::enrichment::user_agent::woothee_engine::WootheeEngine;
use crate::enrichment::{BotClassifier, EnrichmentError};
use serde::{Deserialize, Serialize};
use std::path::Path;

const MAX_USER_AGENT_LENGTH: usize = 2048;

#[derive(Default, Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UaEngineKind {
    UaParser,
    #[default]
    Woothee,
    /// Every client counts as human.
    None,
}

/// `Ok(None)` when classification is switched off.
pub fn build_ua_engine(
    kind: UaEngineKind,
    regexes: Option<&Path>,
) -> Result<Option<UaEngine>, EnrichmentError> {
    match kind {
        UaEngineKind::UaParser => {
            let path = regexes.ok_or(EnrichmentError::MissingUaRules)?;
            Ok(Some(UaEngine::UaParser(UaParserEngine::from_file(path)?)))
        }
        UaEngineKind::Woothee => Ok(Some(UaEngine::Woothee(WootheeEngine::new()))),
        UaEngineKind::None => Ok(None),
    }
}

pub enum UaEngine {
    UaParser(UaParserEngine),
    Woothee(WootheeEngine),
}

impl BotClassifier for UaEngine {
    fn classify(&self, user_agent: &str) -> bool {
        if user_agent.len() > MAX_USER_AGENT_LENGTH {
            return false;
        }

        match self {
            UaEngine::UaParser(p) => p.is_bot(user_agent),
            UaEngine::Woothee(p) => p.is_bot(user_agent),
        }
    }
}
