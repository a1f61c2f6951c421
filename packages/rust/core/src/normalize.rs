//! Language and state tagging for records an agent writes.

use tadka_shared::regions::{self, ALL_STATES};
use tadka_shared::{AgentConfig, Language};

/// Language and state tags for one record.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub language: Option<Language>,
    pub states: Vec<String>,
}

/// Resolves language and states for an agent's records.
///
/// Language precedence: the agent's configured language, the scraped hint,
/// a language named in the record's text, then the default language.
/// States are the agent's configured states, else every state where the
/// language is regional, else `["all"]`.
#[derive(Debug, Clone)]
pub struct Normalizer {
    language: Option<Language>,
    states: Vec<String>,
    default_language: Option<Language>,
}

impl Normalizer {
    pub fn new(agent: &AgentConfig, default_language: Option<Language>) -> Self {
        Self {
            language: agent.language,
            states: agent.states.clone(),
            default_language,
        }
    }

    /// Tags for a record with an optional scraped language hint and the
    /// texts (title, body) searched for language words.
    pub fn normalize(&self, hint: Option<&str>, texts: &[&str]) -> Normalized {
        let language = self
            .language
            .or_else(|| hint.and_then(parse_hint))
            .or_else(|| texts.iter().find_map(|t| regions::detect_language(t)))
            .or(self.default_language);

        let states = if !self.states.is_empty() {
            self.states.clone()
        } else {
            language
                .map(regions::states_for_language)
                .filter(|s| !s.is_empty())
                .map(|s| s.into_iter().map(String::from).collect())
                .unwrap_or_else(|| vec![ALL_STATES.to_string()])
        };

        Normalized { language, states }
    }
}

/// A hint may be a name, an ISO code (`te`, `en-IN`), or a phrase
/// ("Telugu, Hindi").
fn parse_hint(hint: &str) -> Option<Language> {
    let hint = hint.trim();
    if hint.is_empty() {
        return None;
    }
    if let Ok(lang) = hint.parse::<Language>() {
        return Some(lang);
    }
    let primary = hint.split(['-', '_']).next().unwrap_or(hint);
    if let Ok(lang) = primary.parse::<Language>() {
        return Some(lang);
    }
    regions::detect_language(hint)
}
