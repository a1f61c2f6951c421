//! Indian state → regional language lookup table.
//!
//! Every record the agents write carries a language and a list of state codes.
//! The frontend shows a user content whose states include theirs, content in
//! one of their state's languages, or content tagged [`ALL_STATES`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TadkaError;

/// State tag meaning "visible in every state".
pub const ALL_STATES: &str = "all";

// ---------------------------------------------------------------------------
// Language
// ---------------------------------------------------------------------------

/// Content languages the CMS tags records with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Telugu,
    Tamil,
    Hindi,
    Kannada,
    Malayalam,
    Marathi,
    Bengali,
    Gujarati,
    Punjabi,
    Odia,
    Assamese,
    English,
}

impl Language {
    /// Every supported language, in table order.
    pub const ALL: [Language; 12] = [
        Language::Telugu,
        Language::Tamil,
        Language::Hindi,
        Language::Kannada,
        Language::Malayalam,
        Language::Marathi,
        Language::Bengali,
        Language::Gujarati,
        Language::Punjabi,
        Language::Odia,
        Language::Assamese,
        Language::English,
    ];

    /// Lowercase storage form (`"telugu"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Telugu => "telugu",
            Language::Tamil => "tamil",
            Language::Hindi => "hindi",
            Language::Kannada => "kannada",
            Language::Malayalam => "malayalam",
            Language::Marathi => "marathi",
            Language::Bengali => "bengali",
            Language::Gujarati => "gujarati",
            Language::Punjabi => "punjabi",
            Language::Odia => "odia",
            Language::Assamese => "assamese",
            Language::English => "english",
        }
    }

    /// ISO 639-1 code.
    pub fn iso_code(&self) -> &'static str {
        match self {
            Language::Telugu => "te",
            Language::Tamil => "ta",
            Language::Hindi => "hi",
            Language::Kannada => "kn",
            Language::Malayalam => "ml",
            Language::Marathi => "mr",
            Language::Bengali => "bn",
            Language::Gujarati => "gu",
            Language::Punjabi => "pa",
            Language::Odia => "or",
            Language::Assamese => "as",
            Language::English => "en",
        }
    }

    /// Match a single lowercase word that unambiguously names a language:
    /// the language name, a common spelling variant, or a film-industry nickname.
    ///
    /// ISO codes are deliberately not accepted here ("hi", "as", "or" are
    /// ordinary English words).
    pub fn from_signal_word(word: &str) -> Option<Language> {
        let lang = match word {
            "telugu" | "tollywood" => Language::Telugu,
            "tamil" | "kollywood" => Language::Tamil,
            "hindi" | "bollywood" => Language::Hindi,
            "kannada" | "sandalwood" => Language::Kannada,
            "malayalam" | "mollywood" => Language::Malayalam,
            "marathi" => Language::Marathi,
            "bengali" | "bangla" | "tollygunge" => Language::Bengali,
            "gujarati" | "dhollywood" => Language::Gujarati,
            "punjabi" | "pollywood" => Language::Punjabi,
            "odia" | "oriya" | "ollywood" => Language::Odia,
            "assamese" | "jollywood" => Language::Assamese,
            "english" | "hollywood" => Language::English,
            _ => return None,
        };
        Some(lang)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = TadkaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        if let Some(lang) = Language::from_signal_word(&needle) {
            return Ok(lang);
        }
        Language::ALL
            .into_iter()
            .find(|l| l.iso_code() == needle)
            .ok_or_else(|| TadkaError::validation(format!("unknown language '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// State table
// ---------------------------------------------------------------------------

/// A state or union territory and the languages its readers follow.
#[derive(Debug, Clone, Copy)]
pub struct StateInfo {
    /// Short lowercase code used in record state lists (`"ap"`).
    pub code: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Regional languages, most widely spoken first.
    pub languages: &'static [Language],
}

const fn state(
    code: &'static str,
    name: &'static str,
    languages: &'static [Language],
) -> StateInfo {
    StateInfo {
        code,
        name,
        languages,
    }
}

/// The static state → language table.
pub static STATES: &[StateInfo] = &[
    state("ap", "Andhra Pradesh", &[Language::Telugu, Language::Hindi]),
    state("ts", "Telangana", &[Language::Telugu, Language::Hindi]),
    state("tn", "Tamil Nadu", &[Language::Tamil]),
    state("ka", "Karnataka", &[Language::Kannada, Language::Hindi]),
    state("kl", "Kerala", &[Language::Malayalam]),
    state("mh", "Maharashtra", &[Language::Marathi, Language::Hindi]),
    state("wb", "West Bengal", &[Language::Bengali, Language::Hindi]),
    state("gj", "Gujarat", &[Language::Gujarati, Language::Hindi]),
    state("pb", "Punjab", &[Language::Punjabi, Language::Hindi]),
    state("or", "Odisha", &[Language::Odia, Language::Hindi]),
    state("as", "Assam", &[Language::Assamese, Language::Bengali, Language::Hindi]),
    state("tr", "Tripura", &[Language::Bengali]),
    state("dl", "Delhi", &[Language::Hindi, Language::Punjabi]),
    state("up", "Uttar Pradesh", &[Language::Hindi]),
    state("br", "Bihar", &[Language::Hindi]),
    state("mp", "Madhya Pradesh", &[Language::Hindi]),
    state("rj", "Rajasthan", &[Language::Hindi]),
    state("hr", "Haryana", &[Language::Hindi, Language::Punjabi]),
    state("hp", "Himachal Pradesh", &[Language::Hindi]),
    state("uk", "Uttarakhand", &[Language::Hindi]),
    state("jh", "Jharkhand", &[Language::Hindi]),
    state("cg", "Chhattisgarh", &[Language::Hindi]),
    state("ga", "Goa", &[Language::Marathi, Language::Hindi]),
    state("jk", "Jammu and Kashmir", &[Language::Hindi]),
    state("py", "Puducherry", &[Language::Tamil, Language::Telugu, Language::Malayalam]),
];

/// Look up a state by its code (case-insensitive).
pub fn state_by_code(code: &str) -> Option<&'static StateInfo> {
    let code = code.trim();
    STATES.iter().find(|s| s.code.eq_ignore_ascii_case(code))
}

/// Languages for a state code. Unknown codes have none.
pub fn languages_for_state(code: &str) -> &'static [Language] {
    state_by_code(code).map(|s| s.languages).unwrap_or(&[])
}

/// All state codes where `lang` is a regional language, in table order.
pub fn states_for_language(lang: Language) -> Vec<&'static str> {
    STATES
        .iter()
        .filter(|s| s.languages.contains(&lang))
        .map(|s| s.code)
        .collect()
}

/// Find the first unambiguous language signal in free text
/// (e.g. "Tollywood box office" → Telugu).
pub fn detect_language(text: &str) -> Option<Language> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .find_map(|w| Language::from_signal_word(&w.to_lowercase()))
}

/// Validate and lowercase a list of state codes. `"all"` is accepted.
pub fn validate_states(codes: &[String]) -> crate::Result<Vec<String>> {
    codes
        .iter()
        .map(|c| {
            let c = c.trim().to_lowercase();
            if c == ALL_STATES || state_by_code(&c).is_some() {
                Ok(c)
            } else {
                Err(TadkaError::validation(format!("unknown state code '{c}'")))
            }
        })
        .collect()
}

/// Whether content tagged with `language` and `states` is shown to a user in `user_state`.
pub fn is_visible_in_state(
    language: Option<Language>,
    states: &[String],
    user_state: &str,
) -> bool {
    if states
        .iter()
        .any(|s| s == ALL_STATES || s.eq_ignore_ascii_case(user_state))
    {
        return true;
    }
    language.is_some_and(|lang| languages_for_state(user_state).contains(&lang))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_codes_are_unique() {
        let mut codes: Vec<&str> = STATES.iter().map(|s| s.code).collect();
        codes.sort_unstable();
        let before = codes.len();
        codes.dedup();
        assert_eq!(before, codes.len());
    }

    #[test]
    fn language_parsing_accepts_names_codes_and_nicknames() {
        assert_eq!("Telugu".parse::<Language>().unwrap(), Language::Telugu);
        assert_eq!("ta".parse::<Language>().unwrap(), Language::Tamil);
        assert_eq!(" Kollywood ".parse::<Language>().unwrap(), Language::Tamil);
        assert_eq!("oriya".parse::<Language>().unwrap(), Language::Odia);
        assert!("klingon".parse::<Language>().is_err());
    }

    #[test]
    fn telugu_maps_to_both_telugu_states() {
        let states = states_for_language(Language::Telugu);
        assert!(states.contains(&"ap"));
        assert!(states.contains(&"ts"));
        assert!(states.contains(&"py"));
        assert!(!states.contains(&"tn"));
    }

    #[test]
    fn english_has_no_regional_states() {
        assert!(states_for_language(Language::English).is_empty());
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(state_by_code("TN").unwrap().name, "Tamil Nadu");
        assert_eq!(languages_for_state("Kl"), &[Language::Malayalam]);
        assert!(languages_for_state("zz").is_empty());
    }

    #[test]
    fn detects_language_from_title_words() {
        assert_eq!(
            detect_language("Tollywood: Devara box office collections"),
            Some(Language::Telugu)
        );
        assert_eq!(
            detect_language("Manjummel Boys (Malayalam) review"),
            Some(Language::Malayalam)
        );
        // "hi" is an ISO code but must not count as a signal
        assert_eq!(detect_language("Say hi to the new trailer"), None);
    }

    #[test]
    fn visibility_rules() {
        let all = vec![ALL_STATES.to_string()];
        assert!(is_visible_in_state(None, &all, "tn"));

        let telugu_states = vec!["ap".to_string(), "ts".to_string()];
        assert!(is_visible_in_state(Some(Language::Telugu), &telugu_states, "ts"));
        // Not tagged for KA, but Hindi content is followed there
        assert!(is_visible_in_state(Some(Language::Hindi), &telugu_states, "ka"));
        assert!(!is_visible_in_state(Some(Language::Telugu), &telugu_states, "kl"));
        assert!(!is_visible_in_state(None, &telugu_states, "unknown"));
    }

    #[test]
    fn validate_states_rejects_unknown_codes() {
        let ok = validate_states(&["AP".into(), "all".into()]).unwrap();
        assert_eq!(ok, vec!["ap", "all"]);
        assert!(validate_states(&["xx".into()]).is_err());
    }
}
