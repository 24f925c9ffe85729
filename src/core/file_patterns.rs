/*
 * Classifies directory entry names against the name patterns of a scan mode.
 * Patterns are glob expressions matched against the whole entry name, ignoring
 * case, so a pattern never matches just a prefix or a suffix of a name.
 */
use super::config::ScanMode;
use glob::{MatchOptions, Pattern};

// `EventInc_YYYY-MM-DD.uat.zip`
pub const EVENT_INC_PATTERN: &str =
    "EventInc_[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9].uat.zip";

pub const PHOTO_PATTERNS: [&str; 2] = ["*.JPG", "*.PNG"];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    /*
     * Compiles the given glob expressions. An expression that fails to compile
     * is logged and left out of the set rather than failing the whole set.
     */
    pub fn new(expressions: &[&str]) -> Self {
        let mut patterns = Vec::with_capacity(expressions.len());
        for expression in expressions {
            match Pattern::new(expression) {
                Ok(pattern) => patterns.push(pattern),
                Err(err) => {
                    log::error!("PatternSet: Invalid name pattern '{expression}': {err}");
                }
            }
        }
        PatternSet { patterns }
    }

    pub fn for_mode(mode: ScanMode) -> Self {
        match mode {
            ScanMode::EventInc => Self::new(&[EVENT_INC_PATTERN]),
            ScanMode::Photo => Self::new(&PHOTO_PATTERNS),
        }
    }

    // True if `entry_name` matches any pattern of the set.
    pub fn matches(&self, entry_name: &str) -> bool {
        self.patterns
            .iter()
            .any(|pattern| pattern.matches_with(entry_name, MATCH_OPTIONS))
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
