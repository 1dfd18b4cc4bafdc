// src/persona/repair.rs
//! Heuristic repair of near-valid JSON emitted by a model.
//!
//! The rule list is closed: each rule targets one observed malformation and
//! has its own test. Anything else is left to the outer generation retry.

use once_cell::sync::Lazy;
use regex::Regex;

/// Two string literals separated only by whitespace: `"a"  "b"`.
static RE_ADJACENT_STRINGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""\s+""#).expect("adjacent strings regex"));
/// A comma directly (modulo whitespace) before `]` or `}`.
static RE_TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*([\]}])").expect("trailing comma regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairRule {
    /// Insert the missing comma between adjacent string tokens.
    AdjacentStrings,
    /// Drop a comma that precedes a closing bracket or brace.
    TrailingComma,
}

/// Applied in this order.
pub const REPAIR_RULES: [RepairRule; 2] = [RepairRule::AdjacentStrings, RepairRule::TrailingComma];

impl RepairRule {
    pub fn apply(self, input: &str) -> String {
        match self {
            RepairRule::AdjacentStrings => RE_ADJACENT_STRINGS.replace_all(input, r#"", ""#).into_owned(),
            RepairRule::TrailingComma => RE_TRAILING_COMMA.replace_all(input, "$1").into_owned(),
        }
    }
}

/// Greedy candidate region: from the first `{` to the last `}` (inclusive).
pub fn extract_json_region(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Run every repair rule over `candidate`.
pub fn repair(candidate: &str) -> String {
    REPAIR_RULES
        .iter()
        .fold(candidate.to_string(), |acc, rule| rule.apply(&acc))
}

/// Locate the JSON region and repair it; `None` when there is no brace-delimited region.
pub fn extract_and_repair(text: &str) -> Option<String> {
    extract_json_region(text).map(repair)
}
