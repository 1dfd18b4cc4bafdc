// src/persona/parser.rs
//! Two-tier parse of a completion into [`PersonaTraits`]:
//! strict (as emitted, minus code fences), then loose (region extraction + repair).
//! Both tiers end in schema validation; nothing half-valid gets through.

use metrics::counter;

use crate::persona::repair;
use crate::persona::traits::{PersonaTraits, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStage {
    Strict,
    Loose,
}

impl ParseStage {
    pub fn as_str(self) -> &'static str {
        match self {
            ParseStage::Strict => "strict",
            ParseStage::Loose => "loose",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPersona {
    pub traits: PersonaTraits,
    pub stage: ParseStage,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("no brace-delimited JSON region in completion")]
    NoJsonRegion,
    #[error("completion does not decode as persona JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("completion violates persona schema: {0}")]
    Invalid(#[from] ValidationError),
}

/// Remove fenced-code markers wherever they appear.
pub fn strip_fences(raw: &str) -> String {
    raw.replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

fn decode_and_validate(text: &str) -> Result<PersonaTraits, ParseError> {
    let traits: PersonaTraits = serde_json::from_str(text)?;
    traits.validate()?;
    Ok(traits)
}

/// Stage 2 only: the stripped text must already be schema-valid JSON.
pub fn parse_strict(text: &str) -> Result<PersonaTraits, ParseError> {
    decode_and_validate(text)
}

/// Stage 3 only: extract the candidate region, repair it, decode and validate.
pub fn parse_loose(text: &str) -> Result<PersonaTraits, ParseError> {
    let repaired = repair::extract_and_repair(text).ok_or(ParseError::NoJsonRegion)?;
    decode_and_validate(&repaired)
}

/// Full parse: strip fences, try strict, fall back to loose.
pub fn parse_persona(raw: &str) -> Result<ParsedPersona, ParseError> {
    let text = strip_fences(raw);

    let strict_err = match parse_strict(&text) {
        Ok(traits) => {
            counter!("persona_parse_total", "stage" => "strict").increment(1);
            return Ok(ParsedPersona {
                traits,
                stage: ParseStage::Strict,
            });
        }
        Err(e) => e,
    };
    tracing::debug!(target: "persona", error = %strict_err, "strict parse failed; trying loose repair");

    match parse_loose(&text) {
        Ok(traits) => {
            counter!("persona_parse_total", "stage" => "loose").increment(1);
            Ok(ParsedPersona {
                traits,
                stage: ParseStage::Loose,
            })
        }
        Err(e) => {
            counter!("persona_parse_failures_total").increment(1);
            Err(e)
        }
    }
}
