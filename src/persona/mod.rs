// src/persona/mod.rs
//! Persona pipeline: prompt rendering, resilient completion parsing, and the final merge.

pub mod generate;
pub mod parser;
pub mod prompt;
pub mod record;
pub mod repair;
pub mod traits;

// Re-export convenient types.
pub use crate::persona::generate::{PersonaGenerator, DEFAULT_MAX_ATTEMPTS};
pub use crate::persona::parser::{parse_persona, strip_fences, ParseError, ParseStage, ParsedPersona};
pub use crate::persona::prompt::{build_prompt, DEFAULT_PROMPT_CHAR_BUDGET};
pub use crate::persona::record::{finalize, PersonaRecord};
pub use crate::persona::traits::{Insight, PersonaTraits, ValidationError};
