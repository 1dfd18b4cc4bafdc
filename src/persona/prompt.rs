// src/persona/prompt.rs
//! Deterministic prompt rendering for persona inference.

use crate::reconcile::CanonicalUserRecord;
use crate::sources::ContentItem;

pub const DEFAULT_PROMPT_CHAR_BUDGET: usize = 5000;
pub const ENTRY_DELIMITER: &str = "\n---\n";

const INSTRUCTIONS: &str = r#"You are a senior behavioral psychologist and personality analyst. Your job is to infer detailed psychological and personality traits based on digital footprints such as Reddit posts and comments.

You are analyzing the following Reddit user's content. Based on their tone, opinions, patterns of speech, emotional tone, and values, construct a detailed persona. Each entry in DATA starts with the URL of the post or comment it came from; use those URLs as references.

Your response must follow these strict rules:
- Output in RAW, MINIFIED JSON FORMAT ONLY. No code blocks. No markdown. No explanatory text. No pre/post commentary.
- The JSON must strictly match the schema below and be valid, parsable JSON. No trailing commas. All strings must be wrapped in double quotes.
- Use exactly the field names shown in the schema.
- Each list item must be a JSON object with two keys:
  - "text": A complete, empathetic sentence (2-4 lines) interpreting the psychological insight.
  - "url": The URL of the Reddit post or comment (taken from DATA) that supports this insight.
- "behaviors_and_habits", "goals_and_needs", "frustrations" and "motivations" must each contain at least one item.
- The "keywords" field must include exactly four adjectives describing the overall personality.

Schema:
{
  "introversion_extroversion": int (1-10),  // 1 = highly introverted, 10 = highly extroverted
  "intuition_sensing": int (1-10),          // 1 = highly sensing, 10 = highly intuitive
  "feeling_thinking": int (1-10),           // 1 = highly feeling-based, 10 = highly logic/thought-based
  "perceiving_judging": int (1-10),         // 1 = highly spontaneous (perceiving), 10 = highly structured (judging)

  "behaviors_and_habits": [{"text": "...", "url": "..."}],
  "goals_and_needs": [{"text": "...", "url": "..."}],
  "frustrations": [{"text": "...", "url": "..."}],
  "motivations": [{"text": "...", "url": "..."}],
  "keywords": [string],                     // exactly four adjectives
  "personality_type": string (optional),    // e.g. a four-letter type label
  "emotional_regulation": string (optional)
}

Only return valid JSON. Do not explain anything. Do not add any commentary. Do not wrap the output in code blocks. All values must be properly quoted, and there must be no trailing commas."#;

/// `url`, optional title, then body. `None` when there is no text at all.
fn render_entry(item: &ContentItem) -> Option<String> {
    let title = item.title.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let body = item.body.trim();
    if title.is_none() && body.is_empty() {
        return None;
    }
    let mut out = item.url.clone();
    if let Some(t) = title {
        out.push('\n');
        out.push_str(t);
    }
    if !body.is_empty() {
        out.push('\n');
        out.push_str(body);
    }
    Some(out)
}

/// Join posts then comments with the delimiter and keep the first `budget` chars.
pub fn render_content(record: &CanonicalUserRecord, budget: usize) -> String {
    let joined = record
        .content()
        .filter_map(render_entry)
        .collect::<Vec<_>>()
        .join(ENTRY_DELIMITER);
    match joined.char_indices().nth(budget) {
        Some((cut, _)) => joined[..cut].to_string(),
        None => joined,
    }
}

/// Full instruction text for one record. Same record, same prompt.
pub fn build_prompt(record: &CanonicalUserRecord, budget: usize) -> String {
    let data = render_content(record, budget);
    format!("{INSTRUCTIONS}\n\nDATA:\n{data}").trim().to_string()
}
