// src/persona/traits.rs
//! LLM-inferred persona payload and its schema constraints.

use serde::{Deserialize, Serialize};

pub const AXIS_MIN: i32 = 1;
pub const AXIS_MAX: i32 = 10;
pub const KEYWORD_COUNT: usize = 4;

/// An explanatory sentence plus the post/comment URL that supports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub text: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaTraits {
    pub introversion_extroversion: i32,
    pub intuition_sensing: i32,
    pub feeling_thinking: i32,
    pub perceiving_judging: i32,
    pub behaviors_and_habits: Vec<Insight>,
    pub goals_and_needs: Vec<Insight>,
    pub frustrations: Vec<Insight>,
    pub motivations: Vec<Insight>,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub personality_type: Option<String>,
    #[serde(default)]
    pub emotional_regulation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("`{field}` must be within 1..=10, got {value}")]
    AxisOutOfRange { field: &'static str, value: i32 },
    #[error("`{field}` must contain at least one insight")]
    EmptyInsights { field: &'static str },
    #[error("`keywords` must contain exactly 4 entries, got {found}")]
    KeywordCount { found: usize },
}

impl PersonaTraits {
    pub fn axes(&self) -> [(&'static str, i32); 4] {
        [
            ("introversion_extroversion", self.introversion_extroversion),
            ("intuition_sensing", self.intuition_sensing),
            ("feeling_thinking", self.feeling_thinking),
            ("perceiving_judging", self.perceiving_judging),
        ]
    }

    pub fn insight_lists(&self) -> [(&'static str, &[Insight]); 4] {
        [
            ("behaviors_and_habits", self.behaviors_and_habits.as_slice()),
            ("goals_and_needs", self.goals_and_needs.as_slice()),
            ("frustrations", self.frustrations.as_slice()),
            ("motivations", self.motivations.as_slice()),
        ]
    }

    pub fn insights(&self) -> impl Iterator<Item = &Insight> {
        self.behaviors_and_habits
            .iter()
            .chain(&self.goals_and_needs)
            .chain(&self.frustrations)
            .chain(&self.motivations)
    }

    /// Constraints serde can't express: ranges and cardinalities.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in self.axes() {
            if !(AXIS_MIN..=AXIS_MAX).contains(&value) {
                return Err(ValidationError::AxisOutOfRange { field, value });
            }
        }
        for (field, list) in self.insight_lists() {
            if list.is_empty() {
                return Err(ValidationError::EmptyInsights { field });
            }
        }
        if self.keywords.len() != KEYWORD_COUNT {
            return Err(ValidationError::KeywordCount {
                found: self.keywords.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn sample_traits() -> PersonaTraits {
    let insight = |t: &str| Insight {
        text: t.to_string(),
        url: "https://www.reddit.com/r/rust/comments/abc123/my_first_crate/".to_string(),
    };
    PersonaTraits {
        introversion_extroversion: 3,
        intuition_sensing: 7,
        feeling_thinking: 8,
        perceiving_judging: 6,
        behaviors_and_habits: vec![insight("Writes long, careful answers.")],
        goals_and_needs: vec![insight("Wants to ship reliable tools.")],
        frustrations: vec![insight("Dislikes flaky builds.")],
        motivations: vec![insight("Enjoys teaching newcomers.")],
        keywords: vec!["curious".into(), "patient".into(), "precise".into(), "warm".into()],
        personality_type: None,
        emotional_regulation: None,
    }
}
