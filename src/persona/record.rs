// src/persona/record.rs
//! Final externally-visible object: canonical record merged with persona traits.

use serde::ser::{Error as _, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::persona::traits::{PersonaTraits, ValidationError};
use crate::reconcile::CanonicalUserRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct PersonaRecord {
    pub user: CanonicalUserRecord,
    pub traits: PersonaTraits,
}

fn into_object(v: Value) -> Map<String, Value> {
    match v {
        Value::Object(m) => m,
        _ => Map::new(),
    }
}

/// Keys of `top` replace same-named keys of `base`.
pub(crate) fn overlay(mut base: Map<String, Value>, top: Map<String, Value>) -> Map<String, Value> {
    base.extend(top);
    base
}

impl PersonaRecord {
    /// Flat JSON object. On a key collision the traits value wins.
    pub fn to_json_map(&self) -> serde_json::Result<Map<String, Value>> {
        let user = into_object(serde_json::to_value(&self.user)?);
        let traits = into_object(serde_json::to_value(&self.traits)?);
        Ok(overlay(user, traits))
    }
}

impl Serialize for PersonaRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json_map()
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }
}

/// Insight URLs that don't appear in the record's content. Advisory only.
pub fn unsupported_insight_urls<'a>(
    user: &CanonicalUserRecord,
    traits: &'a PersonaTraits,
) -> Vec<&'a str> {
    let known: HashSet<&str> = user.content_urls();
    traits
        .insights()
        .map(|i| i.url.as_str())
        .filter(|u| !known.contains(u))
        .collect()
}

/// Validate once more at the boundary and merge.
pub fn finalize(
    user: CanonicalUserRecord,
    traits: PersonaTraits,
) -> Result<PersonaRecord, ValidationError> {
    traits.validate()?;

    let unsupported = unsupported_insight_urls(&user, &traits);
    if !unsupported.is_empty() {
        tracing::warn!(
            target: "persona",
            unsupported = unsupported.len(),
            total = traits.insights().count(),
            "insight URLs not found in user content"
        );
    }

    Ok(PersonaRecord { user, traits })
}
