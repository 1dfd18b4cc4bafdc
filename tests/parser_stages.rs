// tests/parser_stages.rs
//
// Resilient parse of model output, end to end through the public API.
// Covered:
// - strict JSON and fenced JSON succeed at the strict stage
// - chatter around JSON, a missing comma between strings and a trailing comma
//   are recovered at the loose stage
// - schema violations are rejected even when the JSON itself is fine
// - optional fields default to absent

mod common;

use reddit_persona::persona::{parse_persona, strip_fences, ParseError, ParseStage, ValidationError};

#[test]
fn strict_document_parses_without_repair() {
    let parsed = parse_persona(&common::valid_persona_json()).expect("valid persona");
    assert_eq!(parsed.stage, ParseStage::Strict);
    assert_eq!(parsed.traits.introversion_extroversion, 3);
    assert_eq!(parsed.traits.keywords.len(), 4);
    assert_eq!(parsed.traits.personality_type.as_deref(), Some("INTJ"));
    assert_eq!(parsed.traits.emotional_regulation, None);
}

#[test]
fn fences_are_removed_before_strict_parse() {
    let raw = format!("```json\n{}\n```", common::valid_persona_json());
    assert_eq!(strip_fences(&raw), common::valid_persona_json());
    assert_eq!(parse_persona(&raw).unwrap().stage, ParseStage::Strict);
}

#[test]
fn prose_around_document_is_recovered_loosely() {
    let raw = format!(
        "Sure! Based on the data, here is the persona:\n{}\nI hope this helps.",
        common::valid_persona_json()
    );
    let parsed = parse_persona(&raw).expect("loose recovery");
    assert_eq!(parsed.stage, ParseStage::Loose);
    assert_eq!(parsed.traits.feeling_thinking, 8);
}

#[test]
fn missing_commas_and_trailing_commas_are_repaired() {
    let raw = r#"{
        "introversion_extroversion": 2,
        "intuition_sensing": 9,
        "feeling_thinking": 4,
        "perceiving_judging": 5,
        "behaviors_and_habits": [{"text": "Posts late at night", "url": "https://www.reddit.com/r/a/1/"},],
        "goals_and_needs": [{"text": "Wants a job in games", "url": "https://www.reddit.com/r/a/2/"}],
        "frustrations": [{"text": "Slow builds", "url": "https://www.reddit.com/r/a/3/"}],
        "motivations": [{"text": "Craft", "url": "https://www.reddit.com/r/a/4/"}],
        "keywords": ["quiet" "curious"  "dry" "kind",],
    }"#;
    let parsed = parse_persona(raw).expect("repairable");
    assert_eq!(parsed.stage, ParseStage::Loose);
    assert_eq!(parsed.traits.keywords, vec!["quiet", "curious", "dry", "kind"]);
    assert_eq!(parsed.traits.personality_type, None);
}

#[test]
fn out_of_range_axis_is_rejected() {
    let raw = common::valid_persona_json().replace(
        "\"perceiving_judging\":6",
        "\"perceiving_judging\":11",
    );
    assert!(raw.contains("\"perceiving_judging\":11"));
    match parse_persona(&raw) {
        Err(ParseError::Invalid(ValidationError::AxisOutOfRange { field, value })) => {
            assert_eq!(field, "perceiving_judging");
            assert_eq!(value, 11);
        }
        other => panic!("expected axis violation, got {other:?}"),
    }
}

#[test]
fn wrong_keyword_count_is_rejected() {
    let raw = common::valid_persona_json().replace(
        r#"["curious","builder","patient","technical"]"#,
        r#"["curious","builder","patient"]"#,
    );
    assert!(matches!(
        parse_persona(&raw),
        Err(ParseError::Invalid(ValidationError::KeywordCount { found: 3 }))
    ));
}

#[test]
fn empty_insight_list_is_rejected() {
    let mut v: serde_json::Value = serde_json::from_str(&common::valid_persona_json()).unwrap();
    v["frustrations"] = serde_json::json!([]);
    assert!(matches!(
        parse_persona(&v.to_string()),
        Err(ParseError::Invalid(ValidationError::EmptyInsights { field: "frustrations" }))
    ));
}

#[test]
fn missing_required_field_is_a_decode_error() {
    let mut v: serde_json::Value = serde_json::from_str(&common::valid_persona_json()).unwrap();
    v.as_object_mut().unwrap().remove("motivations");
    assert!(matches!(parse_persona(&v.to_string()), Err(ParseError::Decode(_))));
}

#[test]
fn refusal_without_json_fails() {
    assert!(matches!(
        parse_persona("I can't build a persona from this data."),
        Err(ParseError::NoJsonRegion)
    ));
    assert!(parse_persona("").is_err());
}
