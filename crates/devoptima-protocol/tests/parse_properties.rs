use devoptima_protocol::{markers, parse, strip_fences, ParsedResult};
use proptest::prelude::*;

/// Arbitrary text salted with marker tokens and fences
fn marker_soup() -> impl Strategy<Value = String> {
    let piece = prop_oneof![
        Just(markers::DESCRIPTION.to_string()),
        Just(markers::CODE.to_string()),
        Just(markers::WARNING.to_string()),
        Just(markers::SECURITY_SCORE.to_string()),
        Just(markers::DEBT_GRADE.to_string()),
        Just(markers::ANALYSIS.to_string()),
        Just(markers::VERDICT.to_string()),
        Just(markers::SIMULATION_DATA.to_string()),
        Just(markers::TREE_DATA.to_string()),
        Just("```python".to_string()),
        Just("```".to_string()),
        Just("{\"name\": \"x\", \"children\": [".to_string()),
        ".{0,40}",
    ];
    prop::collection::vec(piece, 0..12).prop_map(|pieces| pieces.join("\n"))
}

proptest! {
    #[test]
    fn parse_is_total_on_marker_soup(raw in marker_soup()) {
        let result = parse(&raw);
        prop_assert!(result.security_score <= 100);
    }

    #[test]
    fn parse_is_total_on_arbitrary_bytes(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let raw = String::from_utf8_lossy(&bytes);
        let _ = parse(&raw);
    }

    #[test]
    fn fence_stripping_is_idempotent(raw in marker_soup()) {
        let once = strip_fences(&raw);
        prop_assert_eq!(strip_fences(&once), once);
    }

    #[test]
    fn parsed_fields_carry_no_outer_fences(raw in marker_soup()) {
        let result = parse(&raw);
        for field in [&result.description, &result.code, &result.warning, &result.verdict] {
            prop_assert!(!field.starts_with("```"));
            prop_assert!(!field.ends_with("```"));
        }
    }
}

#[test]
fn empty_input_is_all_defaults() {
    assert_eq!(parse(""), ParsedResult::default());
}

#[test]
fn every_key_survives_serialization_of_any_parse() {
    let raw = format!("{}\n{}", markers::SIMULATION_DATA, "{\"scenario\":");
    let value = serde_json::to_value(parse(&raw)).unwrap();
    assert_eq!(value.as_object().unwrap().len(), 10);
    assert!(value["simulation"].is_null());
}
