use casebook::models::*;
use casebook::normalize::*;
use proptest::prelude::*;
use serde_json::{json, Value};
use speculate2::speculate;

speculate! {
    describe "normalize_confidence" {
        it "reads values above one as percentages" {
            assert_eq!(normalize_confidence(85.0), 0.85);
            assert_eq!(normalize_confidence(100.0), 1.0);
        }

        it "keeps ratios unchanged" {
            assert_eq!(normalize_confidence(0.5), 0.5);
            assert_eq!(normalize_confidence(1.0), 1.0);
        }

        it "clamps out-of-range values" {
            assert_eq!(normalize_confidence(150.0), 1.0);
            assert_eq!(normalize_confidence(-3.0), 0.0);
            assert_eq!(normalize_confidence(f64::NAN), 0.0);
        }

        it "accepts numeric strings" {
            assert_eq!(normalize_confidence_value(&json!("85%")), 0.85);
            assert_eq!(normalize_confidence_value(&json!("high")), 0.0);
        }
    }

    describe "normalize_party_list" {
        it "flattens a nested name array" {
            assert_eq!(
                normalize_party_list(&json!([{"name": ["A", "B"]}])),
                vec!["A", "B"]
            );
        }

        it "accepts a single string or object" {
            assert_eq!(normalize_party_list(&json!("Alice")), vec!["Alice"]);
            assert_eq!(normalize_party_list(&json!({"name": "Bob"})), vec!["Bob"]);
        }

        it "uses a placeholder for unusable entries" {
            assert_eq!(
                normalize_party_list(&json!(["Alice", 42, {"role": "x"}])),
                vec!["Alice", UNKNOWN_PARTY, UNKNOWN_PARTY]
            );
        }

        it "returns an empty list for null" {
            assert!(normalize_party_list(&Value::Null).is_empty());
        }
    }

    describe "label normalizers" {
        it "maps evidence labels in both languages" {
            assert_eq!(normalize_evidence_type("Expert opinion"), EvidenceType::Expert);
            assert_eq!(normalize_evidence_type("物证"), EvidenceType::Physical);
            assert_eq!(normalize_evidence_type("something else"), EvidenceType::Documentary);
        }

        it "maps extraction methods by substring" {
            assert_eq!(normalize_extraction_method("AI + rules"), ExtractionMethod::Hybrid);
            assert_eq!(normalize_extraction_method("rule-based"), ExtractionMethod::Rule);
            assert_eq!(normalize_extraction_method(""), ExtractionMethod::Ai);
        }

        it "maps impact from scores and labels" {
            assert_eq!(normalize_impact_level(&json!(0.9)), ImpactLevel::Major);
            assert_eq!(normalize_impact_level(&json!(20)), ImpactLevel::Minor);
            assert_eq!(normalize_impact_level(&json!("moderate")), ImpactLevel::Moderate);
            assert_eq!(normalize_impact_level(&json!(null)), ImpactLevel::Moderate);
        }

        it "only accepts known submitters" {
            assert_eq!(normalize_submitted_by("third-party"), Some(SubmittedBy::ThirdParty));
            assert_eq!(normalize_submitted_by("the neighbour"), None);
        }
    }
}

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        any::<f64>().prop_map(|x| json!(x)),
        "[a-zA-Z 原告]{0,8}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            inner.clone().prop_map(|name| json!({ "name": name })),
            prop::collection::hash_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn confidence_always_lands_in_unit_interval(x in any::<f64>()) {
        let c = normalize_confidence(x);
        prop_assert!((0.0..=1.0).contains(&c), "{} -> {}", x, c);
    }

    #[test]
    fn untyped_confidence_lands_in_unit_interval(value in arb_json()) {
        let c = normalize_confidence_value(&value);
        prop_assert!((0.0..=1.0).contains(&c));
    }

    #[test]
    fn evidence_labels_map_into_the_enum(label in ".{0,24}") {
        prop_assert!(EvidenceType::ALL.contains(&normalize_evidence_type(&label)));
    }

    #[test]
    fn extraction_methods_map_into_the_enum(label in ".{0,24}") {
        prop_assert!(ExtractionMethod::ALL.contains(&normalize_extraction_method(&label)));
    }

    #[test]
    fn impact_signals_map_into_the_enum(value in arb_json()) {
        prop_assert!(ImpactLevel::ALL.contains(&normalize_impact_level(&value)));
    }

    #[test]
    fn dialogue_level_stays_in_range(value in arb_json()) {
        prop_assert!((1..=3).contains(&normalize_level(&value)));
    }

    #[test]
    fn party_lists_are_idempotent(value in arb_json()) {
        let once = normalize_party_list(&value);
        let twice = normalize_party_list(&json!(once));
        prop_assert_eq!(once, twice);
    }
}
