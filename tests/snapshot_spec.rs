use casebook::error::SnapshotError;
use casebook::models::*;
use casebook::snapshot::{to_database, to_store, validate, ConversionOptions};
use serde_json::{json, Value};
use speculate2::speculate;
use uuid::Uuid;

fn state_from(value: Value) -> ApplicationState {
    serde_json::from_value(value).expect("Invalid application state")
}

fn intake_state() -> ApplicationState {
    state_from(json!({
        "uploadData": {
            "extractedElements": {
                "data": {
                    "basicInfo": {
                        "caseNumber": "(2023) Civil 4521",
                        "court": "Intermediate People's Court",
                        "parties": {
                            "plaintiff": [{"name": ["A", "B"]}],
                            "defendant": "Bob",
                            "thirdParty": null
                        }
                    },
                    "facts": {
                        "summary": "The borrower stopped repaying in 2021.",
                        "timeline": [{"date": "2021-03-01", "event": "Last repayment"}]
                    },
                    "evidence": {
                        "summary": "Contract and transfers",
                        "items": [
                            {"type": "书证", "description": "Loan contract", "submittedBy": "原告"},
                            {"type": "证人证言", "description": "Witness statement"}
                        ]
                    },
                    "reasoning": {"summary": "The contract is valid."}
                }
            },
            "confidence": 85,
            "aiModel": "deepseek-chat",
            "extractionMethod": "hybrid"
        }
    }))
}

fn no_sync() -> ConversionOptions {
    ConversionOptions::default().with_sync_stores(false)
}

fn store(envelope: &SnapshotEnvelope) -> DatabaseSession {
    DatabaseSession::new(
        Uuid::new_v4(),
        serde_json::to_value(envelope).expect("Failed to encode envelope"),
    )
}

speculate! {
    describe "to_database" {
        it "flattens nested party names" {
            let envelope = to_database(&intake_state(), None, &ConversionOptions::default())
                .expect("Conversion failed");
            let parties = &envelope.act1.basic_info.parties;

            assert_eq!(parties.plaintiff, vec!["A", "B"]);
            assert_eq!(parties.defendant, vec!["Bob"]);
            assert!(parties.third_party.is_empty());
        }

        it "normalizes intake metadata and evidence labels" {
            let envelope = to_database(&intake_state(), None, &ConversionOptions::default())
                .expect("Conversion failed");
            let act1 = &envelope.act1;

            assert_eq!(act1.metadata.confidence, 0.85);
            assert_eq!(act1.metadata.extraction_method, ExtractionMethod::Hybrid);
            let items = act1.evidence.items.as_ref().expect("Evidence items missing");
            assert_eq!(items[0].kind, EvidenceType::Documentary);
            assert_eq!(items[0].submitted_by, Some(SubmittedBy::Plaintiff));
            assert_eq!(items[1].kind, EvidenceType::Testimonial);
        }

        it "leaves Acts without source data absent" {
            let envelope = to_database(&intake_state(), None, &ConversionOptions::default())
                .expect("Conversion failed");

            assert!(envelope.act2.is_none());
            assert!(envelope.act3.is_none());
            assert!(envelope.act4.is_none());
            assert_eq!(envelope.session_state, SessionState::Act1);

            let encoded = serde_json::to_value(&envelope).expect("Encode failed");
            assert!(encoded.get("act2").is_none());
        }

        it "assigns chapter order from position when missing" {
            let mut state = intake_state();
            state.story_chapters = vec![
                json!({"title": "Background", "content": "..."}),
                json!({"title": "Dispute", "order": 5}),
                json!("A bare chapter"),
            ];
            let envelope = to_database(&state, None, &ConversionOptions::default())
                .expect("Conversion failed");

            let chapters = envelope.act2.expect("Act 2 missing").narrative.expect("Narrative missing").chapters;
            let orders: Vec<u32> = chapters.iter().map(|c| c.order).collect();
            assert_eq!(orders, vec![1, 5, 3]);
            assert_eq!(chapters[2].content["content"], json!("A bare chapter"));
        }

        it "deduplicates completed dialogue nodes" {
            let mut state = intake_state();
            state.socratic_data = Some(SocraticData {
                level: Some(json!("2")),
                completed_nodes: ["n1", "n2"].into_iter().map(String::from).collect(),
            });
            let envelope = to_database(&state, None, &ConversionOptions::default())
                .expect("Conversion failed");

            let act3 = envelope.act3.expect("Act 3 missing");
            assert_eq!(act3.level, 2);
            assert_eq!(act3.total_rounds, 2);
            assert_eq!(envelope.session_state, SessionState::Act3);
        }

        it "produces envelopes that validate" {
            let envelope = to_database(&intake_state(), None, &ConversionOptions::strict())
                .expect("Strict conversion failed");
            let report = validate(&serde_json::to_value(&envelope).expect("Encode failed"));
            assert!(report.success, "{}", report);
        }

        it "does not mutate the input state" {
            let state = intake_state();
            let before = state.clone();
            to_database(&state, Some("https://cdn.example/deck.pptx"), &ConversionOptions::default())
                .expect("Conversion failed");
            assert_eq!(state, before);
        }
    }

    describe "per-Act failure isolation" {
        before {
            let mut state = intake_state();
            state.story_chapters = vec![json!({"title": "Background"})];
            state.socratic_data = Some(SocraticData {
                level: Some(json!(2)),
                completed_nodes: ["n1"].into_iter().map(String::from).collect(),
            });
            state.summary_data = Some(SummaryData {
                report: Some(json!({"summary": "Repayment ordered"})),
                ppt_url: None,
                ppt_metadata: None,
            });
        }

        it "keeps Acts 1 to 3 when the summary report is unusable" {
            state.summary_data = Some(SummaryData {
                report: Some(json!(42)),
                ppt_url: None,
                ppt_metadata: None,
            });
            let envelope = to_database(&state, None, &ConversionOptions::default())
                .expect("Conversion failed");

            assert!(envelope.act4.is_none());
            assert_eq!(envelope.act1.basic_info.parties.defendant, vec!["Bob"]);
            assert!(envelope.act2.is_some());
            assert!(envelope.act3.is_some());
        }

        it "keeps the other Acts when the analysis result is unusable" {
            state.analysis_data.result = Some(json!("x"));
            let envelope = to_database(&state, None, &ConversionOptions::default())
                .expect("Conversion failed");

            assert!(envelope.act2.is_none());
            assert_eq!(envelope.act1.basic_info.parties.plaintiff, vec!["A", "B"]);
            assert!(envelope.act3.is_some());
            assert!(envelope.act4.is_some());
        }
    }

    describe "turning points" {
        it "serialize their normalized fields over leftover aliases" {
            let mut state = intake_state();
            state.timeline_analysis = Some(json!({"turningPoints": [
                {"date": "2021-03", "event": "Default", "description": "Borrower stopped paying"},
                {"date": null, "time": "2021-05", "description": "Notice"}
            ]}));
            let envelope = to_database(&state, None, &ConversionOptions::strict())
                .expect("Strict conversion failed");

            let encoded = serde_json::to_value(&envelope).expect("Encode failed");
            let points = &encoded["act2"]["timelineAnalysis"]["turningPoints"];
            assert_eq!(points[0]["description"], json!("Default"));
            assert_eq!(points[1]["date"], json!("2021-05"));

            let restored = to_store(&store(&envelope), &no_sync(), None).expect("Restore failed");
            let timeline = restored.timeline_analysis.expect("Timeline missing");
            assert_eq!(timeline["turningPoints"][1]["date"], json!("2021-05"));
        }
    }

    describe "validation modes" {
        before {
            let mut state = intake_state();
            state.story_chapters = vec![json!({"title": 42, "content": "Numbers are not titles"})];
        }

        it "rejects a malformed chapter in strict mode" {
            let err = to_database(&state, None, &ConversionOptions::strict())
                .expect_err("Strict mode should fail");
            match err {
                SnapshotError::Validation(report) => {
                    assert!(report.has_issue_at("act2.narrative.chapters[0].title"), "{}", report);
                }
                other => panic!("Unexpected error: {}", other),
            }
        }

        it "keeps the envelope in lenient mode" {
            let envelope = to_database(&state, None, &ConversionOptions::default())
                .expect("Lenient mode should succeed");
            let chapters = envelope.act2.expect("Act 2 missing").narrative.expect("Narrative missing").chapters;
            assert_eq!(chapters[0].content["title"], json!(42));
        }

        it "skips validation when asked" {
            let options = ConversionOptions::unvalidated().with_save_type(SaveType::Manual);
            let envelope = to_database(&state, None, &options).expect("Unvalidated conversion failed");
            assert_eq!(envelope.save_type, SaveType::Manual);
        }
    }

    describe "to_store" {
        it "round-trips parties and intake" {
            let envelope = to_database(&intake_state(), None, &ConversionOptions::default())
                .expect("Conversion failed");
            let restored = to_store(&store(&envelope), &no_sync(), None).expect("Restore failed");

            let again = to_database(&restored, None, &ConversionOptions::default())
                .expect("Second conversion failed");
            assert_eq!(again.act1.basic_info, envelope.act1.basic_info);
            assert_eq!(again.act1.evidence, envelope.act1.evidence);
            assert_eq!(again.act1.metadata.confidence, 0.85);
            assert_eq!(again.case_number, envelope.case_number);
        }

        it "restores Act 2 into the UI fields" {
            let mut state = intake_state();
            state.timeline_analysis = Some(json!({
                "turningPoints": [{"date": "2021-03-01", "description": "Default", "impact": "重大"}],
                "overview": "kept verbatim"
            }));
            state.claim_analysis = Some(json!({"claims": ["repayment"]}));
            let envelope = to_database(&state, None, &ConversionOptions::default())
                .expect("Conversion failed");

            let restored = to_store(&store(&envelope), &no_sync(), None).expect("Restore failed");

            let timeline = restored.timeline_analysis.expect("Timeline missing");
            assert_eq!(timeline["overview"], json!("kept verbatim"));
            assert_eq!(timeline["turningPoints"][0]["impact"], json!("major"));
            assert_eq!(restored.claim_analysis, Some(json!({"claims": ["repayment"]})));
            assert_eq!(restored.session_state.as_deref(), Some("act2"));
        }

        it "marks provenance" {
            let envelope = to_database(&intake_state(), None, &ConversionOptions::default())
                .expect("Conversion failed");
            let session = store(&envelope);
            let restored = to_store(&session, &no_sync().read_only(), None).expect("Restore failed");

            let provenance = restored.provenance.expect("Provenance missing");
            assert_eq!(provenance.session_id, session.id);
            assert!(provenance.is_read_only);
            assert_eq!(provenance.source, "database");
            assert_eq!(provenance.schema_version, CURRENT_SCHEMA_VERSION);
        }

        it "rejects snapshots from a newer schema" {
            let session = DatabaseSession::new(Uuid::new_v4(), json!({
                "schemaVersion": MAX_SUPPORTED_SCHEMA_VERSION + 1,
                "caseTitle": "From the future"
            }));
            let result = to_store(&session, &no_sync(), None);
            assert!(matches!(result, Err(SnapshotError::UnsupportedVersion { .. })));
        }

        it "reads legacy snapshots written under older field names" {
            let session = DatabaseSession::new(Uuid::new_v4(), json!({
                "schemaVersion": 1,
                "case_title": "Legacy case",
                "act1_basic_info": {"parties": {"plaintiff": {"name": "Acme Ltd"}}},
                "act2": {"story_chapters": [{"title": "Only chapter"}]},
                "act4": {"learning_report": {"summary": "Learned a lot"}, "ppt_url": "https://old/deck.pptx"}
            }));

            let restored = to_store(&session, &no_sync(), None).expect("Restore failed");

            assert_eq!(restored.upload_data.case_title.as_deref(), Some("Legacy case"));
            assert_eq!(
                restored.upload_data.extracted_elements.as_ref().expect("Intake missing")
                    ["data"]["basicInfo"]["parties"]["plaintiff"],
                json!(["Acme Ltd"])
            );
            assert_eq!(restored.story_chapters.len(), 1);
            let summary = restored.summary_data.expect("Summary missing");
            assert_eq!(summary.ppt_url.as_deref(), Some("https://old/deck.pptx"));
            assert_eq!(summary.report, Some(json!({"summary": "Learned a lot"})));
            assert_eq!(restored.session_state.as_deref(), Some("act4"));
        }

        it "degrades an empty snapshot to defaults" {
            let session = DatabaseSession::new(Uuid::new_v4(), json!({}));
            let restored = to_store(&session, &no_sync(), None).expect("Restore failed");
            assert!(restored.story_chapters.is_empty());
            assert!(restored.socratic_data.is_none());
            assert_eq!(restored.session_state.as_deref(), Some("act1"));
        }
    }
}
