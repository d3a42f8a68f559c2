use casebook::db::{Database, SessionStore};
use casebook::models::*;
use casebook::snapshot::{to_database, to_database_at, to_store, ConversionOptions};
use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use speculate2::speculate;
use uuid::Uuid;

fn intake_state() -> ApplicationState {
    serde_json::from_value(json!({
        "uploadData": {
            "caseTitle": "Loan dispute",
            "extractedElements": {
                "basicInfo": {"court": "District Court", "parties": {"plaintiff": "Alice", "defendant": "Bob"}},
                "facts": {"summary": "Unpaid loan"}
            },
            "confidence": 0.9
        }
    }))
    .expect("Invalid application state")
}

fn analysed_state() -> ApplicationState {
    let mut state = intake_state();
    state.story_chapters = vec![json!({"title": "Background"})];
    state.claim_analysis = Some(json!({"claims": ["repayment"]}));
    state
}

fn envelope_for(state: &ApplicationState) -> SnapshotEnvelope {
    to_database(state, None, &ConversionOptions::default()).expect("Conversion failed")
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
        let id = Uuid::new_v4();
    }

    describe "save_snapshot" {
        it "stores the envelope in nested form" {
            let envelope = envelope_for(&analysed_state());
            let stored = db.save_snapshot(id, &envelope).expect("Save failed");

            assert_eq!(stored.id, id);
            assert_eq!(stored.snapshot["caseTitle"], json!("Loan dispute"));
            assert_eq!(stored.snapshot["courtName"], json!("District Court"));
            assert_eq!(stored.snapshot["schemaVersion"], json!(CURRENT_SCHEMA_VERSION));
            assert_eq!(stored.snapshot["act1"]["basicInfo"]["parties"]["plaintiff"], json!(["Alice"]));
            assert_eq!(stored.snapshot["act2"]["claimAnalysis"], json!({"claims": ["repayment"]}));
            assert!(stored.snapshot.get("act3").is_none());
        }

        it "never removes a previously stored Act" {
            db.save_snapshot(id, &envelope_for(&analysed_state())).expect("First save failed");
            let stored = db.save_snapshot(id, &envelope_for(&intake_state())).expect("Second save failed");

            assert_eq!(stored.snapshot["act2"]["claimAnalysis"], json!({"claims": ["repayment"]}));
            assert_eq!(stored.snapshot["act2"]["narrative"]["chapters"][0]["title"], json!("Background"));
        }

        it "never lowers the schema version" {
            db.save_snapshot(id, &envelope_for(&intake_state())).expect("First save failed");
            let mut older = envelope_for(&intake_state());
            older.schema_version = LEGACY_SCHEMA_VERSION;
            let stored = db.save_snapshot(id, &older).expect("Second save failed");

            assert_eq!(stored.snapshot["schemaVersion"], json!(CURRENT_SCHEMA_VERSION));
        }

        it "keeps the creation time of the first save" {
            let first = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
            let later = first + Duration::hours(2);
            let options = ConversionOptions::default();

            let envelope = to_database_at(&intake_state(), None, &options, first).expect("Conversion failed");
            db.save_snapshot(id, &envelope).expect("First save failed");
            let envelope = to_database_at(&intake_state(), None, &options, later).expect("Conversion failed");
            let stored = db.save_snapshot(id, &envelope).expect("Second save failed");

            assert_eq!(stored.snapshot["createdAt"], json!(first.to_rfc3339()));
            assert_eq!(stored.snapshot["updatedAt"], json!(later.to_rfc3339()));
            assert_eq!(stored.stored_at, Some(later));
        }
    }

    describe "load_session" {
        it "returns None for an unknown session" {
            assert!(db.load_session(Uuid::new_v4()).expect("Query failed").is_none());
        }

        it "round-trips through the restorer" {
            let envelope = envelope_for(&analysed_state());
            db.save(&envelope, id).expect("Save failed");
            let session = db.load(id).expect("Query failed").expect("Session missing");

            let options = ConversionOptions::default().with_sync_stores(false);
            let restored = to_store(&session, &options, None).expect("Restore failed");
            assert_eq!(restored.upload_data.case_title.as_deref(), Some("Loan dispute"));
            assert_eq!(restored.story_chapters.len(), 1);
            assert_eq!(restored.claim_analysis, Some(json!({"claims": ["repayment"]})));
        }
    }

    describe "list_sessions" {
        it "summarizes stored sessions" {
            db.save_snapshot(id, &envelope_for(&analysed_state())).expect("Save failed");

            let sessions = db.list_sessions().expect("Query failed");
            assert_eq!(sessions.len(), 1);
            assert_eq!(sessions[0].id, id);
            assert_eq!(sessions[0].case_title, "Loan dispute");
            assert_eq!(sessions[0].session_state, "act2");
            assert_eq!(sessions[0].schema_version, CURRENT_SCHEMA_VERSION);
        }
    }

    describe "delete_session" {
        it "removes the row" {
            db.save_snapshot(id, &envelope_for(&intake_state())).expect("Save failed");
            assert!(db.delete_session(id).expect("Delete failed"));
            assert!(!db.delete_session(id).expect("Delete failed"));
            assert!(db.load_session(id).expect("Query failed").is_none());
        }
    }
}

mod legacy_rows {
    use super::*;

    #[test]
    fn rows_without_schema_version_restore_as_legacy() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("casebook.db");
        let db = Database::open(path.clone()).expect("Failed to open database");
        db.migrate().expect("Failed to run migrations");

        let id = Uuid::new_v4();
        let conn = rusqlite::Connection::open(&path).expect("Failed to open connection");
        conn.execute(
            "INSERT INTO teaching_sessions
                (id, version, session_state, case_title, act1_basic_info, act3_socratic,
                 created_at, updated_at, last_saved_at)
             VALUES (?, '1.0.0', 'act3', 'Old case', ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                json!({"parties": {"plaintiff": [{"name": "Acme"}]}}).to_string(),
                json!({"level": 3, "completedNodes": ["n1", "n1", "n2"]}).to_string(),
                "2023-01-01T00:00:00Z",
                "2023-01-01T00:00:00Z",
                "2023-01-01T00:00:00Z",
            ),
        )
        .expect("Failed to insert legacy row");

        let session = db.load_session(id).expect("Query failed").expect("Session missing");
        assert!(session.snapshot.get("schemaVersion").is_none());

        let options = ConversionOptions::default().with_sync_stores(false);
        let restored = to_store(&session, &options, None).expect("Restore failed");
        let provenance = restored.provenance.expect("Provenance missing");
        assert_eq!(provenance.schema_version, LEGACY_SCHEMA_VERSION);
        let socratic = restored.socratic_data.expect("Act 3 missing");
        assert_eq!(socratic.completed_nodes.len(), 2);
        assert_eq!(restored.session_state.as_deref(), Some("act3"));

        let summary = &db.list_sessions().expect("Query failed")[0];
        assert_eq!(summary.schema_version, LEGACY_SCHEMA_VERSION);
    }
}
