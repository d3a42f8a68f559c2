//! SQLite session store.
//!
//! An envelope is flattened into one column per persisted Act part on write
//! and reassembled into the nested JSON form on read. Writes are additive: an
//! Act part missing from the incoming envelope keeps whatever the row already
//! held, `schema_version` only moves forward, and `created_at` is set once.

mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection, Row};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::models::*;

/// Storage the HTTP layer and CLI talk to.
pub trait SessionStore {
    /// Persist `envelope` for `session_id` and return the stored result.
    fn save(&self, envelope: &SnapshotEnvelope, session_id: Uuid) -> Result<DatabaseSession>;

    fn load(&self, session_id: Uuid) -> Result<Option<DatabaseSession>>;
}

/// Where an Act part lives in the nested snapshot.
struct ActColumn {
    column: &'static str,
    act: &'static str,
    /// Key inside the Act object. `None` stores the whole Act in one column.
    key: Option<&'static str>,
    /// Plain text rather than JSON.
    text: bool,
}

const fn json_column(column: &'static str, act: &'static str, key: &'static str) -> ActColumn {
    ActColumn {
        column,
        act,
        key: Some(key),
        text: false,
    }
}

const ACT_COLUMNS: &[ActColumn] = &[
    json_column("act1_basic_info", "act1", "basicInfo"),
    json_column("act1_facts", "act1", "facts"),
    json_column("act1_evidence", "act1", "evidence"),
    json_column("act1_reasoning", "act1", "reasoning"),
    json_column("act1_metadata", "act1", "metadata"),
    json_column("act2_narrative", "act2", "narrative"),
    json_column("act2_timeline_analysis", "act2", "timelineAnalysis"),
    json_column("act2_evidence_questions", "act2", "evidenceQuestions"),
    json_column("act2_claim_analysis", "act2", "claimAnalysis"),
    ActColumn {
        column: "act3_socratic",
        act: "act3",
        key: None,
        text: false,
    },
    json_column("act4_learning_report", "act4", "learningReport"),
    json_column("act4_full_report", "act4", "fullReport"),
    ActColumn {
        column: "act4_ppt_url",
        act: "act4",
        key: Some("pptUrl"),
        text: true,
    },
    json_column("act4_ppt_metadata", "act4", "pptMetadata"),
];

/// Columns before the Act parts, in select order.
const HEAD_COLUMNS: &[&str] = &[
    "id",
    "version",
    "schema_version",
    "session_state",
    "case_title",
    "case_number",
    "court_name",
];

/// Columns after the Act parts, in select order.
const TAIL_COLUMNS: &[&str] = &["save_type", "created_at", "updated_at", "last_saved_at"];

impl ActColumn {
    fn encode(&self, snapshot: &Value) -> SqlValue {
        let act = match snapshot.get(self.act) {
            Some(act) if !act.is_null() => act,
            _ => return SqlValue::Null,
        };
        let part = match self.key {
            Some(key) => match act.get(key) {
                Some(part) if !part.is_null() => part,
                _ => return SqlValue::Null,
            },
            None => act,
        };
        match (self.text, part) {
            (true, Value::String(s)) => SqlValue::Text(s.clone()),
            _ => SqlValue::Text(part.to_string()),
        }
    }

    fn decode(&self, raw: String) -> Option<Value> {
        if self.text {
            return Some(Value::String(raw));
        }
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Unreadable JSON in column {}, ignoring: {}", self.column, e);
                None
            }
        }
    }
}

fn all_columns() -> Vec<&'static str> {
    HEAD_COLUMNS
        .iter()
        .copied()
        .chain(ACT_COLUMNS.iter().map(|c| c.column))
        .chain(TAIL_COLUMNS.iter().copied())
        .collect()
}

fn upsert_sql() -> String {
    let columns = all_columns();
    let placeholders = vec!["?"; columns.len()].join(", ");
    let act_updates = ACT_COLUMNS
        .iter()
        .map(|c| {
            format!(
                "{col} = COALESCE(excluded.{col}, teaching_sessions.{col})",
                col = c.column
            )
        })
        .collect::<Vec<_>>()
        .join(",\n            ");

    format!(
        "INSERT INTO teaching_sessions ({columns}) VALUES ({placeholders})
         ON CONFLICT(id) DO UPDATE SET
            version = excluded.version,
            schema_version = MAX(COALESCE(teaching_sessions.schema_version, {legacy}), excluded.schema_version),
            session_state = excluded.session_state,
            case_title = excluded.case_title,
            case_number = COALESCE(excluded.case_number, teaching_sessions.case_number),
            court_name = COALESCE(excluded.court_name, teaching_sessions.court_name),
            {act_updates},
            save_type = excluded.save_type,
            updated_at = excluded.updated_at,
            last_saved_at = excluded.last_saved_at",
        columns = columns.join(", "),
        legacy = LEGACY_SCHEMA_VERSION,
    )
}

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        tracing::debug!("Opened session database at {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "casebook")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Self::open(dirs.data_dir().join("casebook.db"))
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Session operations
    // ============================================================

    /// Flatten and upsert an envelope, then read the merged row back.
    pub fn save_snapshot(&self, id: Uuid, envelope: &SnapshotEnvelope) -> Result<DatabaseSession> {
        let snapshot = serde_json::to_value(envelope).context("Failed to encode snapshot")?;

        let mut params = vec![
            SqlValue::Text(id.to_string()),
            SqlValue::Text(envelope.version.clone()),
            SqlValue::Integer(i64::from(envelope.schema_version)),
            SqlValue::Text(envelope.session_state.as_str().to_string()),
            SqlValue::Text(envelope.case_title.clone()),
            optional_text(envelope.case_number.as_deref()),
            optional_text(envelope.court_name.as_deref()),
        ];
        params.extend(ACT_COLUMNS.iter().map(|c| c.encode(&snapshot)));
        params.extend([
            SqlValue::Text(envelope.save_type.as_str().to_string()),
            SqlValue::Text(envelope.created_at.to_rfc3339()),
            SqlValue::Text(envelope.updated_at.to_rfc3339()),
            SqlValue::Text(envelope.last_saved_at.to_rfc3339()),
        ]);

        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(&upsert_sql(), params_from_iter(params))
            .with_context(|| format!("Failed to save session {}", id))?;
        tracing::info!(
            "Saved {} snapshot for session {} ({})",
            envelope.save_type.as_str(),
            id,
            envelope.session_state.as_str()
        );

        load_locked(&conn, id)?
            .ok_or_else(|| anyhow::anyhow!("Session {} not found after save", id))
    }

    pub fn load_session(&self, id: Uuid) -> Result<Option<DatabaseSession>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        load_locked(&conn, id)
    }

    pub fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT id, case_title, session_state, COALESCE(schema_version, {}), save_type,
                    created_at, updated_at
             FROM teaching_sessions ORDER BY updated_at DESC",
            LEGACY_SCHEMA_VERSION
        ))?;

        let sessions = stmt
            .query_map([], |row| {
                Ok(SessionSummary {
                    id: parse_uuid(row.get::<_, String>(0)?),
                    case_title: row.get(1)?,
                    session_state: row.get(2)?,
                    schema_version: row.get(3)?,
                    save_type: row.get(4)?,
                    created_at: parse_datetime(row.get::<_, String>(5)?),
                    updated_at: parse_datetime(row.get::<_, String>(6)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sessions)
    }

    pub fn delete_session(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute(
            "DELETE FROM teaching_sessions WHERE id = ?",
            [id.to_string()],
        )?;
        Ok(rows > 0)
    }
}

impl SessionStore for Database {
    fn save(&self, envelope: &SnapshotEnvelope, session_id: Uuid) -> Result<DatabaseSession> {
        self.save_snapshot(session_id, envelope)
    }

    fn load(&self, session_id: Uuid) -> Result<Option<DatabaseSession>> {
        self.load_session(session_id)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

fn load_locked(conn: &Connection, id: Uuid) -> Result<Option<DatabaseSession>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM teaching_sessions WHERE id = ?",
        all_columns().join(", ")
    ))?;

    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        Ok(Some(session_from_row(row)?))
    } else {
        Ok(None)
    }
}

/// Reassemble the nested snapshot from a flat row.
fn session_from_row(row: &Row<'_>) -> rusqlite::Result<DatabaseSession> {
    let mut snapshot = Map::new();
    snapshot.insert("version".into(), json!(row.get::<_, String>(1)?));
    if let Some(schema_version) = row.get::<_, Option<i64>>(2)? {
        snapshot.insert("schemaVersion".into(), json!(schema_version));
    }
    snapshot.insert("sessionState".into(), json!(row.get::<_, String>(3)?));
    snapshot.insert("caseTitle".into(), json!(row.get::<_, String>(4)?));
    if let Some(case_number) = row.get::<_, Option<String>>(5)? {
        snapshot.insert("caseNumber".into(), json!(case_number));
    }
    if let Some(court_name) = row.get::<_, Option<String>>(6)? {
        snapshot.insert("courtName".into(), json!(court_name));
    }

    for (offset, column) in ACT_COLUMNS.iter().enumerate() {
        let raw: Option<String> = row.get(HEAD_COLUMNS.len() + offset)?;
        let Some(value) = raw.and_then(|raw| column.decode(raw)) else {
            continue;
        };
        let act = snapshot
            .entry(column.act)
            .or_insert_with(|| Value::Object(Map::new()));
        match (column.key, act) {
            (Some(key), Value::Object(parts)) => {
                parts.insert(key.to_string(), value);
            }
            (_, act) => *act = value,
        }
    }

    let tail = HEAD_COLUMNS.len() + ACT_COLUMNS.len();
    let updated_at: String = row.get(tail + 2)?;
    snapshot.insert("saveType".into(), json!(row.get::<_, String>(tail)?));
    snapshot.insert("createdAt".into(), json!(row.get::<_, String>(tail + 1)?));
    snapshot.insert("lastSavedAt".into(), json!(row.get::<_, String>(tail + 3)?));
    snapshot.insert("updatedAt".into(), json!(updated_at));

    Ok(DatabaseSession {
        id: parse_uuid(row.get::<_, String>(0)?),
        snapshot: Value::Object(snapshot),
        stored_at: Some(parse_datetime(updated_at)),
    })
}

fn optional_text(value: Option<&str>) -> SqlValue {
    value.map_or(SqlValue::Null, |s| SqlValue::Text(s.to_string()))
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
