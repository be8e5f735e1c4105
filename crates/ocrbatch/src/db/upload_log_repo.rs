//! Upload log repository: one audit row per accepted uploaded file.

use std::fmt;
use std::io::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Row};
use serde::Serialize;

use super::{Database, DatabaseError};

/// CSV header of the audit export, in column order.
pub const CSV_HEADER: [&str; 6] = [
    "ID",
    "Filename",
    "Timestamp (UTC)",
    "Status",
    "Language",
    "Pages Processed",
];

/// A row of the `upload_logs` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadLog {
    pub id: i64,
    pub filename: String,
    /// Fixed when the row is created.
    pub timestamp: DateTime<Utc>,
    /// `Processing`, `Complete`, or `Error: <message>`.
    pub status: String,
    pub language: String,
    pub pages_processed: i64,
}

impl UploadLog {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let raw_timestamp: String = row.get("timestamp")?;
        let timestamp = DateTime::parse_from_rfc3339(&raw_timestamp)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

        Ok(Self {
            id: row.get("id")?,
            filename: row.get("filename")?,
            timestamp,
            status: row.get("status")?,
            language: row.get("language")?,
            pages_processed: row.get("pages_processed")?,
        })
    }

    pub fn upload_status(&self) -> UploadStatus {
        UploadStatus::parse(&self.status)
    }
}

/// Structured view of the free-form `status` column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Processing,
    Complete,
    Error(String),
    Other(String),
}

impl UploadStatus {
    pub fn parse(status: &str) -> Self {
        match status {
            "Processing" => Self::Processing,
            "Complete" => Self::Complete,
            other => match other.strip_prefix("Error: ") {
                Some(message) => Self::Error(message.to_string()),
                None => Self::Other(other.to_string()),
            },
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Processing => write!(f, "Processing"),
            Self::Complete => write!(f, "Complete"),
            Self::Error(message) => write!(f, "Error: {}", message),
            Self::Other(status) => write!(f, "{}", status),
        }
    }
}

/// Records the start of processing for `filename` and returns the new row.
pub fn insert(db: &Database, filename: &str, language: &str) -> Result<UploadLog, DatabaseError> {
    let timestamp = Utc::now();
    let status = UploadStatus::Processing.to_string();

    let id = db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO upload_logs (filename, timestamp, status, language, pages_processed)
             VALUES (?1, ?2, ?3, ?4, 0)",
            params![
                filename,
                timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
                status,
                language,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })?;

    log::info!("Upload log {} created for {}", id, filename);

    // Round-trip through the stored text so callers see what a later read would.
    find_by_id(db, id)?.ok_or(DatabaseError::NotFound(id))
}

/// Marks a row `Complete` with the number of pages processed.
pub fn mark_complete(db: &Database, id: i64, pages_processed: usize) -> Result<(), DatabaseError> {
    update_status(db, id, &UploadStatus::Complete, pages_processed as i64)
}

/// Marks a row failed; the status becomes `Error: <message>`.
pub fn mark_failed(db: &Database, id: i64, message: &str) -> Result<(), DatabaseError> {
    update_status(db, id, &UploadStatus::Error(message.to_string()), 0)
}

fn update_status(
    db: &Database,
    id: i64,
    status: &UploadStatus,
    pages_processed: i64,
) -> Result<(), DatabaseError> {
    let status = status.to_string();
    let changed = db.with_conn(|conn| {
        Ok(conn.execute(
            "UPDATE upload_logs SET status = ?2, pages_processed = ?3 WHERE id = ?1",
            params![id, status, pages_processed],
        )?)
    })?;

    if changed == 0 {
        return Err(DatabaseError::NotFound(id));
    }

    log::info!("Upload log {} -> {}", id, status);
    Ok(())
}

/// Finds a row by its id.
pub fn find_by_id(db: &Database, id: i64) -> Result<Option<UploadLog>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM upload_logs WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], UploadLog::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// All rows, most recent first.
pub fn list_recent(db: &Database) -> Result<Vec<UploadLog>, DatabaseError> {
    query_all(
        db,
        "SELECT * FROM upload_logs ORDER BY timestamp DESC, id DESC",
    )
}

/// All rows in insertion (id) order.
pub fn list_all(db: &Database) -> Result<Vec<UploadLog>, DatabaseError> {
    query_all(db, "SELECT * FROM upload_logs ORDER BY id ASC")
}

fn query_all(db: &Database, sql: &str) -> Result<Vec<UploadLog>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map([], UploadLog::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Writes every row as CSV (header first, id order) and returns the number
/// of data rows written.
pub fn export_csv<W: Write>(db: &Database, writer: W) -> Result<usize, DatabaseError> {
    let rows = list_all(db)?;

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CSV_HEADER)?;
    for row in &rows {
        csv.write_record([
            row.id.to_string(),
            row.filename.clone(),
            row.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            row.status.clone(),
            row.language.clone(),
            row.pages_processed.to_string(),
        ])?;
    }
    csv.flush().map_err(|e| DatabaseError::Csv(e.into()))?;

    Ok(rows.len())
}
