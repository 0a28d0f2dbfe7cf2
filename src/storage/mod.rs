//! SQLite storage layer -- pool, schema, incident reads and writes.

pub mod schema;

use std::path::Path;

use anyhow::{Context, Result};
use r2d2::Pool as R2D2Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection};

use crate::model::{self, Incident, NewIncident};

/// Connection Pool type
pub type Pool = R2D2Pool<SqliteConnectionManager>;

/// Open (or create) the SQLite store and return a connection pool.
///
/// The parent directory is created if missing and the schema is applied, so this is
/// safe to call on every startup.
pub fn open_pool(path: &Path) -> Result<Pool> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create store directory: {}", dir.display()))?;
    }

    let manager = SqliteConnectionManager::file(path).with_init(|c| {
        c.execute_batch(
            "PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )
    });

    // The pipeline is sequential; one connection is checked out at a time.
    let pool = R2D2Pool::builder()
        .max_size(1)
        .build(manager)
        .with_context(|| format!("failed to open store: {}", path.display()))?;

    let conn = pool.get()?;
    schema::migrate(&conn)?;
    tracing::debug!(path = %path.display(), "Schema ready");

    Ok(pool)
}

/// Number of rows in the `incidents` table.
pub fn count_incidents(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM incidents", [], |row| row.get(0))?;
    Ok(count)
}

/// Insert a batch of incidents. Callers own the surrounding transaction.
pub fn insert_incidents(conn: &Connection, incidents: &[NewIncident]) -> Result<usize> {
    let mut stmt = conn.prepare(
        "INSERT INTO incidents (timestamp, source_ip, username, incident_type, severity, description)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;

    for incident in incidents {
        stmt.execute(params![
            model::format_timestamp(&incident.timestamp),
            incident.source_ip,
            incident.username,
            incident.incident_type.as_str(),
            incident.severity.as_str(),
            incident.description(),
        ])?;
    }

    Ok(incidents.len())
}

/// Read every stored incident, oldest id first.
pub fn list_incidents(pool: &Pool) -> Result<Vec<Incident>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT id, timestamp, source_ip, username, incident_type, severity, description
         FROM incidents ORDER BY id",
    )?;

    let rows: Vec<(i64, String, String, String, String, String, String)> = stmt
        .query_map([], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
            ))
        })?
        .collect::<Result<_, _>>()?;

    rows.into_iter()
        .map(
            |(id, timestamp, source_ip, username, incident_type, severity, description)| -> Result<Incident> {
                Ok(Incident {
                    id,
                    timestamp: model::parse_timestamp(&timestamp)?,
                    source_ip,
                    username,
                    incident_type: incident_type.parse()?,
                    severity: severity.parse()?,
                    description,
                })
            },
        )
        .collect()
}
