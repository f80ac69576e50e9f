//! Store schema migrations.
//!
//! Applied versions are recorded in `_migrations`; a database opened by an
//! older build only receives the batches it has not seen yet.

use std::num::ParseIntError;

use super::Error;
use tokio_rusqlite::{Connection, params};

/// Ordered (version, SQL) pairs. Every batch uses `IF NOT EXISTS`.
const MIGRATIONS: &[(&str, &str)] = &[("1", include_str!("../../migrations/001_stores.sql"))];

/// Apply pending migrations, returning how many were applied.
///
/// # Errors
///
/// Returns an error if a migration SQL fails to execute.
pub async fn run(conn: &Connection) -> Result<usize, Error> {
    let applied = conn
        .call(|conn| -> Result<usize, Error> {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS _migrations (
                    version INTEGER PRIMARY KEY,
                    applied_at TEXT NOT NULL
                )",
                [],
            )
            .map_err(Error::from)?;

            let current: i64 = conn
                .query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))
                .map_err(Error::from)?;

            let mut applied = 0;
            for (version, sql) in MIGRATIONS {
                let version_num: i64 = version
                    .parse()
                    .map_err(|e: ParseIntError| Error::MigrationFailed(e.to_string()))?;
                if version_num <= current {
                    continue;
                }

                conn.execute_batch(sql)
                    .map_err(|e| Error::MigrationFailed(format!("version {version_num}: {e}")))?;
                conn.execute(
                    "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
                    params![version_num, chrono::Utc::now().to_rfc3339()],
                )
                .map_err(Error::from)?;
                applied += 1;
            }

            Ok(applied)
        })
        .await
        .map_err(Error::from)?;

    if applied > 0 {
        tracing::debug!(applied, "applied store migrations");
    }

    Ok(applied)
}
