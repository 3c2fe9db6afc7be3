//! Schema setup and upgrades.
//!
//! The schema ships as numbered SQL batches. `user_version` in the
//! database header records the last batch applied, so reopening an
//! existing file only runs what is new.

use super::Error;
use tokio_rusqlite::Connection;

/// Numbered schema batches, applied in ascending order.
const MIGRATIONS: &[(i64, &str)] = &[(1, include_str!("../../migrations/001_entries.sql"))];

/// Bring the database up to the current schema.
///
/// # Errors
///
/// Returns [`Error::MigrationFailed`] when a batch does not execute. The
/// version marker only advances after its batch succeeds, so a failed
/// upgrade is retried on the next open.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        let current: i64 =
            conn.query_row("PRAGMA user_version", [], |row| row.get(0)).map_err(Error::from)?;

        for &(version, sql) in MIGRATIONS.iter().filter(|(v, _)| *v > current) {
            conn.execute_batch(sql)
                .map_err(|e| Error::MigrationFailed(format!("batch {version}: {e}")))?;
            conn.pragma_update(None, "user_version", version).map_err(Error::from)?;
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn schema_version(conn: &Connection) -> i64 {
        conn.call(|conn| conn.query_row("PRAGMA user_version", [], |row| row.get(0)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_run_is_idempotent() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();
        run(&conn).await.unwrap();

        assert_eq!(schema_version(&conn).await, MIGRATIONS.len() as i64);
    }

    #[tokio::test]
    async fn test_run_creates_entries_table() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();

        let found: bool = conn
            .call(|conn| {
                conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'entries')",
                    [],
                    |row| row.get(0),
                )
            })
            .await
            .unwrap();
        assert!(found);
    }
}
