// SPDX-License-Identifier: MIT

//! Lifecycle of the two database handles and the scratch attachment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, OpenFlags};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Error, Result};
use crate::matcher::register_matcher;

/// Alias under which the scratch database is attached to both handles.
pub const SCRATCH_ALIAS: &str = "scratch";

const BUSY_TIMEOUT: Duration = Duration::from_millis(500);

/// The two long-lived handles onto one database file.
///
/// The read-only handle enforces its capability at the engine level; the
/// caller's declared mode only selects which handle runs a statement. Both
/// handles share one scratch database (attached as [`SCRATCH_ALIAS`]) and
/// both have the `matches` search function registered. Handles are created
/// once at startup and closed once through [`BridgeDb::close`].
pub struct BridgeDb {
    pub(crate) reader: Connection,
    pub(crate) writer: Connection,
    // Keeps a generated scratch file alive for the lifetime of the handles.
    _scratch: Option<NamedTempFile>,
}

impl BridgeDb {
    /// Open both handles on `path` and attach the scratch database.
    ///
    /// When `scratch_path` is `None` a temporary file is created so both
    /// handles still share one scratch database.
    pub fn open<P: AsRef<Path>>(path: P, scratch_path: Option<&Path>) -> Result<Self> {
        let path = path.as_ref();

        // The writer goes first: opening it creates the file if needed, so
        // the read-only open below cannot fail on a missing database.
        let writer = Connection::open(path).map_err(|e| Error::DatabaseOpen {
            path: path.to_owned(),
            source: e,
        })?;
        let reader = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| Error::DatabaseOpen {
                path: path.to_owned(),
                source: e,
            })?;

        let (scratch_file, scratch_path) = match scratch_path {
            Some(p) => (None, p.to_path_buf()),
            None => {
                let file = tempfile::Builder::new()
                    .prefix("sqlink-scratch-")
                    .suffix(".db")
                    .tempfile()
                    .map_err(Error::ScratchCreate)?;
                let path = file.path().to_path_buf();
                (Some(file), path)
            }
        };

        for conn in [&writer, &reader] {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            attach_scratch(conn, &scratch_path)?;
            register_matcher(conn)?;
        }

        debug!("Opened database at {}", path.display());
        Ok(Self {
            reader,
            writer,
            _scratch: scratch_file,
        })
    }

    /// Close both handles in the required order.
    ///
    /// The reader goes first. Before the writer closes, a trivial read inside
    /// a transaction forces a WAL checkpoint so no `-wal`/`-shm` files
    /// outlive the server.
    pub fn close(self) -> Result<()> {
        let BridgeDb {
            reader,
            writer,
            _scratch,
        } = self;

        reader.close().map_err(|(_, e)| Error::Close(e))?;

        {
            let tx = writer.unchecked_transaction()?;
            let _ = tx.query_row("SELECT * FROM sqlite_schema LIMIT 1", [], |_| Ok(()));
            tx.commit()?;
        }
        writer.close().map_err(|(_, e)| Error::Close(e))?;

        debug!("Closed database handles");
        Ok(())
    }
}

fn attach_scratch(conn: &Connection, scratch_path: &PathBuf) -> Result<()> {
    conn.execute(
        &format!("ATTACH DATABASE ?1 AS {SCRATCH_ALIAS}"),
        [scratch_path.to_string_lossy()],
    )
    .map_err(|e| Error::ScratchAttach {
        path: scratch_path.clone(),
        source: e,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_and_closes_a_fresh_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = BridgeDb::open(&path, None).unwrap();
        db.close().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn scratch_is_shared_between_handles() {
        let dir = tempfile::tempdir().unwrap();
        let db = BridgeDb::open(dir.path().join("test.db"), None).unwrap();

        db.writer
            .execute_batch("CREATE TABLE scratch.staging(v); INSERT INTO scratch.staging VALUES (7)")
            .unwrap();
        let v: i64 = db
            .reader
            .query_row("SELECT v FROM scratch.staging", [], |row| row.get(0))
            .unwrap();
        assert_eq!(v, 7);
        db.close().unwrap();
    }

    #[test]
    fn explicit_scratch_path_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = dir.path().join("side.db");
        let db = BridgeDb::open(dir.path().join("test.db"), Some(&scratch)).unwrap();
        db.writer
            .execute_batch("CREATE TABLE scratch.t(v)")
            .unwrap();
        db.close().unwrap();
        assert!(scratch.exists());
    }

    #[test]
    fn close_checkpoints_the_wal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");

        let db = BridgeDb::open(&path, None).unwrap();
        db.writer
            .execute_batch("PRAGMA journal_mode = WAL; CREATE TABLE t(v); INSERT INTO t VALUES (1)")
            .unwrap();
        db.close().unwrap();

        let wal = path.with_extension("db-wal");
        assert!(!wal.exists(), "WAL file should not survive shutdown");
    }

    #[test]
    fn matcher_is_registered_on_both_handles() {
        let dir = tempfile::tempdir().unwrap();
        let db = BridgeDb::open(dir.path().join("test.db"), None).unwrap();
        for conn in [&db.reader, &db.writer] {
            let matched: bool = conn
                .query_row("SELECT matches('abc', 'b', 0, 1)", [], |row| row.get(0))
                .unwrap();
            assert!(matched);
        }
        db.close().unwrap();
    }
}
