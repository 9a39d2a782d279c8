//! The SQLite query runner.
//!
//! The only component in this crate that opens a SQLite handle or executes
//! SQL. Every Chromium-family strategy goes through [`run`] rather
//! than touching `rusqlite` directly, which keeps the lock-retry policy
//! and the read-only/immutable open flags in one place.

use std::ffi::OsString;
use std::path::Path;
use std::thread;
use std::time::Duration;

use rusqlite::{Connection, OpenFlags};
use thiserror::Error;

/// Delays between retries of a lock-classified failure, exhausted after
/// three attempts total.
const RETRY_DELAYS: [Duration; 2] = [Duration::from_millis(100), Duration::from_millis(500)];
const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("cookie store not found: {path}")]
    NotFound { path: String },

    #[error("failed to open cookie store {path}: {source}")]
    Open { path: String, source: rusqlite::Error },

    #[error("query failed after exhausting lock retries: {source}")]
    Query { source: rusqlite::Error },
}

/// Substrings that classify a `rusqlite::Error` as a transient lock /
/// busy condition worth retrying, rather than a structural failure.
const LOCK_MARKERS: [&str; 3] = ["database is locked", "database locked", "sqlite_busy"];

fn is_lock_error(err: &rusqlite::Error) -> bool {
    let message = err.to_string().to_lowercase();
    LOCK_MARKERS.iter().any(|m| message.contains(m))
}

/// Opens `path` read-only, without ever mutating the file rusqlite holds
/// open. Uses the `?immutable=1` URI form so SQLite skips its own
/// lock-file bookkeeping entirely (the store may be mid-write by a live
/// browser process; this engine never waits on that lock to acquire a
/// connection, only on query execution per the retry policy below).
fn open_read_only(path: &Path) -> Result<Connection, RunnerError> {
    if !path.is_file() {
        return Err(RunnerError::NotFound {
            path: path.display().to_string(),
        });
    }

    let os_path = path.as_os_str();
    let mut uri = OsString::with_capacity(os_path.len() + "file:".len() + "?immutable=1".len());
    uri.push("file:");
    uri.push(os_path);
    uri.push("?immutable=1");

    Connection::open_with_flags(
        uri,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_URI,
    )
    .map_err(|source| RunnerError::Open {
        path: path.display().to_string(),
        source,
    })
}

/// Runs `sql` against the database at `path`, binding `params` positionally
/// and passing each resulting row through `transform`.
///
/// Attempts to set WAL journal mode first; refusal (e.g. a read-only
/// filesystem) is non-fatal and silently ignored, since WAL is an
/// optimisation here, not a requirement for a correct read.
///
/// On a lock-classified error the query is retried up to
/// [`MAX_ATTEMPTS`] times total with the delays in [`RETRY_DELAYS`]. Any
/// other error, or the final lock failure, propagates immediately. A
/// success that needed a retry is logged once.
pub fn run<T, F>(
    path: &Path,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
    transform: F,
) -> Result<Vec<T>, RunnerError>
where
    F: Fn(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
{
    let conn = open_read_only(path)?;
    let _ = conn.pragma_update(None, "journal_mode", "WAL");

    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match run_once(&conn, sql, params, &transform) {
            Ok(rows) => {
                if attempt > 1 {
                    tracing::info!(path = %path.display(), attempt, "query succeeded after retry");
                }
                return Ok(rows);
            }
            Err(source) if is_lock_error(&source) && attempt < MAX_ATTEMPTS => {
                let delay = RETRY_DELAYS[(attempt - 1) as usize];
                tracing::warn!(
                    path = %path.display(),
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "cookie store locked, retrying"
                );
                thread::sleep(delay);
            }
            Err(source) => return Err(RunnerError::Query { source }),
        }
    }
}

fn run_once<T, F>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
    transform: &F,
) -> rusqlite::Result<Vec<T>>
where
    F: Fn(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, transform)?;
    rows.collect()
}
