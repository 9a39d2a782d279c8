//! The Firefox strategy.
//!
//! ### Scheme (Firefox 104+)
//!
//! ```sql
//! CREATE TABLE moz_cookies (
//!   id INTEGER PRIMARY KEY,
//!   originAttributes TEXT NOT NULL DEFAULT '',
//!   name TEXT,
//!   value TEXT,
//!   host TEXT,
//!   path TEXT,
//!   expiry INTEGER,
//!   lastAccessed INTEGER,
//!   creationTime INTEGER,
//!   isSecure INTEGER,
//!   isHttpOnly INTEGER,
//!   sameSite INTEGER DEFAULT 0,
//!   ...
//! );
//! ```
//!
//! Values are stored plaintext; no master key or decryption is involved.

pub mod paths;

use cookie::time::OffsetDateTime;

use crate::browser::{Browser, QueryOptions, Strategy};
use crate::cookie::{CookieMeta, Expiry, ExportedCookie, SameSite};
use crate::locate;
use crate::spec::CookieSpec;
use crate::sqlite;

pub struct FirefoxStrategy;

impl Strategy for FirefoxStrategy {
    fn browser(&self) -> Browser {
        Browser::Firefox
    }

    fn query(&self, spec: &CookieSpec, options: &QueryOptions) -> Vec<ExportedCookie> {
        let profile_dirs = profile_dirs(options);
        if profile_dirs.is_empty() {
            tracing::debug!("no Firefox profiles found");
            return Vec::new();
        }

        profile_dirs
            .into_iter()
            .flat_map(|dir| query_profile(&dir, spec))
            .collect()
    }

    fn batch_query(&self, specs: &[CookieSpec], options: &QueryOptions) -> Option<Vec<ExportedCookie>> {
        let profile_dirs = profile_dirs(options);
        if profile_dirs.is_empty() {
            return Some(Vec::new());
        }

        let (predicate, values) = crate::spec::build_combined_predicate(specs, "name", "host");
        if predicate.is_empty() {
            return Some(Vec::new());
        }
        let sql = format!(
            "SELECT name, value, host, path, expiry, isSecure, isHttpOnly, sameSite \
             FROM moz_cookies WHERE {predicate}"
        );
        let params: Vec<&dyn rusqlite::ToSql> = values.iter().map(|v| v as &dyn rusqlite::ToSql).collect();

        let mut out = Vec::new();
        for db_path in &profile_dirs {
            match run_rows(db_path, &sql, &params) {
                Ok(rows) => out.extend(to_exported(rows, db_path)),
                Err(err) => {
                    tracing::warn!(path = %db_path.display(), %err, "combined batch query failed, skipping file");
                }
            }
        }
        Some(out)
    }
}

fn profile_dirs(options: &QueryOptions) -> Vec<std::path::PathBuf> {
    if let Some(store) = &options.store {
        return vec![store.clone()];
    }

    let mut dirs = Vec::new();
    if let Some(provider) = paths::default_provider() {
        dirs.push(provider.cookies_database());
    }

    let base = options
        .root_dir
        .clone()
        .or_else(paths::base_dir);
    if let Some(base) = base {
        for profile_dir in locate::firefox_default_like_profile_dirs(&base) {
            let db = paths::PathProvider::new(profile_dir).cookies_database();
            if !dirs.contains(&db) {
                dirs.push(db);
            }
        }
    }

    dirs.into_iter().filter(|p| p.is_file()).collect()
}

struct Row {
    name: String,
    value: String,
    host: String,
    path: String,
    expiry: i64,
    secure: bool,
    http_only: bool,
    same_site: i64,
}

fn query_profile(db_path: &std::path::Path, spec: &CookieSpec) -> Vec<ExportedCookie> {
    // Placeholder numbers shift depending on whether `name` is bound at
    // all, since rusqlite binds a params slice positionally starting at
    // ?1 regardless of which numbered placeholders the SQL text uses.
    let (name_predicate, host_start) = if spec.name_is_wildcard() {
        ("1".to_string(), 1)
    } else {
        ("name = ?1".to_string(), 2)
    };
    let sql = format!(
        "SELECT name, value, host, path, expiry, isSecure, isHttpOnly, sameSite \
         FROM moz_cookies \
         WHERE {name_predicate} AND (host = ?{a} OR host = ?{b} OR host LIKE ?{c})",
        a = host_start,
        b = host_start + 1,
        c = host_start + 2,
    );

    let dotted = format!(".{}", spec.domain);
    let suffix = format!("%.{}", spec.domain);
    let params: Vec<&dyn rusqlite::ToSql> = if spec.name_is_wildcard() {
        vec![&spec.domain, &dotted, &suffix]
    } else {
        vec![&spec.name, &spec.domain, &dotted, &suffix]
    };

    let rows = match run_rows(db_path, &sql, &params) {
        Ok(rows) => rows,
        Err(err) => {
            tracing::warn!(path = %db_path.display(), %err, "failed to query Firefox cookie store");
            return Vec::new();
        }
    };

    to_exported(rows, db_path)
}

/// Shared row-mapping for both the single-spec and combined-batch
/// queries; only the SQL text and parameter list differ between them.
fn run_rows(db_path: &std::path::Path, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<Row>, sqlite::RunnerError> {
    sqlite::run(db_path, sql, params, |row| {
        Ok(Row {
            name: row.get(0)?,
            value: row.get(1)?,
            host: row.get(2)?,
            path: row.get(3)?,
            expiry: row.get(4)?,
            secure: row.get::<_, i64>(5)? != 0,
            http_only: row.get::<_, i64>(6)? != 0,
            same_site: row.get(7)?,
        })
    })
}

fn to_exported(rows: Vec<Row>, db_path: &std::path::Path) -> Vec<ExportedCookie> {
    let profile = db_path
        .parent()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    rows.into_iter()
        .map(|row| ExportedCookie {
            name: row.name,
            domain: row.host,
            value: row.value,
            path: ExportedCookie::normalised_path(row.path),
            expiry: expiry_from_unix_seconds(row.expiry),
            secure: row.secure,
            http_only: row.http_only,
            same_site: match row.same_site {
                0 => SameSite::None,
                1 => SameSite::Lax,
                2 => SameSite::Strict,
                _ => SameSite::Unspecified,
            },
            meta: CookieMeta {
                browser: "Firefox".to_string(),
                profile: profile.clone(),
                source_file: db_path.display().to_string(),
                decrypted: true,
            },
        })
        .collect()
}

fn expiry_from_unix_seconds(seconds: i64) -> Expiry {
    if seconds <= 0 {
        return Expiry::Session;
    }
    match OffsetDateTime::from_unix_timestamp(seconds) {
        Ok(t) => Expiry::At(t),
        Err(_) => Expiry::Never,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn seed_db(path: &std::path::Path) {
        let conn = Connection::open(path).unwrap();
        conn.execute(
            "CREATE TABLE moz_cookies (
                id INTEGER PRIMARY KEY,
                name TEXT, value TEXT, host TEXT, path TEXT,
                expiry INTEGER, isSecure INTEGER, isHttpOnly INTEGER, sameSite INTEGER
            )",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO moz_cookies (name, value, host, path, expiry, isSecure, isHttpOnly, sameSite)
             VALUES ('auth', 'tok', '.example.com', '/', 0, 1, 1, 1)",
            [],
        )
        .unwrap();
    }

    #[test]
    fn reads_plaintext_cookies_matching_spec() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("cookies.sqlite");
        seed_db(&db_path);

        let spec = CookieSpec::for_domain("example.com");
        let rows = query_profile(&db_path, &spec);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "auth");
        assert_eq!(rows[0].value, "tok");
        assert!(matches!(rows[0].expiry, Expiry::Session));
        assert!(rows[0].meta.decrypted);
    }

    #[test]
    fn missing_database_yields_empty_without_panicking() {
        let spec = CookieSpec::for_domain("example.com");
        let rows = query_profile(std::path::Path::new("/no/such/cookies.sqlite"), &spec);
        assert!(rows.is_empty());
    }
}
