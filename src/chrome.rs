//! The Chromium-family strategy.
//!
//! ### Scheme (v18)
//!
//! ```sql
//! CREATE TABLE cookies (
//!   creation_utc    INTEGER NOT NULL,
//!   host_key        TEXT NOT NULL,
//!   name            TEXT NOT NULL,
//!   value           TEXT NOT NULL,
//!   encrypted_value BLOB NOT NULL,
//!   path            TEXT NOT NULL,
//!   expires_utc     INTEGER NOT NULL,
//!   is_secure       INTEGER NOT NULL,
//!   is_httponly     INTEGER NOT NULL,
//!   samesite        INTEGER NOT NULL,
//!   ...
//! );
//! ```

pub mod decrypt;
pub mod keys;
pub mod paths;

use crate::browser::{Browser, ChromeVariant, QueryOptions, Strategy};
use crate::cookie::{CookieMeta, Expiry, ExportedCookie, SameSite};
use crate::locate;
use crate::lock::{self, CloseOutcome};
use crate::platform;
use crate::spec::CookieSpec;
use crate::sqlite::{self, RunnerError};

/// Chrome epoch → Unix epoch offset, in seconds.
const CHROME_UNIX_EPOCH_OFFSET_SECONDS: i64 = 11_644_473_600;
/// `64_092_211_200` seconds past the Chrome epoch is year 4001 — used by
/// Chromium as its internal "never expires" sentinel.
const NEVER_EXPIRES_THRESHOLD_SECONDS: i64 = 64_092_211_200;

pub struct ChromeStrategy {
    variant: ChromeVariant,
}

impl ChromeStrategy {
    pub fn new(variant: ChromeVariant) -> Self {
        Self { variant }
    }
}

impl Strategy for ChromeStrategy {
    fn browser(&self) -> Browser {
        Browser::ChromeVariant(self.variant)
    }

    fn query(&self, spec: &CookieSpec, options: &QueryOptions) -> Vec<ExportedCookie> {
        let providers = self.path_providers(options);
        if providers.is_empty() {
            tracing::debug!(browser = %self.browser(), "no profiles found");
            return Vec::new();
        }

        providers
            .into_iter()
            .flat_map(|provider| self.query_profile(&provider, spec, options))
            .collect()
    }

    /// Answers every spec with one `WHERE (name, host_key) IN (...)`-shaped
    /// predicate per profile file instead of fanning out per spec.
    ///
    /// A locked file is skipped rather than recovered through
    /// [`lock::close_and_wait`] here: multiplexing the close/relaunch state
    /// machine across many specs sharing one file offers no benefit over
    /// skipping once, so this path trades the single-spec path's recovery
    /// for simplicity and falls back to the per-file `NotFound`/`Corrupt`
    /// degradation that already governs every other adverse condition.
    fn batch_query(&self, specs: &[CookieSpec], options: &QueryOptions) -> Option<Vec<ExportedCookie>> {
        let providers = self.path_providers(options);
        if providers.is_empty() {
            return Some(Vec::new());
        }

        let (predicate, values) = crate::spec::build_combined_predicate(specs, "name", "host_key");
        if predicate.is_empty() {
            return Some(Vec::new());
        }
        let sql = format!(
            "SELECT name, encrypted_value, value, host_key, expires_utc, is_secure, is_httponly, path, samesite \
             FROM cookies WHERE {predicate}"
        );
        let params: Vec<&dyn rusqlite::ToSql> = values.iter().map(|v| v as &dyn rusqlite::ToSql).collect();

        let mut out = Vec::new();
        for provider in &providers {
            let db_path = provider.cookies_database();
            if !db_path.is_file() {
                continue;
            }
            match Self::run_rows(&db_path, &sql, &params) {
                Ok(rows) => out.extend(self.normalise(rows, provider, &db_path)),
                Err(err) => {
                    tracing::warn!(path = %db_path.display(), %err, "combined batch query failed, skipping file");
                }
            }
        }
        Some(out)
    }
}

impl ChromeStrategy {
    fn path_providers(&self, options: &QueryOptions) -> Vec<paths::PathProvider> {
        if let Some(store) = &options.store {
            let base = store.parent().unwrap_or(store).to_path_buf();
            return vec![paths::PathProvider::new(base, store.clone())];
        }

        let base_dir = match options.root_dir.clone() {
            Some(dir) => dir,
            None => match locate::chrome::base_dir(self.variant) {
                Some(dir) => dir,
                None => return Vec::new(),
            },
        };

        locate::existing_chrome_profile_dirs(&base_dir)
            .into_iter()
            .map(|profile_dir| paths::PathProvider::new(base_dir.clone(), profile_dir))
            .collect()
    }

    fn query_profile(
        &self,
        provider: &paths::PathProvider,
        spec: &CookieSpec,
        options: &QueryOptions,
    ) -> Vec<ExportedCookie> {
        let db_path = provider.cookies_database();
        if !db_path.is_file() {
            return Vec::new();
        }

        match self.run_query(&db_path, spec) {
            Ok(rows) => self.normalise(rows, provider, &db_path),
            Err(RunnerError::Query { source }) if lock::is_conflict(&source.to_string()) => {
                self.recover_and_retry(&db_path, spec, provider, options, &source.to_string())
            }
            Err(err) => {
                tracing::warn!(path = %db_path.display(), %err, "failed to query cookie store");
                Vec::new()
            }
        }
    }

    fn recover_and_retry(
        &self,
        db_path: &std::path::Path,
        spec: &CookieSpec,
        provider: &paths::PathProvider,
        options: &QueryOptions,
        conflict: &str,
    ) -> Vec<ExportedCookie> {
        tracing::warn!(path = %db_path.display(), conflict, "cookie store locked, attempting recovery");
        let executable = self.variant.executable_name();

        match lock::close_and_wait(executable, options.force) {
            CloseOutcome::Closed => match self.run_query(db_path, spec) {
                Ok(rows) => {
                    lock::relaunch(executable);
                    self.normalise(rows, provider, db_path)
                }
                Err(err) => {
                    tracing::warn!(path = %db_path.display(), %err, "still locked after recovery");
                    Vec::new()
                }
            },
            other => {
                tracing::warn!(path = %db_path.display(), ?other, "lock unresolved, skipping file");
                Vec::new()
            }
        }
    }

    fn run_query(&self, db_path: &std::path::Path, spec: &CookieSpec) -> Result<Vec<ChromeRow>, RunnerError> {
        // Placeholder numbers shift depending on whether `name` is bound at
        // all, since rusqlite binds a params slice positionally starting at
        // ?1 regardless of which numbered placeholders the SQL text uses.
        let (name_predicate, host_start) = if spec.name_is_wildcard() {
            ("1".to_string(), 1)
        } else {
            ("name = ?1".to_string(), 2)
        };
        let sql = format!(
            "SELECT name, encrypted_value, value, host_key, expires_utc, is_secure, is_httponly, path, samesite \
             FROM cookies \
             WHERE {name_predicate} AND (host_key = ?{a} OR host_key = ?{b} OR host_key LIKE ?{c})",
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

        Self::run_rows(db_path, &sql, &params)
    }

    /// Shared row-mapping for both the single-spec and combined-batch
    /// queries; only the SQL text and parameter list differ between them.
    fn run_rows(
        db_path: &std::path::Path,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<ChromeRow>, RunnerError> {
        sqlite::run(db_path, sql, params, |row| {
            Ok(ChromeRow {
                name: row.get(0)?,
                encrypted_value: row.get(1)?,
                value: row.get(2)?,
                host: row.get(3)?,
                expires_utc: row.get(4)?,
                secure: row.get::<_, i64>(5)? != 0,
                http_only: row.get::<_, i64>(6)? != 0,
                path: row.get(7)?,
                same_site: row.get(8)?,
            })
        })
    }

    fn normalise(
        &self,
        rows: Vec<ChromeRow>,
        provider: &paths::PathProvider,
        db_path: &std::path::Path,
    ) -> Vec<ExportedCookie> {
        let profile = provider.profile_dir().display().to_string();
        let local_state_path = provider.local_state();
        let variant = self.variant;

        rows.into_iter()
            .map(|row| {
                let (value, decrypted) = decrypt_cell(variant, &row.encrypted_value, &row.value, &local_state_path);
                ExportedCookie {
                    name: row.name,
                    domain: row.host,
                    value,
                    path: ExportedCookie::normalised_path(row.path),
                    expiry: expiry_from_chrome_microseconds(row.expires_utc),
                    secure: row.secure,
                    http_only: row.http_only,
                    same_site: match row.same_site {
                        -1 => SameSite::Unspecified,
                        0 => SameSite::None,
                        1 => SameSite::Lax,
                        _ => SameSite::Strict,
                    },
                    meta: CookieMeta {
                        browser: variant.to_string(),
                        profile: profile.clone(),
                        source_file: db_path.display().to_string(),
                        decrypted,
                    },
                }
            })
            .collect()
    }
}

struct ChromeRow {
    name: String,
    encrypted_value: Vec<u8>,
    value: String,
    host: String,
    expires_utc: i64,
    secure: bool,
    http_only: bool,
    path: String,
    same_site: i64,
}

/// Decrypts one row's value, degrading to the raw bytes (hex-encoded)
/// with `decrypted = false` on any failure — key retrieval, ciphertext
/// corruption, or an unrecognised prefix are all absorbed here rather
/// than propagated.
fn decrypt_cell(
    variant: ChromeVariant,
    encrypted_value: &[u8],
    plain_value: &str,
    local_state_path: &std::path::Path,
) -> (String, bool) {
    if encrypted_value.is_empty() {
        return (plain_value.to_string(), true);
    }

    let os = platform::current_os();
    let classification = decrypt::classify(encrypted_value, os);
    let decrypt::Classification::Encrypted { key_scheme, scheme } = classification else {
        return match String::from_utf8(encrypted_value.to_vec()) {
            Ok(value) => (value, true),
            Err(_) => (hex_encode(encrypted_value), false),
        };
    };

    let profile_dir = local_state_path.parent().unwrap_or(local_state_path);
    let key = match keys::master_key(variant, profile_dir, local_state_path, key_scheme) {
        Ok(key) => key,
        Err(err) => {
            tracing::warn!(%err, browser = %variant, "master key unavailable");
            return (hex_encode(encrypted_value), false);
        }
    };

    let ciphertext = decrypt::strip_header(encrypted_value, classification);
    match decrypt::decrypt(ciphertext, &key, scheme) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(value) => (value, true),
            Err(_) => (hex_encode(encrypted_value), false),
        },
        Err(err) => {
            tracing::warn!(%err, browser = %variant, "cookie value decryption failed");
            (hex_encode(encrypted_value), false)
        }
    }
}

/// Renders undecryptable bytes as a lowercase hex string so they can
/// still be inspected in output rather than discarded.
fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

fn expiry_from_chrome_microseconds(value: i64) -> Expiry {
    if value <= 0 {
        return Expiry::Session;
    }
    let seconds = value / 1_000_000 - CHROME_UNIX_EPOCH_OFFSET_SECONDS;
    if seconds <= 0 {
        return Expiry::Session;
    }
    if seconds >= NEVER_EXPIRES_THRESHOLD_SECONDS {
        return Expiry::Never;
    }
    match cookie::time::OffsetDateTime::from_unix_timestamp(seconds) {
        Ok(t) => Expiry::At(t),
        Err(_) => Expiry::Session,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chrome_epoch_zero_is_session() {
        assert!(matches!(expiry_from_chrome_microseconds(0), Expiry::Session));
    }

    #[test]
    fn chrome_epoch_far_future_is_never() {
        let far_future_micros = (NEVER_EXPIRES_THRESHOLD_SECONDS + CHROME_UNIX_EPOCH_OFFSET_SECONDS) * 1_000_000;
        assert!(matches!(expiry_from_chrome_microseconds(far_future_micros), Expiry::Never));
    }

    #[test]
    fn chrome_epoch_ordinary_value_converts_to_unix_time() {
        // 13300000000000000 microseconds since 1601-01-01 is a concrete,
        // plausible near-future expiry.
        let result = expiry_from_chrome_microseconds(13_300_000_000_000_000);
        assert!(matches!(result, Expiry::At(_)));
    }
}
