//! The uniform output record produced by every browser strategy.

use cookie::time::OffsetDateTime;

/// `SameSite` attribute, normalised to the four values every backend can
/// express (Chromium and Firefox use small integers, Safari doesn't store
/// this attribute at all).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    None,
    Lax,
    Strict,
    Unspecified,
}

/// A cookie's expiry: a concrete point in time, or one of two sentinels:
/// `Session` (no expiry) and `Never` (far-future, effectively
/// permanent).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    At(OffsetDateTime),
    Session,
    Never,
}

impl Expiry {
    /// Whether this expiry is a concrete time at or before `now`.
    ///
    /// The `Session` and `Never` sentinels are never considered expired.
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        matches!(self, Expiry::At(t) if *t <= now)
    }
}

/// Identifies which backend produced a record and whether its value was
/// successfully decrypted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieMeta {
    pub browser: String,
    pub profile: String,
    pub source_file: String,
    pub decrypted: bool,
}

/// The uniform output record returned by the public facade,
/// regardless of which backend produced it.
#[derive(Debug, Clone)]
pub struct ExportedCookie {
    pub name: String,
    pub domain: String,
    pub value: String,
    pub path: String,
    pub expiry: Expiry,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    pub meta: CookieMeta,
}

impl ExportedCookie {
    /// `path` always begins with `/`; callers that don't have one on hand
    /// should pass `/`.
    pub fn normalised_path(path: impl Into<String>) -> String {
        let path = path.into();
        if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cookie::time::Duration;

    #[test]
    fn session_and_never_are_never_expired() {
        let now = OffsetDateTime::now_utc();
        assert!(!Expiry::Session.is_expired_at(now));
        assert!(!Expiry::Never.is_expired_at(now));
    }

    #[test]
    fn concrete_past_time_is_expired() {
        let now = OffsetDateTime::now_utc();
        let past = now - Duration::days(1);
        assert!(Expiry::At(past).is_expired_at(now));
    }

    #[test]
    fn concrete_future_time_is_not_expired() {
        let now = OffsetDateTime::now_utc();
        let future = now + Duration::days(1);
        assert!(!Expiry::At(future).is_expired_at(now));
    }

    #[test]
    fn path_is_normalised() {
        assert_eq!(ExportedCookie::normalised_path("/"), "/");
        assert_eq!(ExportedCookie::normalised_path("foo"), "/foo");
    }
}
