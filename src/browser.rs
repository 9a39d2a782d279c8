//! The browser/strategy registry.
//!
//! Each browser backend is exposed as a small trait plus an enum of
//! variants, held as a fixed, ordered registry. Registration order is
//! part of the contract: it is the tie-break used by deduplication, and
//! it is the order composite results are concatenated in when no dedup
//! is requested.

use crate::cookie::ExportedCookie;
use crate::spec::CookieSpec;

/// Chromium-family variant. Each variant has its own profile root and
/// macOS Keychain "Safe Storage" service name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChromeVariant {
    Chrome,
    Chromium,
    Edge,
    Brave,
    Opera,
    OperaGx,
    Arc,
}

impl ChromeVariant {
    pub const ALL: [ChromeVariant; 7] = [
        ChromeVariant::Chrome,
        ChromeVariant::Chromium,
        ChromeVariant::Edge,
        ChromeVariant::Brave,
        ChromeVariant::Opera,
        ChromeVariant::OperaGx,
        ChromeVariant::Arc,
    ];

    /// macOS Keychain service name under which this variant's master key
    /// is stored.
    pub fn safe_storage_service(self) -> &'static str {
        match self {
            ChromeVariant::Chrome => "Chrome Safe Storage",
            ChromeVariant::Chromium => "Chromium Safe Storage",
            ChromeVariant::Edge => "Microsoft Edge Safe Storage",
            ChromeVariant::Brave => "Brave Safe Storage",
            ChromeVariant::Opera => "Opera Safe Storage",
            ChromeVariant::OperaGx => "Opera Safe Storage",
            ChromeVariant::Arc => "Arc Safe Storage",
        }
    }

    /// Keychain/libsecret account name paired with the service above.
    pub fn safe_storage_account(self) -> &'static str {
        match self {
            ChromeVariant::Chrome => "Chrome",
            ChromeVariant::Chromium => "Chromium",
            ChromeVariant::Edge => "Microsoft Edge",
            ChromeVariant::Brave => "Brave",
            ChromeVariant::Opera => "Opera",
            ChromeVariant::OperaGx => "Opera",
            ChromeVariant::Arc => "Arc",
        }
    }

    /// Linux Secret Service `application` attribute used to look up the
    /// v11 password.
    pub fn linux_application_attribute(self) -> &'static str {
        match self {
            ChromeVariant::Chrome => "chrome",
            ChromeVariant::Chromium => "chromium",
            ChromeVariant::Edge => "microsoft-edge",
            ChromeVariant::Brave => "brave",
            ChromeVariant::Opera => "opera",
            ChromeVariant::OperaGx => "opera",
            ChromeVariant::Arc => "arc",
        }
    }

    /// Executable name used by the lock handler to find and close
    /// a running instance.
    pub fn executable_name(self) -> &'static str {
        match self {
            ChromeVariant::Chrome => "google-chrome",
            ChromeVariant::Chromium => "chromium",
            ChromeVariant::Edge => "msedge",
            ChromeVariant::Brave => "brave",
            ChromeVariant::Opera => "opera",
            ChromeVariant::OperaGx => "opera-gx",
            ChromeVariant::Arc => "arc",
        }
    }
}

impl std::fmt::Display for ChromeVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ChromeVariant::Chrome => "Google Chrome",
            ChromeVariant::Chromium => "Chromium",
            ChromeVariant::Edge => "Microsoft Edge",
            ChromeVariant::Brave => "Brave",
            ChromeVariant::Opera => "Opera",
            ChromeVariant::OperaGx => "Opera GX",
            ChromeVariant::Arc => "Arc",
        };
        f.write_str(name)
    }
}

/// The set of supported browsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Browser {
    ChromeVariant(ChromeVariant),
    Firefox,
    Safari,
}

impl std::fmt::Display for Browser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Browser::ChromeVariant(v) => write!(f, "{v}"),
            Browser::Firefox => write!(f, "Firefox"),
            Browser::Safari => write!(f, "Safari"),
        }
    }
}

/// The fixed, ordered set of browsers the composite dispatcher fans out
/// to. Order here is the order used for tie-breaking in deduplication
/// and for result concatenation.
pub const REGISTRY_ORDER: [Browser; 9] = [
    Browser::ChromeVariant(ChromeVariant::Chrome),
    Browser::ChromeVariant(ChromeVariant::Chromium),
    Browser::ChromeVariant(ChromeVariant::Edge),
    Browser::ChromeVariant(ChromeVariant::Brave),
    Browser::ChromeVariant(ChromeVariant::Opera),
    Browser::ChromeVariant(ChromeVariant::OperaGx),
    Browser::ChromeVariant(ChromeVariant::Arc),
    Browser::Firefox,
    Browser::Safari,
];

/// Per-query overrides threaded down from the facade into a
/// strategy.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Explicit cookie store path, bypassing discovery entirely.
    pub store: Option<std::path::PathBuf>,
    /// Bypass the lock/relaunch recovery and accept stale/failed
    /// reads instead.
    pub force: bool,
    /// Root directory override (e.g. a session's temporary profile),
    /// overriding the OS default but still subject to normal profile
    /// discovery within it.
    pub root_dir: Option<std::path::PathBuf>,
}

/// A single browser backend: discover its cookie store(s), read them,
/// decrypt where needed, and normalise into [`ExportedCookie`].
///
/// Every adverse condition local to a file or row is absorbed here —
/// `query` returns `vec![]` rather than raising for `NotFound`, `Locked`
/// (after recovery attempts), `Corrupt`, `KeyUnavailable`, or
/// `DecryptFailed`.
pub trait Strategy: Send + Sync {
    fn browser(&self) -> Browser;

    fn query(&self, spec: &CookieSpec, options: &QueryOptions) -> Vec<ExportedCookie>;

    /// Answers every spec in `specs` with a single combined query, for
    /// strategies that can express "match any of these (name, domain)
    /// pairs" as one predicate (the SQLite-backed strategies, via
    /// [`crate::spec::build_combined_predicate`]).
    ///
    /// `None` means this strategy has no such capability (or the attempt
    /// failed outright) and the batch facade should fan out one
    /// [`Strategy::query`] call per spec instead.
    fn batch_query(&self, _specs: &[CookieSpec], _options: &QueryOptions) -> Option<Vec<ExportedCookie>> {
        None
    }
}
