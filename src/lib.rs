//! Read-only cookie extraction engine for Chrome, Firefox and Safari.
//!
//! Locates each browser's on-disk cookie store, decrypts the encrypted
//! Chromium-family values where needed, decodes Safari's undocumented
//! `Cookies.binarycookies` format, and normalises everything into a
//! uniform [`ExportedCookie`]. The crate never mutates a browser's
//! store, never makes network calls, and never raises for an adverse
//! condition local to one file or row — see [`error`] for the small set
//! of failures that do propagate.

pub mod browser;
pub mod chrome;
pub mod cookie;
pub mod dedup;
pub mod dispatch;
pub mod error;
pub mod facade;
pub mod firefox;
pub mod locate;
pub mod lock;
pub mod platform;
pub mod safari;
pub mod spec;
pub mod sqlite;

pub use browser::{Browser, ChromeVariant};
pub use cookie::{CookieMeta, Expiry, ExportedCookie, SameSite};
pub use error::{EngineError, Result};
pub use facade::{batch, get, get_by_domain, get_chrome, get_firefox, get_safari, BatchOptions};
pub use spec::CookieSpec;
