//! Chromium-family base directory resolution.

use std::path::PathBuf;

use crate::browser::ChromeVariant;
use crate::platform::{self, OsTag};

/// The base directory (the "User Data" root on Windows, the
/// `~/Library/Application Support/<Vendor>` tree on macOS, or
/// `~/.config/<vendor>` on Linux) under which profile directories
/// (`Default`, `Profile 1`, ...) live for a given variant.
pub fn base_dir(variant: ChromeVariant) -> Option<PathBuf> {
    let root = match platform::current_os() {
        OsTag::Windows => platform::local_app_data_dir()?,
        OsTag::MacOs => platform::home_dir()?.join("Library/Application Support"),
        OsTag::Linux | OsTag::OtherUnix => platform::home_dir()?.join(".config"),
    };

    Some(root.join(variant_subpath(variant)))
}

fn variant_subpath(variant: ChromeVariant) -> &'static str {
    match platform::current_os() {
        OsTag::Windows => match variant {
            ChromeVariant::Chrome => "Google\\Chrome\\User Data",
            ChromeVariant::Chromium => "Chromium\\User Data",
            ChromeVariant::Edge => "Microsoft\\Edge\\User Data",
            ChromeVariant::Brave => "BraveSoftware\\Brave-Browser\\User Data",
            ChromeVariant::Opera => "Opera Software\\Opera Stable",
            ChromeVariant::OperaGx => "Opera Software\\Opera GX Stable",
            ChromeVariant::Arc => "Arc\\User Data",
        },
        OsTag::MacOs => match variant {
            ChromeVariant::Chrome => "Google/Chrome",
            ChromeVariant::Chromium => "Chromium",
            ChromeVariant::Edge => "Microsoft Edge",
            ChromeVariant::Brave => "BraveSoftware/Brave-Browser",
            ChromeVariant::Opera => "com.operasoftware.Opera",
            ChromeVariant::OperaGx => "com.operasoftware.OperaGX",
            ChromeVariant::Arc => "Arc/User Data",
        },
        OsTag::Linux | OsTag::OtherUnix => match variant {
            ChromeVariant::Chrome => "google-chrome",
            ChromeVariant::Chromium => "chromium",
            ChromeVariant::Edge => "microsoft-edge",
            ChromeVariant::Brave => "BraveSoftware/Brave-Browser",
            ChromeVariant::Opera => "opera",
            ChromeVariant::OperaGx => "opera-gx",
            ChromeVariant::Arc => "arc", // Arc has no Linux build; kept for symmetry.
        },
    }
}
