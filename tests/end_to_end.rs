//! Cross-module end-to-end scenarios from spec.md §8, exercised through
//! each strategy's public `Strategy::query` plus the dedup stage that
//! the composite dispatcher applies, rather than through any one
//! module's internals.

use rusqlite::Connection;

use sable::browser::{ChromeVariant, QueryOptions, Strategy};
use sable::chrome::ChromeStrategy;
use sable::cookie::Expiry;
use sable::dedup;
use sable::firefox::FirefoxStrategy;
use sable::safari::SafariStrategy;
use sable::CookieSpec;

fn build_safari_buffer(name: &str, value: &str, url: &str, flags: u32, expiry: f64) -> Vec<u8> {
    const HEADER_LEN: usize = 0x38;

    let mut cookie = vec![0u8; HEADER_LEN];
    let url_bytes = format!("{url}\0");
    let name_bytes = format!("{name}\0");
    let path_bytes = b"/\0".to_vec();
    let value_bytes = format!("{value}\0");

    let url_offset = HEADER_LEN;
    let name_offset = url_offset + url_bytes.len();
    let path_offset = name_offset + name_bytes.len();
    let value_offset = path_offset + path_bytes.len();
    let total_size = value_offset + value_bytes.len();

    cookie[0x00..0x04].copy_from_slice(&(total_size as u32).to_le_bytes());
    cookie[0x04..0x08].copy_from_slice(&1u32.to_le_bytes());
    cookie[0x08..0x0C].copy_from_slice(&flags.to_le_bytes());
    cookie[0x10..0x14].copy_from_slice(&(url_offset as u32).to_le_bytes());
    cookie[0x14..0x18].copy_from_slice(&(name_offset as u32).to_le_bytes());
    cookie[0x18..0x1C].copy_from_slice(&(path_offset as u32).to_le_bytes());
    cookie[0x1C..0x20].copy_from_slice(&(value_offset as u32).to_le_bytes());
    cookie[0x28..0x30].copy_from_slice(&expiry.to_le_bytes());
    cookie.extend_from_slice(url_bytes.as_bytes());
    cookie.extend_from_slice(name_bytes.as_bytes());
    cookie.extend_from_slice(&path_bytes);
    cookie.extend_from_slice(value_bytes.as_bytes());

    let mut page = Vec::new();
    page.extend_from_slice(b"100Y");
    page.push(0);
    page.extend_from_slice(&1u32.to_be_bytes());
    page.extend_from_slice(&9u32.to_le_bytes());
    page.extend_from_slice(&cookie);

    let mut buf = Vec::new();
    buf.extend_from_slice(b"cook");
    buf.extend_from_slice(&1u32.to_be_bytes());
    buf.extend_from_slice(&(page.len() as u32).to_be_bytes());
    buf.extend_from_slice(&page);
    buf
}

/// Scenario 1: a well-formed single-page, single-cookie Safari file with
/// the canonical footer decodes to one matching `ExportedCookie` with
/// Secure+HttpOnly set and a concrete future expiry.
#[test]
fn safari_scenario_well_formed_file_with_canonical_footer() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("Cookies.binarycookies");
    let mut buf = build_safari_buffer("session-id", "abc123", ".example.com", 0b101, 1_000_000_000.0);
    buf.extend_from_slice(&0x071720050000004bu64.to_be_bytes());
    std::fs::write(&path, &buf).unwrap();

    let options = QueryOptions {
        store: Some(path),
        ..Default::default()
    };
    let spec = CookieSpec::for_domain("example.com");
    let records = SafariStrategy.query(&spec, &options);

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.name, "session-id");
    assert_eq!(record.value, "abc123");
    assert_eq!(record.domain, "example.com");
    assert_eq!(record.path, "/");
    assert!(record.secure);
    assert!(record.http_only);
    assert!(matches!(record.expiry, Expiry::At(_)));
}

/// Scenario 2: the same file with a mismatched footer decodes identically
/// — the footer check is a warning, never fatal.
#[test]
fn safari_scenario_bad_footer_still_decodes() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("Cookies.binarycookies");
    let mut buf = build_safari_buffer("session-id", "abc123", ".example.com", 0b101, 1_000_000_000.0);
    buf.extend_from_slice(&0u64.to_be_bytes());
    std::fs::write(&path, &buf).unwrap();

    let options = QueryOptions {
        store: Some(path),
        ..Default::default()
    };
    let spec = CookieSpec::for_domain("example.com");
    let records = SafariStrategy.query(&spec, &options);

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].value, "abc123");
}

/// Scenario 3: bad magic yields an empty result for that file rather
/// than propagating, and doesn't affect the engine's ability to run.
#[test]
fn safari_scenario_bad_magic_yields_empty() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("Cookies.binarycookies");
    std::fs::write(&path, b"abcdxxxxxxxxxxxx").unwrap();

    let options = QueryOptions {
        store: Some(path),
        ..Default::default()
    };
    let spec = CookieSpec::for_domain("example.com");
    assert!(SafariStrategy.query(&spec, &options).is_empty());
}

fn seed_chrome_db(path: &std::path::Path, host: &str, name: &str, encrypted_value: &[u8], expires_utc: i64) {
    let conn = Connection::open(path).unwrap();
    conn.execute(
        "CREATE TABLE cookies (
            creation_utc INTEGER, host_key TEXT, name TEXT, value TEXT,
            encrypted_value BLOB, path TEXT, expires_utc INTEGER,
            is_secure INTEGER, is_httponly INTEGER, samesite INTEGER
        )",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO cookies (creation_utc, host_key, name, value, encrypted_value, path, expires_utc, is_secure, is_httponly, samesite)
         VALUES (0, ?1, ?2, '', ?3, '/', ?4, 1, 0, 1)",
        rusqlite::params![host, name, encrypted_value, expires_utc],
    )
    .unwrap();
}

/// Scenario 4/5 adapted to a platform-independent v10/AES-128-CBC
/// ciphertext (macOS/Linux's scheme): decryptable when the right key is
/// supplied, degraded to opaque hex with `decrypted = false` when it
/// isn't.
#[test]
fn chrome_scenario_v10_cbc_round_trips_with_the_right_key() {
    use aes::cipher::block_padding::Pkcs7;
    use aes::cipher::{BlockEncryptMut, KeyIvInit};

    // The documented Linux "peanuts" fallback key — pre-derived the same
    // way `chrome::keys::posix::CHROME_V10_KEY` is.
    const KEY: [u8; 16] = [253, 98, 31, 229, 162, 180, 2, 83, 157, 250, 20, 124, 169, 39, 39, 120];
    const IV: [u8; 16] = [b' '; 16];

    type Enc = cbc::Encryptor<aes::Aes128>;
    let plaintext = b"tok";
    let mut buffer = vec![0u8; plaintext.len() + 16];
    let ciphertext = Enc::new(&KEY.into(), &IV.into())
        .encrypt_padded_b2b_mut::<Pkcs7>(plaintext, &mut buffer)
        .unwrap();

    let mut encrypted_value = b"v10".to_vec();
    encrypted_value.extend_from_slice(ciphertext);

    // 13300000000000000 microseconds since 1601-01-01 is a concrete,
    // far-future-but-not-"never" expiry.
    let db = tempfile::tempdir().unwrap();
    let db_path = db.path().join("Cookies");
    seed_chrome_db(&db_path, ".example.com", "auth", &encrypted_value, 13_300_000_000_000_000);

    let decrypted = sable::chrome::decrypt::decrypt(
        ciphertext,
        &KEY,
        sable::chrome::decrypt::Scheme::Cbc128FixedIv,
    )
    .unwrap();
    assert_eq!(decrypted, plaintext);

    // The strategy itself can't reach a real Keychain/libsecret in CI, so
    // this exercises the degrade-to-opaque-bytes path (`KeyUnavailable`)
    // deterministically, matching scenario 5's shape.
    let options = QueryOptions {
        store: Some(db_path.clone()),
        ..Default::default()
    };
    let spec = CookieSpec::new("auth", "example.com");
    let records = ChromeStrategy::new(ChromeVariant::Chrome).query(&spec, &options);

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].domain, "example.com");
    assert!(matches!(records[0].expiry, Expiry::At(_)));
    if !records[0].meta.decrypted {
        // No keychain/libsecret available in this environment — the
        // value degrades to hex-encoded ciphertext rather than panicking
        // or raising, exactly as spec.md §7 prescribes for `KeyUnavailable`.
        assert!(records[0].value.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

/// Scenario 6: a composite result where Chrome produces a short value and
/// Firefox produces a longer one for the same `(name, domain)` keeps the
/// longer value after dedup.
#[test]
fn composite_dedup_keeps_the_longer_value_across_strategies() {
    let chrome_db = tempfile::tempdir().unwrap();
    let chrome_path = chrome_db.path().join("Cookies");
    seed_chrome_db(&chrome_path, "e.com", "x", b"", 0);
    // Overwrite the seeded row's plaintext `value` column with "short" by
    // using an empty encrypted_value (legacy plaintext row), then fix up
    // via a direct update since seed_chrome_db always writes "".
    {
        let conn = Connection::open(&chrome_path).unwrap();
        conn.execute("UPDATE cookies SET value = 'short'", []).unwrap();
    }

    let firefox_db = tempfile::tempdir().unwrap();
    let firefox_path = firefox_db.path().join("cookies.sqlite");
    {
        let conn = Connection::open(&firefox_path).unwrap();
        conn.execute(
            "CREATE TABLE moz_cookies (name TEXT, value TEXT, host TEXT, path TEXT, expiry INTEGER, isSecure INTEGER, isHttpOnly INTEGER, sameSite INTEGER)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO moz_cookies VALUES ('x', 'longer', 'e.com', '/', 0, 0, 0, 0)",
            [],
        )
        .unwrap();
    }

    let spec = CookieSpec::new("x", "e.com");
    let chrome_records = ChromeStrategy::new(ChromeVariant::Chrome).query(
        &spec,
        &QueryOptions {
            store: Some(chrome_path),
            ..Default::default()
        },
    );
    let firefox_records = FirefoxStrategy.query(
        &spec,
        &QueryOptions {
            store: Some(firefox_path),
            ..Default::default()
        },
    );

    assert_eq!(chrome_records.len(), 1);
    assert_eq!(chrome_records[0].value, "short");
    assert_eq!(firefox_records.len(), 1);
    assert_eq!(firefox_records[0].value, "longer");

    let merged = [chrome_records, firefox_records].concat();
    let result = dedup::deduplicate(merged);

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].value, "longer");
}
