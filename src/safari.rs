//! The Safari `Cookies.binarycookies` codec.
//!
//! ### Layout
//!
//! ```text
//! magic      : 4 bytes, ASCII "cook"
//! page_count : u32 big-endian
//! page_sizes : [u32 big-endian; page_count]
//! pages      : concatenated, sizes above
//! footer     : 8 bytes big-endian, expected 0x071720050000004b
//! ```
//!
//! Each page opens with a 4-byte tag (`"100Y"` observed, not validated
//! strictly) followed by a cookie count and an offset table. Two writer
//! variants exist in the wild for where that count and table start —
//! see [`decode_page`].
//!
//! Each cookie (all fields little-endian, offsets relative to the
//! cookie's own start):
//!
//! ```text
//! 0x00 u32  cookie_size
//! 0x04 u32  version
//! 0x08 u32  flags              (bit 0 = Secure, bit 2 = HttpOnly)
//! 0x0C u32  has_port
//! 0x10 u32  url_offset
//! 0x14 u32  name_offset
//! 0x18 u32  path_offset
//! 0x1C u32  value_offset
//! 0x20 u32  comment_offset     (0 if absent)
//! 0x24 u32  comment_url_offset (0 if absent)
//! 0x28 f64  expiry             (Mac epoch seconds)
//! 0x30 f64  creation           (Mac epoch seconds)
//! 0x38 u16  port               (present iff has_port != 0)
//! ```

use std::path::Path;

use cookie::time::OffsetDateTime;
use thiserror::Error;

use crate::browser::{Browser, QueryOptions, Strategy};
use crate::cookie::{CookieMeta, Expiry, ExportedCookie, SameSite};
use crate::locate;
use crate::spec::CookieSpec;

/// Seconds between the Unix epoch and the Mac epoch (2001-01-01 UTC).
const MAC_EPOCH_OFFSET_SECONDS: i64 = 978_307_200;

const MAGIC: &[u8; 4] = b"cook";
const EXPECTED_FOOTER: u64 = 0x071720050000004b;
const COOKIE_HEADER_LEN: usize = 0x38;
/// Guards the offset-table autodetection in [`decode_page`] against a
/// corrupt count field being read as a huge number.
const MAX_PLAUSIBLE_COOKIE_COUNT: u32 = 100_000;

#[derive(Debug, Error)]
pub enum SafariError {
    #[error("not a binarycookies file: bad magic")]
    BadMagic,

    #[error("failed to read cookie store: {0}")]
    Io(#[from] std::io::Error),
}

/// One decoded cookie record, before Mac-epoch-to-Unix normalisation and
/// folding into `ExportedCookie` (done by the Safari strategy).
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryCookieRow {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub url: String,
    pub port: Option<u16>,
    pub version: u32,
    pub secure: bool,
    pub http_only: bool,
    pub expiry: f64,
    pub creation: f64,
    pub comment: Option<String>,
    pub comment_url: Option<String>,
}

pub fn decode_file(path: &Path) -> Result<Vec<BinaryCookieRow>, SafariError> {
    let data = std::fs::read(path)?;
    decode_bytes(&data)
}

/// Decodes a full `Cookies.binarycookies` buffer. A magic mismatch is
/// fatal for the whole buffer; every other malformation is isolated to
/// the page or cookie it occurs in.
pub fn decode_bytes(data: &[u8]) -> Result<Vec<BinaryCookieRow>, SafariError> {
    if data.len() < 8 || &data[0..4] != MAGIC {
        return Err(SafariError::BadMagic);
    }

    let page_count = read_u32_be(data, 4).unwrap_or(0) as usize;
    let mut cursor = 8;
    let mut page_sizes = Vec::with_capacity(page_count);
    for _ in 0..page_count {
        match read_u32_be(data, cursor) {
            Some(size) => page_sizes.push(size as usize),
            None => {
                tracing::warn!("binarycookies page-size table truncated, stopping early");
                break;
            }
        }
        cursor += 4;
    }

    let mut rows = Vec::new();
    for (index, page_size) in page_sizes.into_iter().enumerate() {
        if cursor + page_size > data.len() {
            tracing::warn!(page = index, "binarycookies page overruns file, skipping");
            break;
        }
        let page = &data[cursor..cursor + page_size];
        rows.extend(decode_page(page, index));
        cursor += page_size;
    }

    if cursor + 8 <= data.len() {
        let footer = u64::from_be_bytes(data[cursor..cursor + 8].try_into().unwrap());
        if footer != EXPECTED_FOOTER {
            tracing::warn!(footer = format!("{footer:#x}"), "unexpected binarycookies footer");
        }
    } else {
        tracing::warn!("binarycookies footer missing or truncated");
    }

    Ok(rows)
}

/// Layout of a page's cookie-count and offset-table header. The source
/// format disagrees with itself across writers; both are tried and the
/// first one whose offset table fits entirely inside the page wins.
struct PageLayout {
    count_offset: usize,
    count_big_endian: bool,
    offsets_start: usize,
    name: &'static str,
}

/// The layout documented as canonical: a 4-byte tag plus a zero byte,
/// then a big-endian count at offset 5.
const LAYOUT_TAGGED: PageLayout = PageLayout {
    count_offset: 5,
    count_big_endian: true,
    offsets_start: 9,
    name: "tagged-be",
};

/// The drifted layout some writers produce: no zero-byte gap, a
/// little-endian count directly after the 4-byte tag.
const LAYOUT_COMPACT: PageLayout = PageLayout {
    count_offset: 4,
    count_big_endian: false,
    offsets_start: 8,
    name: "compact-le",
};

fn try_layout(page: &[u8], layout: &PageLayout) -> Option<Vec<usize>> {
    if layout.count_offset + 4 > page.len() {
        return None;
    }
    let count = if layout.count_big_endian {
        read_u32_be(page, layout.count_offset)?
    } else {
        read_u32_le(page, layout.count_offset)?
    };
    if count == 0 || count > MAX_PLAUSIBLE_COOKIE_COUNT {
        return None;
    }

    let table_end = layout.offsets_start.checked_add((count as usize) * 4)?;
    if table_end > page.len() {
        return None;
    }

    let mut offsets = Vec::with_capacity(count as usize);
    for i in 0..count as usize {
        let offset = read_u32_le(page, layout.offsets_start + i * 4)? as usize;
        if offset >= page.len() {
            return None;
        }
        offsets.push(offset);
    }
    Some(offsets)
}

/// Decodes one page. A malformed cookie is logged and stops the page;
/// cookies already decoded in this page, and every later page, still
/// come back.
fn decode_page(page: &[u8], page_index: usize) -> Vec<BinaryCookieRow> {
    let offsets = match try_layout(page, &LAYOUT_TAGGED) {
        Some(o) => {
            tracing::debug!(page = page_index, variant = LAYOUT_TAGGED.name, "page layout");
            o
        }
        None => match try_layout(page, &LAYOUT_COMPACT) {
            Some(o) => {
                tracing::debug!(page = page_index, variant = LAYOUT_COMPACT.name, "page layout");
                o
            }
            None => {
                tracing::warn!(page = page_index, "could not determine page layout, skipping");
                return Vec::new();
            }
        },
    };

    let mut rows = Vec::new();
    for offset in offsets {
        match decode_cookie(&page[offset..]) {
            Some(row) => rows.push(row),
            None => {
                tracing::warn!(page = page_index, offset, "malformed cookie, stopping page");
                break;
            }
        }
    }
    rows
}

fn decode_cookie(buf: &[u8]) -> Option<BinaryCookieRow> {
    if buf.len() < COOKIE_HEADER_LEN {
        return None;
    }

    let size = read_u32_le(buf, 0x00)? as usize;
    if size < COOKIE_HEADER_LEN || size > buf.len() {
        return None;
    }
    let buf = &buf[..size];

    let version = read_u32_le(buf, 0x04)?;
    let flags = read_u32_le(buf, 0x08)?;
    let has_port = read_u32_le(buf, 0x0C)?;
    let url_offset = read_u32_le(buf, 0x10)? as usize;
    let name_offset = read_u32_le(buf, 0x14)? as usize;
    let path_offset = read_u32_le(buf, 0x18)? as usize;
    let value_offset = read_u32_le(buf, 0x1C)? as usize;
    let comment_offset = read_u32_le(buf, 0x20)? as usize;
    let comment_url_offset = read_u32_le(buf, 0x24)? as usize;
    let expiry = read_f64_le(buf, 0x28)?;
    let creation = read_f64_le(buf, 0x30)?;

    let port = if has_port != 0 {
        Some(u16::from_le_bytes(buf.get(0x38..0x3A)?.try_into().ok()?))
    } else {
        None
    };

    let url = read_c_string(buf, url_offset).unwrap_or_default();
    let name = read_c_string(buf, name_offset)?;
    if name.is_empty() {
        return None;
    }
    let path = read_c_string(buf, path_offset).unwrap_or_else(|| "/".to_string());
    let value = read_c_string(buf, value_offset).unwrap_or_default();
    let comment = read_c_string(buf, comment_offset);
    let comment_url = read_c_string(buf, comment_url_offset);

    let domain = url.strip_prefix('.').unwrap_or(&url).to_string();

    Some(BinaryCookieRow {
        name,
        value,
        domain,
        path,
        url,
        port,
        version,
        secure: flags & 0x1 != 0,
        http_only: flags & 0x4 != 0,
        expiry,
        creation,
        comment,
        comment_url,
    })
}

fn read_c_string(buf: &[u8], offset: usize) -> Option<String> {
    if offset == 0 || offset >= buf.len() {
        return None;
    }
    let end = buf[offset..].iter().position(|&b| b == 0)? + offset;
    String::from_utf8(buf[offset..end].to_vec()).ok()
}

fn read_u32_be(buf: &[u8], offset: usize) -> Option<u32> {
    buf.get(offset..offset + 4)
        .map(|b| u32::from_be_bytes(b.try_into().unwrap()))
}

fn read_u32_le(buf: &[u8], offset: usize) -> Option<u32> {
    buf.get(offset..offset + 4)
        .map(|b| u32::from_le_bytes(b.try_into().unwrap()))
}

fn read_f64_le(buf: &[u8], offset: usize) -> Option<f64> {
    buf.get(offset..offset + 8)
        .map(|b| f64::from_le_bytes(b.try_into().unwrap()))
}

pub struct SafariStrategy;

impl Strategy for SafariStrategy {
    fn browser(&self) -> Browser {
        Browser::Safari
    }

    fn query(&self, spec: &CookieSpec, options: &QueryOptions) -> Vec<ExportedCookie> {
        let path = match &options.store {
            Some(store) => store.clone(),
            None => match locate::safari::resolve() {
                Some(path) => path,
                None => {
                    tracing::debug!("no Safari cookie container found");
                    return Vec::new();
                }
            },
        };

        let rows = match decode_file(&path) {
            Ok(rows) => rows,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "failed to decode binarycookies file");
                return Vec::new();
            }
        };

        rows.into_iter()
            .filter(|row| spec.matches(&row.name, &row.domain))
            .map(|row| to_exported(row, &path))
            .collect()
    }
}

fn to_exported(row: BinaryCookieRow, path: &Path) -> ExportedCookie {
    ExportedCookie {
        name: row.name,
        domain: row.domain,
        value: row.value,
        path: ExportedCookie::normalised_path(row.path),
        expiry: mac_epoch_to_expiry(row.expiry),
        secure: row.secure,
        http_only: row.http_only,
        same_site: SameSite::Unspecified,
        meta: CookieMeta {
            browser: "Safari".to_string(),
            profile: String::new(),
            source_file: path.display().to_string(),
            decrypted: true,
        },
    }
}

fn mac_epoch_to_expiry(mac_seconds: f64) -> Expiry {
    let unix_seconds = mac_seconds as i64 + MAC_EPOCH_OFFSET_SECONDS;
    match OffsetDateTime::from_unix_timestamp(unix_seconds) {
        Ok(t) => Expiry::At(t),
        Err(_) => Expiry::Session,
    }
}
