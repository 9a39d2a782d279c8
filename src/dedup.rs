//! Deduplication and post-processing for the composite dispatcher.
//!
//! Groups concatenated results by `(name, domain)`, keeping the record
//! with the longest `value`. Ties break on `meta.decrypted`, then on
//! whichever record appeared earliest in the input (which, coming out of
//! the dispatcher, is strategy-registration order).

use std::collections::HashMap;

use cookie::time::OffsetDateTime;

use crate::cookie::ExportedCookie;

pub fn deduplicate(records: Vec<ExportedCookie>) -> Vec<ExportedCookie> {
    let mut seen_order: Vec<(String, String)> = Vec::new();
    let mut best: HashMap<(String, String), ExportedCookie> = HashMap::new();

    for record in records {
        let key = (record.name.clone(), record.domain.clone());
        match best.get(&key) {
            None => {
                seen_order.push(key.clone());
                best.insert(key, record);
            }
            Some(incumbent) => {
                if is_better(&record, incumbent) {
                    best.insert(key, record);
                }
            }
        }
    }

    seen_order
        .into_iter()
        .filter_map(|key| best.remove(&key))
        .collect()
}

/// Whether `candidate` should replace `incumbent`. A tie on both value
/// length and decrypted status keeps `incumbent`, since it is the
/// earlier-registered strategy's record.
fn is_better(candidate: &ExportedCookie, incumbent: &ExportedCookie) -> bool {
    if candidate.value.len() != incumbent.value.len() {
        return candidate.value.len() > incumbent.value.len();
    }
    candidate.meta.decrypted && !incumbent.meta.decrypted
}

/// Drops records whose expiry is a concrete time at or before `now`.
/// `Session` and `Never` are always retained.
pub fn filter_expired(records: Vec<ExportedCookie>, now: OffsetDateTime) -> Vec<ExportedCookie> {
    records
        .into_iter()
        .filter(|record| !record.expiry.is_expired_at(now))
        .collect()
}

/// Truncates to the first `limit` records, if a limit is given.
pub fn limit(records: Vec<ExportedCookie>, limit: Option<u32>) -> Vec<ExportedCookie> {
    match limit {
        Some(n) => records.into_iter().take(n as usize).collect(),
        None => records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookie::{CookieMeta, Expiry, SameSite};

    fn cookie(name: &str, domain: &str, value: &str, decrypted: bool) -> ExportedCookie {
        ExportedCookie {
            name: name.to_string(),
            domain: domain.to_string(),
            value: value.to_string(),
            path: "/".to_string(),
            expiry: Expiry::Session,
            secure: false,
            http_only: false,
            same_site: SameSite::Unspecified,
            meta: CookieMeta {
                browser: "test".to_string(),
                profile: String::new(),
                source_file: String::new(),
                decrypted,
            },
        }
    }

    #[test]
    fn keeps_the_longest_value_for_a_duplicate_key() {
        let records = vec![
            cookie("auth", "example.com", "short", true),
            cookie("auth", "example.com", "much-longer-value", true),
        ];
        let result = deduplicate(records);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].value, "much-longer-value");
    }

    #[test]
    fn prefers_decrypted_on_equal_length_tie() {
        let records = vec![
            cookie("auth", "example.com", "abcde", false),
            cookie("auth", "example.com", "fghij", true),
        ];
        let result = deduplicate(records);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].value, "fghij");
        assert!(result[0].meta.decrypted);
    }

    #[test]
    fn full_tie_keeps_the_earlier_registered_record() {
        let records = vec![
            cookie("auth", "example.com", "abcde", true),
            cookie("auth", "example.com", "fghij", true),
        ];
        let result = deduplicate(records);
        assert_eq!(result[0].value, "abcde");
    }

    #[test]
    fn distinct_keys_are_preserved_in_registration_order() {
        let records = vec![
            cookie("a", "example.com", "1", true),
            cookie("b", "example.com", "2", true),
        ];
        let result = deduplicate(records);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].name, "a");
        assert_eq!(result[1].name, "b");
    }

    #[test]
    fn session_and_never_survive_the_expiry_filter() {
        let now = OffsetDateTime::now_utc();
        let mut records = vec![cookie("a", "example.com", "1", true)];
        records[0].expiry = Expiry::Session;
        records.push(cookie("b", "example.com", "2", true));
        records[1].expiry = Expiry::Never;

        let result = filter_expired(records, now);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn concrete_past_expiry_is_dropped() {
        let now = OffsetDateTime::now_utc();
        let mut record = cookie("a", "example.com", "1", true);
        record.expiry = Expiry::At(now - cookie::time::Duration::days(1));

        let result = filter_expired(vec![record], now);
        assert!(result.is_empty());
    }

    #[test]
    fn limit_truncates_to_the_first_n() {
        let records = vec![
            cookie("a", "example.com", "1", true),
            cookie("b", "example.com", "2", true),
            cookie("c", "example.com", "3", true),
        ];
        let result = limit(records, Some(2));
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].name, "a");
        assert_eq!(result[1].name, "b");
    }

    #[test]
    fn no_limit_keeps_everything() {
        let records = vec![cookie("a", "example.com", "1", true)];
        assert_eq!(limit(records, None).len(), 1);
    }
}
