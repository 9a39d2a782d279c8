//! Query facade & batching (C10).
//!
//! The crate's public entry points. Single-spec queries go straight
//! through the composite dispatcher (C9); the batch path additionally
//! tries each strategy's combined-query capability before falling back
//! to a bounded worker pool, one spec at a time.

use std::thread;

use crate::browser::{ChromeVariant, QueryOptions, Strategy};
use crate::chrome::ChromeStrategy;
use crate::cookie::ExportedCookie;
use crate::dedup;
use crate::dispatch;
use crate::firefox::FirefoxStrategy;
use crate::safari::SafariStrategy;
use crate::spec::CookieSpec;

/// Options accepted by [`batch`]. Defaults match spec.md §6.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Group results by `(name, domain)` and keep the best record —
    /// see [`crate::dedup::deduplicate`]. Default `true`.
    pub deduplicate: bool,
    /// Upper bound on concurrently in-flight per-spec queries when a
    /// strategy has no combined-query capability. Default `10`.
    pub concurrency: u32,
    /// Whether a panicking per-spec worker is isolated (logged, skipped)
    /// rather than propagated. Default `true`; spec.md §7 never wants a
    /// public entry point to raise for an adverse condition local to one
    /// file or row.
    pub continue_on_error: bool,
    /// Drop records whose expiry is a concrete time at or before now.
    /// Default `false`.
    pub remove_expired: bool,
    /// Truncate to the first N results after dedup/expiry filtering.
    pub limit: Option<u32>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            deduplicate: true,
            concurrency: 10,
            continue_on_error: true,
            remove_expired: false,
            limit: None,
        }
    }
}

/// Runs `spec` against every registered browser strategy concurrently
/// and returns the deduplicated, merged result.
pub fn get(spec: &CookieSpec) -> Vec<ExportedCookie> {
    let options = QueryOptions::default();
    let records = dispatch::dispatch(spec, &options);
    dedup::deduplicate(records)
}

/// Shorthand for `get(&CookieSpec::for_domain(domain))`.
pub fn get_by_domain(domain: impl Into<String>) -> Vec<ExportedCookie> {
    get(&CookieSpec::for_domain(domain))
}

/// Single-strategy variant: queries only the given Chromium-family
/// browser.
pub fn get_chrome(variant: ChromeVariant, spec: &CookieSpec) -> Vec<ExportedCookie> {
    ChromeStrategy::new(variant).query(spec, &QueryOptions::default())
}

/// Single-strategy variant: queries only Firefox.
pub fn get_firefox(spec: &CookieSpec) -> Vec<ExportedCookie> {
    FirefoxStrategy.query(spec, &QueryOptions::default())
}

/// Single-strategy variant: queries only Safari.
pub fn get_safari(spec: &CookieSpec) -> Vec<ExportedCookie> {
    SafariStrategy.query(spec, &QueryOptions::default())
}

/// Runs every spec in `specs` against every registered strategy.
///
/// For each strategy: try one combined query (`Strategy::batch_query`);
/// if the strategy doesn't support that, fan the specs out across a
/// worker pool bounded by `options.concurrency`. Dedup, expiry
/// filtering, and the limit are applied once across the whole merged
/// result set, not per strategy.
pub fn batch(specs: &[CookieSpec], options: &BatchOptions) -> Vec<ExportedCookie> {
    if specs.is_empty() {
        return Vec::new();
    }

    let query_options = QueryOptions::default();
    let mut records = Vec::new();
    for strategy in registry() {
        records.extend(run_strategy_batch(strategy.as_ref(), specs, &query_options, options));
    }

    if options.deduplicate {
        records = dedup::deduplicate(records);
    }
    if options.remove_expired {
        records = dedup::filter_expired(records, cookie::time::OffsetDateTime::now_utc());
    }
    dedup::limit(records, options.limit)
}

fn registry() -> Vec<Box<dyn Strategy>> {
    let mut strategies: Vec<Box<dyn Strategy>> = ChromeVariant::ALL
        .into_iter()
        .map(|variant| Box::new(ChromeStrategy::new(variant)) as Box<dyn Strategy>)
        .collect();
    strategies.push(Box::new(FirefoxStrategy));
    strategies.push(Box::new(SafariStrategy));
    strategies
}

fn run_strategy_batch(
    strategy: &dyn Strategy,
    specs: &[CookieSpec],
    query_options: &QueryOptions,
    options: &BatchOptions,
) -> Vec<ExportedCookie> {
    match strategy.batch_query(specs, query_options) {
        Some(records) => records,
        None => fan_out(strategy, specs, query_options, options),
    }
}

/// Bounded-concurrency fallback for strategies with no combined-query
/// capability: runs at most `options.concurrency` specs at a time,
/// isolating a panicking worker exactly like the composite dispatcher
/// isolates a panicking strategy.
fn fan_out(
    strategy: &dyn Strategy,
    specs: &[CookieSpec],
    query_options: &QueryOptions,
    options: &BatchOptions,
) -> Vec<ExportedCookie> {
    let chunk_size = options.concurrency.max(1) as usize;
    let mut results = Vec::with_capacity(specs.len());

    for chunk in specs.chunks(chunk_size) {
        thread::scope(|scope| {
            let handles: Vec<_> = chunk
                .iter()
                .map(|spec| {
                    let spec = spec.clone();
                    scope.spawn(move || {
                        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                            strategy.query(&spec, query_options)
                        }))
                    })
                })
                .collect();

            for handle in handles {
                match handle.join() {
                    Ok(Ok(records)) => results.extend(records),
                    _ if options.continue_on_error => {
                        tracing::warn!(browser = %strategy.browser(), "batch worker failed, continuing");
                    }
                    _ => {}
                }
            }
        });
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_by_domain_runs_without_panicking_and_returns_empty_in_ci() {
        let records = get_by_domain("example.com");
        assert!(records.is_empty());
    }

    #[test]
    fn batch_with_no_specs_is_a_fast_empty_path() {
        let result = batch(&[], &BatchOptions::default());
        assert!(result.is_empty());
    }

    #[test]
    fn batch_default_options_match_spec() {
        let options = BatchOptions::default();
        assert!(options.deduplicate);
        assert_eq!(options.concurrency, 10);
        assert!(options.continue_on_error);
        assert!(!options.remove_expired);
        assert_eq!(options.limit, None);
    }

    #[test]
    fn batch_runs_every_strategy_for_every_spec_without_panicking() {
        let specs = vec![
            CookieSpec::for_domain("example.com"),
            CookieSpec::new("session", "other.example"),
        ];
        let records = batch(&specs, &BatchOptions::default());
        assert!(records.is_empty());
    }
}
