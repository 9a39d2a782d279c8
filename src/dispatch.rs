//! The composite dispatcher.
//!
//! Fans out a query to every registered strategy concurrently, isolates
//! per-strategy failure (an ordinary empty result, or — defensively — a
//! caught panic), and concatenates results in strategy-registration
//! order.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread;

use crate::browser::{ChromeVariant, QueryOptions, Strategy};
use crate::chrome::ChromeStrategy;
use crate::cookie::ExportedCookie;
use crate::firefox::FirefoxStrategy;
use crate::safari::SafariStrategy;
use crate::spec::CookieSpec;

/// Builds the fixed, ordered strategy set matching
/// [`crate::browser::REGISTRY_ORDER`].
fn registry() -> Vec<Box<dyn Strategy>> {
    let mut strategies: Vec<Box<dyn Strategy>> = ChromeVariant::ALL
        .into_iter()
        .map(|variant| Box::new(ChromeStrategy::new(variant)) as Box<dyn Strategy>)
        .collect();
    strategies.push(Box::new(FirefoxStrategy));
    strategies.push(Box::new(SafariStrategy));
    strategies
}

/// Runs every strategy concurrently and returns the concatenated,
/// un-deduplicated results in registration order.
pub fn dispatch(spec: &CookieSpec, options: &QueryOptions) -> Vec<ExportedCookie> {
    let strategies = registry();
    let mut results: Vec<Vec<ExportedCookie>> = vec![Vec::new(); strategies.len()];

    thread::scope(|scope| {
        let handles: Vec<_> = strategies
            .iter()
            .map(|strategy| {
                let spec = spec.clone();
                let options = options.clone();
                scope.spawn(move || {
                    let browser = strategy.browser();
                    match catch_unwind(AssertUnwindSafe(|| strategy.query(&spec, &options))) {
                        Ok(records) => records,
                        Err(_) => {
                            tracing::warn!(%browser, "strategy panicked, isolating failure");
                            Vec::new()
                        }
                    }
                })
            })
            .collect();

        for (slot, handle) in results.iter_mut().zip(handles) {
            *slot = handle.join().unwrap_or_default();
        }
    });

    results.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_runs_every_strategy_without_panicking() {
        let spec = CookieSpec::for_domain("example.com");
        let options = QueryOptions::default();
        // No real browsers are installed in the test environment; this
        // exercises only that every strategy runs to completion and the
        // dispatcher never panics or deadlocks.
        let records = dispatch(&spec, &options);
        assert!(records.is_empty());
    }
}
