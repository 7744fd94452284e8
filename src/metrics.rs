//! Cache and provider counters for the translation service.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters owned by one `Translator`.
#[derive(Debug, Default)]
pub struct TranslationMetrics {
    /// Lookups answered from the store
    cache_hits: AtomicUsize,

    /// Lookups that had to go to the provider
    cache_misses: AtomicUsize,

    provider_calls: AtomicUsize,
    provider_failures: AtomicUsize,

    /// Batch items that fell back to their original text
    batch_fallbacks: AtomicUsize,
}

impl TranslationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_provider_call(&self) {
        self.provider_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_provider_failure(&self) {
        self.provider_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_batch_fallback(&self) {
        self.batch_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the counters with derived rates.
    pub fn report(&self) -> MetricsReport {
        let hits = self.cache_hits.load(Ordering::Relaxed);
        let misses = self.cache_misses.load(Ordering::Relaxed);
        let total_lookups = hits + misses;
        let cache_hit_rate = if total_lookups > 0 {
            (hits as f64 / total_lookups as f64) * 100.0
        } else {
            0.0
        };

        let calls = self.provider_calls.load(Ordering::Relaxed);
        let failures = self.provider_failures.load(Ordering::Relaxed);
        let provider_success_rate = if calls > 0 {
            (calls.saturating_sub(failures) as f64 / calls as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate,
            provider_calls: calls,
            provider_failures: failures,
            provider_success_rate,
            batch_fallbacks: self.batch_fallbacks.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of `TranslationMetrics`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub cache_hits: usize,
    pub cache_misses: usize,
    /// Percentage (0-100)
    pub cache_hit_rate: f64,
    pub provider_calls: usize,
    pub provider_failures: usize,
    /// Percentage (0-100)
    pub provider_success_rate: f64,
    pub batch_fallbacks: usize,
}
