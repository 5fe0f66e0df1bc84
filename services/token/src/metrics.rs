//! Prometheus metrics for the bearer token service.
//!
//! Labels never carry subjects or token material.

// Registration only fails on a duplicate metric name, a startup bug.
#![allow(clippy::expect_used)]

use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, CounterVec};

/// Tokens issued counter.
pub static TOKENS_ISSUED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "bearer_tokens_issued_total",
        "Total number of bearer tokens issued",
        &["algorithm"]
    )
    .expect("Failed to register tokens_issued metric")
});

/// Token verifications counter, labelled by outcome.
pub static TOKEN_VERIFICATIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "bearer_token_verifications_total",
        "Total number of bearer token verifications",
        &["outcome"]
    )
    .expect("Failed to register token_verifications metric")
});

/// Record a token issuance.
pub fn record_token_issued(algorithm: &str) {
    TOKENS_ISSUED.with_label_values(&[algorithm]).inc();
}

/// Record a verification outcome: `success` or a failure code.
pub fn record_verification(outcome: &str) {
    TOKEN_VERIFICATIONS.with_label_values(&[outcome]).inc();
}
