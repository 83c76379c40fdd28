//! Fuzz testing for request canonicalization and timestamp parsing.
//!
//! Both run on attacker-controlled input before any authentication decision,
//! so they must never panic:
//!
//! - `canonicalize`: arbitrary method, path, query, body and timestamp
//! - `TimestampValidator::check`: arbitrary header text, including values
//!   that overflow `i64` or fall outside chrono's representable range
//! - `reconstruct_query`: arbitrary decoded parameter lists
//!
//! # Running the Fuzz Tests
//!
//! ```bash
//! cargo +nightly install cargo-fuzz
//! cargo +nightly fuzz run fuzz_signing -- -max_total_time=60
//! ```

#![no_main]

use arbitrary::Arbitrary;
use chrono::DateTime;
use libfuzzer_sys::fuzz_target;

use hmac_sample::signing::{Signer, SigningContext, TimestampValidator, reconstruct_query};

#[derive(Arbitrary, Debug)]
struct Input {
    method: String,
    path: String,
    query: String,
    body: Vec<u8>,
    timestamp: String,
    params: Vec<(String, String)>,
    now_ms: i64,
}

fuzz_target!(|input: Input| {
    let ctx = SigningContext::new(input.method.clone(), input.path.clone())
        .with_query(input.query.clone())
        .with_body(input.body.clone())
        .with_timestamp(input.timestamp.clone());

    let canonical = ctx.canonicalize();
    assert!(canonical.len() >= input.method.len() + input.path.len() + 3);

    if let Ok(signer) = Signer::new("fuzzSecret") {
        let first = signer.sign(&canonical);
        assert!(first.matches(signer.sign_context(&ctx).as_str()));
    }

    if let Some(now) = DateTime::from_timestamp_millis(input.now_ms) {
        let _ = TimestampValidator::new().check(&input.timestamp, now);
    }

    let query = reconstruct_query(input.params.iter().map(|(k, v)| (k, v)));
    assert!(query.len() <= input.params.iter().map(|(k, v)| k.len() + v.len() + 2).sum());
});
