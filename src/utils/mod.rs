// Utility functions

pub mod tokenizer;

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::types::{AriaError, AriaResult};

/// Validates a value against a constraint and returns an error if it fails
pub fn validate<T, F>(
    value: T,
    constraint: F,
    error_message: impl Into<String>,
) -> AriaResult<T>
where
    F: FnOnce(&T) -> bool,
{
    if constraint(&value) {
        Ok(value)
    } else {
        Err(AriaError::Invalid(error_message.into()))
    }
}

/// Validates a string against common constraints
pub struct StringValidator;

impl StringValidator {
    /// Validates that a string is not empty or whitespace-only
    pub fn not_blank(value: impl Into<String>, param_name: &str) -> AriaResult<String> {
        let value = value.into();
        validate(
            value,
            |s| !s.trim().is_empty(),
            format!("{} cannot be empty", param_name),
        )
    }
}

/// Runs a fallible store operation up to `attempts` times with jittered
/// exponential backoff between failures.
pub(crate) async fn with_retries<T, F, Fut>(attempts: u32, mut op: F) -> AriaResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AriaResult<T>>,
{
    let mut last_error = None;
    for attempt in 0..attempts.max(1) {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                log::debug!("store operation failed (attempt {}): {}", attempt + 1, err);
                if attempt + 1 < attempts {
                    let jitter_ms: u64 = rand::thread_rng().gen_range(10..50);
                    tokio::time::sleep(Duration::from_millis(jitter_ms << attempt)).await;
                }
                last_error = Some(err);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| AriaError::simple_backend("retry budget exhausted")))
}

/// Current wall-clock time as unix seconds; 0 if the clock is unset
pub(crate) fn now_unix() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
