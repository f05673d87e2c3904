//! Ordered fallback over a list of options.
//!
//! Search strategies and model identifiers share the same shape: try each
//! option in declared order, stop at the first success, and keep every
//! failure message when all of them fail.

use std::fmt;
use std::future::Future;

use tracing::warn;

use crate::error::Result;

/// One failed option inside an ordered attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptFailure {
    /// Label of the option that failed (model id, strategy name).
    pub option: String,
    /// Display form of the error it produced.
    pub message: String,
}

impl AttemptFailure {
    pub fn new(option: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            option: option.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.option, self.message)
    }
}

/// Run `attempt` for each option in order and return the first success.
///
/// Failures are logged and collected; the attempt loop never short-circuits
/// on an error. When every option fails the caller receives one
/// [`AttemptFailure`] per option, in the order they were tried.
pub async fn first_success<'a, O, T, F, Fut>(
    options: &'a [O],
    mut attempt: F,
) -> std::result::Result<(&'a O, T), Vec<AttemptFailure>>
where
    O: fmt::Display,
    F: FnMut(&'a O) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut failures = Vec::with_capacity(options.len());

    for option in options {
        match attempt(option).await {
            Ok(value) => return Ok((option, value)),
            Err(e) => {
                warn!(option = %option, error = %e, "attempt failed, trying next option");
                failures.push(AttemptFailure::new(option.to_string(), e.to_string()));
            }
        }
    }

    Err(failures)
}
