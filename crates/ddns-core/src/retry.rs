//! Bounded retry combinator
//!
//! Runs an async operation up to a fixed number of times with no delay
//! between attempts and returns the first success or the last error,
//! together with how many attempts were made.

use std::future::Future;

/// Successful outcome of [`retry`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Succeeded<T> {
    /// Value returned by the successful attempt
    pub value: T,
    /// Attempts made, including the successful one
    pub attempts: usize,
}

/// Failed outcome of [`retry`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exhausted<E> {
    /// Error returned by the final attempt
    pub last_error: E,
    /// Attempts made
    pub attempts: usize,
}

/// Run `op` up to `max_attempts` times (at least once)
///
/// `op` receives the 1-based attempt number.
pub async fn retry<T, E, F, Fut>(
    max_attempts: usize,
    mut op: F,
) -> Result<Succeeded<T>, Exhausted<E>>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => {
                return Ok(Succeeded {
                    value,
                    attempts: attempt,
                });
            }
            Err(last_error) if attempt >= max_attempts => {
                return Err(Exhausted {
                    last_error,
                    attempts: attempt,
                });
            }
            Err(_) => attempt += 1,
        }
    }
}
