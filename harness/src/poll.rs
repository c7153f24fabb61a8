use crate::error::{self, Error, Result};
use log::trace;
use std::thread;
use std::time::{Duration, Instant};

/// Repeatedly evaluates `query` at `interval` until `predicate` accepts an
/// observation or `timeout` elapses.
///
/// The first check happens immediately, so an already-satisfied condition
/// returns without sleeping. [`Error::NotFound`] from the query is treated as
/// not-ready-yet and polled through, since eventually-consistent resources may
/// simply not exist on early checks; any other query error is terminal.
/// Expiry surfaces as [`Error::Timeout`], never before the configured
/// duration has passed. Blocks the calling thread; no background tasks.
pub fn poll_until<T, Q, P>(
    what: &str,
    mut query: Q,
    mut predicate: P,
    timeout: Duration,
    interval: Duration,
) -> Result<T>
where
    Q: FnMut() -> Result<T>,
    P: FnMut(&T) -> bool,
{
    let start = Instant::now();
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match query() {
            Ok(observed) => {
                if predicate(&observed) {
                    trace!("'{}' satisfied on attempt {}", what, attempt);
                    return Ok(observed);
                }
                trace!("'{}' not satisfied on attempt {}", what, attempt);
            }
            Err(Error::NotFound { kind, name }) => {
                trace!(
                    "'{}': {} '{}' absent on attempt {}",
                    what,
                    kind,
                    name,
                    attempt
                );
            }
            Err(error) => return Err(error),
        }
        if start.elapsed() >= timeout {
            return error::TimeoutSnafu { what, timeout }.fail();
        }
        thread::sleep(interval);
    }
}
