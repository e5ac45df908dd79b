use log::warn;
use std::time::Duration;

use crate::{
    error::{Error, Result},
    stream::CancellationToken,
};

/// How long the remote quota takes to reset once exhausted.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5 * 60);

/// Configuration for retrying requests rejected because of rate limiting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryConfig {
    /// Amount of time to wait before repeating a throttled request.
    pub cooldown: Duration,
    /// Maximum number of attempts per request, including the first one. `None` retries
    /// until the request goes through or the operation is cancelled.
    pub max_attempts: Option<u32>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            cooldown: DEFAULT_COOLDOWN,
            max_attempts: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Retrier {
    config: RetryConfig,
}

impl Retrier {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Run `send_request`, repeating it after the cooldown for as long as it is throttled.
    ///
    /// Any other outcome is returned immediately. Cancellation interrupts the cooldown and
    /// yields [`Error::Cancelled`].
    pub fn with_retries<T>(
        &self,
        cancel: &CancellationToken,
        mut send_request: impl FnMut() -> Result<T>,
    ) -> Result<T> {
        let mut attempt: u32 = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            attempt = attempt.saturating_add(1);

            match send_request() {
                Err(error) if error.is_throttled() => {
                    if self
                        .config
                        .max_attempts
                        .is_some_and(|max_attempts| attempt >= max_attempts)
                    {
                        warn!("{} - giving up after {} attempts.", error, attempt);
                        return Err(error);
                    }
                    warn!(
                        "API limit reached ({}) - retrying after {:?}.",
                        error, self.config.cooldown
                    );
                    if cancel.wait_timeout(self.config.cooldown) {
                        return Err(Error::Cancelled);
                    }
                }
                // If anything else, just return it immediately
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Retrier, RetryConfig};
    use crate::{error::Error, stream::CancellationToken};
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;
    use std::{cell::Cell, time::Duration};

    fn throttled() -> Error {
        Error::Api {
            status_code: StatusCode::TOO_MANY_REQUESTS,
            message: "Rate limit exceeded".to_owned(),
        }
    }

    fn retrier(max_attempts: Option<u32>) -> Retrier {
        Retrier::new(RetryConfig {
            cooldown: Duration::from_millis(1),
            max_attempts,
        })
    }

    #[test]
    fn test_retries_until_not_throttled() {
        let cancel = CancellationToken::new();
        let attempts = Cell::new(0);
        let result = retrier(None).with_retries(&cancel, || {
            attempts.set(attempts.get() + 1);
            if attempts.get() < 4 {
                Err(throttled())
            } else {
                Ok(attempts.get())
            }
        });
        assert_eq!(result.unwrap(), 4);
        assert_eq!(attempts.get(), 4);
    }

    #[test]
    fn test_does_not_retry_other_errors() {
        let cancel = CancellationToken::new();
        let attempts = Cell::new(0);
        let result: Result<(), _> = retrier(None).with_retries(&cancel, || {
            attempts.set(attempts.get() + 1);
            Err(Error::Api {
                status_code: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Over capacity".to_owned(),
            })
        });
        assert!(matches!(result, Err(Error::Api { .. })));
        assert_eq!(attempts.get(), 1);
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let cancel = CancellationToken::new();
        for max_attempts in 1..5 {
            let attempts = Cell::new(0);
            let result: Result<(), _> = retrier(Some(max_attempts)).with_retries(&cancel, || {
                attempts.set(attempts.get() + 1);
                Err(throttled())
            });
            assert!(result.unwrap_err().is_throttled());
            assert_eq!(attempts.get(), max_attempts);
        }
    }

    #[test]
    fn test_cancel_interrupts_cooldown() {
        let cancel = CancellationToken::new();
        let retrier = Retrier::new(RetryConfig {
            cooldown: Duration::from_secs(3600),
            max_attempts: None,
        });
        cancel.cancel_after(Duration::from_millis(20));
        let result: Result<(), _> = retrier.with_retries(&cancel, || Err(throttled()));
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
