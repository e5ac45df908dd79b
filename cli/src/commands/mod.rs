use log::{info, warn};
use mutuals_client::{FollowerSource, Pipeline, RetryConfig};
use std::time::Duration;
use structopt::StructOpt;

pub mod common;
pub mod config;
pub mod followers;
pub mod user_id;

/// Whether a streaming command printed everything there was to print.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Completion {
    Complete,
    Partial,
}

#[derive(Debug, StructOpt)]
pub struct PipelineArgs {
    #[structopt(long = "timeout")]
    /// Stop after this many seconds, keeping whatever was printed so far.
    pub timeout: Option<u64>,

    #[structopt(long = "cooldown", default_value = "300")]
    /// Seconds to wait before repeating a request rejected by the rate limiter.
    pub cooldown: u64,

    #[structopt(long = "max-attempts")]
    /// Give up on a rate limited request after this many attempts. By default requests
    /// are retried until they go through.
    pub max_attempts: Option<u32>,
}

impl PipelineArgs {
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            cooldown: Duration::from_secs(self.cooldown),
            max_attempts: self.max_attempts,
        }
    }

    pub fn start_timeout<S>(&self, pipeline: &Pipeline<S>)
    where
        S: FollowerSource + Send + Sync + 'static,
    {
        if let Some(timeout) = self.timeout {
            pipeline.cancel_after(Duration::from_secs(timeout));
        }
    }
}

/// Report how a drained pipeline ended.
pub fn finish<S>(pipeline: &Pipeline<S>, num_printed: usize, what: &str) -> Completion
where
    S: FollowerSource + Send + Sync + 'static,
{
    let truncations = pipeline.truncations();
    for truncation in &truncations {
        warn!("{}", truncation);
    }

    if pipeline.context().cancellation().is_cancelled() {
        warn!("Stopped early, printed {} {} before timing out.", num_printed, what);
        Completion::Partial
    } else if !truncations.is_empty() {
        warn!("Printed {} {}, the list is incomplete.", num_printed, what);
        Completion::Partial
    } else {
        info!("Printed {} {}.", num_printed, what);
        Completion::Complete
    }
}
