use anyhow::{Context, Result};
use log::{info, warn};
use mutuals_client::{Client, Pipeline, PipelineConfig, ScreenName};
use structopt::StructOpt;

use super::{finish, Completion, PipelineArgs};
use crate::printer::Printer;

#[derive(Debug, StructOpt)]
pub struct CommonArgs {
    /// The first account, e.g. `jack` or `@jack`.
    pub first: ScreenName,

    /// The second account.
    pub second: ScreenName,

    #[structopt(long = "ids")]
    /// Print numeric ids instead of resolving them to screen names.
    pub ids: bool,

    #[structopt(long = "batch-size", default_value = "95")]
    /// Number of ids resolved per lookup request, at most 100.
    pub batch_size: usize,

    #[structopt(flatten)]
    pub pipeline_args: PipelineArgs,
}

pub fn run(
    args: &CommonArgs,
    client: Client,
    printer: &Printer,
    resolver_threads: u32,
) -> Result<Completion> {
    let CommonArgs {
        first,
        second,
        ids,
        batch_size,
        pipeline_args,
    } = args;

    if first == second {
        warn!(
            "Both accounts are `{}`, every one of its followers will be listed.",
            first
        );
    }

    let pipeline = Pipeline::new(
        client,
        PipelineConfig {
            batch_size: *batch_size,
            resolver_threads,
            retry: pipeline_args.retry_config(),
        },
    )
    .context("Invalid options for finding common followers")?;
    pipeline_args.start_timeout(&pipeline);

    info!("Finding the followers `{}` and `{}` have in common.", first, second);
    let common_ids = pipeline.common_follower_ids(first, second);
    let num_printed = if *ids {
        printer.print_stream(common_ids)
    } else {
        printer.print_stream(pipeline.screen_names(common_ids))
    }
    .context("Could not print common followers")?;

    Ok(finish(&pipeline, num_printed, "common followers"))
}
