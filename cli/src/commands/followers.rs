use anyhow::{Context, Result};
use mutuals_client::{Client, Pipeline, PipelineConfig, ScreenName};
use structopt::StructOpt;

use super::{finish, Completion, PipelineArgs};
use crate::printer::Printer;

#[derive(Debug, StructOpt)]
pub struct FollowersArgs {
    /// The account whose followers are listed.
    pub account: ScreenName,

    #[structopt(long = "ids")]
    /// Print numeric ids instead of screen names.
    pub ids: bool,

    #[structopt(flatten)]
    pub pipeline_args: PipelineArgs,
}

pub fn run(args: &FollowersArgs, client: Client, printer: &Printer) -> Result<Completion> {
    let FollowersArgs {
        account,
        ids,
        pipeline_args,
    } = args;

    let pipeline = Pipeline::new(
        client,
        PipelineConfig {
            retry: pipeline_args.retry_config(),
            ..Default::default()
        },
    )?;
    pipeline_args.start_timeout(&pipeline);

    // Screen names come with the `followers/list` pages, no lookups needed.
    let num_printed = if *ids {
        printer.print_stream(pipeline.follower_ids(account))
    } else {
        printer.print_stream(pipeline.follower_screen_names(account))
    }
    .with_context(|| format!("Could not print the followers of `{account}`"))?;

    Ok(finish(&pipeline, num_printed, "followers"))
}
