use anyhow::{Context, Result};
use mutuals_client::{retry::Retrier, CancellationToken, Client, RetryConfig, ScreenName, User};
use structopt::StructOpt;

use crate::printer::Printer;

#[derive(Debug, StructOpt)]
pub struct UserIdArgs {
    /// Screen names to look up.
    #[structopt(required = true)]
    pub screen_names: Vec<ScreenName>,
}

pub fn run(args: &UserIdArgs, client: &Client, printer: &Printer) -> Result<()> {
    let retrier = Retrier::new(RetryConfig::default());
    let cancel = CancellationToken::new();

    let users = args
        .screen_names
        .iter()
        .map(|screen_name| -> Result<User> {
            let id = retrier
                .with_retries(&cancel, || client.get_user_id(screen_name))
                .with_context(|| format!("Could not get the id of `{screen_name}`"))?;
            Ok(User {
                id,
                screen_name: screen_name.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    printer.print_resources(&users)
}
