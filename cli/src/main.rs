#![deny(clippy::all)]
mod args;
mod commands;
mod config;
mod printer;
mod utils;

use anyhow::{anyhow, Context, Result};
use log::{error, warn};
use mutuals_client::{Client, Config as ClientConfig, Token, DEFAULT_ENDPOINT};
use std::{env, fs, io, path::PathBuf, process};
use structopt::{clap::Shell as ClapShell, StructOpt};

use crate::{
    args::{Args, Command, Shell},
    commands::{common, config as config_command, followers, user_id, Completion},
    config::MutualsConfig,
    printer::Printer,
    utils::io::{init_env_logger, read_token_from_stdin},
};

const NUM_THREADS_ENV_VARIABLE_NAME: &str = "MUTUALS_RESOLVER_THREADS";

/// Exit status when the command succeeded but some of the output is missing.
const PARTIAL_OUTPUT_EXIT_CODE: i32 = 2;

fn run(args: Args) -> Result<Completion> {
    let config_path = find_configuration(&args)?;
    let cli_config = config::read_mutuals_config(&config_path)?;
    let printer = Printer::new(args.output);

    let number_of_threads = match env::var(NUM_THREADS_ENV_VARIABLE_NAME) {
        Ok(num_threads) => num_threads.parse::<u32>().with_context(|| {
            format!(
                "Environment variable {NUM_THREADS_ENV_VARIABLE_NAME} is not a u32: '{num_threads}'"
            )
        })?,
        Err(_) => args.num_threads,
    };

    match &args.command {
        Command::Config { config_args } => {
            config_command::run(config_args, cli_config, config_path)?;
            Ok(Completion::Complete)
        }
        Command::Completion { shell } => {
            let mut app = Args::clap();
            let clap_shell = match shell {
                Shell::Zsh => ClapShell::Zsh,
                Shell::Bash => ClapShell::Bash,
            };
            app.gen_completions_to("mutuals", clap_shell, &mut io::stdout());
            Ok(Completion::Complete)
        }
        Command::Common { common_args } => common::run(
            common_args,
            client_from_args(&args, &cli_config)?,
            &printer,
            number_of_threads,
        ),
        Command::Followers { followers_args } => followers::run(
            followers_args,
            client_from_args(&args, &cli_config)?,
            &printer,
        ),
        Command::UserId { user_id_args } => {
            user_id::run(
                user_id_args,
                &client_from_args(&args, &cli_config)?,
                &printer,
            )?;
            Ok(Completion::Complete)
        }
    }
}

fn client_from_args(args: &Args, config: &MutualsConfig) -> Result<Client> {
    let current_context = if let Some(context_name) = args.context.as_ref() {
        let context = config.get_context(context_name);
        if context.is_none() {
            return Err(anyhow!("Unknown context `{}`.", context_name));
        };
        context
    } else {
        config.get_current_context()
    };

    let endpoint = args
        .endpoint
        .clone()
        .or_else(|| current_context.map(|context| context.endpoint.clone()))
        .unwrap_or_else(|| DEFAULT_ENDPOINT.clone());

    let token = Token(
        match args
            .token
            .clone()
            .or_else(|| current_context.and_then(|context| context.token.clone()))
        {
            Some(token) => token,
            None => read_token_from_stdin()?.unwrap_or_default(),
        },
    );

    let accept_invalid_certificates = args
        .accept_invalid_certificates
        .or_else(|| current_context.map(|context| context.accept_invalid_certificates))
        .unwrap_or(false);

    if accept_invalid_certificates {
        warn!(concat!(
            "TLS certificate verification is disabled. ",
            "Do NOT use this over an insecure network."
        ));
    }

    let proxy = args
        .proxy
        .clone()
        .or_else(|| current_context.and_then(|context| context.proxy.clone()));

    Client::new(ClientConfig {
        endpoint,
        token,
        accept_invalid_certificates,
        proxy,
    })
    .context("Failed to initialise the HTTP client.")
}

fn find_configuration(args: &Args) -> Result<PathBuf> {
    let config_path = if let Some(config_path) = args.config.clone() {
        if !config_path.exists() {
            warn!(
                "Configuration file `{}` doesn't exist.",
                config_path.display()
            );
        }
        config_path
    } else {
        let mut config_path =
            dirs::config_dir().context("Could not get path to the user's config directory")?;
        config_path.push("mutuals");
        fs::create_dir_all(&config_path).with_context(|| {
            format!(
                "Could not create config directory {}",
                config_path.display()
            )
        })?;
        config_path.push("contexts.json");
        config_path
    };
    Ok(config_path)
}

fn main() {
    let args = Args::from_args();
    init_env_logger(args.verbose);

    match run(args) {
        Ok(Completion::Complete) => {}
        Ok(Completion::Partial) => process::exit(PARTIAL_OUTPUT_EXIT_CODE),
        Err(error) => {
            error!("An error occurred:");
            for cause in error.chain() {
                error!(" |- {cause}");
            }

            #[cfg(feature = "backtrace")]
            {
                error!("{}", error.backtrace());
            }

            process::exit(1);
        }
    }
}
