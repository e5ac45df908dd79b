use anyhow::{anyhow, Result};
use colored::Colorize;
use log::{error, info, warn};
use mutuals_client::DEFAULT_ENDPOINT;
use prettytable::{cell, row};
use reqwest::Url;
use std::path::Path;
use structopt::StructOpt;

use crate::{
    config::{self, ContextConfig, MutualsConfig},
    printer::new_table,
    utils,
};

#[derive(Debug, StructOpt)]
pub enum ConfigArgs {
    #[structopt(name = "add")]
    /// Add a new context to the config file, or update an existing one
    AddContext {
        #[structopt(long = "name", short = "n")]
        /// The name of the context that will be created or updated
        name: Option<String>,

        #[structopt(long = "endpoint", short = "e")]
        /// The API base URL that will be used for this context
        endpoint: Option<Url>,

        #[structopt(long = "token", short = "t")]
        /// The bearer token that will be used for this context
        token: Option<String>,

        #[structopt(long = "accept-invalid-certificates", short = "k")]
        /// Whether to accept invalid TLS certificates
        accept_invalid_certificates: bool,

        #[structopt(long = "proxy")]
        /// URL for an HTTP proxy that will be used for all requests if specified
        proxy: Option<Option<Url>>,
    },

    #[structopt(name = "current")]
    /// Display the current context
    CurrentContext,

    #[structopt(name = "delete")]
    /// Delete the specified contexts from the config file
    DeleteContext {
        /// The name(s) of the context(s) which will be deleted
        names: Vec<String>,
    },

    #[structopt(name = "ls")]
    /// List the contexts in the config file
    ListContexts {
        #[structopt(long = "tokens")]
        /// Show bearer tokens (by default tokens are hidden).
        tokens: bool,
    },

    #[structopt(name = "use")]
    /// Set the current context
    UseContext {
        /// The name of the context.
        name: String,
    },
}

pub fn run(
    args: &ConfigArgs,
    mut config: MutualsConfig,
    config_path: impl AsRef<Path>,
) -> Result<MutualsConfig> {
    match args {
        ConfigArgs::ListContexts { tokens } if config.num_contexts() > 0 => {
            list_contexts(&config, *tokens);
        }
        ConfigArgs::ListContexts { .. } => {
            info!("No available contexts.");
        }
        ConfigArgs::AddContext {
            name,
            endpoint,
            token,
            accept_invalid_certificates,
            proxy,
        } => {
            let name = match name {
                Some(name) => name.clone(),
                None => read_context_name()?,
            };
            let existing_context = config.get_context(&name).cloned();
            let context = ContextConfig {
                endpoint: match endpoint {
                    Some(endpoint) => endpoint.clone(),
                    None => read_endpoint(existing_context.as_ref())?,
                },
                token: match token {
                    Some(token) => Some(token.clone()),
                    None => utils::read_token_from_stdin()?,
                },
                accept_invalid_certificates: *accept_invalid_certificates,
                proxy: proxy.clone().unwrap_or_else(|| {
                    existing_context
                        .as_ref()
                        .and_then(|context| context.proxy.clone())
                }),
                name,
            };
            add_or_edit_context(context, &mut config, config_path)?;
        }
        ConfigArgs::UseContext { name } => {
            if !config.set_current_context(name) {
                return Err(anyhow!(
                    "No such context `{}` exists in `{}`.",
                    name,
                    config_path.as_ref().display()
                ));
            }
            config::write_mutuals_config(config_path, &config)?;
            info!("Switched to context `{}`.", name);
        }
        ConfigArgs::CurrentContext => config.get_current_context().map_or_else(
            || info!("There is no default context in use."),
            |current_context| println!("{}", current_context.name),
        ),
        ConfigArgs::DeleteContext { names } => {
            for name in names {
                if config.delete_context(name) {
                    config::write_mutuals_config(&config_path, &config)?;
                    info!(
                        "Deleted context `{}` from `{}`.",
                        name,
                        config_path.as_ref().display()
                    );
                } else {
                    error!(
                        "No such context `{}` exists in `{}`.",
                        name,
                        config_path.as_ref().display()
                    );
                }
            }
        }
    }
    Ok(config)
}

fn list_contexts(config: &MutualsConfig, show_tokens: bool) {
    let mut contexts = config.get_all_contexts().clone();
    contexts.sort_unstable_by(|lhs, rhs| lhs.name.cmp(&rhs.name));
    let current_name = config
        .get_current_context()
        .map(|current_context| current_context.name.as_str());

    let mut table = new_table();
    table.set_titles(row![bFg => "Active", "Context", "Endpoint", "Insecure", "Token", "Proxy"]);
    for context in &contexts {
        let active = current_name == Some(context.name.as_str());
        table.add_row(row![
            if active { "    ->" } else { "" },
            if active {
                context.name.bold().bright_white()
            } else {
                context.name.normal()
            },
            context.endpoint,
            if context.accept_invalid_certificates {
                "Yes"
            } else {
                "No"
            },
            match (&context.token, show_tokens) {
                (Some(token), true) => token.clone(),
                (Some(_), false) => "<Hidden>".to_owned(),
                (None, _) => String::new(),
            },
            context
                .proxy
                .as_ref()
                .map(Url::to_string)
                .unwrap_or_default()
        ]);
    }
    table.printstd();
}

fn read_context_name() -> Result<String> {
    loop {
        let name = utils::read_from_stdin("Context name", None)?;
        if !name.is_empty() {
            return Ok(name);
        }
        error!("Context name cannot be empty.");
    }
}

fn read_endpoint(existing_context: Option<&ContextConfig>) -> Result<Url> {
    let default = existing_context
        .map(|context| context.endpoint.as_str())
        .unwrap_or_else(|| DEFAULT_ENDPOINT.as_str());
    loop {
        match Url::parse(&utils::read_from_stdin("Endpoint", Some(default))?) {
            Ok(url) => return Ok(url),
            Err(error) => error!("Invalid endpoint URL: {}", error),
        }
    }
}

/// Store `context` in `config`, making it the current context if it is the only one.
fn add_or_edit_context(
    context: ContextConfig,
    config: &mut MutualsConfig,
    config_path: impl AsRef<Path>,
) -> Result<()> {
    let name = context.name.clone();
    if context.token.is_none() {
        info!(concat!(
            "No bearer token was associated with the context. ",
            "You will have to enter it for every request."
        ));
    } else {
        warn!(
            "Be careful, bearer tokens are stored in cleartext in {}.",
            config_path.as_ref().display()
        );
    }

    let update_existing = config.set_context(context);
    if !update_existing && config.num_contexts() == 1 {
        info!("Default context set to `{}`.", name);
        config.set_current_context(&name);
    }

    config::write_mutuals_config(config_path, config)?;

    if update_existing {
        info!("Context `{}` was updated.", name);
    } else {
        info!("New context `{}` was created.", name);
    }
    Ok(())
}
