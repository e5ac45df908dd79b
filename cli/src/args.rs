use crate::{
    commands::{
        common::CommonArgs, config::ConfigArgs, followers::FollowersArgs, user_id::UserIdArgs,
    },
    printer::OutputFormat,
};
use anyhow::{anyhow, Error, Result};
use reqwest::Url;
use std::{path::PathBuf, str::FromStr};
use structopt::StructOpt;

/// mutuals finds the followers two accounts have in common.
#[derive(Debug, StructOpt)]
#[structopt(
    global_settings = &[
        structopt::clap::AppSettings::ColoredHelp,
        structopt::clap::AppSettings::InferSubcommands,
    ]
)]
pub struct Args {
    #[structopt(long = "config-file", parse(from_os_str))]
    /// Path to the configuration file. Typically defaults to ~/.config/mutuals on Linux.
    pub config: Option<PathBuf>,

    #[structopt(short = "c", long = "context")]
    /// Specify what context to use. Overrides the current context, if any.
    pub context: Option<String>,

    #[structopt(short = "v", long = "verbose")]
    /// Enable more verbose logging.
    pub verbose: bool,

    #[structopt(long = "endpoint", parse(try_from_str))]
    /// Specify what endpoint to use. Overrides the one from the current
    /// context, if any.
    pub endpoint: Option<Url>,

    #[structopt(short = "k", long = "accept-invalid-certificates", parse(try_from_str))]
    pub accept_invalid_certificates: Option<bool>,

    #[structopt(long = "token")]
    /// Specify what bearer token to use. Overrides the one from the current
    /// context, if any.
    pub token: Option<String>,

    #[structopt(long = "proxy")]
    /// URL for an HTTP proxy that will be used for all requests. Overrides the one from
    /// the current context, if any.
    pub proxy: Option<Url>,

    #[structopt(short = "o", long = "output", default_value = "table")]
    /// Output format, one of `table` or `json`.
    pub output: OutputFormat,

    #[structopt(long = "num-threads", default_value = "8")]
    /// Number of user lookup requests in flight at once.
    pub num_threads: u32,

    #[structopt(subcommand)]
    pub command: Command,
}

#[derive(Debug, StructOpt)]
pub enum Command {
    #[structopt(name = "common")]
    /// Stream the followers two accounts have in common
    Common {
        #[structopt(flatten)]
        common_args: CommonArgs,
    },

    #[structopt(name = "completion")]
    /// Output shell completion code for the specified shell (bash or zsh)
    Completion { shell: Shell },

    #[structopt(name = "config")]
    /// Manage endpoint and bearer token contexts
    Config {
        #[structopt(subcommand)]
        config_args: ConfigArgs,
    },

    #[structopt(name = "followers")]
    /// Stream all the followers of one account
    Followers {
        #[structopt(flatten)]
        followers_args: FollowersArgs,
    },

    #[structopt(name = "user-id")]
    /// Look up the numeric ids of accounts
    UserId {
        #[structopt(flatten)]
        user_id_args: UserIdArgs,
    },
}

#[derive(Debug, PartialEq, Eq)]
pub enum Shell {
    Bash,
    Zsh,
}

impl FromStr for Shell {
    type Err = Error;

    fn from_str(string: &str) -> Result<Self> {
        match string {
            "bash" => Ok(Shell::Bash),
            "zsh" => Ok(Shell::Zsh),
            _ => Err(anyhow!("unknown shell: '{}'", string)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mutuals_client::ScreenName;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_common() {
        let args = Args::from_iter_safe([
            "mutuals",
            "-o",
            "json",
            "common",
            "@jack",
            "biz",
            "--ids",
            "--timeout",
            "60",
            "--batch-size",
            "50",
        ])
        .unwrap();

        assert_eq!(args.output, OutputFormat::Json);
        assert_eq!(args.num_threads, 8);
        match args.command {
            Command::Common { common_args } => {
                assert_eq!(common_args.first, ScreenName("jack".to_owned()));
                assert_eq!(common_args.second, ScreenName("biz".to_owned()));
                assert!(common_args.ids);
                assert_eq!(common_args.batch_size, 50);
                assert_eq!(common_args.pipeline_args.timeout, Some(60));
                assert_eq!(common_args.pipeline_args.cooldown, 300);
            }
            command => panic!("unexpected command {command:?}"),
        }
    }

    #[test]
    fn test_rejects_invalid_screen_name() {
        assert!(Args::from_iter_safe(["mutuals", "common", "jack", "not a name"]).is_err());
        assert!(Args::from_iter_safe(["mutuals", "followers", "@"]).is_err());
    }

    #[test]
    fn test_user_id_requires_a_name() {
        assert!(Args::from_iter_safe(["mutuals", "user-id"]).is_err());
        assert!(Args::from_iter_safe(["mutuals", "user-id", "jack", "biz"]).is_ok());
    }

    #[test]
    fn test_parse_shell() {
        assert_eq!("zsh".parse::<Shell>().unwrap(), Shell::Zsh);
        assert!("fish".parse::<Shell>().is_err());
    }
}
