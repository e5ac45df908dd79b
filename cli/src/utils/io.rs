use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};
use env_logger::{fmt::Formatter as LogFormatter, Builder as LogBuilder};
use log::{Level as LogLevel, LevelFilter as LogLevelFilter, Record as LogRecord};
use once_cell::sync::Lazy;
use std::{
    io::{self, Write},
    ops::Deref,
};

pub fn init_env_logger(verbose: bool) {
    LogBuilder::new()
        .format(|formatter: &mut LogFormatter, record: &LogRecord<'_>| {
            writeln!(formatter, "{} {}", level_prefix(record.level()), record.args())
        })
        .filter_level(if verbose {
            LogLevelFilter::Debug
        } else {
            LogLevelFilter::Info
        })
        // RUST_LOG wins over --verbose
        .parse_default_env()
        .init();
}

fn level_prefix(level: LogLevel) -> &'static ColoredString {
    match level {
        LogLevel::Debug => LOG_PREFIX_DEBUG.deref(),
        LogLevel::Info => LOG_PREFIX_INFO.deref(),
        LogLevel::Warn => LOG_PREFIX_WARN.deref(),
        LogLevel::Error => LOG_PREFIX_ERROR.deref(),
        LogLevel::Trace => LOG_PREFIX_TRACE.deref(),
    }
}

pub fn read_from_stdin(message: &str, default: Option<&str>) -> Result<String> {
    let input = match default {
        Some(default) => prompt(&format!("{message} [{default}]"))?,
        None => prompt(message)?,
    };
    Ok(match (input.is_empty(), default) {
        (true, Some(default)) => default.into(),
        _ => input,
    })
}

pub fn read_token_from_stdin() -> Result<Option<String>> {
    let input = prompt("Enter API bearer token [none]")
        .context("Failed to read API token from stdin.")?;
    Ok(Some(input).filter(|token| !token.is_empty()))
}

/// Write `message` to stderr and read one trimmed line from stdin.
fn prompt(message: &str) -> Result<String> {
    let mut input = String::new();
    write!(io::stderr(), "{} {}: ", LOG_PREFIX_INPUT.deref(), message)
        .and_then(|_| io::stderr().flush())
        .and_then(|_| io::stdin().read_line(&mut input))
        .context("Failed to read from stdin.")?;
    Ok(input.trim().to_owned())
}

pub static LOG_PREFIX_DEBUG: Lazy<ColoredString> = Lazy::new(|| "D".normal());
pub static LOG_PREFIX_INFO: Lazy<ColoredString> = Lazy::new(|| "I".green());
pub static LOG_PREFIX_WARN: Lazy<ColoredString> = Lazy::new(|| "W".yellow().bold());
pub static LOG_PREFIX_ERROR: Lazy<ColoredString> = Lazy::new(|| "E".red().bold());
pub static LOG_PREFIX_TRACE: Lazy<ColoredString> = Lazy::new(|| "T".normal());
pub static LOG_PREFIX_INPUT: Lazy<ColoredString> = Lazy::new(|| "*".blue().bold());
