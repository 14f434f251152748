use std::{env, path::PathBuf};

use thiserror::Error;

const DEFAULT_CONFIG_FILE: &str = "./echos.jsonc";
const USAGE: &str = "usage: echos-gate [--config <path>]";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("missing value for --config. {USAGE}")]
    MissingConfigValue,
    #[error("unknown argument: {0}. {USAGE}")]
    UnknownArgument(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub config_path: PathBuf,
}

pub fn args_from_env() -> Result<CliArgs, CliError> {
    parse_args(env::args().skip(1))
}

pub fn parse_args<I>(args: I) -> Result<CliArgs, CliError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut config_path = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let value = args.next().ok_or(CliError::MissingConfigValue)?;
                config_path = Some(PathBuf::from(value));
            }
            other => return Err(CliError::UnknownArgument(other.to_string())),
        }
    }

    Ok(CliArgs {
        config_path: config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE)),
    })
}
