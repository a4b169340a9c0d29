//! Utilities
//!
//! Option handling follows a fixed order: an option set on the command line wins, then a
//! value from the environment (which `dotenv().ok()` fills from a `.env` file), then the
//! built-in default.
use log::*;
use std::{env, fs, collections::HashMap, fmt::Display, io::Write, str::FromStr, time::Duration};
use anyhow::{Result, Context};
use regex::Regex;

use crate::DEFAULT_CONFIG_FILE;
use crate::DEFAULT_PARALLEL;
use crate::DEFAULT_TIMEOUT_MS;

fn resolve_option(
    option: &Option<String>,
    changed_options: &mut HashMap<&str, String>,
    variable: &'static str,
    default: &str,
) -> String
{
    match option {
        Some(value) => {
            info!("{} argument set: using: {}", variable, value);
            // insert into changed_options to be written later on.
            changed_options.insert(variable, value.to_string());
            value.to_string()
        }
        None => {
            match env::var(variable) {
                Ok(set_var) => {
                    info!("{} not set: set via .env: {}", variable, set_var);
                    changed_options.insert(variable, set_var.to_owned());
                    set_var
                }
                Err(_e) => {
                    info!("{} not set: and not set via .env: using default: {}", variable, default);
                    default.to_string()
                }
            }
        }
    }
}

pub fn set_config_file(
    option: &Option<String>,
    changed_options: &mut HashMap<&str, String>,
) -> String
{
    resolve_option(option, changed_options, "SENTINEL_AUDIT_CONFIG", DEFAULT_CONFIG_FILE)
}

/// Parse an option, an invalid value is logged and replaced by the default.
fn parse_option<T>(
    option: &Option<String>,
    changed_options: &mut HashMap<&str, String>,
    variable: &'static str,
    default: &str,
) -> T
where
    T: FromStr + Default,
    T::Err: Display,
{
    let value = resolve_option(option, changed_options, variable, default);
    match value.parse() {
        Ok(parsed) => parsed,
        Err(e) => {
            error!("{} invalid: '{}': {}, using default: {}", variable, value, e, default);
            changed_options.remove(variable);
            default.parse().unwrap_or_default()
        }
    }
}

pub fn set_parallel(
    option: &Option<String>,
    changed_options: &mut HashMap<&str, String>,
) -> usize
{
    let parallel: usize = parse_option(option, changed_options, "SENTINEL_AUDIT_PARALLEL", DEFAULT_PARALLEL);
    // at least one thread.
    parallel.max(1)
}

pub fn set_timeout(
    option: &Option<String>,
    changed_options: &mut HashMap<&str, String>,
) -> Duration
{
    let timeout_ms: u64 = parse_option(option, changed_options, "SENTINEL_AUDIT_TIMEOUT_MS", DEFAULT_TIMEOUT_MS);
    Duration::from_millis(timeout_ms)
}

/// The pod filter. `None` selects all pods, as does an invalid regex.
pub fn set_regex(
    regex: &Option<String>,
) -> Option<Regex>
{
    let regex = regex.as_ref()?;
    Regex::new(regex.as_str())
        .map_err(|e| error!("Invalid regex: '{}': {}, selecting all pods", regex, e))
        .ok()
}

pub fn dotenv_writer(
    write_dotenv: bool,
    changed_options: HashMap<&str, String>,
) -> Result<()>
{
    if !changed_options.is_empty() && write_dotenv {
        info!("Writing .env file");
        let mut file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(".env")
            .with_context(|| "Error writing .env file: .env")?;

        for (key, value) in changed_options {
            file.write_all(format!("{}={}\n", key, value).as_bytes())?;
            info!("{}={}", key, value);
        }
    }
    Ok(())
}
