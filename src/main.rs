//! Review-harvest CLI entrypoint.
//!
//! ```text
//! review-harvest <owner> <name> [-o FILE] [-x N] [--extension EXT] ...
//! ```

use std::env;
use std::ffi::OsString;
use std::io::{self, Write};
use std::process::ExitCode;

use ortho_config::OrthoConfig;
use review_harvest::{
    HarvestConfig, HarvestError, QueryExecutor, RepositoryLocator, ReqwestTransport, download,
    init_logging,
};

/// Flags whose value is the following argument unless written as `--flag=value`.
const FLAGS_WITH_VALUES: &[&str] = &[
    "--token",
    "-t",
    "--output",
    "-o",
    "--max",
    "-x",
    "--extension",
    "--state",
    "--api-url",
    "--retries",
    "--config-path",
];

fn main() -> ExitCode {
    match run(env::args_os().collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if writeln!(io::stderr().lock(), "ERROR: {error}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<OsString>) -> Result<(), HarvestError> {
    let (positionals, flags) = extract_positional_arguments(args);
    let config = load_config(flags)?;
    init_logging(config.verbose);

    let token = config.resolve_token()?;
    let locator = repository_from_positionals(&positionals)?;
    let options = config.harvest_options()?;
    let output = config.output_path(&locator);

    let transport = ReqwestTransport::new(token, &config.client_config())?;
    let executor =
        QueryExecutor::new(transport).with_schema_discovery(!config.skip_schema_discovery);
    download(&executor, &locator, &output, &options)?;
    Ok(())
}

/// Loads configuration from the filtered CLI arguments, environment, and
/// files.
///
/// # Errors
///
/// Returns [`HarvestError::Configuration`] when ortho-config fails to parse
/// arguments or load configuration files.
fn load_config(args: Vec<OsString>) -> Result<HarvestConfig, HarvestError> {
    HarvestConfig::load_from_iter(args).map_err(|error| HarvestError::Configuration {
        message: error.to_string(),
    })
}

/// Builds the repository locator from exactly two positional arguments.
fn repository_from_positionals(positionals: &[String]) -> Result<RepositoryLocator, HarvestError> {
    match positionals {
        [owner, name] => RepositoryLocator::new(owner, name),
        [] | [_] => Err(HarvestError::MissingRepository),
        [_, _, extra, ..] => Err(HarvestError::InvalidArgument {
            argument: extra.clone(),
        }),
    }
}

/// Splits positional arguments from flags so the flags can be handed to
/// ortho-config.
///
/// The program name stays at the front of the returned flags. Values of
/// known value-taking flags are kept with their flag; everything after `--`
/// is positional.
fn extract_positional_arguments(args: Vec<OsString>) -> (Vec<String>, Vec<OsString>) {
    let mut iter = args.into_iter();
    let mut flags: Vec<OsString> = iter.next().into_iter().collect();
    let mut positionals = Vec::new();

    while let Some(arg) = iter.next() {
        let text = arg.to_string_lossy();
        if text == "--" {
            positionals.extend(iter.by_ref().map(|rest| rest.to_string_lossy().into_owned()));
            break;
        }
        if text.starts_with('-') && text.len() > 1 {
            let takes_value = FLAGS_WITH_VALUES.contains(&&*text);
            flags.push(arg);
            if takes_value && let Some(value) = iter.next() {
                flags.push(value);
            }
            continue;
        }
        positionals.push(text.into_owned());
    }

    (positionals, flags)
}
