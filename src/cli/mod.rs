//! CLI mode for drive-mirror.

mod progress;

use std::path::PathBuf;
use std::sync::Arc;

use url::Url;

use crate::extract::PageExtractor;
use crate::{AppConfig, ChromeSession, Error, Mirror, MirrorProgress};

pub use progress::{CliProgress, print_summary};

/// Validated command-line options for a mirror run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    /// Root folder URL.
    pub url: String,
    /// Overrides `browser.headless` from the config file.
    pub headless: Option<bool>,
    /// Overrides `download.dir` from the config file.
    pub output: Option<PathBuf>,
    /// Explicit config file.
    pub config: Option<PathBuf>,
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(CliArgs),
    Help,
}

fn invalid(msg: impl Into<String>) -> Error {
    Error::InvalidArgument(msg.into())
}

fn parse_bool(flag: &str, value: &str) -> crate::Result<bool> {
    match value {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(invalid(format!("{flag} expects true or false, got {value:?}"))),
    }
}

/// Checks that `url` is an absolute http(s) URL with a host.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] describing what is wrong.
pub fn validate_url(url: &str) -> crate::Result<()> {
    let parsed = Url::parse(url).map_err(|e| invalid(format!("--url {url:?} is not a valid URI: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("--url must use http or https, got {}", parsed.scheme())));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(invalid(format!("--url {url:?} has no host")));
    }
    Ok(())
}

/// Parses command-line arguments (without the program name).
///
/// Options take their value either as the next argument or after `=`.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] for unknown options, missing values,
/// a missing `--url` or one that is not a valid http(s) URL.
pub fn parse_args<I>(args: I) -> crate::Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut url = None;
    let mut headless = None;
    let mut output = None;
    let mut config = None;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with('-') => (flag.to_string(), Some(value.to_string())),
            _ => (arg.clone(), None),
        };
        let mut value = |name: &str| {
            inline
                .clone()
                .or_else(|| args.next())
                .ok_or_else(|| invalid(format!("{name} requires a value")))
        };

        match flag.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "-u" | "--url" => url = Some(value("--url")?),
            "-o" | "--output" => output = Some(PathBuf::from(value("--output")?)),
            "-c" | "--config" => config = Some(PathBuf::from(value("--config")?)),
            "--headless" => {
                headless = Some(match inline.as_deref() {
                    Some(v) => parse_bool("--headless", v)?,
                    None => true,
                });
            }
            other if other.starts_with('-') => {
                return Err(invalid(format!("unknown option: {other}")));
            }
            other => return Err(invalid(format!("unexpected argument: {other}"))),
        }
    }

    let url = url.ok_or_else(|| invalid("--url is required"))?;
    validate_url(&url)?;

    Ok(Command::Run(CliArgs {
        url,
        headless,
        output,
        config,
    }))
}

pub fn print_usage() {
    eprintln!("Usage: drive-mirror --url <URL> [OPTIONS]");
    eprintln!();
    eprintln!("Mirrors a cloud-drive folder tree onto the local disk through a browser.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -u, --url <URL>         Root folder to mirror (required, http or https)");
    eprintln!("      --headless[=BOOL]   Run the browser without a window");
    eprintln!("  -o, --output <DIR>      Local root to mirror into (default: ./download)");
    eprintln!("  -c, --config <FILE>     Config file (default: <config dir>/drive-mirror/config.toml)");
    eprintln!("  -h, --help              Show this help");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  RUST_LOG                Log filter, e.g. drive_mirror=debug");
}

/// Runs one mirror of `args.url`.
///
/// The browser is closed after the walk whether it succeeded or not (see
/// [`Mirror::run`]).
///
/// # Errors
///
/// Returns the first error of the walk, or a launch/config/close failure.
pub async fn run(args: CliArgs) -> crate::Result<()> {
    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(headless) = args.headless {
        config.browser.headless = headless;
    }
    if let Some(output) = args.output {
        config.download.dir = output;
    }

    // Bad settings should fail before a browser exists.
    config.browser.validate()?;
    PageExtractor::new(&config.selectors)?;

    println!(
        "Mirroring {} into {}",
        args.url,
        config.download.dir.display()
    );

    let session = ChromeSession::launch(&config.browser).await?;
    let progress = Arc::new(CliProgress::new());
    let mirror = Mirror::new(session, config, Arc::clone(&progress) as Arc<dyn MirrorProgress>)?;

    let result = mirror.run(&args.url).await;
    progress.finish();
    let stats = result?;

    print_summary(&stats);
    println!("Done.");
    Ok(())
}
