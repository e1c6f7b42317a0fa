//! Command-line arguments for the `catsearch` binary.

use clap::Parser;
use clap::error::ErrorKind;

pub const USAGE: &str = "Usage: catsearch portNumber";

/// Cat Search - browse cat pictures by breed or category
#[derive(Debug, Parser)]
#[command(name = "catsearch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Port the web server listens on
    pub port: u16,
}

/// Result of reading the process arguments.
#[derive(Debug)]
pub enum ParsedArgs {
    Run(Cli),
    /// `--help` or `--version`: print and exit successfully.
    Info(String),
    Usage,
}

pub fn parse_args<I, T>(args: I) -> ParsedArgs
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => ParsedArgs::Run(cli),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            ParsedArgs::Info(e.to_string())
        }
        Err(_) => ParsedArgs::Usage,
    }
}
