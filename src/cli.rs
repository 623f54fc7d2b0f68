//! Command-line flags shared by both binaries.
//!
//! Hand-rolled on purpose: three flags do not need an argument parser.

use crate::error::AppError;
use crate::logger;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CliArgs {
    /// Level forced by `-v` flags; wins over env and config.
    pub log_level: Option<&'static str>,
    pub config_path: Option<String>,
    pub help: bool,
}

/// Parse arguments (without the program name).
pub fn parse<I>(args: I) -> Result<CliArgs, AppError>
where
    I: IntoIterator<Item = String>,
{
    let mut verbosity = 0u8;
    let mut out = CliArgs::default();

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        if arg == "--" {
            break;
        }

        match arg.as_str() {
            "-h" | "--help" => out.help = true,
            "-f" | "--config" => {
                let path = iter
                    .next()
                    .ok_or_else(|| AppError::Config("-f/--config requires a path argument".into()))?;
                out.config_path = Some(path);
            }
            "--verbose" => verbosity = verbosity.saturating_add(1),
            a if a.starts_with('-') && a.len() > 1 && a.chars().skip(1).all(|c| c == 'v') => {
                verbosity = verbosity.saturating_add((a.len() - 1) as u8);
            }
            _ => {}
        }
    }

    out.log_level = logger::level_for_verbosity(verbosity);
    Ok(out)
}

/// Usage text for `bin`.
pub fn usage(bin: &str) -> String {
    format!(
        "Usage: {bin} [OPTIONS]\n\
         \n\
         Options:\n\
         \x20 -h, --help                 Print help\n\
         \x20 -f, --config <PATH>        Path to configuration file (default: config/default.toml)\n\
         \x20 -v, -vv, -vvv, -vvvv       Increase logging verbosity\n"
    )
}
