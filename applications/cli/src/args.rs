//! Command line arguments
//!
//! Operators type long options with a single dash (`-start`, `-stream_type`),
//! so arguments are normalized before clap sees them.

use crate::error::{CliError, Result};
use chrono::NaiveDateTime;
use clap::{ArgGroup, Args, Parser, Subcommand};
use recsync_core::types::{StreamType, SyncRequest, SyncWindowSpec};
use std::ffi::OsString;
use std::path::PathBuf;

/// Accepted datetime layouts for `--start` and `--end`
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"];

#[derive(Parser, Debug)]
#[command(name = "recsync")]
#[command(about = "Fill recording gaps from peer servers", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ./recsync.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print the run summary as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Synchronize an explicit window
    Period {
        /// Window start, `YYYY-MM-DD HH:MM`
        #[arg(long)]
        start: String,

        /// Window end (exclusive), `YYYY-MM-DD HH:MM`
        #[arg(long)]
        end: String,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Synchronize the last whole days or hours
    #[command(group(ArgGroup::new("span").required(true).args(["days", "hours"])))]
    Auto {
        #[arg(long)]
        days: Option<u32>,

        #[arg(long)]
        hours: Option<u32>,

        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// `audio` or `video`
    #[arg(long = "stream_type")]
    pub stream_type: String,

    /// Restrict the run to one stream
    #[arg(long = "stream_id")]
    pub stream_id: Option<i64>,

    /// Copy files and write rows; without it the run only reports
    #[arg(long)]
    pub sync: bool,

    /// Take any remote record when no scored candidate exists
    #[arg(long = "add_mode")]
    pub add_mode: bool,

    /// Do not register a task or track progress
    #[arg(long = "no_task")]
    pub no_task: bool,
}

impl Cli {
    /// Parse normalized arguments, mapping clap failures to usage errors.
    ///
    /// Help and version requests are returned as `Err(clap::Error)` so the
    /// caller can print them and exit cleanly.
    pub fn parse_from_args<I, T>(args: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(normalize_args(args))
    }
}

impl Command {
    /// Build and validate the sync request described by the arguments
    pub fn into_request(self) -> Result<SyncRequest> {
        let (window, common) = match self {
            Command::Period { start, end, common } => {
                let window = SyncWindowSpec::Period {
                    start: parse_datetime(&start)?,
                    end: parse_datetime(&end)?,
                };
                (window, common)
            }
            Command::Auto {
                days,
                hours,
                common,
            } => {
                let window = match (days, hours) {
                    (Some(days), None) => SyncWindowSpec::Days(days),
                    (None, Some(hours)) => SyncWindowSpec::Hours(hours),
                    _ => {
                        return Err(CliError::Usage(
                            "exactly one of -days or -hours is required".to_string(),
                        ))
                    }
                };
                (window, common)
            }
        };

        let stream_type: StreamType = common.stream_type.parse().map_err(CliError::Usage)?;

        let request = SyncRequest {
            window,
            stream_type,
            stream_id: common.stream_id,
            sync: common.sync,
            add_mode: common.add_mode,
            no_task: common.no_task,
        };
        request
            .validate()
            .map_err(|e| CliError::Usage(e.to_string()))?;

        Ok(request)
    }
}

/// Parse `YYYY-MM-DD HH:MM` (seconds optional)
pub fn parse_datetime(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| {
            CliError::Usage(format!(
                "`{}` is not a datetime, expected YYYY-MM-DD HH:MM",
                value
            ))
        })
}

/// Rewrite single-dash long options (`-stream_type`) to `--stream_type`.
///
/// The program name, short flags (`-h`), negative numbers and anything
/// already double-dashed pass through unchanged.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .enumerate()
        .map(|(i, arg)| {
            let arg: OsString = arg.into();
            if i == 0 {
                return arg;
            }
            match arg.to_str() {
                Some(s) if is_single_dash_long(s) => OsString::from(format!("-{}", s)),
                _ => arg,
            }
        })
        .collect()
}

fn is_single_dash_long(arg: &str) -> bool {
    let Some(rest) = arg.strip_prefix('-') else {
        return false;
    };
    !rest.starts_with('-')
        && rest.len() > 1
        && rest.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}
