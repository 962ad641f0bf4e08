//! CLI entrypoint for the legacy extension probe.
//!
//! Each subcommand runs one scenario through the C entry points and prints a
//! JSON report on stdout. Fatal runtime errors terminate the process the way
//! compiled Fortran would see them.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use legacyrt_harness::LoginSource;
use legacyrt_harness::probe::{
    probe_arguments, probe_failing_flush, probe_flush, probe_login, probe_null_index,
};

/// Exercises IARGC, GETARG, GETLOG and FLUSH in a fresh process.
#[derive(Debug, Parser)]
#[command(name = "legacyrt-probe")]
#[command(about = "Probe the legacy Fortran extension entry points")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Report IARGC and every GETARG value of this process.
    Args {
        /// CHARACTER length of the GETARG buffer.
        #[arg(long, default_value_t = 16)]
        width: usize,
        /// Extra words, present only to appear in argv.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        words: Vec<String>,
    },
    /// Fetch the login name with GETLOG.
    Login {
        /// CHARACTER length of the GETLOG buffer.
        #[arg(long, default_value_t = 16)]
        width: usize,
        #[arg(long, value_enum, default_value_t = LoginSource::Platform)]
        source: LoginSource,
    },
    /// Write a record to a unit and FLUSH it.
    Flush {
        #[arg(long, default_value_t = 10, allow_negative_numbers = true)]
        unit: i32,
        /// File to connect the unit to.
        #[arg(long, requires = "text")]
        path: Option<PathBuf>,
        /// Record written before the flush.
        #[arg(long, requires = "path")]
        text: Option<String>,
        /// Leave the record buffered.
        #[arg(long)]
        skip_flush: bool,
        /// Connect the unit to a sink that fails every write, then FLUSH.
        #[arg(long, conflicts_with_all = ["path", "skip_flush"])]
        failing_sink: bool,
    },
    /// Call GETARG with a null index reference.
    NullIndex {
        #[arg(long, default_value_t = 4)]
        width: usize,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let report = match cli.command {
        Command::Args { width, words: _ } => serde_json::to_string(&probe_arguments(width))?,
        Command::Login { width, source } => serde_json::to_string(&probe_login(source, width))?,
        Command::Flush {
            unit,
            path,
            text,
            skip_flush,
            failing_sink,
        } => {
            let report = if failing_sink {
                probe_failing_flush(unit, text.as_deref().unwrap_or("record"))?
            } else {
                let target = path.as_deref().zip(text.as_deref());
                probe_flush(unit, target, !skip_flush)?
            };
            serde_json::to_string(&report)?
        }
        Command::NullIndex { width } => {
            probe_null_index(width);
            return Err("GETARG returned with a null index".into());
        }
    };
    println!("{report}");
    Ok(())
}
