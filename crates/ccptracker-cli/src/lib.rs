//! Shared setup for the `ccptracker` binaries.

use std::ffi::OsString;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Env var holding the log filter, e.g. `CCPTRACKER_LOG=debug`.
pub const LOG_ENV: &str = "CCPTRACKER_LOG";

/// Install a stderr `fmt` subscriber. Stdout is reserved for data that hooks
/// consume, so nothing is ever logged there.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    // A second init (e.g. in tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Output line of `ccptracker-parse-transcript` for the given argv.
///
/// The first argument after the program name is the transcript path; any
/// further arguments are ignored.
pub fn transcript_summary_line<I>(args: I) -> String
where
    I: IntoIterator<Item = OsString>,
{
    let transcript_path = args.into_iter().nth(1).map(PathBuf::from);
    ccptracker_transcript::extract_summary(transcript_path.as_deref()).to_json_line()
}
