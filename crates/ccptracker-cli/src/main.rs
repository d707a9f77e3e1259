mod cmd_config;
mod cmd_export;
mod cmd_status;
mod cmd_turn;

use ccptracker_store::config::resolve_csv_path;
use ccptracker_store::{ExportFormat, TurnLog};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

const ADD_USAGE: &str = "add <id> <timestamp> <path> <prompt>";
const UPDATE_RESPONSE_USAGE: &str =
    "update-response <id> <response> <duration> <tools_used> <tools_count>";
const UPDATE_SATISFACTION_USAGE: &str = "update-satisfaction <id> <score> <comment>";

#[derive(Parser)]
#[command(
    name = "ccptracker",
    version,
    about = "Record Claude Code prompts, responses and ratings in a CSV log"
)]
struct Cli {
    /// CSV file to use instead of the configured location (before the command)
    #[arg(long, env = "CCPTRACKER_CSV")]
    csv: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

// The hook-facing commands take their arguments verbatim: prompts and
// responses may look like flags (`--help`, `-h`, `--`), so none are parsed.
// Arguments past the expected count are ignored.
#[derive(Subcommand)]
enum Command {
    /// Append a new turn for a submitted prompt
    #[command(disable_help_flag = true)]
    Add {
        #[arg(
            value_name = "ID TIMESTAMP PATH PROMPT",
            trailing_var_arg = true,
            allow_hyphen_values = true
        )]
        args: Vec<String>,
    },
    /// Record the assistant response on the latest turn
    #[command(disable_help_flag = true)]
    UpdateResponse {
        #[arg(
            value_name = "ID RESPONSE DURATION TOOLS_USED TOOLS_COUNT",
            trailing_var_arg = true,
            allow_hyphen_values = true
        )]
        args: Vec<String>,
    },
    /// Record a satisfaction rating (integer score) on the latest turn
    #[command(disable_help_flag = true)]
    UpdateSatisfaction {
        #[arg(
            value_name = "ID SCORE COMMENT",
            trailing_var_arg = true,
            allow_hyphen_values = true
        )]
        args: Vec<String>,
    },
    /// Print the latest turn as JSON ({} when empty)
    GetLatest,
    /// Show conversation count, average rating and last activity
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export all turns
    Export {
        /// json or csv
        #[arg(long, default_value = "csv")]
        format: ExportFormat,
        /// Output file (default: ./ccptracker-export-<timestamp>.<format>)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Read or change ~/.ccptracker/config.json
    Config {
        #[command(subcommand)]
        cmd: cmd_config::ConfigCmd,
    },
}

/// Take the first `N` raw arguments, dropping any extras.
fn positionals<const N: usize>(
    mut values: Vec<String>,
    usage: &str,
) -> Result<[String; N], clap::Error> {
    values.truncate(N);
    values.try_into().map_err(|_: Vec<String>| {
        Cli::command().error(
            ErrorKind::MissingRequiredArgument,
            format!("missing arguments, expected: ccptracker {usage}"),
        )
    })
}

fn parse_score(raw: &str) -> Result<i64, clap::Error> {
    raw.trim().parse().map_err(|_| {
        Cli::command().error(
            ErrorKind::ValueValidation,
            format!("invalid score '{raw}': expected an integer"),
        )
    })
}

/// Usage errors go to stdout with exit status 1 so hook scripts see them in
/// the same stream as normal output.
fn usage_exit(err: clap::Error) -> ! {
    print!("{}", err.render());
    std::process::exit(1);
}

fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => usage_exit(err),
    }
}

fn main() -> anyhow::Result<()> {
    ccptracker::init_tracing();
    let cli = parse_cli();
    let cwd = std::env::current_dir()?;
    let config_path = ccptracker_store::config_path();

    let log = TurnLog::new(resolve_csv_path(cli.csv.as_deref(), &config_path, &cwd));
    tracing::debug!(path = %log.path().display(), "using turn log");

    match cli.cmd {
        Command::Add { args } => {
            let [id, timestamp, path, prompt] =
                positionals(args, ADD_USAGE).unwrap_or_else(|e| usage_exit(e));
            cmd_turn::add(&log, &id, &timestamp, &path, &prompt)
        }
        Command::UpdateResponse { args } => {
            let [id, response, duration, tools_used, tools_count] =
                positionals(args, UPDATE_RESPONSE_USAGE).unwrap_or_else(|e| usage_exit(e));
            cmd_turn::update_response(
                &log,
                &id,
                &response,
                &cmd_turn::ResponseMeta {
                    duration: &duration,
                    tools_used: &tools_used,
                    tools_count: &tools_count,
                },
            )
        }
        Command::UpdateSatisfaction { args } => {
            let [id, score, comment] =
                positionals(args, UPDATE_SATISFACTION_USAGE).unwrap_or_else(|e| usage_exit(e));
            let score = parse_score(&score).unwrap_or_else(|e| usage_exit(e));
            cmd_turn::update_satisfaction(&log, &id, score, &comment)
        }
        Command::GetLatest => cmd_turn::get_latest(&log),
        Command::Status { json } => cmd_status::execute(&log, json),
        Command::Export { format, output } => {
            cmd_export::execute(&log, format, output.as_deref(), &cwd)
        }
        Command::Config { cmd } => cmd_config::run(cmd, &config_path, &cwd),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("ccptracker").chain(args.iter().copied()))
    }

    fn raw_args(args: &[&str]) -> Vec<String> {
        match parse(args).unwrap().cmd {
            Command::Add { args }
            | Command::UpdateResponse { args }
            | Command::UpdateSatisfaction { args } => args,
            _ => panic!("expected a turn command"),
        }
    }

    fn add_prompt(prompt: &str) -> String {
        let args = raw_args(&["add", "s1", "2024-01-15 10:30:00", "/work", prompt]);
        let [_, _, _, prompt] = positionals(args, ADD_USAGE).unwrap();
        prompt
    }

    #[test]
    fn add_takes_four_positionals() {
        let args = raw_args(&["add", "s1", "2024-01-15 10:30:00", "/work", "-v is a prompt"]);
        let [id, timestamp, path, prompt] = positionals(args, ADD_USAGE).unwrap();
        assert_eq!(id, "s1");
        assert_eq!(timestamp, "2024-01-15 10:30:00");
        assert_eq!(path, "/work");
        assert_eq!(prompt, "-v is a prompt");
    }

    #[test]
    fn flag_like_prompts_are_kept_verbatim() {
        for prompt in ["--help", "-h", "--", "--csv=x", "--csv", "--version", "-V"] {
            assert_eq!(add_prompt(prompt), prompt);
        }
    }

    #[test]
    fn flag_like_response_and_comment_are_kept_verbatim() {
        let args = raw_args(&["update-response", "s1", "-h", "--", "--help", "3"]);
        let [id, response, duration, tools_used, tools_count] =
            positionals(args, UPDATE_RESPONSE_USAGE).unwrap();
        assert_eq!(id, "s1");
        assert_eq!(response, "-h");
        assert_eq!(duration, "--");
        assert_eq!(tools_used, "--help");
        assert_eq!(tools_count, "3");

        let args = raw_args(&["update-satisfaction", "s1", "5", "--help"]);
        let [_, score, comment] = positionals(args, UPDATE_SATISFACTION_USAGE).unwrap();
        assert_eq!(parse_score(&score).unwrap(), 5);
        assert_eq!(comment, "--help");
    }

    #[test]
    fn extra_arguments_are_ignored() {
        let args = raw_args(&[
            "add",
            "s1",
            "2024-01-15 10:30:00",
            "/work",
            "prompt",
            "extra",
            "--x",
        ]);
        let [.., prompt] = positionals::<4>(args, ADD_USAGE).unwrap();
        assert_eq!(prompt, "prompt");

        let args = raw_args(&["update-satisfaction", "s1", "4", "good", "more"]);
        let [_, _, comment] = positionals(args, UPDATE_SATISFACTION_USAGE).unwrap();
        assert_eq!(comment, "good");
    }

    #[test]
    fn missing_arguments_are_usage_errors() {
        let args = raw_args(&["add", "s1", "2024-01-15 10:30:00"]);
        let err = positionals::<4>(args, ADD_USAGE).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert!(err
            .render()
            .to_string()
            .contains("expected: ccptracker add <id> <timestamp> <path> <prompt>"));

        let args = raw_args(&["update-response", "s1", "text"]);
        let err = positionals::<5>(args, UPDATE_RESPONSE_USAGE).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let args = raw_args(&["update-satisfaction"]);
        assert!(args.is_empty());
        assert!(positionals::<3>(args, UPDATE_SATISFACTION_USAGE).is_err());
    }

    #[test]
    fn unknown_command_is_rejected() {
        let err = parse(&["frobnicate"]).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        assert!(parse(&[]).is_err());
    }

    #[test]
    fn satisfaction_score_must_be_integer() {
        assert_eq!(parse_score("4").unwrap(), 4);
        assert_eq!(parse_score("-2").unwrap(), -2);
        let err = parse_score("four").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        assert!(parse_score("4.5").is_err());
    }

    #[test]
    fn get_latest_takes_no_arguments() {
        assert!(matches!(parse(&["get-latest"]).unwrap().cmd, Command::GetLatest));
    }

    #[test]
    fn csv_override_and_export_format() {
        let cli = parse(&["--csv", "/tmp/t.csv", "export", "--format", "json"]).unwrap();
        assert_eq!(cli.csv, Some(PathBuf::from("/tmp/t.csv")));
        assert!(matches!(
            cli.cmd,
            Command::Export {
                format: ExportFormat::Json,
                output: None
            }
        ));
    }

    #[test]
    fn csv_override_applies_to_turn_commands() {
        let cli = parse(&["--csv", "/tmp/t.csv", "add", "s1", "t", "/p", "--csv"]).unwrap();
        assert_eq!(cli.csv, Some(PathBuf::from("/tmp/t.csv")));
        let Command::Add { args } = cli.cmd else {
            panic!("expected add");
        };
        assert_eq!(args.last().map(String::as_str), Some("--csv"));
    }

    #[test]
    fn config_set_location_validates() {
        assert!(parse(&["config", "set-location", "project"]).is_ok());
        assert!(parse(&["config", "set-location", "cloud"]).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
