//! RIPP CLI - the `ripp` command
//!
//! A thin layer over the pipeline crates:
//!
//! ```text
//! ripp evidence build              # .ripp/evidence/
//! ripp discover --enable-ai        # .ripp/intent.candidates.yaml
//! ripp confirm [--checklist [--apply]]
//! ripp build --id user-login --title "User login"
//! ripp validate <path> [--level N]
//! ripp lint <path> [--strict]
//! ```
//!
//! Every command returns a pass/fail verdict; the binary maps it to exit
//! status 0 or 1.

#![warn(unreachable_pub)]

pub mod commands;
pub mod error;
pub mod logging;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use ripp_core::{Level, RippConfig, Workspace};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

pub use error::{diagnosed, Failure};

fn parse_level(value: &str) -> Result<Level, String> {
    value.parse().map_err(|e| format!("{e}"))
}

fn level_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .value_name("N")
        .value_parser(parse_level)
        .help(help)
}

/// Command-line definition
#[must_use]
pub fn command() -> Command {
    Command::new("ripp")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Discover, confirm and compile intent packets")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("root")
                .long("root")
                .global(true)
                .default_value(".")
                .value_parser(value_parser!(PathBuf))
                .help("Repository root holding the .ripp directory"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON on stderr"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging when RIPP_LOG is unset"),
        )
        .subcommand(
            Command::new("evidence")
                .about("Evidence pack operations")
                .subcommand_required(true)
                .subcommand(Command::new("build").about("Scan the repository into an evidence pack")),
        )
        .subcommand(
            Command::new("discover")
                .about("Infer candidate intent from the evidence pack")
                .arg(
                    Arg::new("enable-ai")
                        .long("enable-ai")
                        .action(ArgAction::SetTrue)
                        .help("Runtime half of the AI opt-in (or set RIPP_AI_ENABLED=true)"),
                )
                .arg(level_arg("level", "Target level, overriding discovery.target_level")),
        )
        .subcommand(
            Command::new("confirm")
                .about("Accept or reject candidates")
                .arg(
                    Arg::new("checklist")
                        .long("checklist")
                        .action(ArgAction::SetTrue)
                        .help("Write the checklist instead of prompting"),
                )
                .arg(
                    Arg::new("apply")
                        .long("apply")
                        .action(ArgAction::SetTrue)
                        .requires("checklist")
                        .help("Record the decisions ticked in the checklist"),
                )
                .arg(
                    Arg::new("decider")
                        .long("decider")
                        .value_name("NAME")
                        .help("Identity stamped on decisions (defaults to $USER)"),
                ),
        )
        .subcommand(
            Command::new("build")
                .about("Compile confirmed intent into a packet")
                .arg(Arg::new("id").long("id").required(true).help("Kebab-case packet id"))
                .arg(Arg::new("title").long("title").required(true).help("Feature title"))
                .arg(level_arg("min-level", "Fail when the derived level is lower")),
        )
        .subcommand(
            Command::new("validate")
                .about("Validate a packet document")
                .arg(
                    Arg::new("path")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(level_arg("level", "Validate against this level instead of the declared one"))
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("lint")
                .about("Check a packet document against best practices")
                .arg(
                    Arg::new("path")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("strict")
                        .long("strict")
                        .action(ArgAction::SetTrue)
                        .help("Treat warnings as failures"),
                )
                .arg(json_arg()),
        )
}

fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Print the report as JSON")
}

/// Terminal handles a command may use
pub struct Io<'a> {
    /// Answers for interactive prompts
    pub input: &'a mut dyn BufRead,
    /// Findings and results
    pub output: &'a mut dyn Write,
}

/// Run parsed arguments; returns the verdict
///
/// # Errors
/// Returns error when a stage fails; stage errors are wrapped in [`Failure`]
pub async fn run(
    matches: &ArgMatches,
    io: Io<'_>,
    cancel: &CancellationToken,
) -> anyhow::Result<bool> {
    let root = matches
        .get_one::<PathBuf>("root")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."));
    let workspace = Workspace::new(root);

    match matches.subcommand() {
        Some(("evidence", sub)) => match sub.subcommand() {
            Some(("build", _)) => {
                let config = load_config(&workspace)?;
                commands::evidence_build(&workspace, &config, io.output, cancel).await
            }
            _ => anyhow::bail!("unknown evidence subcommand"),
        },
        Some(("discover", args)) => {
            let config = load_config(&workspace)?;
            let options = commands::DiscoverArgs {
                enable_ai: args.get_flag("enable-ai"),
                level: args.get_one::<Level>("level").copied(),
            };
            commands::discover(&workspace, &config, &options, io.output, cancel).await
        }
        Some(("confirm", args)) => {
            let options = commands::ConfirmArgs {
                checklist: args.get_flag("checklist"),
                apply: args.get_flag("apply"),
                decider: args.get_one::<String>("decider").cloned(),
            };
            commands::confirm(&workspace, &options, io)
        }
        Some(("build", args)) => {
            let options = commands::BuildArgs {
                id: args.get_one::<String>("id").cloned().unwrap_or_default(),
                title: args.get_one::<String>("title").cloned().unwrap_or_default(),
                min_level: args.get_one::<Level>("min-level").copied(),
            };
            commands::build(&workspace, &options, io.output)
        }
        Some(("validate", args)) => {
            let path = required_path(args)?;
            let level = args.get_one::<Level>("level").copied();
            commands::validate(&path, level, args.get_flag("json"), io.output)
        }
        Some(("lint", args)) => {
            let path = required_path(args)?;
            commands::lint(&path, args.get_flag("strict"), args.get_flag("json"), io.output)
        }
        _ => anyhow::bail!("no command given; see `ripp --help`"),
    }
}

fn required_path(args: &ArgMatches) -> anyhow::Result<PathBuf> {
    args.get_one::<PathBuf>("path")
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("a document path is required"))
}

fn load_config(workspace: &Workspace) -> anyhow::Result<RippConfig> {
    RippConfig::load(&workspace.config_path()).map_err(diagnosed)
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
