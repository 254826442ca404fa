//! Command surface (§6.3): one subcommand per character lifecycle or
//! diagnostic operation, plus the global flags every subcommand shares.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "artifactsmmo-agent", version, about = "Autonomous GOAP agent for a cooldown-based MMO REST API")]
pub struct Cli {
    /// DEBUG, INFO, WARNING, or ERROR.
    #[arg(long, global = true, default_value = "INFO")]
    pub log_level: String,

    /// File holding the API token, one line.
    #[arg(long, global = true, default_value = "TOKEN")]
    pub token_file: PathBuf,

    /// Overrides the `DATA_PREFIX` env var for knowledge/map persistence.
    #[arg(long, global = true)]
    pub data_prefix: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Runs the AIPlayerLoop for `name` until stopped (SIGINT) or a fatal error.
    RunCharacter { name: String },

    /// Requests that a running `run-character name` loop stop after its
    /// current step, via the stop-file convention `<data-prefix>/<name>.stop`
    /// (one process runs one character, so there is no in-process handle to
    /// reach from a second CLI invocation).
    StopCharacter { name: String },

    /// Prints the last-persisted character snapshot and goal/plan diagnostics.
    StatusCharacter { name: String },

    /// Lists the account's characters.
    ListCharacters,

    /// Creates a character (thin wrapper over the account API).
    CreateCharacter {
        name: String,
        #[arg(long, default_value = "men1")]
        skin: String,
    },

    /// Deletes a character (thin wrapper over the account API).
    DeleteCharacter { name: String },

    /// Dumps the StateMap built from a live character snapshot and knowledge base.
    DiagnoseState { name: String },

    /// Lists all registered actions with their preconditions/effects/weight.
    DiagnoseActions,

    /// Runs the planner against the live state for `name` without executing the plan.
    DiagnosePlan {
        name: String,
        #[arg(long, default_value = "level_up")]
        goal: String,
    },

    /// Runs the planner against a built-in fixture state and goal, offline.
    TestPlanning,
}
