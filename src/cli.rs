//! CLI interface for the matching engine

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "career-match")]
#[command(about = "Skill-gap analysis and job matching over vector similarity")]
#[command(
    long_about = "Rank job opportunities against a profile and report skill gaps using taxonomy resolution, embeddings, and weighted compatibility scoring"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rank jobs for a profile
    Rank {
        /// Path to a JSON file of raw profiles
        #[arg(long)]
        profiles: PathBuf,

        /// Path to a JSON file of roles
        #[arg(long)]
        roles: PathBuf,

        /// Profile identifier to rank for
        #[arg(short, long)]
        profile: String,

        /// Number of jobs to return
        #[arg(short, long, default_value_t = 10)]
        k: usize,

        /// Emit JSON instead of console output
        #[arg(long)]
        json: bool,
    },

    /// Compute a skill-gap report for one profile against one role
    Gap {
        /// Path to a JSON file of raw profiles
        #[arg(long)]
        profiles: PathBuf,

        /// Path to a JSON file of roles
        #[arg(long)]
        roles: PathBuf,

        /// Profile identifier
        #[arg(short, long)]
        profile: String,

        /// Role identifier
        #[arg(short, long)]
        role: String,

        /// Emit JSON instead of console output
        #[arg(long)]
        json: bool,
    },

    /// Resolve free-text skill mentions against the taxonomy
    Resolve {
        /// Mentions to resolve
        #[arg(required = true)]
        mentions: Vec<String>,
    },

    /// Show or reset configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,
}

/// Validate that a fixture path points at a JSON file.
pub fn validate_fixture_path(path: &PathBuf) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(()),
        Some(ext) => Err(format!("unsupported fixture extension: .{}", ext)),
        None => Err("fixture file has no extension".to_string()),
    }
}
