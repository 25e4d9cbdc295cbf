//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Gyeyak CLI - Korean contract risk analysis.
#[derive(Debug, Parser)]
#[command(name = "gyeyak")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Emit the stable JSON report instead of the human summary
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze a contract file (PDF / HWPX / HTML / TXT)
    Analyze(AnalyzeArgs),

    /// Diagnose a described work situation
    Situation(SituationArgs),

    /// Ask a grounded question against the legal corpus
    Chat(ChatArgs),
}

/// Arguments for the analyze command.
#[derive(Debug, Parser)]
pub struct AnalyzeArgs {
    /// Path to the contract file
    pub file: PathBuf,

    /// What the user wants looked at
    #[arg(short, long)]
    pub description: Option<String>,

    /// Force the input format instead of detecting by extension
    #[arg(long, value_parser = ["pdf", "hwpx", "html", "txt"])]
    pub format: Option<String>,
}

/// Arguments for the situation command.
#[derive(Debug, Parser)]
pub struct SituationArgs {
    /// The situation, in the user's own words
    pub text: String,

    /// Category hint (wage, working_hours, probation_termination, ...)
    #[arg(short = 'k', long)]
    pub category: Option<String>,

    /// Employment type (정규직, 프리랜서, ...)
    #[arg(long)]
    pub employment_type: Option<String>,

    /// Months at the current workplace
    #[arg(long)]
    pub tenure_months: Option<u32>,

    /// Contracted weekly hours
    #[arg(long)]
    pub weekly_hours: Option<u32>,
}

/// Arguments for the chat command.
#[derive(Debug, Parser)]
pub struct ChatArgs {
    /// The question to answer
    pub query: String,

    /// Document id from a prior analysis to ground against
    #[arg(short, long)]
    pub document: Option<String>,
}
