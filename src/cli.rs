use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hostprep")]
#[command(version)]
#[command(about = "Install and start the Apache web server on an EC2 instance", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Actually perform the installation (default is a dry run)
    #[arg(long, global = true)]
    pub apply: bool,

    /// Config file (defaults to ~/.config/hostprep/config.toml when present)
    #[arg(short, long, global = true, env = "HOSTPREP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write the run report as JSON to this path
    #[arg(long, global = true, env = "HOSTPREP_REPORT")]
    pub report: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the installation steps (the default)
    Run,

    /// List the installation steps without running anything
    Steps,

    /// Print the effective configuration as TOML
    Config,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
