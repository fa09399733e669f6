use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "setapp-get",
    about = "Install Setapp applications from the command line",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Ignore a still-valid cached catalog and fetch a fresh one
    #[arg(long, global = true)]
    pub refresh: bool,

    /// Write to the destination as the current user instead of through sudo
    #[arg(long, global = true)]
    pub no_sudo: bool,

    /// Directory applications are installed into
    #[arg(long, global = true, value_name = "DIR")]
    pub destination: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Install applications by id, or by name with --name
    Install(InstallArgs),

    /// List every application in the catalog
    List,

    #[command(external_subcommand)]
    Other(Vec<String>),
}

#[derive(Args, Debug, Clone, Default)]
pub struct InstallArgs {
    /// Treat every token as an application name
    #[arg(long)]
    pub name: bool,

    /// Install all targets concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Upper bound on concurrent installs
    #[arg(long, short, requires = "parallel", value_name = "N")]
    pub jobs: Option<usize>,

    /// Application ids (or names with --name)
    #[arg(value_name = "ID|NAME", allow_negative_numbers = true)]
    pub tokens: Vec<String>,
}
