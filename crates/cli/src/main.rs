mod cmd;
mod logging;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "botshim", version, about = "Run bot scripts against stand-in host objects")]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate configuration and print resolved host settings
    Doctor,

    /// Run a Lua script's `run(...)` entry point
    Run(RunArgs),

    /// Exercise the date engine
    #[command(subcommand)]
    Time(TimeCommand),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Script file; relative paths also resolve against scripts_dir
    pub script: PathBuf,

    /// Arguments passed to `run` (JSON when parseable, else strings)
    pub args: Vec<String>,

    /// Seed a context variable before the run (NAME=VALUE, repeatable)
    #[arg(long = "var", value_name = "NAME=VALUE")]
    pub vars: Vec<String>,

    /// Print live context variables as JSON after the run
    #[arg(long)]
    pub show_context: bool,
}

#[derive(Debug, Subcommand)]
pub enum TimeCommand {
    /// Parse a date and show its renderings
    Parse(TimeParseArgs),

    /// Render a date with a host pattern
    Format(TimeFormatArgs),
}

#[derive(Debug, Args)]
pub struct TimeParseArgs {
    pub input: String,

    /// Host pattern, e.g. "dd/MM/yyyy"
    #[arg(long)]
    pub format: Option<String>,

    /// Culture for month and weekday names
    #[arg(long)]
    pub culture: Option<String>,

    /// IANA zone to express the result in
    #[arg(long)]
    pub timezone: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

#[derive(Debug, Args)]
pub struct TimeFormatArgs {
    pub input: String,

    /// Host pattern (default yyyy-MM-ddTHH:mm:ss.SSSSSSSZ)
    #[arg(long)]
    pub format: Option<String>,

    #[arg(long)]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Doctor => cmd::doctor::run(cli.config.as_deref(), cli.profile.as_deref()),
        Commands::Run(args) => {
            cmd::run::run(cli.config.as_deref(), cli.profile.as_deref(), &args)
        }
        Commands::Time(TimeCommand::Parse(args)) => {
            cmd::time::parse(cli.config.as_deref(), cli.profile.as_deref(), &args)
        }
        Commands::Time(TimeCommand::Format(args)) => {
            cmd::time::format(cli.config.as_deref(), cli.profile.as_deref(), &args)
        }
    }

    Ok(())
}
