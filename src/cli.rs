use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "spl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Interpreter for SPL programs", long_about = None)]
pub struct Args {
    /// Program to run; read from stdin when omitted
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Type check before running
    #[arg(long)]
    pub check: bool,

    /// Type check and exit without running
    #[arg(long = "check-only", conflicts_with = "dump")]
    pub check_only: bool,

    /// Forbid rebinding builtin names
    #[arg(long)]
    pub sandbox: bool,

    /// Additional names that may not be assigned
    #[arg(long = "deny", value_name = "NAME")]
    pub deny: Vec<String>,

    /// Run spawned tasks on a pool of N workers
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    #[arg(long = "max-depth", value_name = "N")]
    pub max_depth: Option<usize>,

    /// Print the token stream or AST as JSON and exit
    #[arg(long, value_name = "WHAT")]
    pub dump: Option<DumpTarget>,

    /// JSON file with default settings
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[arg(long = "color", value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,

    /// Repeat for more detail (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a shell completion script
    Complete {
        #[arg(value_name = "SHELL")]
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DumpTarget {
    Tokens,
    Ast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl std::str::FromStr for ColorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            _ => Err(format!(
                "Invalid color choice: {}. Must be 'auto', 'always', or 'never'",
                s
            )),
        }
    }
}

pub fn generate_completions(shell: Shell) {
    let mut cmd = Args::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, &bin_name, &mut io::stdout());
}
