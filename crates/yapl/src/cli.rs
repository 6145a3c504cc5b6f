//! CLI command structure using clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "yapl")]
#[command(version, about = "Render text templates", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a template and print the result
    Render {
        /// Template reference, resolved against the base directory
        template: String,

        #[command(flatten)]
        options: RenderArgs,

        /// Also list the template files consumed (on stderr)
        #[arg(long)]
        used_files: bool,
    },

    /// Render templates without printing them
    Check {
        /// Template references, resolved against the base directory
        #[arg(required = true)]
        templates: Vec<String>,

        #[command(flatten)]
        options: RenderArgs,
    },
}

/// Options shared by every rendering command
#[derive(Args, Debug, Clone, Default)]
pub struct RenderArgs {
    /// Variables file (.json or .toml, top level must be a table)
    #[arg(long, value_name = "FILE")]
    pub vars: Option<PathBuf>,

    /// Directory templates are resolved from [default: current directory]
    #[arg(long, value_name = "DIR", env = "YAPL_BASE_DIR")]
    pub base_dir: Option<PathBuf>,

    /// Renderer configuration [default: <base-dir>/yapl.toml when present]
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Allow references outside the base directory
    #[arg(long)]
    pub no_strict: bool,
}
