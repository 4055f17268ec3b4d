use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Development requirements - Check and render pinned tool manifests
///
/// devreqs reads `dev-requirements.txt` style manifests: one
/// `name[extras]<operator>version` declaration per line, grouped by
/// `#` section headers. Malformed lines and duplicate tools are reported
/// so CI can gate on them before an installer runs.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to ./devreqs.toml, then the user config)
    #[arg(long, global = true, value_name = "PATH", env = "DEVREQS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate manifests and report malformed or duplicate entries
    Check {
        /// Manifest files (uses the configured manifest if omitted)
        #[arg(value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// List parsed requirements grouped by section
    List {
        /// Manifest file (uses the configured manifest if omitted)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = ListFormat::Text)]
        format: ListFormat,

        /// Only show entries under this section header
        #[arg(short, long, value_name = "NAME")]
        section: Option<String>,
    },

    /// Print the manifest in normalised form
    Render {
        /// Manifest file (uses the configured manifest if omitted)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Fail instead of printing when the file is not normalised
        #[arg(long)]
        check: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFormat {
    Text,
    Json,
}
