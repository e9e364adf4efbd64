//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Labeled hierarchies stored as flat tree-path rows
#[derive(Parser, Debug)]
#[command(name = "treepath")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug level, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// SQLite database file (overrides config)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub db: Option<PathBuf>,

    /// Directory to read `.treepath.toml` from (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the assembled hierarchy as a tree
    Tree {
        /// Print tree paths (`/a/b/`) instead of labels
        #[arg(long)]
        paths: bool,
        /// Also list rows that are not reachable from a root
        #[arg(long)]
        dropped: bool,
    },

    /// List stored rows (all, or those at one depth under one parent)
    List {
        /// Depth of the rows to list
        #[arg(long)]
        depth: Option<u16>,
        /// Parent ident (omit for top-level rows)
        #[arg(long, requires = "depth")]
        parent: Option<String>,
    },

    /// Show one row by identity
    Get {
        ident: String,
        depth: u16,
        /// Parent ident (omit for top-level rows)
        parent: Option<String>,
    },

    /// Insert a row
    Add {
        ident: String,
        depth: u16,
        #[arg(allow_negative_numbers = true)]
        sort_order: i16,
        #[arg(long)]
        parent: Option<String>,
        #[arg(long)]
        label: Option<String>,
    },

    /// Delete a row by identity
    Remove {
        ident: String,
        depth: u16,
        #[arg(long)]
        parent: Option<String>,
    },

    /// Change the sort order of a row
    SetOrder {
        ident: String,
        depth: u16,
        #[arg(allow_negative_numbers = true)]
        sort_order: i16,
        #[arg(long)]
        parent: Option<String>,
    },

    /// Change the label of a row (no --label clears it)
    SetLabel {
        ident: String,
        depth: u16,
        #[arg(long)]
        parent: Option<String>,
        #[arg(long)]
        label: Option<String>,
    },

    /// Delete all rows
    Clear {
        /// Required confirmation
        #[arg(long)]
        yes: bool,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings
    Show,
    /// Show config file locations
    Path,
}
