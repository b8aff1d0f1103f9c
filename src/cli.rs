use crate::config::DEFAULT_CONFIG_FILE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "aamporter",
    about = "Download Adobe AAM updates and optionally import them into a Munki repo",
    version,
    author
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download updates for the configured products
    Sync {
        /// Process downloaded updates with munkiimport using the configured options
        #[arg(short = 'm', long)]
        munkiimport: bool,

        /// Include updates that have been marked as revoked in Adobe's feed
        #[arg(short = 'r', long)]
        include_revoked: bool,

        /// Run munkiimport even if an identical item is already in the repo
        #[arg(short = 'f', long, requires = "munkiimport")]
        force_import: bool,

        /// Read the updater feed from a local file instead of Adobe's server
        #[arg(long, value_name = "PATH")]
        feed_file: Option<PathBuf>,
    },

    /// Show which updates would be mirrored without downloading anything
    Check {
        /// Include updates that have been marked as revoked in Adobe's feed
        #[arg(short = 'r', long)]
        include_revoked: bool,

        /// Read the updater feed from a local file instead of Adobe's server
        #[arg(long, value_name = "PATH")]
        feed_file: Option<PathBuf>,

        /// Print the resolved updates as JSON
        #[arg(long)]
        json: bool,
    },

    /// Import a folder of Creative Cloud Packager builds with munkiimport
    ImportCc {
        /// Folder containing one directory per CCP package build
        #[arg(value_name = "DIR")]
        packages_dir: PathBuf,
    },
}
