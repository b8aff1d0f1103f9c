mod aam;
mod cache;
mod cli;
mod config;
mod error;
mod feed;
mod munki;
mod workflow;

use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;
use std::process;
use workflow::SyncOptions;

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        unsafe {
            std::env::set_var("AAMPORTER_VERBOSE", "1");
        }
    }

    let result = match cli.command {
        Commands::Sync {
            munkiimport,
            include_revoked,
            force_import,
            feed_file,
        } => workflow::execute_sync(
            &cli.config,
            SyncOptions {
                munkiimport,
                include_revoked,
                force_import,
                feed_file,
            },
        ),
        Commands::Check {
            include_revoked,
            feed_file,
            json,
        } => workflow::execute_check(&cli.config, include_revoked, feed_file.as_deref(), json),
        Commands::ImportCc { packages_dir } => {
            workflow::execute_import_cc(&cli.config, &packages_dir)
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}
