//! Frontserve - a front-end module server.
//!
//! Serves browser modules straight from `node_modules` and project
//! directories, rewriting bare import specifiers into fetchable URLs and
//! caching the minified, compressed result in memory.

#![allow(dead_code)]

mod asset;
mod cache;
mod cli;
mod config;
mod logger;
mod pipeline;
mod resolve;
mod stream;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::ServerConfig;
use std::sync::Arc;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    cli::serve::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = Arc::new(ServerConfig::load(&cli)?);
    debug!("config"; "root {}", config.get_root().display());

    match &cli.command {
        Commands::Serve { .. } => cli::serve::serve(config),
    }
}
