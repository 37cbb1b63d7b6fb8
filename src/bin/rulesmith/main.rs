//! rulesmith CLI - inspect rendered build rules and extracted dependencies

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use rulesmith::errors::RuleError;
use rulesmith::util::diagnostic::emit;

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color && std::io::stderr().is_terminal();

    if let Err(e) = run(cli, color) {
        match e.downcast_ref::<RuleError>() {
            Some(rule_error) => emit(&rule_error.to_diagnostic(), color),
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli, color: bool) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("rulesmith=debug")
    } else {
        EnvFilter::new("rulesmith=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_ansi(color)
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    match cli.command {
        Commands::Backends(args) => commands::backends::execute(args),
        Commands::Render(args) => commands::render::execute(args),
        Commands::Deps(args) => commands::deps::execute(args, color),
        Commands::Plan(args) => commands::plan::execute(args, color),
    }
}
