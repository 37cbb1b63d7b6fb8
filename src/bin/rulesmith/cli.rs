//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use rulesmith::core::action::Action;
use rulesmith::deps::ParseErrorPolicy;
use rulesmith::toolchain::DependencyMode;

/// rulesmith - render toolchain-agnostic build rules and extract their
/// dependencies
#[derive(Parser)]
#[command(name = "rulesmith")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List registered backends and their templates
    Backends(BackendsArgs),

    /// Render a single build step
    Render(RenderArgs),

    /// Extract dependencies from a depfile or compiler output
    Deps(DepsArgs),

    /// Render every step of a plan file
    Plan(PlanArgs),
}

/// Options shared by commands that select a backend.
#[derive(Args, Clone, Default)]
pub struct ToolchainOpts {
    /// Backend to use (e.g. gcc-like, msvc-like)
    #[arg(short, long, env = "RULESMITH_BACKEND")]
    pub backend: Option<String>,

    /// Override a template variable (NAME=VALUE, repeatable)
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,

    /// Import CC, CXX, CFLAGS, LDFLAGS, ... from the environment
    #[arg(long)]
    pub from_env: bool,
}

#[derive(Args)]
pub struct BackendsArgs {
    /// Look each tool up on PATH
    #[arg(long)]
    pub probe: bool,
}

#[derive(Args)]
pub struct RenderArgs {
    /// Action to render (compile-c, compile-cxx, link-exe, link-cxx-exe,
    /// archive, assemble, preprocess)
    pub action: Action,

    /// Input path (repeatable, order is kept)
    #[arg(short, long = "input", value_name = "PATH")]
    pub inputs: Vec<PathBuf>,

    /// Primary output path
    #[arg(short, long)]
    pub output: PathBuf,

    /// Extra output path, e.g. a depfile (repeatable)
    #[arg(long = "extra-output", value_name = "PATH")]
    pub extra_outputs: Vec<PathBuf>,

    #[command(flatten)]
    pub toolchain: ToolchainOpts,

    /// Print the rendered rule as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct DepsArgs {
    /// How the dependencies were reported
    #[arg(long, default_value = "gcc-style-depfile")]
    pub mode: DependencyMode,

    /// Output the dependencies belong to
    #[arg(long)]
    pub output: PathBuf,

    /// Declared input, excluded from the record (repeatable)
    #[arg(long = "input", value_name = "PATH")]
    pub inputs: Vec<PathBuf>,

    /// Directory the action ran in (defaults to the current directory)
    #[arg(long)]
    pub cwd: Option<PathBuf>,

    /// Marker introducing include lines in compiler output
    /// [default: config `msvc_deps_prefix`, then MSVC's English marker]
    #[arg(long)]
    pub prefix: Option<String>,

    /// Dependency store to update
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// What to do with the stored record if parsing fails
    #[arg(long)]
    pub on_parse_error: Option<ParseErrorPolicy>,

    /// Depfile or captured compiler output ("-" for stdin)
    pub file: PathBuf,
}

#[derive(Args)]
pub struct PlanArgs {
    /// Plan file
    pub plan: PathBuf,

    #[command(flatten)]
    pub toolchain: ToolchainOpts,

    /// Write compile_commands.json to this path
    #[arg(long, value_name = "PATH")]
    pub compdb: Option<PathBuf>,

    /// Print the rendered rules as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_var(s: &str) -> Result<(String, String), String> {
    rulesmith::core::invocation::VariableOverrides::parse_assignment(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_render_args() {
        let cli = Cli::parse_from([
            "rulesmith",
            "render",
            "link-exe",
            "-i",
            "a.o",
            "-i",
            "b.o",
            "-o",
            "app",
            "--var",
            "ldflags=-s",
        ]);
        let Commands::Render(args) = cli.command else {
            panic!("expected render");
        };
        assert_eq!(args.action, Action::LinkExe);
        assert_eq!(args.inputs, vec![PathBuf::from("a.o"), PathBuf::from("b.o")]);
        assert_eq!(
            args.toolchain.vars,
            vec![("ldflags".to_string(), "-s".to_string())]
        );
    }
}
