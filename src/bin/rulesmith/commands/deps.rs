//! `rulesmith deps` command
//!
//! Extract a dependency record from a depfile or captured compiler output.
//! Unusable dependency data is a warning: the command still succeeds.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::DepsArgs;
use crate::commands::current_config;
use rulesmith::builder::render::DEPS_PREFIX_VARIABLE;
use rulesmith::deps::{self, DepStore, ExtractContext};
use rulesmith::errors::DependencyParseError;
use rulesmith::util::diagnostic::emit;

pub fn execute(args: DepsArgs, color: bool) -> Result<()> {
    let (cwd, config) = current_config()?;
    let working_dir = args.cwd.unwrap_or(cwd);

    let mut ctx = ExtractContext::new(&args.output, &working_dir).with_inputs(&args.inputs);
    let configured = config.toolchain.vars.get(DEPS_PREFIX_VARIABLE);
    if let Some(prefix) = args.prefix.as_deref().or(configured) {
        ctx = ctx.with_prefix(prefix);
    }

    let result = read_raw(&args.file).and_then(|raw| deps::extract(args.mode, &raw, &ctx));
    let record = result.as_ref().ok().map(|extracted| extracted.record.clone());

    let policy = args
        .on_parse_error
        .unwrap_or_else(|| config.parse_error_policy());
    let store_path = args.store.or(config.deps.store);
    let mut store = match store_path {
        Some(ref path) => DepStore::load(path)?,
        None => DepStore::default(),
    };

    let report = store.record_step(&ctx.output_key(), result, policy);

    for line in &report.passthrough {
        eprintln!("{}", line);
    }
    if let Some(warning) = report.warning() {
        emit(&warning, color);
    }

    if let Some(record) = record {
        println!("{}", serde_json::to_string_pretty(&record)?);
    }

    if let Some(ref path) = store_path {
        store
            .save(path)
            .with_context(|| format!("failed to update dependency store: {}", path.display()))?;
    }

    Ok(())
}

/// Read the raw dependency data; `-` means stdin.
fn read_raw(path: &Path) -> Result<String, DependencyParseError> {
    if path != Path::new("-") {
        return deps::load_depfile(path);
    }

    let mut raw = String::new();
    std::io::stdin()
        .read_to_string(&mut raw)
        .map_err(|e| DependencyParseError::Unreadable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    Ok(raw)
}
