//! `rulesmith backends` command
//!
//! List registered backends, their templates and, optionally, which of
//! their tools are installed.

use anyhow::Result;

use crate::cli::BackendsArgs;
use crate::commands::current_config;
use rulesmith::core::invocation::VariableOverrides;
use rulesmith::toolchain::{host_default_backend, registry};

pub fn execute(args: BackendsArgs) -> Result<()> {
    let registry = registry()?;
    let (_, config) = current_config()?;
    let configured = config.backend();

    println!("Backends:");
    println!();

    for descriptor in registry.descriptors() {
        let name = descriptor.name();
        let mut marks = Vec::new();
        if name == host_default_backend() {
            marks.push("host default");
        }
        if configured == Some(name) {
            marks.push("configured");
        }

        if marks.is_empty() {
            println!("  {}", name);
        } else {
            println!("  {} ({})", name, marks.join(", "));
        }

        for (action, template) in descriptor.templates() {
            println!("    {:<13} {}", action.as_str(), template);
            println!("    {:<13} deps: {}", "", template.dependency_mode);
        }

        let conventions = descriptor.conventions();
        println!(
            "    artifacts:    {}, {}, {}",
            conventions.object_name("main"),
            conventions.static_lib_name("foo"),
            conventions.exe_name("app")
        );

        if !descriptor.defaults().is_empty() {
            println!("    defaults:");
            for (var, value) in descriptor.defaults().iter() {
                println!("      {} = {:?}", var, value);
            }
        }

        if args.probe {
            let overrides = if configured == Some(name) {
                config.toolchain.vars.clone()
            } else {
                VariableOverrides::new()
            };
            let toolchain = registry.select(name, overrides)?;

            println!("    tools:");
            for probe in toolchain.probe() {
                let location = match probe.path {
                    Some(path) => path.display().to_string(),
                    None => "not found".to_string(),
                };
                let actions: Vec<&str> = probe.actions.iter().map(|a| a.as_str()).collect();
                println!(
                    "      {:<10} {} [{}]",
                    probe.program,
                    location,
                    actions.join(", ")
                );
            }
        }

        println!();
    }

    Ok(())
}
