//! `rulesmith plan` command

use anyhow::{bail, Context, Result};

use crate::cli::PlanArgs;
use crate::commands::{current_config, ToolchainChoice};
use rulesmith::builder::{CompileDatabase, Plan, RenderedRule};
use rulesmith::util::diagnostic::emit;

pub fn execute(args: PlanArgs, color: bool) -> Result<()> {
    let plan = Plan::load(&args.plan)?;
    let (_, config) = current_config()?;

    let choice = ToolchainChoice::resolve(&args.toolchain, plan.backend(), &config);
    let toolchain = plan.select(&choice.backend, &choice.base, &choice.cli)?;

    tracing::info!(
        "Rendering {} steps for {}",
        plan.steps.len(),
        toolchain.name()
    );

    let mut rules: Vec<RenderedRule> = Vec::with_capacity(plan.steps.len());
    let mut failed = 0;
    for result in plan.render(&toolchain) {
        match result {
            Ok(rule) => rules.push(rule),
            Err(e) => {
                emit(&e.to_diagnostic(), color);
                failed += 1;
            }
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rules)?);
    } else {
        for rule in &rules {
            println!("{}", rule.description);
            println!("  {}", rule.command.display_line());
        }
    }

    if let Some(ref path) = args.compdb {
        let directory = std::path::absolute(plan.working_dir())
            .with_context(|| format!("failed to resolve {}", plan.working_dir().display()))?;
        CompileDatabase::from_rules(&rules, &directory).write(path)?;
    }

    if failed > 0 {
        bail!("{} of {} steps could not be rendered", failed, plan.steps.len());
    }

    Ok(())
}
