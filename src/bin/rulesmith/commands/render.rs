//! `rulesmith render` command

use anyhow::Result;

use crate::cli::RenderArgs;
use crate::commands::{current_config, ToolchainChoice};
use rulesmith::core::invocation::RuleInvocation;
use rulesmith::toolchain::select;

pub fn execute(args: RenderArgs) -> Result<()> {
    let (_, config) = current_config()?;
    let choice = ToolchainChoice::resolve(&args.toolchain, None, &config);
    let toolchain = select(&choice.backend, choice.overrides())?;

    let mut invocation = RuleInvocation::new(args.action, &args.output).inputs(&args.inputs);
    for extra in &args.extra_outputs {
        invocation = invocation.extra_output(extra);
    }

    let rule = toolchain.render(&invocation)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rule)?);
        return Ok(());
    }

    println!("{}", rule.description);
    println!("{}", rule.command.display_line());
    if let Some(ref depfile) = rule.depfile {
        println!("depfile: {}", depfile.display());
    }

    Ok(())
}
