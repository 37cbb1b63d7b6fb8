//! compile_commands.json generation for IDE integration.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::builder::render::RenderedRule;
use crate::core::action::Action;
use crate::util::fs;

/// compile_commands.json entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileCommand {
    pub directory: String,
    pub file: String,
    pub arguments: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// The compile actions of a batch of rendered rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileDatabase {
    commands: Vec<CompileCommand>,
}

impl CompileDatabase {
    /// Collect the entries for `rules` run from `directory`.
    ///
    /// Only actions that translate a source file are included: compiles and
    /// assembly. Each input of such an action gets its own entry.
    pub fn from_rules<'a>(rules: impl IntoIterator<Item = &'a RenderedRule>, directory: &Path) -> Self {
        let directory = directory.display().to_string();
        let mut commands = Vec::new();

        for rule in rules {
            if !(rule.action.is_compile() || rule.action == Action::Assemble) {
                continue;
            }

            let arguments = rule.command.tokens();
            for input in &rule.inputs {
                commands.push(CompileCommand {
                    directory: directory.clone(),
                    file: input.display().to_string(),
                    arguments: arguments.clone(),
                    output: Some(rule.output.display().to_string()),
                });
            }
        }

        CompileDatabase { commands }
    }

    pub fn commands(&self) -> &[CompileCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Write the database as pretty-printed JSON.
    pub fn write(&self, path: &Path) -> Result<PathBuf> {
        let json = serde_json::to_string_pretty(&self.commands)?;
        fs::write_string(path, &json)?;
        tracing::info!(
            "Wrote {} entries to {}",
            self.commands.len(),
            path.display()
        );
        Ok(path.to_path_buf())
    }
}
