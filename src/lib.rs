//! rulesmith - toolchain-agnostic build rule rendering for C and C++
//!
//! This crate turns abstract build actions (compile, link, archive,
//! assemble, preprocess) into concrete commands for a selected toolchain
//! backend, and normalizes the header dependencies compilers report back
//! into one backend-agnostic record.
//!
//! ```no_run
//! use rulesmith::{select, Action, RuleInvocation, VariableOverrides};
//!
//! let gcc = select("gcc-like", VariableOverrides::new().with("cc", "clang"))?;
//! let rule = gcc.render(&RuleInvocation::new(Action::CompileC, "obj/main.o").input("main.c"))?;
//! println!("{}", rule.command.display_line());
//! # Ok::<(), rulesmith::RuleError>(())
//! ```

pub mod builder;
pub mod core;
pub mod deps;
pub mod errors;
pub mod toolchain;
pub mod util;

pub use builder::{CompileDatabase, Plan, RenderedRule};
pub use core::{action::Action, invocation::RuleInvocation, invocation::VariableOverrides};
pub use deps::{DepStore, DependencyRecord, ExtractContext, ParseErrorPolicy, StepReport};
pub use errors::{DependencyParseError, ErrorScope, RuleError, RuleErrorKind};
pub use toolchain::{select, DependencyMode, ResolvedToolchain, ToolchainRegistry};
