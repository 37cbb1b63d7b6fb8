//! Core data types.
//!
//! This module contains the vocabulary shared by every backend:
//! - Action: the closed set of abstract build steps
//! - RuleInvocation: one build step to render
//! - VariableOverrides: named values substituted into templates

pub mod action;
pub mod invocation;

pub use action::Action;
pub use invocation::{RuleInvocation, VariableOverrides};
