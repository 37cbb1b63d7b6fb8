//! Rule rendering.
//!
//! Turns abstract invocations into concrete commands for a resolved
//! toolchain, and collects rendered rules into plans and compilation
//! databases.

pub mod compile_db;
pub mod plan;
pub mod render;

pub use compile_db::{CompileCommand, CompileDatabase};
pub use plan::Plan;
pub use render::{render, RenderedRule};
