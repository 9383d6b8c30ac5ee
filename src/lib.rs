//! # Wisp
//! A small dynamically-typed scripting language: block-delimited syntax,
//! a single-pass lowering compiler with peephole fusion, and a
//! stack-based bytecode VM with cooperative coroutines.
//!
//! ## Overview of the pipeline
//! Source text flows through four stages, each a plain function:
//!
//! - [`compiler::lex::lex`] turns a [`common::source::Source`] into a
//!   token stream.
//! - [`compiler::parse::parse`] turns tokens into a tree of
//!   [`construct::tree::Expr`], each wrapped in a [`common::span::Span`]
//!   for error reporting.
//! - [`compiler::lower::lower`] turns the tree into a flat
//!   [`compiler::program::Program`] of [`compiler::program::Instruction`]s,
//!   fusing common instruction pairs as it emits them.
//! - [`vm::interpreter::Interpreter`] runs the program: one coroutine
//!   executes at a time, picked from a small LIFO scheduler.
//!
//! Compile-time errors are [`compiler::syntax::Syntax`] values; runtime
//! errors are [`vm::trace::Trace`] values. Both carry enough context to
//! print a useful message without unwinding the host process.
//!
//! ```
//! use wisp::{compile, run};
//!
//! let mut out = Vec::new();
//! let program = compile(wisp::common::source::Source::source("print(1 + 2)")).unwrap();
//! run(program, 64, &mut out).unwrap();
//! assert_eq!(String::from_utf8(out).unwrap(), "3\n");
//! ```

pub mod common;
pub mod compiler;
pub mod construct;
pub mod vm;

use std::io::Write;
use std::rc::Rc;

pub use common::source::Source;
pub use compiler::program::Program;
pub use compiler::syntax::Syntax;
pub use vm::interpreter::Interpreter;
pub use vm::trace::Trace;

/// Runs the full front end: lex, parse, lower. Stops at the first
/// `Syntax` error encountered.
pub fn compile(source: Rc<Source>) -> Result<Program, Syntax> {
    let tokens = compiler::lex::lex(&source)?;
    let block = compiler::parse::parse(tokens)?;
    compiler::lower::lower(&block)
}

/// Runs a compiled [`Program`] to completion, writing anything `print`
/// produces to `out`. `memory_mb` bounds each per-kind arena (§6).
pub fn run(program: Program, memory_mb: u64, out: &mut dyn Write) -> Result<(), Trace> {
    let mut interpreter = Interpreter::new(program, memory_mb, Box::new(out));
    interpreter.run()
}
