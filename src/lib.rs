//! A tiny interactive command interpreter.
//!
//! This crate provides a minimal set of building blocks to execute built-in commands
//! implemented in Rust and to discover and launch external programs from the current
//! process environment. It is intentionally small and easy to read: a line is read
//! from the terminal, split into whitespace-delimited tokens, and either handled by
//! a built-in command or run as a child process that the interpreter waits on.
//!
//! The main entry point is [`Interpreter`], which can run single commands by name or
//! drive a full read-eval loop. The public modules [`command`] and [`registry`]
//! expose the traits and types needed to assemble an interpreter with a custom set
//! of commands.

mod builtin;
pub mod command;
mod external;
mod interpreter;
mod lexer;
pub mod registry;

#[cfg(test)]
mod test_support;

pub use command::Flow;
pub use interpreter::Interpreter;
pub use registry::Registry;

/// Name the interpreter uses to prefix its own diagnostics on stderr.
pub(crate) const SHELL_NAME: &str = "rush";
