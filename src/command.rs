use crate::registry::Registry;
use anyhow::Result;
use std::io::Write;

/// Outcome of one dispatched command.
///
/// Every command handler, built-in or external, tells the read-eval loop
/// whether to keep prompting or to stop. This mirrors the convention used by
/// POSIX shells where only `exit` (and end-of-input) ends the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading and executing commands.
    Continue,
    /// Leave the read-eval loop; the process then exits successfully.
    Exit,
}

/// Object-safe trait for any command that can be executed by the interpreter.
///
/// This is implemented by built-ins via a blanket impl and by the external
/// program launcher.
pub trait ExecutableCommand {
    /// Executes the command.
    ///
    /// `stdout` and `stderr` receive the command's regular output and its
    /// diagnostics. The registry is the one the command was resolved from;
    /// most commands ignore it, `help` uses it to list the built-in names.
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        registry: &Registry,
    ) -> Result<Flow>;
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`. Built-in
/// factories match their single command name exactly and case-sensitively;
/// the external-launcher factory matches any name it can resolve to an
/// executable on `PATH`.
pub trait CommandFactory {
    /// Name of the built-in this factory creates, or `None` for factories
    /// that launch external programs.
    fn builtin_name(&self) -> Option<&'static str> {
        None
    }

    /// Attempt to create a command instance for the provided name and arguments.
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>>;
}
