use crate::command::Flow;
use crate::external::ExternalCommand;
use crate::lexer;
use crate::registry::Registry;
use anyhow::bail;
use log::debug;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, Write};

/// Prompt printed before each line is read, with no trailing newline.
const PROMPT: &str = "> ";

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate — the builtins and
/// ExternalCommand.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// A minimal shell-like interpreter that can execute built-in and external commands.
///
/// The interpreter owns a [`Registry`] of command factories that is built once
/// and queried on every dispatch. See [`Default`] for the built-in set
/// included out of the box.
///
/// Example
/// ```
/// use rush::{Flow, Interpreter};
/// let sh = Interpreter::default();
/// let flow = sh.run("echo", &["hello", "world"]).unwrap();
/// assert_eq!(flow, Flow::Continue);
/// ```
pub struct Interpreter {
    registry: Registry,
}

impl Interpreter {
    /// Create a new interpreter with a custom command registry.
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    /// Run a single command invocation by name with arguments.
    ///
    /// Returns the command's continuation signal, or an error if the name is
    /// neither a built-in nor a program reachable through `PATH`, or if the
    /// command fails to launch.
    pub fn run(&self, name: &str, args: &[&str]) -> anyhow::Result<Flow> {
        self.run_with_output(name, args, &mut io::stdout(), &mut io::stderr())
    }

    fn run_with_output(
        &self,
        name: &str,
        args: &[&str],
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> anyhow::Result<Flow> {
        match self.registry.resolve(name, args) {
            Some(cmd) => cmd.execute(stdout, stderr, &self.registry),
            None => bail!("command not found: {}", name),
        }
    }

    /// Decide what a token sequence means and execute it.
    ///
    /// An empty sequence (a blank input line) is a no-op that signals
    /// [`Flow::Continue`]. Otherwise token 0 is the command name and the rest
    /// are its arguments.
    pub fn dispatch(&self, tokens: &[String]) -> anyhow::Result<Flow> {
        self.dispatch_with_output(tokens, &mut io::stdout(), &mut io::stderr())
    }

    fn dispatch_with_output(
        &self,
        tokens: &[String],
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> anyhow::Result<Flow> {
        let Some((name, rest)) = tokens.split_first() else {
            return Ok(Flow::Continue);
        };
        let args: Vec<&str> = rest.iter().map(String::as_str).collect();
        self.run_with_output(name, &args, stdout, stderr)
    }

    /// The Read-Eval Loop.
    ///
    /// Prompts, reads one line, tokenizes and dispatches it, and repeats until
    /// a command signals [`Flow::Exit`]. Dispatch errors are reported on
    /// stderr and never end the loop. End-of-input on the terminal exits the
    /// process directly with success, matching the behavior users expect from
    /// Ctrl-D.
    pub fn repl(&self) -> anyhow::Result<()> {
        let mut rl = DefaultEditor::new()?;

        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    rl.add_history_entry(line.as_str())?;
                    let tokens = lexer::split_into_tokens(&line);
                    debug!("tokens = {:?}", tokens);
                    match self.dispatch(&tokens) {
                        Ok(Flow::Continue) => {}
                        Ok(Flow::Exit) => break,
                        Err(err) => eprintln!("{}: {:#}", crate::SHELL_NAME, err),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl-C: drop the partial line and prompt again.
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    std::process::exit(0);
                }
                Err(err) => return Err(err.into()),
            }
        }

        Ok(())
    }
}

impl Default for Interpreter {
    /// Create an interpreter with the default set of commands:
    /// - built-ins: `echo`, `pwd`, `ls`, `mkdir`, `cd`, `help`, `exit`
    /// - external command launcher
    fn default() -> Self {
        use crate::builtin::*;
        Self::new(Registry::new(vec![
            Box::new(Factory::<Echo>::default()),
            Box::new(Factory::<Pwd>::default()),
            Box::new(Factory::<Ls>::default()),
            Box::new(Factory::<Mkdir>::default()),
            Box::new(Factory::<Cd>::default()),
            Box::new(Factory::<Help>::default()),
            Box::new(Factory::<Exit>::default()),
            Box::new(Factory::<ExternalCommand>::default()),
        ]))
    }
}
