use crate::command::{CommandFactory, ExecutableCommand, Flow};
use crate::interpreter::Factory;
use crate::registry::Registry;
use anyhow::{Context, Result, bail};
use argh::{EarlyExit, FromArgs};
use std::env;
use std::fs;
use std::io::Write;

/// Built-in commands known to the interpreter at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed
/// directly in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "echo" or "cd".
    fn name() -> &'static str;

    /// Executes the command, writing regular output to `stdout`.
    ///
    /// Errors returned from here are reported on the interpreter's error
    /// stream and never stop the read-eval loop.
    fn execute(self, stdout: &mut dyn Write, registry: &Registry) -> Result<Flow>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        registry: &Registry,
    ) -> Result<Flow> {
        match T::execute(*self, stdout, registry) {
            Ok(flow) => Ok(flow),
            Err(e) => {
                writeln!(stderr, "{}: {:#}", crate::SHELL_NAME, e)?;
                Ok(Flow::Continue)
            }
        }
    }
}

/// Fallback command produced when `argh` refuses the arguments, or when it
/// generated `--help` output instead of a command instance.
struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        _registry: &Registry,
    ) -> Result<Flow> {
        let line = self.output.trim_end_matches('\n');
        if self.is_error {
            writeln!(stderr, "{}", line)?;
        } else {
            writeln!(stdout, "{}", line)?;
        }
        Ok(Flow::Continue)
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn builtin_name(&self) -> Option<&'static str> {
        Some(T::name())
    }

    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        if name == T::name() {
            Some(match T::from_args(&[name], args) {
                Ok(cmd) => Box::new(cmd),
                Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                    output,
                    is_error: status.is_err(),
                }),
            })
        } else {
            None
        }
    }
}

#[derive(FromArgs)]
/// Write the arguments to standard output, each one followed by a single
/// space, then a trailing newline.
pub struct Echo {
    #[argh(positional, greedy)]
    /// values to print as-is.
    pub args: Vec<String>,
}

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn execute(self, stdout: &mut dyn Write, _registry: &Registry) -> Result<Flow> {
        for arg in &self.args {
            write!(stdout, "{} ", arg)?;
        }
        writeln!(stdout)?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(self, stdout: &mut dyn Write, _registry: &Registry) -> Result<Flow> {
        let dir = env::current_dir().context("pwd")?;
        writeln!(stdout, "{}", dir.display())?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// List the entries of the current directory, one name per line.
pub struct Ls {}

impl BuiltinCommand for Ls {
    fn name() -> &'static str {
        "ls"
    }

    fn execute(self, stdout: &mut dyn Write, _registry: &Registry) -> Result<Flow> {
        let entries = fs::read_dir(".").context("ls: couldn't open the directory")?;
        // `read_dir` skips the "." and ".." entries; emit them ourselves the
        // way the underlying directory stream would.
        writeln!(stdout, ".")?;
        writeln!(stdout, "..")?;
        for entry in entries {
            let entry = entry.context("ls: couldn't read the directory")?;
            writeln!(stdout, "{}", entry.file_name().to_string_lossy())?;
        }
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Create a directory with permission mode 0755.
pub struct Mkdir {
    #[argh(positional)]
    /// directory to create; absolute or relative to the current directory.
    pub dir: Option<String>,
}

impl BuiltinCommand for Mkdir {
    fn name() -> &'static str {
        "mkdir"
    }

    fn execute(self, _stdout: &mut dyn Write, _registry: &Registry) -> Result<Flow> {
        let Some(dir) = self.dir else {
            bail!("expected argument to mkdir");
        };
        let mut builder = fs::DirBuilder::new();
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o755);
        }
        builder
            .create(&dir)
            .with_context(|| format!("mkdir: {}", dir))?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Change the current working directory of the interpreter process.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, _stdout: &mut dyn Write, _registry: &Registry) -> Result<Flow> {
        let Some(target) = self.target else {
            bail!("expected argument to cd");
        };
        // The working directory is process-global OS state; `ls`, `pwd` and
        // spawned programs all observe this change on their next use.
        env::set_current_dir(&target).with_context(|| format!("cd: {}", target))?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Print a usage banner and the list of built-in commands.
pub struct Help {}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn execute(self, stdout: &mut dyn Write, registry: &Registry) -> Result<Flow> {
        writeln!(stdout, "{}, a minimal command interpreter", crate::SHELL_NAME)?;
        writeln!(stdout, "Type program names and arguments, and hit enter.")?;
        writeln!(stdout, "The following are built in:")?;
        for name in registry.builtin_names() {
            writeln!(stdout, "  {}", name)?;
        }
        writeln!(stdout, "Use the man command for information on other programs.")?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Leave the interpreter.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored; accepted so that trailing tokens don't fail parsing.
    pub args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, _stdout: &mut dyn Write, _registry: &Registry) -> Result<Flow> {
        Ok(Flow::Exit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{lock_current_dir, make_unique_temp_dir};
    use std::collections::HashSet;
    use std::env as stdenv;

    fn empty_registry() -> Registry {
        Registry::new(Vec::new())
    }

    fn sink() -> Vec<u8> {
        Vec::new()
    }

    #[test]
    fn test_echo_emits_each_argument_with_trailing_space() {
        let mut out = Vec::new();
        let echo = Echo {
            args: vec!["a".to_string(), "b".to_string(), "c".to_string()],
        };
        let flow = echo.execute(&mut out, &empty_registry()).unwrap();

        assert_eq!(flow, Flow::Continue);
        assert_eq!(String::from_utf8(out).unwrap(), "a b c \n");
    }

    #[test]
    fn test_echo_without_arguments_prints_bare_newline() {
        let mut out = Vec::new();
        let echo = Echo { args: Vec::new() };
        let flow = echo.execute(&mut out, &empty_registry()).unwrap();

        assert_eq!(flow, Flow::Continue);
        assert_eq!(String::from_utf8(out).unwrap(), "\n");
    }

    #[test]
    fn test_pwd_prints_current_dir() {
        let _lock = lock_current_dir();
        let cur = stdenv::current_dir().unwrap();

        let mut out = Vec::new();
        let flow = Pwd {}.execute(&mut out, &empty_registry()).unwrap();

        assert_eq!(flow, Flow::Continue);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("{}\n", cur.display())
        );
    }

    #[test]
    fn test_cd_to_absolute_path() {
        let _lock = lock_current_dir();
        let temp = make_unique_temp_dir("cd_abs").expect("failed to create temp dir");
        let orig = stdenv::current_dir().unwrap();

        let cmd = Cd {
            target: Some(temp.to_string_lossy().to_string()),
        };
        let res = cmd.execute(&mut sink(), &empty_registry());

        assert!(res.is_ok());
        assert_eq!(
            std::fs::canonicalize(stdenv::current_dir().unwrap()).unwrap(),
            std::fs::canonicalize(&temp).unwrap()
        );

        stdenv::set_current_dir(orig).expect("failed to restore cwd");
        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn test_cd_without_argument_reports_and_keeps_cwd() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();

        let res = Cd { target: None }.execute(&mut sink(), &empty_registry());

        let err = res.unwrap_err();
        assert_eq!(err.to_string(), "expected argument to cd");
        assert_eq!(stdenv::current_dir().unwrap(), orig);
    }

    #[test]
    fn test_cd_nonexistent_path_errors_and_keeps_cwd() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();

        let name = format!("nonexistent_dir_for_rush_test_{}", std::process::id());
        let res = Cd { target: Some(name) }.execute(&mut sink(), &empty_registry());

        assert!(res.is_err());
        assert_eq!(stdenv::current_dir().unwrap(), orig);
    }

    #[test]
    fn test_mkdir_creates_directory() {
        let temp = make_unique_temp_dir("mkdir").expect("failed to create temp dir");
        let target = temp.join("d");

        let cmd = Mkdir {
            dir: Some(target.to_string_lossy().to_string()),
        };
        let flow = cmd.execute(&mut sink(), &empty_registry()).unwrap();

        assert_eq!(flow, Flow::Continue);
        assert!(target.is_dir());

        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    #[cfg(unix)]
    fn test_mkdir_uses_mode_0755() {
        use std::os::unix::fs::PermissionsExt;

        let temp = make_unique_temp_dir("mkdir_mode").expect("failed to create temp dir");
        let target = temp.join("d");

        let cmd = Mkdir {
            dir: Some(target.to_string_lossy().to_string()),
        };
        cmd.execute(&mut sink(), &empty_registry()).unwrap();

        let mode = fs::metadata(&target).unwrap().permissions().mode() & 0o777;
        // The requested mode is 0755; the process umask can only clear bits.
        assert_eq!(mode & !0o755, 0);

        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn test_mkdir_existing_directory_errors_second_time() {
        let temp = make_unique_temp_dir("mkdir_twice").expect("failed to create temp dir");
        let target = temp.join("d").to_string_lossy().to_string();

        let first = Mkdir {
            dir: Some(target.clone()),
        }
        .execute(&mut sink(), &empty_registry());
        assert!(first.is_ok());

        let second = Mkdir { dir: Some(target) }.execute(&mut sink(), &empty_registry());
        assert!(second.is_err());

        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn test_mkdir_without_argument_reports() {
        let res = Mkdir { dir: None }.execute(&mut sink(), &empty_registry());
        let err = res.unwrap_err();
        assert_eq!(err.to_string(), "expected argument to mkdir");
    }

    #[test]
    fn test_ls_lists_dot_entries_and_files() {
        let _lock = lock_current_dir();
        let temp = make_unique_temp_dir("ls").expect("failed to create temp dir");
        fs::File::create(temp.join("a.txt")).unwrap();
        fs::File::create(temp.join("b.txt")).unwrap();
        let orig = stdenv::current_dir().unwrap();
        stdenv::set_current_dir(&temp).unwrap();

        let mut out = Vec::new();
        let res = Ls {}.execute(&mut out, &empty_registry());

        stdenv::set_current_dir(orig).expect("failed to restore cwd");

        assert!(res.is_ok());
        let names: HashSet<String> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect();
        // Listing order is unspecified; only the set of names matters.
        assert_eq!(
            names,
            HashSet::from([
                ".".to_string(),
                "..".to_string(),
                "a.txt".to_string(),
                "b.txt".to_string(),
            ])
        );

        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn test_help_lists_registered_builtins() {
        let registry = Registry::new(vec![
            Box::new(Factory::<Echo>::default()),
            Box::new(Factory::<Pwd>::default()),
            Box::new(Factory::<Help>::default()),
            Box::new(Factory::<Exit>::default()),
        ]);

        let mut out = Vec::new();
        let flow = Help {}.execute(&mut out, &registry).unwrap();

        assert_eq!(flow, Flow::Continue);
        let s = String::from_utf8(out).unwrap();
        assert!(s.contains("The following are built in:"));
        for name in ["echo", "pwd", "help", "exit"] {
            assert!(s.contains(&format!("  {}\n", name)), "missing {}", name);
        }
    }

    #[test]
    fn test_exit_signals_termination() {
        let flow = Exit { args: Vec::new() }
            .execute(&mut sink(), &empty_registry())
            .unwrap();
        assert_eq!(flow, Flow::Exit);
    }

    #[test]
    fn test_exit_ignores_trailing_arguments() {
        let flow = Exit {
            args: vec!["0".to_string(), "now".to_string()],
        }
        .execute(&mut sink(), &empty_registry())
        .unwrap();
        assert_eq!(flow, Flow::Exit);
    }

    #[test]
    fn test_factory_matches_exact_name_only() {
        let factory = Factory::<Echo>::default();
        assert!(factory.try_create("echo", &[]).is_some());
        assert!(factory.try_create("Echo", &[]).is_none());
        assert!(factory.try_create("echoo", &[]).is_none());
        assert_eq!(factory.builtin_name(), Some("echo"));
    }
}
