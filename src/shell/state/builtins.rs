use std::collections::BTreeMap;
use std::env;
use std::ffi::CString;
use std::io::Write;
use std::path::PathBuf;

use nix::unistd::execvp;

use super::path;
use super::ShellState;
use crate::shell::error::{Eval, ShellError, Unwind};
use crate::shell::interpreter::{FAILURE, SUCCESS};
use crate::shell::process::signals;

/// A command run inside the shell process. Receives the expanded arguments
/// without the command name.
pub type Builtin = fn(&ShellState, &[String], &mut dyn Write) -> Eval<i64>;

const USAGE: &str = "\
usage: statements are read from standard input, one per line

  a ; b       run a, then b
  a && b      run b only if a succeeded
  a || b      run b only if a failed
  ! a         invert the result of a
  a | b       connect the output of a to the input of b
  ( a ; b )   group statements
  a > f       write output of a to f (2> for errors, >> to append)
  a &> f      write output and errors of a to f (&>> to append)
  a 2>&1      send errors of a to its output
  a < f       read input of a from f
  # text      comment until the end of the line

builtins:
  cd [dir]        change the working directory (default: home)
  exit            leave the shell
  help            show this text
  type name...    tell how each name would be run
  exec cmd args   replace the shell with cmd
";

fn output(name: &str) -> impl Fn(std::io::Error) -> Unwind + '_ {
    move |error| ShellError::argument(format!("{}: {}", name, error)).into()
}

fn no_arguments(name: &str, arguments: &[String]) -> Eval<()> {
    if arguments.is_empty() {
        Ok(())
    } else {
        Err(ShellError::argument(format!("{}: too many arguments", name)).into())
    }
}

fn some_arguments(name: &str, arguments: &[String]) -> Eval<()> {
    if arguments.is_empty() {
        Err(ShellError::argument(format!("{}: missing argument", name)).into())
    } else {
        Ok(())
    }
}

fn cd(state: &ShellState, arguments: &[String], _: &mut dyn Write) -> Eval<i64> {
    if arguments.len() > 1 {
        return Err(ShellError::argument("cd: too many arguments").into());
    }
    let target = match arguments.first() {
        Some(directory) => PathBuf::from(directory),
        None => state
            .home()
            .map(|home| home.to_path_buf())
            .ok_or_else(|| ShellError::argument("cd: no home directory"))?,
    };
    env::set_current_dir(&target).map_err(|error| {
        ShellError::argument(format!("cd: {}: {}", target.display(), error))
    })?;
    Ok(SUCCESS)
}

fn exit(_: &ShellState, arguments: &[String], _: &mut dyn Write) -> Eval<i64> {
    no_arguments("exit", arguments)?;
    Err(Unwind::Terminate(0))
}

fn help(_: &ShellState, arguments: &[String], out: &mut dyn Write) -> Eval<i64> {
    no_arguments("help", arguments)?;
    out.write_all(USAGE.as_bytes()).map_err(output("help"))?;
    Ok(SUCCESS)
}

fn type_of(state: &ShellState, arguments: &[String], out: &mut dyn Write) -> Eval<i64> {
    some_arguments("type", arguments)?;
    let mut result = SUCCESS;
    for name in arguments {
        let written = if state.builtins().contains(name) {
            writeln!(out, "{} is a shell builtin", name)
        } else if let Some(location) = path::resolve(name) {
            writeln!(out, "{} is {}", name, location.display())
        } else {
            result = FAILURE;
            writeln!(out, "{}: not found", name)
        };
        written.map_err(output("type"))?;
    }
    Ok(result)
}

fn exec(state: &ShellState, arguments: &[String], _: &mut dyn Write) -> Eval<i64> {
    some_arguments("exec", arguments)?;
    let argv = arguments
        .iter()
        .map(|argument| CString::new(argument.as_bytes()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| ShellError::argument("exec: argument contains a NUL byte"))?;
    let _ = std::io::stdout().flush();
    signals::reset()?;
    let _ = execvp(&argv[0], &argv);
    signals::restore(state.is_interactive())?;
    Err(ShellError::CommandNotFound(arguments[0].clone()).into())
}

/// Name to implementation table of the builtins.
pub struct Builtins {
    table: BTreeMap<&'static str, Builtin>,
}

impl Builtins {
    pub fn new() -> Self {
        let mut table: BTreeMap<&'static str, Builtin> = BTreeMap::new();
        table.insert("cd", cd);
        table.insert("exit", exit);
        table.insert("help", help);
        table.insert("type", type_of);
        table.insert("exec", exec);
        Builtins { table }
    }

    pub fn get(&self, name: &str) -> Option<Builtin> {
        self.table.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }
}
