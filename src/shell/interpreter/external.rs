use std::ffi::CString;

use nix::unistd::execvp;

use super::Interpreter;
use crate::shell::error::{Eval, ShellError, Unwind};
use crate::shell::process::{Pipe, ProcessGuard};

/// Exit status of a child whose exec failed.
const NOT_EXECUTABLE: i32 = 127;

impl<'a> Interpreter<'a> {
    /// Forks and execs `argv`. A failed exec is reported back through a
    /// close-on-exec pipe, which the parent drains after the child is reaped.
    pub(super) fn external(&mut self, argv: &[String]) -> Eval<i64> {
        let args = argv
            .iter()
            .map(|argument| CString::new(argument.as_bytes()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| {
                ShellError::argument(format!("{}: argument contains a NUL byte", argv[0]))
            })?;

        let mut failure = Pipe::new()?;
        failure.set_nonblocking_reader()?;
        let mut guard = ProcessGuard::fork()?;
        if guard.is_child() {
            failure.close_reader();
            if let Err(error) = guard.reset_signals() {
                warn!("{}", error);
            }
            let _ = execvp(&args[0], &args);
            failure.send(true);
            return Err(Unwind::Terminate(NOT_EXECUTABLE));
        }

        failure.close_writer();
        let status = guard.wait()?;
        if failure.receive() == Some(true) {
            error!("{}", ShellError::CommandNotFound(argv[0].clone()));
        }
        debug!("{} exited with {}", argv[0], status);
        Ok(self.record(status))
    }
}
