use std::io::{self, Write};

use nix::errno::Errno;
use nix::sys::signal::{sigprocmask, SigSet, SigmaskHow};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{fork, getpid, ForkResult, Pid};

use super::signals;
use crate::shell::error::{Result, ShellError};

/// A forked process, seen from either side of the fork.
///
/// Creating the guard blocks interrupt and suspend signals before forking so
/// a signal cannot land between the fork and the child resetting its
/// dispositions. In the parent the previous mask comes back when the guard
/// is dropped, after the child has been reaped. Copies of the guard that
/// survive into later forks do nothing when dropped there.
#[derive(Debug)]
pub struct ProcessGuard {
    child: Option<Pid>,
    owner: Pid,
    previous: SigSet,
    exit: Option<i32>,
}

impl ProcessGuard {
    pub fn fork() -> Result<ProcessGuard> {
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();

        let mut previous = SigSet::empty();
        sigprocmask(
            SigmaskHow::SIG_BLOCK,
            Some(&signals::guarded()),
            Some(&mut previous),
        )
        .map_err(ShellError::system("sigprocmask"))?;

        let owner = getpid();
        match unsafe { fork() } {
            Ok(ForkResult::Parent { child }) => {
                debug!("forked child {}", child);
                Ok(ProcessGuard {
                    child: Some(child),
                    owner,
                    previous,
                    exit: None,
                })
            }
            Ok(ForkResult::Child) => Ok(ProcessGuard {
                child: None,
                owner,
                previous,
                exit: None,
            }),
            Err(errno) => {
                let _ = sigprocmask(SigmaskHow::SIG_SETMASK, Some(&previous), None);
                Err(ShellError::system("fork")(errno))
            }
        }
    }

    pub fn is_parent(&self) -> bool {
        self.child.is_some() && getpid() == self.owner
    }

    pub fn is_child(&self) -> bool {
        self.child.is_none()
    }

    /// Waits for the child and returns its exit status. Calling it again
    /// returns the recorded status without waiting.
    ///
    /// A child killed by a signal reports `128 + signal`.
    pub fn wait(&mut self) -> Result<i32> {
        if let Some(code) = self.exit {
            return Ok(code);
        }
        let child = match self.child {
            Some(child) if self.is_parent() => child,
            _ => return Err(ShellError::argument("only the parent can wait for a child")),
        };
        loop {
            match waitpid(child, None) {
                Ok(WaitStatus::Exited(_, code)) => {
                    self.exit = Some(code);
                    return Ok(code);
                }
                Ok(WaitStatus::Signaled(_, signal, _)) => {
                    let code = 128 + signal as i32;
                    self.exit = Some(code);
                    return Ok(code);
                }
                Ok(_) | Err(Errno::EINTR) => continue,
                Err(errno) => return Err(ShellError::system("waitpid")(errno)),
            }
        }
    }

    /// Exit status, available once `wait` has succeeded.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit
    }

    /// Default signal dispositions for the child; call before exec.
    pub fn reset_signals(&self) -> Result<()> {
        signals::reset()
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        if !self.is_parent() {
            return;
        }
        if self.exit.is_none() {
            if let Err(error) = self.wait() {
                warn!("{}", error);
            }
        }
        let _ = sigprocmask(SigmaskHow::SIG_SETMASK, Some(&self.previous), None);
    }
}
