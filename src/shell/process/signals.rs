use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, SigmaskHow, Signal};

use crate::shell::error::{Result, ShellError};

/// Signals an interactive shell must survive; its foreground children must not.
const INTERACTIVE: [Signal; 3] = [Signal::SIGINT, Signal::SIGTSTP, Signal::SIGQUIT];

/// Signals held back around every fork.
pub fn guarded() -> SigSet {
    let mut set = SigSet::empty();
    set.add(Signal::SIGINT);
    set.add(Signal::SIGTSTP);
    set
}

fn set_disposition(handler: SigHandler) -> Result<()> {
    let action = SigAction::new(handler, SaFlags::empty(), SigSet::empty());
    for &sig in INTERACTIVE.iter() {
        let previous = unsafe { signal::sigaction(sig, &action) };
        previous.map_err(ShellError::system("sigaction"))?;
    }
    Ok(())
}

/// Ignores interrupt, suspend and quit in the shell process.
pub fn ignore_interactive() -> Result<()> {
    set_disposition(SigHandler::SigIgn)
}

/// Restores default dispositions and unblocks the signals held back around
/// forks, so an exec'd program reacts to the terminal normally.
pub fn reset() -> Result<()> {
    set_disposition(SigHandler::SigDfl)?;
    signal::sigprocmask(SigmaskHow::SIG_UNBLOCK, Some(&guarded()), None)
        .map_err(ShellError::system("sigprocmask"))
}

/// Puts back the shell's own dispositions after a `reset` that was not
/// followed by a successful exec.
pub fn restore(interactive: bool) -> Result<()> {
    if interactive {
        ignore_interactive()
    } else {
        set_disposition(SigHandler::SigDfl)
    }
}
