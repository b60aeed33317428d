use std::env;
use std::path::{Path, PathBuf};

use users::os::unix::UserExt;

pub mod builtins;
pub mod path;

pub use self::builtins::{Builtin, Builtins};

/// Everything the interpreter consults besides the syntax tree itself.
pub struct ShellState {
    builtins: Builtins,
    home: Option<PathBuf>,
    interactive: bool,
}

impl ShellState {
    pub fn new(interactive: bool) -> Self {
        ShellState {
            builtins: Builtins::new(),
            home: home_directory(),
            interactive,
        }
    }

    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    /// Home directory of the current user, used by `~` and a bare `cd`.
    pub fn home(&self) -> Option<&Path> {
        self.home.as_deref()
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }
}

fn home_directory() -> Option<PathBuf> {
    users::get_user_by_uid(users::get_current_uid())
        .map(|user| user.home_dir().to_path_buf())
        .or_else(|| env::var_os("HOME").map(PathBuf::from))
}
