use std::os::unix::io::RawFd;
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::fcntl::{open, OFlag};
use nix::libc::{STDERR_FILENO, STDIN_FILENO, STDOUT_FILENO};
use nix::sys::stat::Mode;
use nix::unistd::{access, close, dup2, AccessFlags};

use super::{expand, Interpreter};
use crate::shell::error::{Eval, Result, ShellError};
use crate::shell::process::ProcessGuard;
use crate::shell::syntax::ast::{Expression, Redirection, Statement, UNSPECIFIED};

/// How the child's descriptors change before it evaluates its subtree.
#[derive(Debug, PartialEq)]
enum Wiring {
    File {
        path: PathBuf,
        flags: OFlag,
        onto: Vec<RawFd>,
    },
    Duplicate {
        source: RawFd,
        destination: RawFd,
    },
}

fn file_mode() -> Mode {
    Mode::S_IRUSR | Mode::S_IWUSR | Mode::S_IRGRP | Mode::S_IROTH
}

fn descriptor(expression: Option<&Expression>, default: RawFd) -> Result<RawFd> {
    match expression {
        None => Ok(default),
        Some(&Expression::Value(UNSPECIFIED)) => Ok(default),
        Some(&Expression::Value(value)) => RawFd::try_from(value)
            .map_err(|_| ShellError::argument(format!("{}: bad file descriptor", value))),
        Some(other) => Err(ShellError::argument(format!(
            "{}: not a file descriptor",
            other.text()
        ))),
    }
}

/// Checks up front that the child will be able to open `path`.
///
/// Missing output files are created so their permissions can be checked.
fn verify(path: &Path, flags: OFlag) -> Result<()> {
    let failed = |errno: Errno| ShellError::Redirect {
        path: path.to_path_buf(),
        reason: errno.desc().to_owned(),
    };
    if flags.contains(OFlag::O_WRONLY) {
        if access(path, AccessFlags::F_OK).is_err() {
            let fd = open(path, OFlag::O_WRONLY | OFlag::O_CREAT, file_mode()).map_err(failed)?;
            let _ = close(fd);
        }
        access(path, AccessFlags::W_OK).map_err(failed)
    } else {
        access(path, AccessFlags::R_OK).map_err(failed)
    }
}

fn wire(wiring: &Wiring) -> Result<()> {
    match *wiring {
        Wiring::File {
            ref path,
            flags,
            ref onto,
        } => {
            let fd = open(path, flags, file_mode()).map_err(ShellError::system("open"))?;
            for &target in onto {
                dup2(fd, target).map_err(ShellError::system("dup2"))?;
            }
            if !onto.contains(&fd) {
                let _ = close(fd);
            }
            Ok(())
        }
        Wiring::Duplicate {
            source,
            destination,
        } => dup2(destination, source)
            .map(|_| ())
            .map_err(ShellError::system("dup2")),
    }
}

impl<'a> Interpreter<'a> {
    fn target_path(&self, target: &mut Expression) -> PathBuf {
        expand::expand_expression(target, self.state);
        PathBuf::from(target.text())
    }

    fn wiring(&self, redirection: &mut Redirection) -> Result<Wiring> {
        let write = OFlag::O_WRONLY | OFlag::O_CREAT;
        let wiring = match *redirection {
            Redirection::Overwrite {
                ref fd,
                ref mut target,
            } => Wiring::File {
                path: self.target_path(target),
                flags: write | OFlag::O_TRUNC,
                onto: vec![descriptor(fd.as_ref(), STDOUT_FILENO)?],
            },
            Redirection::Append {
                ref fd,
                ref mut target,
            } => Wiring::File {
                path: self.target_path(target),
                flags: write | OFlag::O_APPEND,
                onto: vec![descriptor(fd.as_ref(), STDOUT_FILENO)?],
            },
            Redirection::MergeOutput { ref mut target } => Wiring::File {
                path: self.target_path(target),
                flags: write | OFlag::O_TRUNC,
                onto: vec![STDOUT_FILENO, STDERR_FILENO],
            },
            Redirection::MergeAppend { ref mut target } => Wiring::File {
                path: self.target_path(target),
                flags: write | OFlag::O_APPEND,
                onto: vec![STDOUT_FILENO, STDERR_FILENO],
            },
            Redirection::Stdin { ref mut target } => Wiring::File {
                path: self.target_path(target),
                flags: OFlag::O_RDONLY,
                onto: vec![STDIN_FILENO],
            },
            Redirection::MergeStream {
                ref source,
                ref destination,
            } => Wiring::Duplicate {
                source: descriptor(Some(source), STDERR_FILENO)?,
                destination: descriptor(Some(destination), STDOUT_FILENO)?,
            },
        };
        Ok(wiring)
    }

    /// Forks once; the child rewires its descriptors and evaluates `left`.
    pub(super) fn redirect(
        &mut self,
        redirection: &mut Redirection,
        left: Option<&mut Statement>,
    ) -> Eval<i64> {
        let wiring = self.wiring(redirection)?;
        if let Wiring::File {
            ref path, flags, ..
        } = wiring
        {
            if let Err(error) = verify(path, flags) {
                error!("{}", error);
                return Ok(self.record(1));
            }
        }

        let mut guard = ProcessGuard::fork()?;
        if guard.is_child() {
            let wired = wire(&wiring);
            return Err(self.finish_child(wired, left));
        }
        let status = guard.wait()?;
        debug!("{} finished with {}", redirection.operator(), status);
        Ok(self.record(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::error::Position;
    use crate::shell::state::ShellState;
    use crate::shell::syntax::tokens::{Token, TokenKind};
    use std::env;
    use std::fs;

    fn target(text: &str) -> Expression {
        Expression::word(Token::new(TokenKind::Command, text, Position::default()))
    }

    fn scratch(name: &str) -> PathBuf {
        env::temp_dir().join(format!("parsnip-redirect-{}-{}", std::process::id(), name))
    }

    #[test]
    fn descriptors_fall_back_to_defaults() {
        assert_eq!(descriptor(None, 1).unwrap(), 1);
        assert_eq!(descriptor(Some(&Expression::Value(UNSPECIFIED)), 2).unwrap(), 2);
        assert_eq!(descriptor(Some(&Expression::Value(5)), 1).unwrap(), 5);
        assert!(descriptor(Some(&Expression::Value(1 << 40)), 1).is_err());
        assert!(descriptor(Some(&target("x")), 1).is_err());
    }

    #[test]
    fn merge_stream_defaults_to_stderr_onto_stdout() {
        let state = ShellState::new(false);
        let interpreter = Interpreter::new(&state);
        let mut redirection = Redirection::MergeStream {
            source: Expression::Value(UNSPECIFIED),
            destination: Expression::Value(UNSPECIFIED),
        };
        assert_eq!(
            interpreter.wiring(&mut redirection).unwrap(),
            Wiring::Duplicate {
                source: 2,
                destination: 1
            }
        );
    }

    #[test]
    fn explicit_descriptor_selects_the_stream() {
        let state = ShellState::new(false);
        let interpreter = Interpreter::new(&state);
        let mut redirection = Redirection::Overwrite {
            fd: Some(Expression::Value(2)),
            target: target("errors"),
        };
        match interpreter.wiring(&mut redirection).unwrap() {
            Wiring::File { path, onto, .. } => {
                assert_eq!(path, PathBuf::from("errors"));
                assert_eq!(onto, vec![2]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn output_targets_are_created_when_missing() {
        let path = scratch("created");
        let _ = fs::remove_file(&path);
        verify(&path, OFlag::O_WRONLY | OFlag::O_CREAT).unwrap();
        assert!(path.exists());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_input_targets_are_rejected() {
        let path = scratch("missing");
        match verify(&path, OFlag::O_RDONLY) {
            Err(ShellError::Redirect { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("unexpected {:?}", other),
        }
        match verify(Path::new("/parsnip/no/such/dir/out"), OFlag::O_WRONLY) {
            Err(ShellError::Redirect { .. }) => {}
            other => panic!("unexpected {:?}", other),
        }
    }
}
