//! Evaluation of syntax trees.
//!
//! Every statement evaluates to [`SUCCESS`] or [`FAILURE`]. Alongside that
//! the interpreter keeps the raw exit status of the last node it finished;
//! forked children leave with that status so exact codes survive pipelines
//! and redirections of composite statements.

use std::io::{self, Write};

use nix::libc::{STDIN_FILENO, STDOUT_FILENO};

use crate::shell::error::{Eval, Result, ShellError, Unwind};
use crate::shell::process::{Pipe, ProcessGuard};
use crate::shell::state::{Builtin, ShellState};
use crate::shell::syntax::ast::{Expression, Invocation, Statement};

pub mod expand;
mod external;
mod redirect;

pub const SUCCESS: i64 = 1;
pub const FAILURE: i64 = 0;

pub struct Interpreter<'a> {
    state: &'a ShellState,
    status: i32,
}

impl<'a> Interpreter<'a> {
    pub fn new(state: &'a ShellState) -> Self {
        Interpreter { state, status: 0 }
    }

    /// Raw exit status of the most recently completed node.
    pub fn status(&self) -> i32 {
        self.status
    }

    pub fn evaluate(&mut self, statement: &mut Statement) -> Eval<i64> {
        match *statement {
            Statement::Sequential {
                ref mut left,
                ref mut right,
            } => {
                let result = self.evaluate(left)?;
                match *right {
                    Some(ref mut right) => self.evaluate(right),
                    None => Ok(result),
                }
            }
            Statement::LogicalAnd(ref mut left, ref mut right) => {
                if self.evaluate(left)? == SUCCESS {
                    self.evaluate(right)
                } else {
                    Ok(FAILURE)
                }
            }
            Statement::LogicalOr(ref mut left, ref mut right) => {
                if self.evaluate(left)? == SUCCESS {
                    Ok(SUCCESS)
                } else {
                    self.evaluate(right)
                }
            }
            Statement::LogicalNot(ref mut inner) => {
                let negated = if self.evaluate(inner)? == SUCCESS { 1 } else { 0 };
                Ok(self.record(negated))
            }
            Statement::Pipeline(ref mut left, ref mut right) => self.pipeline(left, right),
            Statement::Redirect {
                ref mut redirection,
                ref mut left,
            } => self.redirect(redirection, left.as_deref_mut()),
            Statement::Atom(Expression::Value(value)) => Ok(value),
            Statement::Atom(Expression::Command(ref mut invocation))
            | Statement::Atom(Expression::String(ref mut invocation)) => self.invoke(invocation),
        }
    }

    /// Stores a raw status and converts it to a result.
    fn record(&mut self, status: i32) -> i64 {
        self.status = status;
        if status == 0 {
            SUCCESS
        } else {
            FAILURE
        }
    }

    fn invoke(&mut self, invocation: &mut Invocation) -> Eval<i64> {
        if let Some((result, status)) = invocation.memo() {
            self.status = status;
            return Ok(result);
        }
        expand::expand_invocation(invocation, self.state);
        let argv: Vec<String> = invocation.words().map(|token| token.text.clone()).collect();
        trace!("invoking {:?}", argv);

        let outcome = match self.state.builtins().get(&argv[0]) {
            Some(builtin) => self.builtin(builtin, &argv[1..]),
            None => self.external(&argv),
        };
        let result = match outcome {
            Err(Unwind::Failed(ShellError::Argument(message))) => {
                error!("{}", message);
                self.record(1)
            }
            other => other?,
        };
        invocation.remember(result, self.status);
        Ok(result)
    }

    fn builtin(&mut self, builtin: Builtin, arguments: &[String]) -> Eval<i64> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        let outcome = builtin(self.state, arguments, &mut out);
        let _ = out.flush();
        let result = outcome?;
        self.status = if result == SUCCESS { 0 } else { 1 };
        Ok(result)
    }

    fn pipeline(&mut self, left: &mut Statement, right: &mut Statement) -> Eval<i64> {
        let mut pipe = Pipe::new()?;
        let mut writer = ProcessGuard::fork()?;
        if writer.is_child() {
            let wired = pipe.redirect_writer(STDOUT_FILENO);
            pipe.close();
            return Err(self.finish_child(wired, Some(left)));
        }
        let mut reader = match ProcessGuard::fork() {
            Ok(reader) => reader,
            Err(error) => {
                pipe.close();
                return Err(error.into());
            }
        };
        if reader.is_child() {
            let wired = pipe.redirect_reader(STDIN_FILENO);
            pipe.close();
            return Err(self.finish_child(wired, Some(right)));
        }
        pipe.close();

        let left_status = writer.wait()?;
        let right_status = reader.wait()?;
        debug!(
            "pipeline finished: left {}, right {}",
            left_status, right_status
        );
        let status = if left_status == 0 {
            right_status
        } else {
            left_status
        };
        Ok(self.record(status))
    }

    /// Runs the rest of a forked child's work and yields how it must exit.
    ///
    /// A child never returns to the caller's loop: whatever happens, the
    /// result is a termination carrying the child's exit status.
    fn finish_child(&mut self, prepared: Result<()>, subtree: Option<&mut Statement>) -> Unwind {
        if let Err(error) = prepared {
            error!("{}", error);
            return Unwind::Terminate(1);
        }
        let outcome = match subtree {
            Some(statement) => self.evaluate(statement).map(|_| ()),
            None => {
                self.status = 0;
                Ok(())
            }
        };
        match outcome {
            Ok(()) => Unwind::Terminate(self.status),
            Err(Unwind::Terminate(code)) => Unwind::Terminate(code),
            Err(Unwind::Failed(error)) => {
                error!("{}", error);
                Unwind::Terminate(1)
            }
        }
    }
}
