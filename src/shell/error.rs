use std::fmt;
use std::io;
use std::path::PathBuf;

use super::syntax::tokens::TokenKind;

/// Line and column of a character in the input, both 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A malformed character sequence.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{position}: unexpected {}, expected {expected}", describe(.found))]
pub struct TokenError {
    pub position: Position,
    pub found: Option<char>,
    pub expected: &'static str,
}

fn describe(found: &Option<char>) -> String {
    match found {
        Some('\n') => String::from("newline"),
        Some(c) => format!("'{}'", c),
        None => String::from("end of input"),
    }
}

/// A grammar violation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{position}: syntax error near {found}, expected {expected}")]
pub struct SyntaxError {
    pub position: Position,
    pub expected: &'static str,
    pub found: TokenKind,
}

/// Faults of the character source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("read past the end of input")]
    StreamClosed,
    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error("{0}")]
    Argument(String),
    #[error("{call} failed: {errno}")]
    SystemCall {
        call: &'static str,
        errno: nix::Error,
    },
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("{0}: command not found")]
    CommandNotFound(String),
    #[error("{}: {reason}", .path.display())]
    Redirect { path: PathBuf, reason: String },
}

impl ShellError {
    pub fn argument(message: impl Into<String>) -> Self {
        ShellError::Argument(message.into())
    }

    /// Returns a mapper usable with `map_err` for a failed OS primitive.
    pub fn system(call: &'static str) -> impl Fn(nix::Error) -> ShellError {
        move |errno| ShellError::SystemCall { call, errno }
    }
}

pub type Result<T> = std::result::Result<T, ShellError>;

/// Why evaluation of a statement stopped before producing a value.
#[derive(Debug)]
pub enum Unwind {
    /// Stop evaluating and leave the process with this exit code.
    Terminate(i32),
    Failed(ShellError),
}

impl From<ShellError> for Unwind {
    fn from(error: ShellError) -> Self {
        Unwind::Failed(error)
    }
}

pub type Eval<T> = std::result::Result<T, Unwind>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_error_renders_position_and_characters() {
        let error = TokenError {
            position: Position::new(2, 7),
            found: Some('\n'),
            expected: "'\"'",
        };
        assert_eq!(error.to_string(), "2:7: unexpected newline, expected '\"'");
    }

    #[test]
    fn syntax_error_names_the_token_kind() {
        let error = SyntaxError {
            position: Position::new(1, 1),
            expected: "a command",
            found: TokenKind::RParen,
        };
        assert_eq!(
            error.to_string(),
            "1:1: syntax error near ')', expected a command"
        );
    }

    #[test]
    fn shell_errors_convert_into_failed_unwinds() {
        let unwind: Unwind = ShellError::CommandNotFound(String::from("nope")).into();
        match unwind {
            Unwind::Failed(error) => assert_eq!(error.to_string(), "nope: command not found"),
            Unwind::Terminate(_) => panic!("expected a failure"),
        }
    }
}
