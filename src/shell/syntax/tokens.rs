use std::fmt;

use crate::shell::error::Position;

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum TokenKind {
    Command,
    String,
    And,
    Or,
    Not,
    Pipe,
    OverwriteRedir,
    AppendRedir,
    MergeOutput,
    MergeAppend,
    MergeStream,
    StdinRedir,
    LParen,
    RParen,
    Newline,
    Semi,
    EndOfInput,
    Error,
}

impl TokenKind {
    pub fn is_redirection(self) -> bool {
        match self {
            TokenKind::OverwriteRedir
            | TokenKind::AppendRedir
            | TokenKind::MergeOutput
            | TokenKind::MergeAppend
            | TokenKind::MergeStream
            | TokenKind::StdinRedir => true,
            _ => false,
        }
    }

    /// Tokens that can start or continue a command's word list.
    pub fn is_word(self) -> bool {
        self == TokenKind::Command || self == TokenKind::String
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            TokenKind::Command => "command",
            TokenKind::String => "string",
            TokenKind::And => "'&&'",
            TokenKind::Or => "'||'",
            TokenKind::Not => "'!'",
            TokenKind::Pipe => "'|'",
            TokenKind::OverwriteRedir => "'>'",
            TokenKind::AppendRedir => "'>>'",
            TokenKind::MergeOutput => "'&>'",
            TokenKind::MergeAppend => "'&>>'",
            TokenKind::MergeStream => "'>&'",
            TokenKind::StdinRedir => "'<'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Newline => "newline",
            TokenKind::Semi => "';'",
            TokenKind::EndOfInput => "end of input",
            TokenKind::Error => "invalid token",
        };
        f.write_str(name)
    }
}

/// A lexed token together with its raw source text.
///
/// Redirection operators keep their digits (`2>`, `1>&2`) so the parser can
/// recover explicit descriptors; strings keep their contents without quotes.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: Position) -> Self {
        Token {
            kind,
            text: text.into(),
            position,
        }
    }
}
