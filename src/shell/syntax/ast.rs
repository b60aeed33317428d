use std::fmt;

use super::tokens::{Token, TokenKind};

/// Sentinel for a descriptor whose digits were absent from the operator.
pub const UNSPECIFIED: i64 = -1;

/// A command head with its positional arguments.
///
/// Tokens are expanded in place before execution; the outcome of the first
/// evaluation is kept so a second evaluation does not run anything again.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub head: Token,
    pub arguments: Vec<Token>,
    memo: Option<(i64, i32)>,
}

impl Invocation {
    pub fn new(head: Token, arguments: Vec<Token>) -> Self {
        Invocation {
            head,
            arguments,
            memo: None,
        }
    }

    pub fn words(&self) -> impl Iterator<Item = &Token> {
        ::std::iter::once(&self.head).chain(self.arguments.iter())
    }

    pub fn words_mut(&mut self) -> impl Iterator<Item = &mut Token> {
        ::std::iter::once(&mut self.head).chain(self.arguments.iter_mut())
    }

    /// Memoized `(result, raw exit status)` of a previous evaluation.
    pub fn memo(&self) -> Option<(i64, i32)> {
        self.memo
    }

    pub fn remember(&mut self, result: i64, status: i32) {
        self.memo = Some((result, status));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Command(Invocation),
    String(Invocation),
    Value(i64),
}

impl Expression {
    /// A single word, classified by the kind of its token.
    pub fn word(token: Token) -> Self {
        if token.kind == TokenKind::String {
            Expression::String(Invocation::new(token, Vec::new()))
        } else {
            Expression::Command(Invocation::new(token, Vec::new()))
        }
    }

    pub fn text(&self) -> String {
        match *self {
            Expression::Command(ref invocation) | Expression::String(ref invocation) => invocation
                .words()
                .map(|token| token.text.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            Expression::Value(value) => value.to_string(),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Expression::Command(ref invocation) => write!(f, "[{}]", self.text_of(invocation)),
            Expression::String(ref invocation) => write!(f, "\"{}\"", invocation.head.text),
            Expression::Value(value) => write!(f, "{}", value),
        }
    }
}

impl Expression {
    fn text_of(&self, invocation: &Invocation) -> String {
        invocation
            .words()
            .map(|token| match token.kind {
                TokenKind::String => format!("\"{}\"", token.text),
                _ => token.text.clone(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// What a redirection node does, with its sibling operands.
///
/// Descriptor operands are `Expression::Value` nodes; targets are word
/// expressions naming a file.
#[derive(Debug, Clone, PartialEq)]
pub enum Redirection {
    Overwrite {
        fd: Option<Expression>,
        target: Expression,
    },
    Append {
        fd: Option<Expression>,
        target: Expression,
    },
    MergeOutput {
        target: Expression,
    },
    MergeAppend {
        target: Expression,
    },
    MergeStream {
        source: Expression,
        destination: Expression,
    },
    Stdin {
        target: Expression,
    },
}

fn digits(fd: Option<&Expression>) -> String {
    match fd {
        Some(&Expression::Value(value)) if value != UNSPECIFIED => value.to_string(),
        _ => String::new(),
    }
}

impl Redirection {
    /// Renders the operator the way it appeared in the source.
    pub fn operator(&self) -> String {
        match *self {
            Redirection::Overwrite { ref fd, .. } => format!("{}>", digits(fd.as_ref())),
            Redirection::Append { ref fd, .. } => format!("{}>>", digits(fd.as_ref())),
            Redirection::MergeOutput { .. } => String::from("&>"),
            Redirection::MergeAppend { .. } => String::from("&>>"),
            Redirection::MergeStream {
                ref source,
                ref destination,
            } => format!("{}>&{}", digits(Some(source)), digits(Some(destination))),
            Redirection::Stdin { .. } => String::from("<"),
        }
    }

    pub fn target(&self) -> Option<&Expression> {
        match *self {
            Redirection::Overwrite { ref target, .. }
            | Redirection::Append { ref target, .. }
            | Redirection::MergeOutput { ref target }
            | Redirection::MergeAppend { ref target }
            | Redirection::Stdin { ref target } => Some(target),
            Redirection::MergeStream { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Sequential,
    LogicalAnd,
    LogicalOr,
    LogicalNot,
    Pipeline,
    OverwriteRedirect,
    AppendRedirect,
    MergeOutput,
    MergeAppend,
    MergeStream,
    StdinRedirect,
    Atom,
}

/// A node of the syntax tree. Every node owns its children outright.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Sequential {
        left: Box<Statement>,
        right: Option<Box<Statement>>,
    },
    LogicalAnd(Box<Statement>, Box<Statement>),
    LogicalOr(Box<Statement>, Box<Statement>),
    LogicalNot(Box<Statement>),
    Pipeline(Box<Statement>, Box<Statement>),
    Redirect {
        redirection: Redirection,
        left: Option<Box<Statement>>,
    },
    Atom(Expression),
}

impl Statement {
    pub fn kind(&self) -> StatementKind {
        match *self {
            Statement::Sequential { .. } => StatementKind::Sequential,
            Statement::LogicalAnd(..) => StatementKind::LogicalAnd,
            Statement::LogicalOr(..) => StatementKind::LogicalOr,
            Statement::LogicalNot(..) => StatementKind::LogicalNot,
            Statement::Pipeline(..) => StatementKind::Pipeline,
            Statement::Redirect {
                ref redirection, ..
            } => match *redirection {
                Redirection::Overwrite { .. } => StatementKind::OverwriteRedirect,
                Redirection::Append { .. } => StatementKind::AppendRedirect,
                Redirection::MergeOutput { .. } => StatementKind::MergeOutput,
                Redirection::MergeAppend { .. } => StatementKind::MergeAppend,
                Redirection::MergeStream { .. } => StatementKind::MergeStream,
                Redirection::Stdin { .. } => StatementKind::StdinRedirect,
            },
            Statement::Atom(_) => StatementKind::Atom,
        }
    }

    pub fn sequential(left: Statement, right: Option<Statement>) -> Self {
        Statement::Sequential {
            left: Box::new(left),
            right: right.map(Box::new),
        }
    }

    pub fn redirect(redirection: Redirection, left: Option<Statement>) -> Self {
        Statement::Redirect {
            redirection,
            left: left.map(Box::new),
        }
    }
}

/// Prefix rendering used in diagnostics: `(&& [a] (| [b] [c]))`.
impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Statement::Sequential {
                ref left,
                right: Some(ref right),
            } => write!(f, "(; {} {})", left, right),
            Statement::Sequential {
                ref left,
                right: None,
            } => write!(f, "(; {})", left),
            Statement::LogicalAnd(ref left, ref right) => write!(f, "(&& {} {})", left, right),
            Statement::LogicalOr(ref left, ref right) => write!(f, "(|| {} {})", left, right),
            Statement::LogicalNot(ref inner) => write!(f, "(! {})", inner),
            Statement::Pipeline(ref left, ref right) => write!(f, "(| {} {})", left, right),
            Statement::Redirect {
                ref redirection,
                ref left,
            } => {
                write!(f, "({}", redirection.operator())?;
                match *left {
                    Some(ref left) => write!(f, " {}", left)?,
                    None => write!(f, " _")?,
                }
                match redirection.target() {
                    Some(target) => write!(f, " {})", target),
                    None => write!(f, ")"),
                }
            }
            Statement::Atom(ref expression) => write!(f, "{}", expression),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::error::Position;

    fn word(text: &str) -> Token {
        Token::new(TokenKind::Command, text, Position::default())
    }

    fn atom(words: &[&str]) -> Statement {
        let mut tokens = words.iter().map(|w| word(w));
        let head = tokens.next().unwrap();
        Statement::Atom(Expression::Command(Invocation::new(head, tokens.collect())))
    }

    #[test]
    fn kinds_follow_redirection_variants() {
        let target = Expression::word(word("out"));
        let overwrite = Statement::redirect(
            Redirection::Overwrite {
                fd: None,
                target: target.clone(),
            },
            Some(atom(&["ls"])),
        );
        assert_eq!(overwrite.kind(), StatementKind::OverwriteRedirect);
        let stream = Statement::redirect(
            Redirection::MergeStream {
                source: Expression::Value(UNSPECIFIED),
                destination: Expression::Value(1),
            },
            None,
        );
        assert_eq!(stream.kind(), StatementKind::MergeStream);
        assert_eq!(atom(&["ls"]).kind(), StatementKind::Atom);
    }

    #[test]
    fn operators_render_explicit_digits_only() {
        let explicit = Redirection::Append {
            fd: Some(Expression::Value(2)),
            target: Expression::word(word("log")),
        };
        assert_eq!(explicit.operator(), "2>>");
        let defaulted = Redirection::MergeStream {
            source: Expression::Value(UNSPECIFIED),
            destination: Expression::Value(UNSPECIFIED),
        };
        assert_eq!(defaulted.operator(), ">&");
    }

    #[test]
    fn display_is_prefix_notation() {
        let tree = Statement::LogicalAnd(
            Box::new(atom(&["a"])),
            Box::new(Statement::Pipeline(
                Box::new(atom(&["b", "x"])),
                Box::new(atom(&["c"])),
            )),
        );
        assert_eq!(tree.to_string(), "(&& [a] (| [b x] [c]))");
    }

    #[test]
    fn memo_is_recorded() {
        let mut invocation = Invocation::new(word("true"), Vec::new());
        assert_eq!(invocation.memo(), None);
        invocation.remember(1, 0);
        assert_eq!(invocation.memo(), Some((1, 0)));
    }
}
