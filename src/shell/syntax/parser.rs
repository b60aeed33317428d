use std::io::BufRead;

use super::ast::{Expression, Invocation, Redirection, Statement, UNSPECIFIED};
use super::redirect::{output_operator, stream_operator};
use super::stream::TokenStream;
use super::tokens::{Token, TokenKind};
use crate::shell::error::{Result, ShellError, SyntaxError};

fn unexpected(token: &Token, expected: &'static str) -> ShellError {
    ShellError::Syntax(SyntaxError {
        position: token.position,
        expected,
        found: token.kind,
    })
}

/// Recursive-descent parser producing one statement per call to
/// [`Parser::parse`].
///
/// Binding, tightest first: redirections (left to right, each wrapping the
/// operand built so far), `!`, `|`, then `&&`/`||` with equal precedence and
/// left associativity. `;` and newlines end a statement.
pub struct Parser<R> {
    tokens: TokenStream<R>,
}

impl<R: BufRead> Parser<R> {
    pub fn new(tokens: TokenStream<R>) -> Self {
        Parser { tokens }
    }

    /// Parses the next logical statement, or returns `None` at end of input.
    pub fn parse(&mut self) -> Result<Option<Statement>> {
        if self.tokens.is_exhausted() {
            return Ok(None);
        }
        loop {
            match self.tokens.peek_kind()? {
                TokenKind::Newline | TokenKind::Semi => {
                    self.tokens.next()?;
                }
                TokenKind::EndOfInput => {
                    self.tokens.next()?;
                    return Ok(None);
                }
                _ => break,
            }
        }
        self.statement().map(Some)
    }

    /// Drops the rest of the current line after a failed parse.
    pub fn discard(&mut self) {
        self.tokens.clear();
    }

    pub fn is_exhausted(&self) -> bool {
        self.tokens.is_exhausted()
    }

    fn statement(&mut self) -> Result<Statement> {
        let left = self.logical()?;
        self.statement_extension(left)
    }

    fn statement_extension(&mut self, left: Statement) -> Result<Statement> {
        let token = self.tokens.next()?;
        match token.kind {
            TokenKind::Newline | TokenKind::EndOfInput => Ok(left),
            TokenKind::Semi => match self.tokens.peek_kind()? {
                TokenKind::Newline | TokenKind::EndOfInput => {
                    self.tokens.next()?;
                    Ok(Statement::sequential(left, None))
                }
                _ => {
                    let right = self.statement()?;
                    Ok(Statement::sequential(left, Some(right)))
                }
            },
            _ => Err(unexpected(&token, "';' or newline")),
        }
    }

    /// A parenthesized scope, ended by `)` which the caller consumes.
    fn inner_statement(&mut self) -> Result<Statement> {
        self.skip_newlines()?;
        let left = self.logical()?;
        self.inner_statement_extension(left)
    }

    fn inner_statement_extension(&mut self, left: Statement) -> Result<Statement> {
        let token = self.tokens.peek()?.clone();
        match token.kind {
            TokenKind::RParen => Ok(left),
            TokenKind::Semi | TokenKind::Newline => {
                self.tokens.next()?;
                self.skip_newlines()?;
                if self.tokens.peek_kind()? == TokenKind::RParen {
                    return Ok(left);
                }
                let right = self.inner_statement()?;
                Ok(Statement::sequential(left, Some(right)))
            }
            _ => Err(unexpected(&token, "')'")),
        }
    }

    fn logical(&mut self) -> Result<Statement> {
        let mut left = self.pipeline()?;
        loop {
            let kind = self.tokens.peek_kind()?;
            if kind != TokenKind::And && kind != TokenKind::Or {
                return Ok(left);
            }
            self.tokens.next()?;
            self.skip_newlines()?;
            let right = Box::new(self.pipeline()?);
            left = if kind == TokenKind::And {
                Statement::LogicalAnd(Box::new(left), right)
            } else {
                Statement::LogicalOr(Box::new(left), right)
            };
        }
    }

    fn pipeline(&mut self) -> Result<Statement> {
        let left = self.redirection_chain()?;
        if self.tokens.peek_kind()? != TokenKind::Pipe {
            return Ok(left);
        }
        self.tokens.next()?;
        self.skip_newlines()?;
        let right = self.pipeline()?;
        Ok(Statement::Pipeline(Box::new(left), Box::new(right)))
    }

    fn redirection_chain(&mut self) -> Result<Statement> {
        let mut left = if self.tokens.peek_kind()?.is_redirection() {
            None
        } else {
            Some(self.operand()?)
        };
        while self.tokens.peek_kind()?.is_redirection() {
            left = Some(self.redirection(left)?);
        }
        match left {
            Some(statement) => Ok(statement),
            None => Err(ShellError::argument(
                "redirection chain ended without an operand",
            )),
        }
    }

    fn operand(&mut self) -> Result<Statement> {
        let token = self.tokens.next()?;
        match token.kind {
            TokenKind::Command | TokenKind::String => {
                self.tokens.push_back(token);
                self.expression().map(Statement::Atom)
            }
            TokenKind::Not => {
                let inner = self.operand()?;
                Ok(Statement::LogicalNot(Box::new(inner)))
            }
            TokenKind::LParen => {
                let inner = self.inner_statement()?;
                let closing = self.tokens.next()?;
                if closing.kind != TokenKind::RParen {
                    return Err(unexpected(&closing, "')'"));
                }
                Ok(inner)
            }
            _ => Err(unexpected(&token, "a command")),
        }
    }

    /// A head word plus every word directly following it.
    fn expression(&mut self) -> Result<Expression> {
        let head = self.tokens.next()?;
        let mut arguments = Vec::new();
        while self.tokens.peek_kind()?.is_word() {
            arguments.push(self.tokens.next()?);
        }
        if arguments.is_empty() {
            Ok(Expression::word(head))
        } else {
            Ok(Expression::Command(Invocation::new(head, arguments)))
        }
    }

    fn redirection(&mut self, left: Option<Statement>) -> Result<Statement> {
        let token = self.tokens.next()?;
        let redirection = match token.kind {
            TokenKind::OverwriteRedir | TokenKind::AppendRedir => {
                let (fd, append) = output_operator(&token.text)
                    .ok_or_else(|| unexpected(&token, "a redirection operator"))?;
                let fd = fd.map(Expression::Value);
                let target = self.target()?;
                if append {
                    Redirection::Append { fd, target }
                } else {
                    Redirection::Overwrite { fd, target }
                }
            }
            TokenKind::MergeOutput => Redirection::MergeOutput {
                target: self.target()?,
            },
            TokenKind::MergeAppend => Redirection::MergeAppend {
                target: self.target()?,
            },
            TokenKind::MergeStream => {
                let (source, destination) = stream_operator(&token.text)
                    .ok_or_else(|| unexpected(&token, "a redirection operator"))?;
                Redirection::MergeStream {
                    source: Expression::Value(source.unwrap_or(UNSPECIFIED)),
                    destination: Expression::Value(destination.unwrap_or(UNSPECIFIED)),
                }
            }
            TokenKind::StdinRedir => Redirection::Stdin {
                target: self.target()?,
            },
            _ => return Err(unexpected(&token, "a redirection operator")),
        };
        Ok(Statement::redirect(redirection, left))
    }

    fn target(&mut self) -> Result<Expression> {
        let token = self.tokens.next()?;
        if token.kind.is_word() {
            Ok(Expression::word(token))
        } else {
            Err(unexpected(&token, "a file name"))
        }
    }

    fn skip_newlines(&mut self) -> Result<()> {
        while self.tokens.peek_kind()? == TokenKind::Newline {
            self.tokens.next()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::syntax::ast::StatementKind;
    use crate::shell::syntax::lexer::Lexer;
    use crate::shell::syntax::source::CharSource;
    use std::io::Cursor;

    fn parser(input: &str) -> Parser<Cursor<Vec<u8>>> {
        let source = CharSource::new(Cursor::new(input.as_bytes().to_vec()));
        Parser::new(TokenStream::new(Lexer::new(source)))
    }

    fn parse(input: &str) -> String {
        parser(input).parse().unwrap().unwrap().to_string()
    }

    fn syntax_error(input: &str) -> SyntaxError {
        match parser(input).parse() {
            Err(ShellError::Syntax(error)) => error,
            other => panic!("expected a syntax error for {:?}, got {:?}", input, other),
        }
    }

    #[test]
    fn commands_take_following_words_as_arguments() {
        assert_eq!(parse("ls -la /tmp"), "[ls -la /tmp]");
        assert_eq!(parse("echo \"a b\" c"), "[echo \"a b\" c]");
    }

    #[test]
    fn lone_string_stays_a_string() {
        let statement = parser("\"hello\"").parse().unwrap().unwrap();
        match statement {
            Statement::Atom(Expression::String(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
        let statement = parser("\"echo\" hi").parse().unwrap().unwrap();
        match statement {
            Statement::Atom(Expression::Command(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn pipe_binds_tighter_than_logical_connectors() {
        assert_eq!(parse("a | b && c"), "(&& (| [a] [b]) [c])");
        assert_eq!(parse("a && b | c"), "(&& [a] (| [b] [c]))");
        assert_eq!(parse("a | b | c"), "(| [a] (| [b] [c]))");
    }

    #[test]
    fn logical_connectors_are_left_associative() {
        assert_eq!(parse("a && b || c"), "(|| (&& [a] [b]) [c])");
        assert_eq!(parse("a || b && c"), "(&& (|| [a] [b]) [c])");
    }

    #[test]
    fn semicolons_chain_to_the_right() {
        assert_eq!(parse("a; b; c"), "(; [a] (; [b] [c]))");
        assert_eq!(parse("a;"), "(; [a])");
        assert_eq!(parse("a && b; c"), "(; (&& [a] [b]) [c])");
    }

    #[test]
    fn negation_applies_to_one_operand() {
        assert_eq!(parse("! a && b"), "(&& (! [a]) [b])");
        assert_eq!(parse("! (a && b)"), "(! (&& [a] [b]))");
        assert_eq!(parse("! ! a"), "(! (! [a]))");
    }

    #[test]
    fn groups_nest_statements() {
        assert_eq!(parse("(a || b) && c"), "(&& (|| [a] [b]) [c])");
        assert_eq!(parse("(a; b) | c"), "(| (; [a] [b]) [c])");
        assert_eq!(parse("(a;)"), "[a]");
        assert_eq!(parse("(\na\nb\n)"), "(; [a] [b])");
    }

    #[test]
    fn redirections_wrap_left_to_right() {
        assert_eq!(parse("cmd > out"), "(> [cmd] [out])");
        assert_eq!(parse("cmd 2>> log"), "(2>> [cmd] [log])");
        assert_eq!(parse("cmd > file >&2"), "(>&2 (> [cmd] [file]))");
        assert_eq!(parse("cmd < in > out"), "(> (< [cmd] [in]) [out])");
        assert_eq!(parse("(a; b) &> all"), "(&> (; [a] [b]) [all])");
        assert_eq!(parse("a 2>&1 | b"), "(| (2>&1 [a]) [b])");
    }

    #[test]
    fn redirection_without_a_command() {
        assert_eq!(parse("> empty"), "(> _ [empty])");
    }

    #[test]
    fn string_targets_keep_their_kind() {
        assert_eq!(parse("cmd > \"my file\""), "(> [cmd] \"my file\")");
    }

    #[test]
    fn merge_stream_descriptors_default_to_unspecified() {
        let statement = parser("cmd >&").parse().unwrap().unwrap();
        assert_eq!(statement.kind(), StatementKind::MergeStream);
        match statement {
            Statement::Redirect {
                redirection:
                    Redirection::MergeStream {
                        source,
                        destination,
                    },
                ..
            } => {
                assert_eq!(source, Expression::Value(UNSPECIFIED));
                assert_eq!(destination, Expression::Value(UNSPECIFIED));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn newlines_may_follow_connectors() {
        assert_eq!(parse("a &&\nb"), "(&& [a] [b])");
        assert_eq!(parse("a |\n\nb"), "(| [a] [b])");
    }

    #[test]
    fn statements_are_parsed_one_at_a_time() {
        let mut parser = parser("\n\na\n;b\n");
        assert_eq!(parser.parse().unwrap().unwrap().to_string(), "[a]");
        assert_eq!(parser.parse().unwrap().unwrap().to_string(), "[b]");
        assert!(parser.parse().unwrap().is_none());
        assert!(parser.is_exhausted());
        assert!(parser.parse().unwrap().is_none());
    }

    #[test]
    fn syntax_errors_name_what_was_found() {
        let error = syntax_error("a && && b");
        assert_eq!(error.found, TokenKind::And);
        assert_eq!(error.expected, "a command");

        let error = syntax_error("cmd >");
        assert_eq!(error.found, TokenKind::EndOfInput);
        assert_eq!(error.expected, "a file name");

        let error = syntax_error("(a");
        assert_eq!(error.found, TokenKind::EndOfInput);

        let error = syntax_error("a )");
        assert_eq!(error.found, TokenKind::RParen);
        assert_eq!(error.position.column, 3);
    }

    #[test]
    fn discard_recovers_on_the_next_line() {
        let mut parser = parser("a ) b\nc\n");
        assert!(parser.parse().is_err());
        parser.discard();
        assert_eq!(parser.parse().unwrap().unwrap().to_string(), "[c]");
    }
}
