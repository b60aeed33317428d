use std::io::BufRead;

use super::lexer::Lexer;
use super::tokens::{Token, TokenKind};
use crate::shell::error::Result;

/// One token of lookahead and pushback over the lexer.
pub struct TokenStream<R> {
    lexer: Lexer<R>,
    lookahead: Option<Token>,
    exhausted: bool,
}

impl<R: BufRead> TokenStream<R> {
    pub fn new(lexer: Lexer<R>) -> Self {
        TokenStream {
            lexer,
            lookahead: None,
            exhausted: false,
        }
    }

    pub fn peek(&mut self) -> Result<&Token> {
        let token = match self.lookahead.take() {
            Some(token) => token,
            None => self.lexer.next()?,
        };
        Ok(self.lookahead.get_or_insert(token))
    }

    pub fn peek_kind(&mut self) -> Result<TokenKind> {
        self.peek().map(|token| token.kind)
    }

    pub fn next(&mut self) -> Result<Token> {
        let token = match self.lookahead.take() {
            Some(token) => token,
            None => self.lexer.next()?,
        };
        if token.kind == TokenKind::EndOfInput {
            self.exhausted = true;
        }
        Ok(token)
    }

    /// Puts `token` back so the next `peek`/`next` returns it.
    pub fn push_back(&mut self, token: Token) {
        if token.kind == TokenKind::EndOfInput {
            self.exhausted = false;
        }
        self.lookahead = Some(token);
    }

    /// True once the end-of-input token has been handed out.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Forgets the lookahead and the rest of the current line.
    pub fn clear(&mut self) {
        if let Some(token) = self.lookahead.take() {
            if token.kind == TokenKind::EndOfInput {
                self.push_back(token);
                return;
            }
        }
        self.lexer.clear();
    }
}
