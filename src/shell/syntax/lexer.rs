use std::io::BufRead;

use super::source::CharSource;
use super::tokens::{Token, TokenKind};
use crate::shell::error::{Result, ShellError, TokenError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Done,
    InComment,
    InCommand,
    InNumberLike,
    InString,
    InAnd,
    InMergeOutput,
    InMergeStream,
    InPipeLike,
    InRightArrow,
    Error,
}

/// Characters that can never be part of a command token.
const RESERVED: &[char] = &[
    ' ', '&', '|', '!', '<', '>', '"', '\'', ';', ':', '(', ')', '^', '%', '#',
];

fn is_command_char(c: char) -> bool {
    !c.is_whitespace() && !RESERVED.contains(&c)
}

/// Finite-state lexer producing one token per call to [`Lexer::next`].
pub struct Lexer<R> {
    source: CharSource<R>,
    /// The last token was ended by the end marker, which must not be peeked
    /// a second time.
    ended_by_marker: bool,
}

impl<R: BufRead> Lexer<R> {
    pub fn new(source: CharSource<R>) -> Self {
        Lexer {
            source,
            ended_by_marker: false,
        }
    }

    /// Discards the unconsumed remainder of the current input line.
    pub fn clear(&mut self) {
        self.source.clear();
    }

    pub fn next(&mut self) -> Result<Token> {
        if self.ended_by_marker {
            self.ended_by_marker = false;
            return Ok(Token::new(
                TokenKind::EndOfInput,
                String::new(),
                self.source.position(),
            ));
        }

        let mut state = State::Start;
        let mut kind = None;
        let mut text = String::new();
        let mut position = self.source.position();
        let mut found = None;
        let mut expected = "";
        let mut symbol = None;

        while state != State::Done && state != State::Error {
            symbol = self.source.peek()?;
            state = match state {
                State::Start => {
                    position = self.source.position();
                    match symbol {
                        None => {
                            self.source.consume();
                            kind = Some(TokenKind::EndOfInput);
                            State::Done
                        }
                        Some('\n') => {
                            self.source.consume();
                            text.push('\n');
                            kind = Some(TokenKind::Newline);
                            State::Done
                        }
                        Some(c) if c.is_whitespace() => {
                            self.source.consume();
                            State::Start
                        }
                        Some('#') => {
                            self.source.consume();
                            State::InComment
                        }
                        Some('"') => {
                            self.source.consume();
                            State::InString
                        }
                        Some(c @ '&') | Some(c @ '|') | Some(c @ '>') => {
                            self.source.consume();
                            text.push(c);
                            match c {
                                '&' => State::InAnd,
                                '|' => State::InPipeLike,
                                _ => State::InRightArrow,
                            }
                        }
                        Some(c @ '<') | Some(c @ '!') | Some(c @ ';') | Some(c @ '(')
                        | Some(c @ ')') => {
                            self.source.consume();
                            text.push(c);
                            kind = Some(match c {
                                '<' => TokenKind::StdinRedir,
                                '!' => TokenKind::Not,
                                ';' => TokenKind::Semi,
                                '(' => TokenKind::LParen,
                                _ => TokenKind::RParen,
                            });
                            State::Done
                        }
                        Some(c) if c.is_ascii_digit() => {
                            self.source.consume();
                            text.push(c);
                            State::InNumberLike
                        }
                        Some(c) if is_command_char(c) => {
                            self.source.consume();
                            text.push(c);
                            State::InCommand
                        }
                        Some(c) => {
                            found = Some(c);
                            expected = "a command character";
                            State::Error
                        }
                    }
                }
                State::InComment => match symbol {
                    None => {
                        self.source.consume();
                        kind = Some(TokenKind::EndOfInput);
                        State::Done
                    }
                    Some('\n') => {
                        self.source.consume();
                        text.push('\n');
                        kind = Some(TokenKind::Newline);
                        State::Done
                    }
                    Some(_) => {
                        self.source.consume();
                        State::InComment
                    }
                },
                State::InCommand => match symbol {
                    Some(c) if is_command_char(c) => {
                        self.source.consume();
                        text.push(c);
                        State::InCommand
                    }
                    _ => {
                        kind = Some(TokenKind::Command);
                        State::Done
                    }
                },
                State::InNumberLike => match symbol {
                    Some(c) if c.is_ascii_digit() => {
                        self.source.consume();
                        text.push(c);
                        State::InNumberLike
                    }
                    Some('>') => {
                        self.source.consume();
                        text.push('>');
                        State::InRightArrow
                    }
                    Some('&') => {
                        self.source.consume();
                        text.push('&');
                        State::InAnd
                    }
                    Some(c) if is_command_char(c) => {
                        self.source.consume();
                        text.push(c);
                        State::InCommand
                    }
                    _ => {
                        kind = Some(TokenKind::Command);
                        State::Done
                    }
                },
                State::InString => match symbol {
                    Some('"') => {
                        self.source.consume();
                        kind = Some(TokenKind::String);
                        State::Done
                    }
                    Some('\n') | None => {
                        found = symbol;
                        expected = "a closing '\"'";
                        State::Error
                    }
                    Some(c) => {
                        self.source.consume();
                        text.push(c);
                        State::InString
                    }
                },
                State::InAnd => match symbol {
                    Some('&') => {
                        self.source.consume();
                        text.push('&');
                        kind = Some(TokenKind::And);
                        State::Done
                    }
                    Some('>') => {
                        self.source.consume();
                        text.push('>');
                        State::InMergeOutput
                    }
                    _ => {
                        found = symbol;
                        expected = "'&' or '>'";
                        State::Error
                    }
                },
                State::InMergeOutput => match symbol {
                    Some('>') => {
                        self.source.consume();
                        text.push('>');
                        kind = Some(TokenKind::MergeAppend);
                        State::Done
                    }
                    _ => {
                        kind = Some(TokenKind::MergeOutput);
                        State::Done
                    }
                },
                State::InPipeLike => match symbol {
                    Some('|') => {
                        self.source.consume();
                        text.push('|');
                        kind = Some(TokenKind::Or);
                        State::Done
                    }
                    _ => {
                        kind = Some(TokenKind::Pipe);
                        State::Done
                    }
                },
                State::InRightArrow => match symbol {
                    Some('>') => {
                        self.source.consume();
                        text.push('>');
                        kind = Some(TokenKind::AppendRedir);
                        State::Done
                    }
                    Some('&') => {
                        self.source.consume();
                        text.push('&');
                        State::InMergeStream
                    }
                    _ => {
                        kind = Some(TokenKind::OverwriteRedir);
                        State::Done
                    }
                },
                State::InMergeStream => match symbol {
                    Some(c) if c.is_ascii_digit() => {
                        self.source.consume();
                        text.push(c);
                        State::InMergeStream
                    }
                    _ => {
                        kind = Some(TokenKind::MergeStream);
                        State::Done
                    }
                },
                State::Done | State::Error => state,
            };
        }

        if state == State::Error {
            return Err(ShellError::Token(TokenError {
                position: self.source.position(),
                found,
                expected,
            }));
        }
        if symbol.is_none() && kind != Some(TokenKind::EndOfInput) {
            self.ended_by_marker = true;
        }
        match kind {
            Some(kind) => Ok(Token::new(kind, text, position)),
            None => Err(ShellError::argument(
                "lexer reached a final state without recognizing a token",
            )),
        }
    }
}
