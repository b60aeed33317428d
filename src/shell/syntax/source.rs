use std::io::{BufRead, Write};

use crate::shell::error::{Position, SourceError};

/// Line-buffered character input with one character of lookahead.
///
/// When the underlying reader is exhausted a synthetic end marker (`None`) is
/// produced once. Any `peek` after the marker was returned fails with
/// [`SourceError::StreamClosed`], so a lexer can never spin on a finished
/// stream.
///
/// Lines that are not valid UTF-8 are decoded lossily.
pub struct CharSource<R> {
    reader: R,
    line: Vec<char>,
    position: usize,
    line_number: usize,
    ended: bool,
    closed: bool,
    prompt: Option<String>,
}

impl<R: BufRead> CharSource<R> {
    pub fn new(reader: R) -> Self {
        CharSource {
            reader,
            line: Vec::new(),
            position: 0,
            line_number: 0,
            ended: false,
            closed: false,
            prompt: None,
        }
    }

    /// Prints `prompt` on stdout every time a new line is requested.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Returns the current character, or `None` for the end marker.
    pub fn peek(&mut self) -> Result<Option<char>, SourceError> {
        loop {
            if self.closed {
                return Err(SourceError::StreamClosed);
            }
            if let Some(&c) = self.line.get(self.position) {
                return Ok(Some(c));
            }
            if self.ended {
                self.closed = true;
                return Ok(None);
            }
            self.refill()?;
        }
    }

    pub fn consume(&mut self) {
        if self.position < self.line.len() {
            self.position += 1;
        }
    }

    /// Drops whatever is left of the buffered line.
    pub fn clear(&mut self) {
        self.line.clear();
        self.position = 0;
    }

    /// Position of the character `peek` would return.
    pub fn position(&self) -> Position {
        Position::new(self.line_number.max(1), self.position + 1)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn refill(&mut self) -> Result<(), SourceError> {
        if let Some(ref prompt) = self.prompt {
            let mut stdout = std::io::stdout();
            let _ = write!(stdout, "{}", prompt);
            let _ = stdout.flush();
        }
        let mut buffer = Vec::new();
        self.line.clear();
        self.position = 0;
        match self.reader.read_until(b'\n', &mut buffer) {
            Ok(0) => {
                self.ended = true;
                Ok(())
            }
            Ok(_) => {
                self.line_number += 1;
                self.line.extend(String::from_utf8_lossy(&buffer).chars());
                Ok(())
            }
            Err(error) => {
                self.ended = true;
                Err(SourceError::Io(error))
            }
        }
    }
}
