use std::io::BufRead;

pub mod config;
pub mod error;
pub mod interpreter;
pub mod logger;
pub mod process;
pub mod state;
pub mod syntax;

pub use self::config::Config;

use self::error::{ShellError, SourceError, Unwind};
use self::interpreter::Interpreter;
use self::state::ShellState;
use self::syntax::lexer::Lexer;
use self::syntax::source::CharSource;
use self::syntax::stream::TokenStream;
use self::syntax::Parser;

/// The read-eval loop: parses one statement at a time and evaluates it.
pub struct Shell<R> {
    state: ShellState,
    parser: Parser<R>,
}

impl<R: BufRead> Shell<R> {
    pub fn new(config: &Config, input: R) -> Self {
        let mut source = CharSource::new(input);
        if config.interactive {
            source = source.with_prompt(config.prompt.clone());
        }
        Shell {
            state: ShellState::new(config.interactive),
            parser: Parser::new(TokenStream::new(Lexer::new(source))),
        }
    }

    /// Runs until end of input or `exit`; returns the process exit status.
    pub fn run(&mut self) -> i32 {
        let mut interpreter = Interpreter::new(&self.state);
        let mut status = 0;
        loop {
            let mut statement = match self.parser.parse() {
                Ok(Some(statement)) => statement,
                Ok(None) => return status,
                Err(ShellError::Source(SourceError::StreamClosed)) => return status,
                Err(ShellError::Source(error)) => {
                    error!("{}", error);
                    return 1;
                }
                Err(error) => {
                    error!("{}", error);
                    self.parser.discard();
                    status = 1;
                    continue;
                }
            };
            debug!("parsed {}", statement);
            match interpreter.evaluate(&mut statement) {
                Ok(_) => status = interpreter.status(),
                Err(Unwind::Terminate(code)) => return code,
                Err(Unwind::Failed(error)) => {
                    error!("{}", error);
                    status = 1;
                }
            }
        }
    }
}
