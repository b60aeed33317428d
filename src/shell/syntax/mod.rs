pub mod ast;
pub mod lexer;
pub mod parser;
pub mod redirect;
pub mod source;
pub mod stream;
pub mod tokens;

pub use self::ast::{Expression, Invocation, Redirection, Statement, StatementKind};
pub use self::parser::Parser;
