//! Fork, pipe and signal plumbing shared by the interpreter.

pub mod guard;
pub mod pipe;
pub mod signals;

pub use self::guard::ProcessGuard;
pub use self::pipe::Pipe;
