use nix::unistd::getpid;

use crate::shell::state::ShellState;
use crate::shell::syntax::ast::{Expression, Invocation};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Expands one word: `$$`, `$VERSION` and a leading `~` or `~/`.
///
/// `$$` is the pid of the process doing the expansion, so inside a forked
/// pipeline stage it names that stage.
pub fn expand_word(text: &str, state: &ShellState) -> String {
    let text = match state.home() {
        Some(home) if text == "~" => home.to_string_lossy().into_owned(),
        Some(home) if text.starts_with("~/") => {
            format!("{}{}", home.to_string_lossy(), &text[1..])
        }
        _ => text.to_owned(),
    };
    text.replace("$$", &getpid().to_string())
        .replace("$VERSION", VERSION)
}

pub fn expand_invocation(invocation: &mut Invocation, state: &ShellState) {
    for token in invocation.words_mut() {
        token.text = expand_word(&token.text, state);
    }
}

pub fn expand_expression(expression: &mut Expression, state: &ShellState) {
    match *expression {
        Expression::Command(ref mut invocation) | Expression::String(ref mut invocation) => {
            expand_invocation(invocation, state)
        }
        Expression::Value(_) => {}
    }
}
