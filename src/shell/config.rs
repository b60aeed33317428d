use std::io;

use log::LevelFilter;

/// Settings the shell is started with. Built once in `main` and handed to
/// the pieces that need it.
#[derive(Debug, Clone)]
pub struct Config {
    /// Prefix of every diagnostic.
    pub name: String,
    pub prompt: String,
    pub color: bool,
    pub level: LevelFilter,
    /// Prompt for input and ignore terminal signals in the shell itself.
    pub interactive: bool,
}

impl Config {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Config {
            prompt: format!("{}$ ", name),
            name,
            color: true,
            level: LevelFilter::Warn,
            interactive: termion::is_tty(&io::stdin()),
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn quiet(mut self) -> Self {
        self.level = LevelFilter::Error;
        self
    }

    pub fn verbose(mut self) -> Self {
        self.level = LevelFilter::Debug;
        self
    }

    pub fn without_color(mut self) -> Self {
        self.color = false;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new("parsnip")
    }
}
