#[macro_use]
extern crate log;

use std::io::{self, Write};
use std::process;

use argh::FromArgs;

use parsnip::shell::logger::ShellLogger;
use parsnip::shell::process::signals;
use parsnip::shell::{Config, Shell};

/// A small shell reading statements from standard input.
#[derive(FromArgs)]
struct Args {
    /// report errors only
    #[argh(switch, short = 'q')]
    quiet: bool,

    /// also report what the shell is doing
    #[argh(switch, short = 'v')]
    verbose: bool,

    /// never color diagnostics
    #[argh(switch)]
    no_color: bool,

    /// prompt printed before each line when reading from a terminal
    #[argh(option)]
    prompt: Option<String>,
}

impl Args {
    fn into_config(self) -> Config {
        let mut config = Config::new(env!("CARGO_PKG_NAME"));
        if self.quiet {
            config = config.quiet();
        }
        if self.verbose {
            config = config.verbose();
        }
        if self.no_color {
            config = config.without_color();
        }
        if let Some(prompt) = self.prompt {
            config = config.with_prompt(prompt);
        }
        config
    }
}

fn main() {
    let config = argh::from_env::<Args>().into_config();
    if let Err(error) = ShellLogger::new(&config).install() {
        eprintln!("{}: {}", config.name, error);
    }
    if config.interactive {
        if let Err(error) = signals::ignore_interactive() {
            error!("{}", error);
        }
    }

    let stdin = io::stdin();
    let code = Shell::new(&config, stdin.lock()).run();
    let _ = io::stdout().flush();
    process::exit(code);
}
