use std::io::{self, Write};

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use termion::color;

use super::config::Config;

/// Writes every record to stderr as `<name>: <message>`.
pub struct ShellLogger {
    name: String,
    color: bool,
    level: LevelFilter,
}

impl ShellLogger {
    pub fn new(config: &Config) -> Self {
        ShellLogger {
            name: config.name.clone(),
            color: config.color && termion::is_tty(&io::stderr()),
            level: config.level,
        }
    }

    pub fn install(self) -> Result<(), SetLoggerError> {
        let level = self.level;
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(level);
        Ok(())
    }

    fn format(&self, record: &Record) -> String {
        if !self.color {
            return format!("{}: {}", self.name, record.args());
        }
        let prefix = match record.level() {
            Level::Error => format!("{}{}", color::Fg(color::Red), self.name),
            Level::Warn => format!("{}{}", color::Fg(color::Yellow), self.name),
            _ => format!("{}{}", color::Fg(color::Reset), self.name),
        };
        format!("{}{}: {}", prefix, color::Fg(color::Reset), record.args())
    }
}

impl Log for ShellLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let _ = writeln!(io::stderr(), "{}", self.format(record));
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logger(color: bool) -> ShellLogger {
        ShellLogger {
            name: String::from("parsnip"),
            color,
            level: LevelFilter::Warn,
        }
    }

    #[test]
    fn plain_records_carry_the_shell_name() {
        let line = logger(false).format(
            &Record::builder()
                .args(format_args!("nope: command not found"))
                .level(Level::Error)
                .build(),
        );
        assert_eq!(line, "parsnip: nope: command not found");
    }

    #[test]
    fn colored_errors_are_red() {
        let line = logger(true).format(
            &Record::builder()
                .args(format_args!("boom"))
                .level(Level::Error)
                .build(),
        );
        assert!(line.starts_with(&color::Fg(color::Red).to_string()));
        assert!(line.ends_with(": boom"));
    }

    #[test]
    fn levels_above_the_threshold_are_dropped() {
        let logger = logger(false);
        let debug = Metadata::builder().level(Level::Debug).build();
        let error = Metadata::builder().level(Level::Error).build();
        assert!(!logger.enabled(&debug));
        assert!(logger.enabled(&error));
    }
}
