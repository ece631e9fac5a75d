//! Logging setup: env_logger behind the `log` facade, bridged through
//! indicatif in TTY mode so log lines do not tear progress bars.

use indicatif::MultiProgress;

/// Console verbosity chosen on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Warnings and errors only
    Quiet,
    Normal,
    Debug,
}

impl Verbosity {
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if debug {
            Self::Debug
        } else if quiet {
            Self::Quiet
        } else {
            Self::Normal
        }
    }

    /// Default filter when `RUST_LOG` is unset. Columnar readers stay at
    /// `warn` unless debugging.
    fn default_filter(self) -> &'static str {
        match self {
            Self::Quiet => "warn",
            Self::Normal => "info,parquet=warn,arrow=warn",
            Self::Debug => "debug",
        }
    }
}

/// Padded level label, optionally wrapped in an ANSI color.
fn level_label(level: log::Level, color: bool) -> String {
    let (ansi, label) = match level {
        log::Level::Error => ("\x1b[31m", "ERROR"),
        log::Level::Warn => ("\x1b[33m", "WARN "),
        log::Level::Info => ("\x1b[32m", "INFO "),
        log::Level::Debug => ("\x1b[36m", "DEBUG"),
        log::Level::Trace => ("\x1b[35m", "TRACE"),
    };
    if color {
        format!("{ansi}{label}\x1b[0m")
    } else {
        label.to_string()
    }
}

/// Logger that prints through indicatif MultiProgress to avoid mixing with progress bars.
pub struct IndicatifLogger {
    inner: env_logger::Logger,
    multi: MultiProgress,
}

impl IndicatifLogger {
    pub fn new(inner: env_logger::Logger, multi: MultiProgress) -> Self {
        Self { inner, multi }
    }
}

impl log::Log for IndicatifLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &log::Record) {
        if !self.inner.enabled(record.metadata()) {
            return;
        }
        let line = format!("[{}] {}", level_label(record.level(), true), record.args());
        self.multi.suspend(|| eprintln!("{line}"));
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Install the global logger. Later calls keep the first logger and note
/// the refusal at debug level.
///
/// With `multi` (TTY) log lines are printed above the progress lines;
/// otherwise plain `[LEVEL] message` lines go to stderr. `RUST_LOG`
/// overrides the level derived from `quiet`/`debug`.
pub fn init_logging(quiet: bool, debug: bool, multi: Option<&MultiProgress>) {
    use std::io::Write;

    let verbosity = Verbosity::from_flags(quiet, debug);
    let env = env_logger::Env::default().default_filter_or(verbosity.default_filter());
    let mut builder = env_logger::Builder::from_env(env);

    match multi {
        Some(multi) => {
            let logger = builder.build();
            let max_level = logger.filter();
            let bridged = IndicatifLogger::new(logger, multi.clone());
            match log::set_boxed_logger(Box::new(bridged)) {
                Ok(()) => log::set_max_level(max_level),
                Err(e) => log::debug!("logger already installed: {e}"),
            }
        }
        None => {
            let installed = builder
                .format(move |buf, record| {
                    let label = level_label(record.level(), false);
                    if verbosity == Verbosity::Debug {
                        writeln!(buf, "[{label}] {}: {}", record.target(), record.args())
                    } else {
                        writeln!(buf, "[{label}] {}", record.args())
                    }
                })
                .try_init();
            if let Err(e) = installed {
                log::debug!("logger already installed: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(true, false), Verbosity::Quiet);
        // --debug wins over quiet
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Debug);
    }

    #[test]
    fn normal_filter_silences_columnar_readers() {
        assert!(Verbosity::Normal.default_filter().contains("parquet=warn"));
        assert_eq!(Verbosity::Quiet.default_filter(), "warn");
    }

    #[test]
    fn plain_label_has_no_ansi() {
        assert_eq!(level_label(log::Level::Warn, false), "WARN ");
        assert_eq!(level_label(log::Level::Error, true), "\x1b[31mERROR\x1b[0m");
    }

    #[test]
    fn second_init_keeps_first_logger() {
        init_logging(true, false, None);
        let level = log::max_level();
        init_logging(false, true, None);
        assert_eq!(log::max_level(), level);
    }
}
