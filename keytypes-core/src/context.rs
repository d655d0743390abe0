//! Compilation context: atom table, log gating and recorded diagnostics

use std::env;
use std::fmt;

use log::{Level, LevelFilter};

use crate::types::atom::{Atom, AtomTable};

/// Environment variable selecting the lowest surfaced severity
pub const LOG_LEVEL_ENV: &str = "XKB_LOG_LEVEL";
/// Environment variable selecting the verbosity of `vrb` messages
pub const LOG_VERBOSITY_ENV: &str = "XKB_LOG_VERBOSITY";

pub const MAX_VERBOSITY: i32 = 10;

/// A message that passed the level and verbosity gates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub verbosity: i32,
    pub message: String,
}

#[derive(Debug)]
pub struct Context {
    atoms: AtomTable,
    log_level: LevelFilter,
    verbosity: i32,
    diagnostics: Vec<Diagnostic>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    pub fn new() -> Self {
        Self {
            atoms: AtomTable::new(),
            log_level: LevelFilter::Error,
            verbosity: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Builds a context configured from `XKB_LOG_LEVEL` and
    /// `XKB_LOG_VERBOSITY`
    pub fn from_env() -> Self {
        let mut ctx = Self::new();

        if let Ok(value) = env::var(LOG_LEVEL_ENV) {
            match parse_log_level(&value) {
                Some(level) => ctx.log_level = level,
                None => log::warn!(
                    target: "keytypes",
                    "Ignoring invalid {} value \"{}\"",
                    LOG_LEVEL_ENV,
                    value
                ),
            }
        }

        if let Ok(value) = env::var(LOG_VERBOSITY_ENV) {
            match value.trim().parse::<i32>() {
                Ok(verbosity) => ctx.verbosity = verbosity.clamp(0, MAX_VERBOSITY),
                Err(_) => log::warn!(
                    target: "keytypes",
                    "Ignoring invalid {} value \"{}\"",
                    LOG_VERBOSITY_ENV,
                    value
                ),
            }
        }

        ctx
    }

    pub fn with_log_level(mut self, level: LevelFilter) -> Self {
        self.log_level = level;
        self
    }

    pub fn with_verbosity(mut self, verbosity: i32) -> Self {
        self.verbosity = verbosity.clamp(0, MAX_VERBOSITY);
        self
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn verbosity(&self) -> i32 {
        self.verbosity
    }

    pub fn atoms(&self) -> &AtomTable {
        &self.atoms
    }

    pub fn atoms_mut(&mut self) -> &mut AtomTable {
        &mut self.atoms
    }

    pub fn intern(&mut self, text: &str) -> Atom {
        self.atoms.intern(text)
    }

    pub fn atom_text(&self, atom: Atom) -> &str {
        self.atoms.text(atom)
    }

    /// Surfaces a message when `level` passes the configured filter and
    /// `verbosity` does not exceed the configured verbosity.
    pub fn emit(&mut self, level: Level, verbosity: i32, args: fmt::Arguments<'_>) {
        if level > self.log_level || verbosity > self.verbosity {
            return;
        }
        let message = args.to_string();
        log::log!(target: "keytypes", level, "{}", message);
        self.diagnostics.push(Diagnostic {
            level,
            verbosity,
            message,
        });
    }

    pub fn error(&mut self, args: fmt::Arguments<'_>) {
        self.emit(Level::Error, 0, args);
    }

    pub fn warn(&mut self, args: fmt::Arguments<'_>) {
        self.emit(Level::Warn, 0, args);
    }

    pub fn info(&mut self, args: fmt::Arguments<'_>) {
        self.emit(Level::Info, 0, args);
    }

    /// Warning shown only at verbosity `verbosity` or above
    pub fn vrb(&mut self, verbosity: i32, args: fmt::Arguments<'_>) {
        self.emit(Level::Warn, verbosity, args);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

fn parse_log_level(value: &str) -> Option<LevelFilter> {
    let value = value.trim();
    if let Ok(num) = value.parse::<u8>() {
        // syslog priorities
        return Some(match num {
            0..=3 => LevelFilter::Error,
            4 => LevelFilter::Warn,
            5 | 6 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        });
    }

    match value.to_ascii_lowercase().as_str() {
        "crit" | "critical" | "err" | "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        _ => None,
    }
}
