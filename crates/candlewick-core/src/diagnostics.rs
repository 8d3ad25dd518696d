//! Write-only diagnostics sink handed to each pipeline component.
//!
//! Components report what happened through a [`DiagnosticSink`] they receive at
//! construction. [`TracingSink`] forwards to `tracing`; [`MemorySink`] keeps
//! events for inspection.

use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};

use serde::Serialize;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

/// Pipeline stage a diagnostic originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Run,
    Fetch,
    Parse,
    Store,
}

impl Stage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::Fetch => "fetch",
            Self::Parse => "parse",
            Self::Store => "store",
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structured diagnostic event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub level: Level,
    pub stage: Stage,
    pub symbol: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(level: Level, stage: Stage, message: impl Into<String>) -> Self {
        Self {
            level,
            stage,
            symbol: None,
            message: message.into(),
        }
    }

    pub fn debug(stage: Stage, message: impl Into<String>) -> Self {
        Self::new(Level::Debug, stage, message)
    }

    pub fn info(stage: Stage, message: impl Into<String>) -> Self {
        Self::new(Level::Info, stage, message)
    }

    pub fn warn(stage: Stage, message: impl Into<String>) -> Self {
        Self::new(Level::Warn, stage, message)
    }

    pub fn error(stage: Stage, message: impl Into<String>) -> Self {
        Self::new(Level::Error, stage, message)
    }

    pub fn for_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }
}

/// Destination for diagnostics. Implementations must not influence control flow.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to the `tracing` subscriber installed by the host process.
#[derive(Debug, Clone, Default)]
pub struct TracingSink {
    run_id: Option<String>,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag every event with a run identifier.
    pub fn with_run_id(run_id: impl Into<String>) -> Self {
        Self {
            run_id: Some(run_id.into()),
        }
    }
}

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        let stage = diagnostic.stage.as_str();
        let symbol = diagnostic.symbol.as_deref().unwrap_or("-");
        let run_id = self.run_id.as_deref().unwrap_or("-");
        let message = diagnostic.message.as_str();

        match diagnostic.level {
            Level::Debug => tracing::debug!(stage, symbol, run_id, "{message}"),
            Level::Info => tracing::info!(stage, symbol, run_id, "{message}"),
            Level::Warn => tracing::warn!(stage, symbol, run_id, "{message}"),
            Level::Error => tracing::error!(stage, symbol, run_id, "{message}"),
        }
    }
}

/// Keeps every diagnostic in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<Diagnostic>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Diagnostic> {
        self.events
            .lock()
            .expect("diagnostic store should not be poisoned")
            .clone()
    }

    /// Events at `level` raised by `stage`.
    pub fn filtered(&self, stage: Stage, level: Level) -> Vec<Diagnostic> {
        self.events()
            .into_iter()
            .filter(|event| event.stage == stage && event.level == level)
            .collect()
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, diagnostic: Diagnostic) {
        self.events
            .lock()
            .expect("diagnostic store should not be poisoned")
            .push(diagnostic);
    }
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn emit(&self, _diagnostic: Diagnostic) {}
}
