//! Per-roll structured diagnostics.
//!
//! `RollLog` is handed explicitly to every stage that processes a roll. Each
//! diagnostic is written three ways: as a `tracing` event with roll and
//! exposure fields, as an [`Event::Diagnostic`] on the event channel, and into
//! the log's own list so the roll audit can be built without re-parsing logs.

use super::{Diagnostic, DiagnosticKind, Event, EventSender, Severity};
use crate::core::roll::RollId;

/// Collects diagnostics for a single roll.
pub struct RollLog {
    roll: RollId,
    events: EventSender,
    entries: Vec<Diagnostic>,
}

/// Exposure context attached to a diagnostic
#[derive(Debug, Clone, Copy, Default)]
pub struct Subject<'a> {
    pub file_name: Option<&'a str>,
    pub index: Option<u32>,
}

impl<'a> Subject<'a> {
    /// A diagnostic about the roll as a whole
    pub fn roll() -> Self {
        Self::default()
    }

    /// A diagnostic about a frame number rather than one file
    pub fn index(index: u32) -> Self {
        Self {
            file_name: None,
            index: Some(index),
        }
    }

    /// A diagnostic about one exposure file
    pub fn exposure(file_name: &'a str, index: Option<u32>) -> Self {
        Self {
            file_name: Some(file_name),
            index,
        }
    }
}

impl RollLog {
    pub fn new(roll: RollId, events: EventSender) -> Self {
        Self {
            roll,
            events,
            entries: Vec::new(),
        }
    }

    pub fn roll(&self) -> RollId {
        self.roll
    }

    pub fn events(&self) -> &EventSender {
        &self.events
    }

    pub fn info(&mut self, kind: DiagnosticKind, subject: Subject<'_>, message: impl Into<String>) {
        self.report(Severity::Info, kind, subject, message.into());
    }

    pub fn warn(&mut self, kind: DiagnosticKind, subject: Subject<'_>, message: impl Into<String>) {
        self.report(Severity::Warning, kind, subject, message.into());
    }

    pub fn error(&mut self, kind: DiagnosticKind, subject: Subject<'_>, message: impl Into<String>) {
        self.report(Severity::Error, kind, subject, message.into());
    }

    fn report(&mut self, severity: Severity, kind: DiagnosticKind, subject: Subject<'_>, message: String) {
        let roll = self.roll.0;
        let exposure = subject.file_name.unwrap_or("");
        let index = subject.index.map(i64::from).unwrap_or(-1);

        match severity {
            Severity::Info => {
                tracing::info!(roll, exposure, index, kind = %kind, "{}", message)
            }
            Severity::Warning => {
                tracing::warn!(roll, exposure, index, kind = %kind, "{}", message)
            }
            Severity::Error => {
                tracing::error!(roll, exposure, index, kind = %kind, "{}", message)
            }
        }

        let diagnostic = Diagnostic {
            severity,
            kind,
            roll: self.roll,
            exposure: subject.file_name.map(str::to_string),
            index: subject.index,
            message,
        };

        self.events.send(Event::Diagnostic(diagnostic.clone()));
        self.entries.push(diagnostic);
    }

    /// Diagnostics recorded so far
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Number of diagnostics of the given kind
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    /// Consume the log, returning its diagnostics
    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }
}
