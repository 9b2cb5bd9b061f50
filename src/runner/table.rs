//! Per-run status table, built by folding log events.
//!
//! The same [`RunStatusTable::apply`] drives both the live coordinator (for
//! the markers it emits) and log replay (for the markers it reads back), so
//! the two can never disagree about what a sequence of markers means.

use std::collections::HashMap;

use crate::logstream::LogEvent;

/// State of a step that has been attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    /// START seen, no terminal marker yet.
    Running,
    /// OK seen.
    Passed,
    /// ERROR seen with this code.
    Failed(i32),
}

/// Answer to a status lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepQuery {
    /// The step was never attempted.
    Unknown,
    /// The step has started but not finished.
    Running,
    /// The step passed.
    Pass,
    /// The step failed with this code.
    Error(i32),
}

/// Mapping from step name to its state within one run.
///
/// Every attempted step has exactly one entry. A second START for the same
/// name replaces the earlier attempt's state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStatusTable {
    entries: HashMap<String, StepState>,
    order: Vec<String>,
}

impl RunStatusTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the table. Non-step events are ignored.
    pub fn apply(&mut self, event: &LogEvent) {
        let (step, state) = match event {
            LogEvent::StepStart { step } => (step, StepState::Running),
            LogEvent::StepOk { step } => (step, StepState::Passed),
            LogEvent::StepError { step, code } => (step, StepState::Failed(*code)),
            _ => return,
        };

        if !self.entries.contains_key(step) {
            self.order.push(step.clone());
        }
        self.entries.insert(step.clone(), state);
    }

    /// Fold a sequence of events.
    pub fn apply_all<'e>(&mut self, events: impl IntoIterator<Item = &'e LogEvent>) {
        for event in events {
            self.apply(event);
        }
    }

    /// Look up a step by name.
    pub fn get(&self, name: &str) -> StepQuery {
        match self.entries.get(name) {
            None => StepQuery::Unknown,
            Some(StepState::Running) => StepQuery::Running,
            Some(StepState::Passed) => StepQuery::Pass,
            Some(StepState::Failed(code)) => StepQuery::Error(*code),
        }
    }

    /// Attempted step names in the order they first started.
    pub fn attempted(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of attempted steps.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no step has been attempted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
