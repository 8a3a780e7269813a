//! Deploy lifecycle events
//!
//! The deployer reports its progress through an [`EventSink`]. The CLI prints
//! events to the terminal; tests record them.

use std::sync::{Arc, Mutex};

use console::{Term, style};

/// Status change of a deploy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployEvent {
    InProgress,
    Complete,
    Failed(String),
    /// Non-fatal information about the deploy
    Info(String),
}

impl DeployEvent {
    fn symbol(&self) -> console::StyledObject<&'static str> {
        match self {
            DeployEvent::InProgress => style("◐").cyan(),
            DeployEvent::Complete => style("●").green(),
            DeployEvent::Failed(_) => style("✗").red(),
            DeployEvent::Info(_) => style("ℹ").yellow(),
        }
    }

    fn message(&self) -> String {
        match self {
            DeployEvent::InProgress => "Deploying".to_string(),
            DeployEvent::Complete => "Deploy complete".to_string(),
            DeployEvent::Failed(reason) => format!("Deploy failed: {}", reason),
            DeployEvent::Info(message) => message.clone(),
        }
    }
}

/// Receives deploy events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: DeployEvent);
}

/// Prints events to stderr
pub struct ConsoleEvents {
    term: Term,
}

impl ConsoleEvents {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }
}

impl Default for ConsoleEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for ConsoleEvents {
    fn emit(&self, event: DeployEvent) {
        let line = format!("{} {}", event.symbol(), event.message());
        if let Err(e) = self.term.write_line(&line) {
            tracing::debug!("unable to print deploy event: {}", e);
        }
    }
}

/// Keeps events in memory
#[derive(Clone, Default)]
pub struct RecordingEvents {
    events: Arc<Mutex<Vec<DeployEvent>>>,
}

impl RecordingEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events emitted so far, oldest first
    pub fn events(&self) -> Vec<DeployEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl EventSink for RecordingEvents {
    fn emit(&self, event: DeployEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Discards events
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEvents;

impl EventSink for NoEvents {
    fn emit(&self, _event: DeployEvent) {}
}
