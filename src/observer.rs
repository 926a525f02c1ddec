use crate::schema::ColumnKind;
use crate::window::ReportWindow;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;

/// Report-worthy events surfaced by a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PipelineEvent {
    FetchStarted { source: String },
    FetchAttemptFailed { attempt: u32, max_attempts: u32, error: String },
    RowsFetched { count: usize },
    ColumnResolved { column: String, kind: ColumnKind },
    ColumnFellBack { column: String, rejected: Vec<ColumnKind>, kind: ColumnKind },
    WindowFiltered { window: ReportWindow, rows: usize },
    ReportComposed { window: ReportWindow, pages: usize },
    /// Text the PDF font cannot encode; the listed strings lose those characters.
    TextNotEncodable { window: ReportWindow, texts: Vec<String> },
    ReportWritten { window: ReportWindow, path: PathBuf },
    RunAborted { reason: String },
}

/// Sink for pipeline events, passed into the pipeline instead of global logger state.
pub trait RunObserver {
    fn on_event(&self, event: &PipelineEvent);
}

/// Forwards events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl RunObserver for LogObserver {
    fn on_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::FetchStarted { source } => info!("Fetching rows from {}", source),
            PipelineEvent::FetchAttemptFailed {
                attempt,
                max_attempts,
                error,
            } => warn!("Attempt {}/{} failed : {}", attempt, max_attempts, error),
            PipelineEvent::RowsFetched { count } => info!("Fetched {} rows", count),
            PipelineEvent::ColumnResolved { column, kind } => {
                debug!("Column '{}' resolved as {}", column, kind)
            }
            PipelineEvent::ColumnFellBack {
                column,
                rejected,
                kind,
            } => {
                let rejected: Vec<String> = rejected.iter().map(|k| k.to_string()).collect();
                warn!(
                    "Column '{}' could not be read as {}; kept as {}",
                    column,
                    rejected.join(" or "),
                    kind
                )
            }
            PipelineEvent::WindowFiltered { window, rows } => {
                info!("{} window holds {} rows", window, rows)
            }
            PipelineEvent::ReportComposed { window, pages } => {
                debug!("{} report laid out on {} pages", window, pages)
            }
            PipelineEvent::TextNotEncodable { window, texts } => warn!(
                "{} report: {} text(s) contain characters the built-in font cannot show, e.g. '{}'; set font_regular to a Unicode TrueType font",
                window,
                texts.len(),
                texts.first().map(String::as_str).unwrap_or_default()
            ),
            PipelineEvent::ReportWritten { window, path } => {
                info!("{} report written to {}", window, path.display())
            }
            PipelineEvent::RunAborted { reason } => warn!("Run aborted: {}", reason),
        }
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl RunObserver for SilentObserver {
    fn on_event(&self, _event: &PipelineEvent) {}
}

/// Keeps every event in memory, in arrival order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl RunObserver for RecordingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
