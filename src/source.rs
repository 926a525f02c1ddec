//! Boundary to the collaborator that supplies raw rows.
//!
//! Sources here read exported query results from disk. A live database source
//! only has to implement [`RowSource`].

use crate::error::{Result, SalesReportError};
use crate::observer::{PipelineEvent, RunObserver};
use crate::schema::{RawRow, RawValue};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::Duration;

pub trait RowSource {
    /// Short description for log output.
    fn describe(&self) -> String;

    fn fetch_rows(&mut self) -> Result<Vec<RawRow>>;
}

/// A JSON array of row objects.
#[derive(Debug, Clone)]
pub struct JsonRowsFile {
    path: PathBuf,
}

impl JsonRowsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RowSource for JsonRowsFile {
    fn describe(&self) -> String {
        format!("JSON file {}", self.path.display())
    }

    fn fetch_rows(&mut self) -> Result<Vec<RawRow>> {
        read_json_rows(&self.path)
    }
}

/// A CSV file with a header row. Empty cells are null, everything else is raw text.
#[derive(Debug, Clone)]
pub struct CsvRowsFile {
    path: PathBuf,
}

impl CsvRowsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RowSource for CsvRowsFile {
    fn describe(&self) -> String {
        format!("CSV file {}", self.path.display())
    }

    fn fetch_rows(&mut self) -> Result<Vec<RawRow>> {
        read_csv_rows(&self.path)
    }
}

/// Every `<prefix>*.json` / `<prefix>*.csv` export in a directory, concatenated in name order.
#[derive(Debug, Clone)]
pub struct QueryExportDir {
    dir: PathBuf,
    prefix: String,
}

impl QueryExportDir {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn export_files(&self) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .filter(|path| {
                let name_matches = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(&self.prefix));
                name_matches && export_format(path).is_some()
            })
            .collect();
        files.sort();
        Ok(files)
    }
}

impl RowSource for QueryExportDir {
    fn describe(&self) -> String {
        format!("query exports '{}*' in {}", self.prefix, self.dir.display())
    }

    fn fetch_rows(&mut self) -> Result<Vec<RawRow>> {
        let files = self.export_files()?;
        if files.is_empty() {
            return Err(SalesReportError::NoSourceFiles {
                dir: self.dir.display().to_string(),
                prefix: self.prefix.clone(),
            });
        }

        let mut all_rows = Vec::new();
        for file in files {
            let rows = match export_format(&file) {
                Some(ExportFormat::Json) => read_json_rows(&file)?,
                Some(ExportFormat::Csv) => read_csv_rows(&file)?,
                None => continue,
            };
            all_rows.extend(rows);
        }
        Ok(all_rows)
    }
}

/// Picks the source for a path: a directory of query exports, or a single JSON/CSV file.
pub fn source_for_path(path: &Path, query_prefix: &str) -> Result<Box<dyn RowSource>> {
    if path.is_dir() {
        return Ok(Box::new(QueryExportDir::new(path, query_prefix)));
    }
    match export_format(path) {
        Some(ExportFormat::Json) => Ok(Box::new(JsonRowsFile::new(path))),
        Some(ExportFormat::Csv) => Ok(Box::new(CsvRowsFile::new(path))),
        None => Err(SalesReportError::InvalidConfig(format!(
            "Unsupported input {}: expected a directory, .json or .csv file",
            path.display()
        ))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExportFormat {
    Json,
    Csv,
}

fn export_format(path: &Path) -> Option<ExportFormat> {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("json") => Some(ExportFormat::Json),
        Some("csv") => Some(ExportFormat::Csv),
        _ => None,
    }
}

fn read_json_rows(path: &Path) -> Result<Vec<RawRow>> {
    let text = fs::read_to_string(path)?;
    let objects: Vec<serde_json::Map<String, serde_json::Value>> = serde_json::from_str(&text)?;
    Ok(objects
        .into_iter()
        .map(|object| {
            object
                .into_iter()
                .map(|(column, value)| (column, RawValue::from(value)))
                .collect()
        })
        .collect())
}

fn read_csv_rows(path: &Path) -> Result<Vec<RawRow>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(column, cell)| {
                let value = if cell.is_empty() {
                    RawValue::Null
                } else {
                    RawValue::Text(cell.to_string())
                };
                (column.to_string(), value)
            })
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

/// Bounded retry with a fixed delay, applied once around the row fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_secs: 20,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay_secs: delay.as_secs(),
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }

    /// Fetches rows, retrying failures. Only the final outcome is returned.
    pub fn fetch(
        &self,
        source: &mut dyn RowSource,
        observer: &dyn RunObserver,
    ) -> Result<Vec<RawRow>> {
        let max_attempts = self.max_attempts.max(1);
        observer.on_event(&PipelineEvent::FetchStarted {
            source: source.describe(),
        });

        let mut last_error = String::new();
        for attempt in 1..=max_attempts {
            match source.fetch_rows() {
                Ok(rows) => {
                    observer.on_event(&PipelineEvent::RowsFetched { count: rows.len() });
                    return Ok(rows);
                }
                Err(e) => {
                    last_error = e.to_string();
                    observer.on_event(&PipelineEvent::FetchAttemptFailed {
                        attempt,
                        max_attempts,
                        error: last_error.clone(),
                    });
                    if attempt < max_attempts {
                        sleep(self.delay());
                    }
                }
            }
        }

        Err(SalesReportError::SourceUnavailable {
            attempts: max_attempts,
            reason: last_error,
        })
    }
}
