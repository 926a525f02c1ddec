//! # Sales Report Builder
//!
//! A library for turning raw sales-transaction rows into two periodic PDF sales
//! reports: month-to-date (MTD) and year-to-date (YTD), aggregated by product
//! group and by dealer.
//!
//! ## Pipeline
//!
//! - **Type coercion**: each column of the loosely typed rows resolves to exactly one
//!   type (integer, float, text, or date for the delivery date), falling back column-wide
//! - **Time windows**: MTD and YTD tables are cut from the typed table at one reference instant
//! - **Aggregation**: rounded quantity/turnover/margin sums and margin % per product group
//!   and per dealer, table-wide totals, and per-line container counts
//! - **Report composition**: a summary page, a dealer summary page, and per-dealer detail
//!   tables, paginated and rendered to PDF
//!
//! ## Example
//!
//! ```rust,ignore
//! use sales_report_builder::*;
//! use chrono::Local;
//!
//! let config = ReportConfig::default();
//! let observer = LogObserver;
//! let pipeline = SalesReportPipeline::new(config, &observer);
//!
//! let mut source = JsonRowsFile::new("query_sales.json");
//! let written = pipeline.run_from_source(&mut source, Local::now().naive_local()).unwrap();
//! ```

pub mod aggregate;
pub mod coercion;
pub mod config;
pub mod error;
pub mod observer;
pub mod report;
pub mod schema;
pub mod source;
pub mod utils;
pub mod window;

pub use aggregate::{
    container_count, AggregateRow, Aggregator, DealerDetail, DetailLine, SalesSummary, Totals,
};
pub use coercion::{select_columns, CoercionReport, TypeCoercer, TypedColumn, TypedTable};
pub use config::ReportConfig;
pub use error::{Result, SalesReportError};
pub use observer::{LogObserver, PipelineEvent, RecordingObserver, RunObserver, SilentObserver};
pub use report::{
    layout_report, render_pdf, LaidOutDocument, PdfFonts, Report, ReportComposer, ReportStyle,
    Section,
};
pub use schema::*;
pub use source::{
    source_for_path, CsvRowsFile, JsonRowsFile, QueryExportDir, RetryPolicy, RowSource,
};
pub use window::{ReportWindow, TimeWindowFilter, WindowTable};

use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};

/// One finished report held in memory until every report of the run is ready.
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub window: ReportWindow,
    pub path: PathBuf,
    pub pages: usize,
    pub totals: Totals,
    pub bytes: Vec<u8>,
}

pub struct SalesReportPipeline<'a> {
    config: ReportConfig,
    style: ReportStyle,
    observer: &'a dyn RunObserver,
}

impl<'a> SalesReportPipeline<'a> {
    pub fn new(config: ReportConfig, observer: &'a dyn RunObserver) -> Self {
        Self {
            config,
            style: ReportStyle::default(),
            observer,
        }
    }

    pub fn with_style(mut self, style: ReportStyle) -> Self {
        self.style = style;
        self
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Selects the sales columns and coerces them into a typed table.
    pub fn prepare(&self, rows: &[RawRow]) -> TypedTable {
        let selected = select_columns(rows);
        let (table, report) = TypeCoercer::new(self.config.date_format.clone()).coerce(&selected);

        for resolution in &report.resolutions {
            let event = if resolution.fell_back() {
                PipelineEvent::ColumnFellBack {
                    column: resolution.column.clone(),
                    rejected: resolution.rejected.clone(),
                    kind: resolution.kind,
                }
            } else {
                PipelineEvent::ColumnResolved {
                    column: resolution.column.clone(),
                    kind: resolution.kind,
                }
            };
            self.observer.on_event(&event);
        }

        table
    }

    /// Cuts both windows from the typed table and aggregates each.
    pub fn summarize_windows(
        &self,
        rows: &[RawRow],
        reference: NaiveDateTime,
    ) -> Vec<(WindowTable, SalesSummary)> {
        let table = self.prepare(rows);
        let filter = TimeWindowFilter::new(reference);

        ReportWindow::ALL
            .iter()
            .map(|&window| {
                let windowed = filter.filter(&table, window);
                self.observer.on_event(&PipelineEvent::WindowFiltered {
                    window,
                    rows: windowed.len(),
                });
                let summary = Aggregator::summarize(&windowed.records);
                (windowed, summary)
            })
            .collect()
    }

    /// Composes the logical report of every window without laying it out.
    pub fn compose_reports(&self, rows: &[RawRow], reference: NaiveDateTime) -> Vec<Report> {
        let composer = ReportComposer::new(&self.config);
        self.summarize_windows(rows, reference)
            .iter()
            .map(|(windowed, summary)| composer.compose(windowed, summary))
            .collect()
    }

    /// Builds both reports in memory; nothing is written.
    pub fn build_reports(
        &self,
        rows: &[RawRow],
        reference: NaiveDateTime,
    ) -> Result<Vec<RenderedReport>> {
        self.config.validate()?;
        let fonts = PdfFonts::load(
            self.config.font_regular.as_deref(),
            self.config.font_bold.as_deref(),
        )?;

        let composer = ReportComposer::new(&self.config);
        let mut rendered = Vec::with_capacity(ReportWindow::ALL.len());
        for (windowed, summary) in self.summarize_windows(rows, reference) {
            let window = windowed.window;
            let report = composer.compose(&windowed, &summary);
            let document = layout_report(&report, &self.style);
            self.observer.on_event(&PipelineEvent::ReportComposed {
                window,
                pages: document.page_count(),
            });
            let texts = fonts.unencodable_texts(&document);
            if !texts.is_empty() {
                self.observer
                    .on_event(&PipelineEvent::TextNotEncodable { window, texts });
            }

            rendered.push(RenderedReport {
                window,
                path: self.config.output_path(window),
                pages: document.page_count(),
                totals: summary.totals,
                bytes: render_pdf(&document, &fonts)?,
            });
        }

        Ok(rendered)
    }

    /// Writes every report or none: files are staged next to their targets and
    /// renamed only once all of them were written. Reports from an earlier run
    /// are set aside first and restored if any rename fails.
    pub fn write_reports(&self, reports: &[RenderedReport]) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.config.output_dir)?;

        let mut staged: Vec<PathBuf> = Vec::with_capacity(reports.len());
        for report in reports {
            let temp = staging_path(&report.path);
            if let Err(e) = fs::write(&temp, &report.bytes) {
                let _ = fs::remove_file(&temp);
                discard(&staged);
                return Err(e.into());
            }
            staged.push(temp);
        }

        let mut backups: Vec<(PathBuf, PathBuf)> = Vec::new();
        for report in reports {
            if !report.path.is_file() {
                continue;
            }
            let backup = backup_path(&report.path);
            if let Err(e) = fs::rename(&report.path, &backup) {
                restore(&backups);
                discard(&staged);
                return Err(e.into());
            }
            backups.push((backup, report.path.clone()));
        }

        let mut written: Vec<PathBuf> = Vec::with_capacity(reports.len());
        for (report, temp) in reports.iter().zip(staged.iter()) {
            if let Err(e) = fs::rename(temp, &report.path) {
                discard(&written);
                discard(&staged);
                restore(&backups);
                return Err(e.into());
            }
            written.push(report.path.clone());
        }

        for (backup, _) in &backups {
            let _ = fs::remove_file(backup);
        }
        for report in reports {
            self.observer.on_event(&PipelineEvent::ReportWritten {
                window: report.window,
                path: report.path.clone(),
            });
        }
        Ok(written)
    }

    pub fn run(&self, rows: &[RawRow], reference: NaiveDateTime) -> Result<Vec<PathBuf>> {
        let reports = self.build_reports(rows, reference).map_err(|e| self.abort(e))?;
        self.write_reports(&reports).map_err(|e| self.abort(e))
    }

    /// Fetches the rows under the configured retry policy, then runs.
    pub fn run_from_source(
        &self,
        source: &mut dyn RowSource,
        reference: NaiveDateTime,
    ) -> Result<Vec<PathBuf>> {
        let rows = self
            .config
            .retry
            .fetch(source, self.observer)
            .map_err(|e| self.abort(e))?;
        self.run(&rows, reference)
    }

    fn abort(&self, error: SalesReportError) -> SalesReportError {
        self.observer.on_event(&PipelineEvent::RunAborted {
            reason: error.to_string(),
        });
        error
    }
}

fn sibling_path(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(extension);
    path.with_file_name(name)
}

fn staging_path(path: &Path) -> PathBuf {
    sibling_path(path, ".partial")
}

fn backup_path(path: &Path) -> PathBuf {
    sibling_path(path, ".previous")
}

fn discard(paths: &[PathBuf]) {
    for path in paths {
        let _ = fs::remove_file(path);
    }
}

fn restore(backups: &[(PathBuf, PathBuf)]) {
    for (backup, original) in backups {
        let _ = fs::rename(backup, original);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(dealer: &str, group: &str, qty: i64, turnover: i64, margin: i64, date: &str) -> RawRow {
        [
            (DEALER_NAME, RawValue::from(dealer)),
            (NOMENCLATURE, RawValue::from("Pump 40")),
            (BRAND, RawValue::from("Grundfos")),
            (TOTAL_POWER_MW, RawValue::from(0.75)),
            (PCS_CONTAINER, RawValue::from(5i64)),
            (NOMEN_GROUP_PARENT, RawValue::from(group)),
            (QUANTITY_REGISTER_UOM, RawValue::from(qty)),
            (REGISTER_UOM, RawValue::from("pcs")),
            (TOTAL_FINAL_PRICE_CZK, RawValue::from(turnover)),
            (GROSS_MARGIN_CZK, RawValue::from(margin)),
            (DELIVERY_DATE, RawValue::from(date)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    fn reference() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 25)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_build_reports_in_memory() {
        let rows = vec![
            row("Acme", "Pumps", 10, 1000, 200, "15/01/2024"),
            row("Acme", "Pumps", 5, 500, 50, "20/02/2024"),
        ];
        let observer = RecordingObserver::new();
        let pipeline = SalesReportPipeline::new(ReportConfig::default(), &observer);

        let reports = pipeline.build_reports(&rows, reference()).unwrap();
        assert_eq!(reports.len(), 2);

        let mtd = &reports[0];
        assert_eq!(mtd.window, ReportWindow::MonthToDate);
        assert_eq!(mtd.totals.turnover, 500);
        assert!(mtd.bytes.starts_with(b"%PDF"));

        let ytd = &reports[1];
        assert_eq!(ytd.totals.turnover, 1500);
        assert_eq!(ytd.totals.margin, 250);
        assert_eq!(ytd.totals.margin_percent, 16.67);
        assert_eq!(ytd.pages, 3);

        let events = observer.events();
        assert!(events.contains(&PipelineEvent::WindowFiltered {
            window: ReportWindow::YearToDate,
            rows: 2,
        }));
    }

    #[test]
    fn test_compose_reports_follow_window_order() {
        let rows = vec![row("Acme", "Pumps", 1, 10, 1, "01/02/2024")];
        let pipeline = SalesReportPipeline::new(ReportConfig::default(), &SilentObserver);

        let reports = pipeline.compose_reports(&rows, reference());
        let windows: Vec<ReportWindow> = reports.iter().map(|r| r.window).collect();
        assert_eq!(windows, vec![ReportWindow::MonthToDate, ReportWindow::YearToDate]);
        assert_eq!(reports[0].title, "MTD Sales Report");
    }

    #[test]
    fn test_fallback_columns_are_reported() {
        let mut odd = row("Acme", "Pumps", 1, 10, 1, "01/02/2024");
        odd.insert(TOTAL_POWER_MW.to_string(), RawValue::from("unknown"));
        let observer = RecordingObserver::new();
        let pipeline = SalesReportPipeline::new(ReportConfig::default(), &observer);

        let table = pipeline.prepare(&[odd]);
        assert_eq!(table.kind_of(TOTAL_POWER_MW), Some(ColumnKind::Text));
        assert!(observer.events().iter().any(|e| matches!(
            e,
            PipelineEvent::ColumnFellBack { column, kind: ColumnKind::Text, .. } if column == TOTAL_POWER_MW
        )));
    }

    #[test]
    fn test_failed_rename_keeps_previous_reports() {
        let dir = tempfile::tempdir().unwrap();
        let config = ReportConfig {
            output_dir: dir.path().to_path_buf(),
            ..ReportConfig::default()
        };
        let pipeline = SalesReportPipeline::new(config, &SilentObserver);
        let rows = vec![row("Acme", "Pumps", 10, 1000, 200, "15/02/2024")];

        let first = pipeline.run(&rows, reference()).unwrap();
        let previous: Vec<Vec<u8>> = first.iter().map(|p| fs::read(p).unwrap()).collect();

        // A file cannot be renamed over a directory, so the second rename fails.
        let mut reports = pipeline.build_reports(&rows, reference()).unwrap();
        let blocked = dir.path().join("blocked");
        fs::create_dir_all(blocked.join("inner")).unwrap();
        reports[1].path = blocked;

        assert!(pipeline.write_reports(&reports).is_err());
        assert_eq!(fs::read(&first[0]).unwrap(), previous[0]);
        assert_eq!(fs::read(&first[1]).unwrap(), previous[1]);
        assert!(!staging_path(&first[0]).exists());
        assert!(!backup_path(&first[0]).exists());
    }

    #[test]
    fn test_czech_names_outside_builtin_font_are_reported() {
        let rows = vec![
            row("ČEZ Prodej", "Čerpadla", 1, 10, 1, "01/02/2024"),
            row("Müller", "Pumps", 1, 10, 1, "02/02/2024"),
        ];
        let observer = RecordingObserver::new();
        let pipeline = SalesReportPipeline::new(ReportConfig::default(), &observer);

        pipeline.build_reports(&rows, reference()).unwrap();
        let flagged: Vec<Vec<String>> = observer
            .events()
            .into_iter()
            .filter_map(|e| match e {
                PipelineEvent::TextNotEncodable { texts, .. } => Some(texts),
                _ => None,
            })
            .collect();

        assert_eq!(flagged.len(), 2);
        for texts in &flagged {
            assert!(texts.iter().any(|t| t == "ČEZ Prodej"));
            assert!(texts.iter().any(|t| t == "Čerpadla"));
            assert!(!texts.iter().any(|t| t == "Müller"));
        }
    }

    #[test]
    fn test_staging_path_sits_next_to_target() {
        let path = PathBuf::from("out/MTD_Sales_Report.pdf");
        assert_eq!(
            staging_path(&path),
            PathBuf::from("out/MTD_Sales_Report.pdf.partial")
        );
    }
}
