use crate::aggregate::{AggregateRow, DetailLine, SalesSummary, Totals};
use crate::config::ReportConfig;
use crate::schema::Value;
use crate::utils::{format_thousands, truncate_text};
use crate::window::{ReportWindow, WindowTable};

pub const GROUP_HEADERS: [&str; 5] = ["Nomen Group Parent", "Quantity", "Turnover", "Margin", "Margin %"];
pub const DEALER_HEADERS: [&str; 5] = ["Dealer", "Quantity", "Turnover", "Margin", "Margin %"];
pub const DETAIL_HEADERS: [&str; 7] = [
    "Nomenclature",
    "Brand",
    "Total Power (MW)",
    "Container",
    "Quantity",
    "Turnover",
    "Margin",
];

// Relative column widths; the layout scales them to the space available.
const GROUP_WIDTHS: [f32; 5] = [100.0, 60.0, 80.0, 60.0, 60.0];
const DEALER_WIDTHS: [f32; 5] = [183.0, 80.0, 100.0, 80.0, 80.0];
const DETAIL_WIDTHS: [f32; 7] = [100.0, 100.0, 100.0, 65.0, 65.0, 85.0, 80.0];

/// A rendered table cell. Only text cells are ever truncated.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(String),
}

impl Cell {
    pub fn as_str(&self) -> &str {
        match self {
            Cell::Text(s) | Cell::Number(s) => s,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Cell::Number(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableRole {
    Summary,
    Detail,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub widths: Vec<f32>,
    pub rows: Vec<Vec<Cell>>,
    pub role: TableRole,
    /// Repeat the header row on every page the table continues onto.
    pub repeat_header: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub heading: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    Summary {
        title: String,
        period: String,
        blocks: Vec<TextBlock>,
        table: Table,
    },
    DealerSummary {
        heading: String,
        table: Table,
    },
    DealerDetail {
        dealer: String,
        table: Table,
    },
}

/// Logical report content for one window, before pagination.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub window: ReportWindow,
    pub title: String,
    pub sections: Vec<Section>,
}

impl Report {
    pub fn dealer_names(&self) -> Vec<&str> {
        self.sections
            .iter()
            .filter_map(|s| match s {
                Section::DealerDetail { dealer, .. } => Some(dealer.as_str()),
                _ => None,
            })
            .collect()
    }
}

pub struct ReportComposer<'a> {
    config: &'a ReportConfig,
}

impl<'a> ReportComposer<'a> {
    pub fn new(config: &'a ReportConfig) -> Self {
        Self { config }
    }

    pub fn compose(&self, table: &WindowTable, summary: &SalesSummary) -> Report {
        let window = table.window;
        let mut sections = Vec::with_capacity(2 + summary.dealer_details.len());

        sections.push(Section::Summary {
            title: format!("{} Sales Summary", window.label()),
            period: window.period_label(table.reference),
            blocks: vec![
                TextBlock {
                    heading: "Parameters:".to_string(),
                    lines: self.config.parameters.clone(),
                },
                TextBlock {
                    heading: "Details:".to_string(),
                    lines: self.config.methodology.clone(),
                },
                TextBlock {
                    heading: "Totals:".to_string(),
                    lines: self.totals_lines(&summary.totals),
                },
            ],
            table: aggregate_table(&GROUP_HEADERS, &GROUP_WIDTHS, &summary.by_group),
        });

        sections.push(Section::DealerSummary {
            heading: "Dealer Sales Summary".to_string(),
            table: aggregate_table(&DEALER_HEADERS, &DEALER_WIDTHS, &summary.by_dealer),
        });

        for detail in &summary.dealer_details {
            sections.push(Section::DealerDetail {
                dealer: detail.dealer.to_string(),
                table: Table {
                    headers: DETAIL_HEADERS.iter().map(|h| h.to_string()).collect(),
                    widths: DETAIL_WIDTHS.to_vec(),
                    rows: detail.lines.iter().map(|l| self.detail_row(l)).collect(),
                    role: TableRole::Detail,
                    repeat_header: true,
                },
            });
        }

        Report {
            window,
            title: format!("{} Sales Report", window.label()),
            sections,
        }
    }

    fn totals_lines(&self, totals: &Totals) -> Vec<String> {
        vec![
            format!(
                "Turnover: {} {}",
                format_thousands(totals.turnover),
                self.config.currency
            ),
            format!(
                "Gross Margin: {} {}",
                format_thousands(totals.margin),
                self.config.currency
            ),
            format!("Avg Gross Margin: {:.2}%", totals.margin_percent),
        ]
    }

    fn detail_row(&self, line: &DetailLine) -> Vec<Cell> {
        let cells = [
            value_cell(&line.nomenclature),
            value_cell(&line.brand),
            value_cell(&line.total_power_mw),
            Cell::Number(format!("{:.2}", line.container)),
            value_cell(&line.quantity),
            value_cell(&line.turnover),
            value_cell(&line.margin),
        ];

        cells
            .into_iter()
            .zip(self.config.detail_max_lengths.iter())
            .map(|(cell, &max_len)| match cell {
                Cell::Text(text) => Cell::Text(truncate_text(&text, max_len)),
                number => number,
            })
            .collect()
    }
}

fn aggregate_table(headers: &[&str], widths: &[f32], rows: &[AggregateRow]) -> Table {
    Table {
        headers: headers.iter().map(|h| h.to_string()).collect(),
        widths: widths.to_vec(),
        rows: rows
            .iter()
            .map(|row| {
                vec![
                    Cell::Text(row.key.to_string()),
                    Cell::Number(row.quantity.to_string()),
                    Cell::Number(row.turnover.to_string()),
                    Cell::Number(row.margin.to_string()),
                    Cell::Number(format!("{:.2}", row.margin_percent)),
                ]
            })
            .collect(),
        role: TableRole::Summary,
        repeat_header: true,
    }
}

fn value_cell(value: &Value) -> Cell {
    match value {
        Value::Integer(i) => Cell::Number(i.to_string()),
        Value::Float(f) => Cell::Number(f.to_string()),
        other => Cell::Text(other.as_text().unwrap_or_default()),
    }
}
