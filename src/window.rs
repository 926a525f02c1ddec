use crate::coercion::TypedTable;
use crate::schema::{ColumnKind, SalesRecord, DELIVERY_DATE};
use crate::utils::{first_day_of_month, first_day_of_year};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportWindow {
    /// First day of the reference month through the reference instant.
    MonthToDate,
    /// Every date in the reference year.
    YearToDate,
}

impl ReportWindow {
    pub const ALL: [ReportWindow; 2] = [ReportWindow::MonthToDate, ReportWindow::YearToDate];

    pub fn label(&self) -> &'static str {
        match self {
            ReportWindow::MonthToDate => "MTD",
            ReportWindow::YearToDate => "YTD",
        }
    }

    pub fn contains(&self, date: NaiveDate, reference: NaiveDateTime) -> bool {
        match self {
            ReportWindow::MonthToDate => {
                let start = first_day_of_month(reference.date());
                date >= start && date.and_hms_opt(0, 0, 0).is_some_and(|d| d <= reference)
            }
            ReportWindow::YearToDate => date.year() == reference.year(),
        }
    }

    /// Human readable period for report titles.
    pub fn period_label(&self, reference: NaiveDateTime) -> String {
        let today = reference.date();
        match self {
            ReportWindow::MonthToDate => format!(
                "{} - {}",
                first_day_of_month(today).format("%d/%m/%Y"),
                today.format("%d/%m/%Y")
            ),
            ReportWindow::YearToDate => format!(
                "Year {} (from {})",
                today.year(),
                first_day_of_year(today).format("%d/%m/%Y")
            ),
        }
    }
}

impl fmt::Display for ReportWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Records of one reporting window; the delivery date is no longer carried.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowTable {
    pub window: ReportWindow,
    pub reference: NaiveDateTime,
    pub records: Vec<SalesRecord>,
}

impl WindowTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Splits a typed table into its windows at one shared reference instant.
pub struct TimeWindowFilter {
    reference: NaiveDateTime,
}

impl TimeWindowFilter {
    pub fn new(reference: NaiveDateTime) -> Self {
        Self { reference }
    }

    pub fn filter(&self, table: &TypedTable, window: ReportWindow) -> WindowTable {
        // Only a date-typed column is comparable; text dates match no window.
        let records = if table.kind_of(DELIVERY_DATE) == Some(ColumnKind::Date) {
            table
                .records()
                .into_iter()
                .filter(|r| {
                    r.delivery_date
                        .date()
                        .is_some_and(|d| window.contains(d, self.reference))
                })
                .map(|r| r.record)
                .collect()
        } else {
            Vec::new()
        };

        WindowTable {
            window,
            reference: self.reference,
            records,
        }
    }

    pub fn month_to_date(&self, table: &TypedTable) -> WindowTable {
        self.filter(table, ReportWindow::MonthToDate)
    }

    pub fn year_to_date(&self, table: &TypedTable) -> WindowTable {
        self.filter(table, ReportWindow::YearToDate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coercion::TypeCoercer;
    use crate::schema::{RawRow, RawValue, Value};

    fn row(dealer: &str, date: &str) -> RawRow {
        [
            ("dealer_name".to_string(), RawValue::Text(dealer.to_string())),
            ("delivery_date".to_string(), RawValue::Text(date.to_string())),
        ]
        .into_iter()
        .collect()
    }

    fn reference() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap()
    }

    fn dealers(table: &WindowTable) -> Vec<String> {
        table
            .records
            .iter()
            .filter_map(|r| r.dealer_name.as_text())
            .collect()
    }

    #[test]
    fn test_month_and_year_windows() {
        let rows = vec![
            row("last-month", "28/02/2024"),
            row("first-of-month", "01/03/2024"),
            row("today", "10/03/2024"),
            row("later-this-month", "11/03/2024"),
            row("last-year", "31/12/2023"),
            row("later-this-year", "05/11/2024"),
        ];
        let (table, _) = TypeCoercer::default().coerce(&rows);
        let filter = TimeWindowFilter::new(reference());

        let mtd = filter.month_to_date(&table);
        assert_eq!(dealers(&mtd), vec!["first-of-month", "today"]);

        let ytd = filter.year_to_date(&table);
        assert_eq!(
            dealers(&ytd),
            vec![
                "last-month",
                "first-of-month",
                "today",
                "later-this-month",
                "later-this-year"
            ]
        );
    }

    #[test]
    fn test_month_to_date_is_subset_of_year_to_date() {
        let rows: Vec<RawRow> = (1..=28)
            .flat_map(|day| {
                (1..=12).map(move |month| row(&format!("{}-{}", day, month), &format!("{:02}/{:02}/2024", day, month)))
            })
            .collect();
        let (table, _) = TypeCoercer::default().coerce(&rows);
        let filter = TimeWindowFilter::new(reference());

        let mtd = filter.month_to_date(&table);
        let ytd = filter.year_to_date(&table);
        assert!(!mtd.is_empty());
        for record in &mtd.records {
            assert!(ytd.records.contains(record));
        }
    }

    #[test]
    fn test_unparsed_date_column_matches_no_window() {
        let rows = vec![row("a", "05/03/2024"), row("b", "March 5th")];
        let (table, _) = TypeCoercer::default().coerce(&rows);
        let filter = TimeWindowFilter::new(reference());

        assert!(filter.month_to_date(&table).is_empty());
        assert!(filter.year_to_date(&table).is_empty());
    }

    #[test]
    fn test_missing_dates_are_excluded() {
        let mut undated = row("undated", "");
        undated.insert("delivery_date".to_string(), RawValue::Null);
        let rows = vec![row("dated", "05/03/2024"), undated];
        let (table, _) = TypeCoercer::default().coerce(&rows);

        let ytd = TimeWindowFilter::new(reference()).year_to_date(&table);
        assert_eq!(ytd.records.len(), 1);
        assert_eq!(ytd.records[0].dealer_name, Value::Text("dated".to_string()));
    }

    #[test]
    fn test_period_labels() {
        assert_eq!(
            ReportWindow::MonthToDate.period_label(reference()),
            "01/03/2024 - 10/03/2024"
        );
        assert_eq!(
            ReportWindow::YearToDate.period_label(reference()),
            "Year 2024 (from 01/01/2024)"
        );
    }
}
