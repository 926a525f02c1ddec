use crate::error::{Result, SalesReportError};
use crate::source::RetryPolicy;
use crate::window::ReportWindow;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DETAIL_COLUMN_COUNT: usize = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
    /// Appended to the window label, e.g. `MTD_Sales_Report.pdf`.
    pub file_suffix: String,
    pub currency: String,
    /// chrono format of the delivery date column.
    pub date_format: String,
    /// Fixed descriptive lines of the "Parameters" block.
    pub parameters: Vec<String>,
    /// Lines of the "Details" block.
    pub methodology: Vec<String>,
    /// Max characters per detail column: nomenclature, brand, power, container, quantity, turnover, margin.
    pub detail_max_lengths: Vec<usize>,
    pub retry: RetryPolicy,
    pub query_prefix: String,
    /// TrueType font embedded for body text. Without one the built-in Helvetica is
    /// used, which only covers the WinAnsi character set.
    pub font_regular: Option<PathBuf>,
    /// TrueType font for bold text; falls back to `font_regular`.
    pub font_bold: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            file_suffix: "_Sales_Report.pdf".to_string(),
            currency: "CZK".to_string(),
            date_format: "%d/%m/%Y".to_string(),
            parameters: vec![
                "Applied Year: 2024".to_string(),
                "BP used for Initial Balance: Synthetic".to_string(),
                "Include Services: No".to_string(),
                "Invoice Status: Only invoiced deliveries".to_string(),
                "Currency: CZK".to_string(),
                "Issue Note Types: External only".to_string(),
            ],
            methodology: vec![
                "- Each transaction is recorded separately".to_string(),
                "- Gross Margin is defined as selling price - purchase price".to_string(),
                "  (excluding other purchase costs, credit notes, etc.)".to_string(),
                "- For initial stock balance, use Synthetic BP".to_string(),
                "  - Accounting value of the goods is included".to_string(),
            ],
            detail_max_lengths: vec![20, 20, 10, 10, 10, 15, 10],
            retry: RetryPolicy::default(),
            query_prefix: "query".to_string(),
            font_regular: None,
            font_bold: None,
        }
    }
}

impl ReportConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ReportConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.detail_max_lengths.len() != DETAIL_COLUMN_COUNT {
            return Err(SalesReportError::InvalidConfig(format!(
                "detail_max_lengths needs {} entries, got {}",
                DETAIL_COLUMN_COUNT,
                self.detail_max_lengths.len()
            )));
        }
        if let Some(idx) = self.detail_max_lengths.iter().position(|&len| len == 0) {
            return Err(SalesReportError::InvalidConfig(format!(
                "detail_max_lengths[{}] must be at least 1",
                idx
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(SalesReportError::InvalidConfig(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.date_format.trim().is_empty() {
            return Err(SalesReportError::InvalidConfig(
                "date_format must not be empty".to_string(),
            ));
        }
        if self.font_bold.is_some() && self.font_regular.is_none() {
            return Err(SalesReportError::InvalidConfig(
                "font_bold needs font_regular".to_string(),
            ));
        }
        if self.file_suffix.trim().is_empty() {
            return Err(SalesReportError::InvalidConfig(
                "file_suffix must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn output_path(&self, window: ReportWindow) -> PathBuf {
        self.output_dir
            .join(format!("{}{}", window.label(), self.file_suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ReportConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.output_path(ReportWindow::MonthToDate),
            PathBuf::from("./MTD_Sales_Report.pdf")
        );
        assert_eq!(
            config.output_path(ReportWindow::YearToDate),
            PathBuf::from("./YTD_Sales_Report.pdf")
        );
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ReportConfig::from_json_str(
            r#"{"output_dir": "out", "retry": {"max_attempts": 5}}"#,
        )
        .unwrap();
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.delay_secs, 20);
        assert_eq!(config.currency, "CZK");
    }

    #[test]
    fn test_validation_rejects_bad_lengths_and_attempts() {
        assert!(matches!(
            ReportConfig::from_json_str(r#"{"detail_max_lengths": [10, 10]}"#),
            Err(SalesReportError::InvalidConfig(_))
        ));
        assert!(matches!(
            ReportConfig::from_json_str(r#"{"detail_max_lengths": [10, 10, 10, 0, 10, 10, 10]}"#),
            Err(SalesReportError::InvalidConfig(_))
        ));
        assert!(matches!(
            ReportConfig::from_json_str(r#"{"retry": {"max_attempts": 0}}"#),
            Err(SalesReportError::InvalidConfig(_))
        ));
        assert!(matches!(
            ReportConfig::from_json_str(r#"{"font_bold": "DejaVuSans-Bold.ttf"}"#),
            Err(SalesReportError::InvalidConfig(_))
        ));
    }
}
