use thiserror::Error;

#[derive(Error, Debug)]
pub enum SalesReportError {
    #[error("Row source unavailable after {attempts} attempt(s): {reason}")]
    SourceUnavailable { attempts: u32, reason: String },

    #[error("No source files matching '{prefix}*' found in {dir}")]
    NoSourceFiles { dir: String, prefix: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("PDF rendering error: {0}")]
    Pdf(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SalesReportError>;
