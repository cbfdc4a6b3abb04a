//! The boundary to the external service that owns statement parsing,
//! categorisation, storage and password checks.
//!
//! Everything the views need from the outside world goes through [Backend].
//! [ProcessBackend] talks to a real backend program, [MemoryBackend] keeps
//! everything in memory for tests and demos.

mod memory;
mod process;
mod wire;

use std::{fmt::Display, str::FromStr};

use async_trait::async_trait;
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    analytics::MonthlyCategoryMatrix,
    transaction::{Transaction, TransactionId},
};

pub use memory::MemoryBackend;
pub use process::ProcessBackend;

/// The ways a backend command can fail.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum BackendError {
    /// The backend ran the command and reported a failure.
    ///
    /// The message is meant for the user and is shown verbatim.
    #[error("{0}")]
    Rejected(String),

    /// The backend could not be reached, e.g. the program failed to start or
    /// exited with an error.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend replied with something that is not a valid response.
    #[error("invalid backend response: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    /// The text to show the user for this error.
    ///
    /// Messages from the backend are passed through, faults get a generic
    /// message since their details are only useful in the server logs.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Rejected(message) => message.clone(),
            BackendError::Unavailable(_) | BackendError::InvalidResponse(_) => {
                "Could not reach the backend. Try again or check the server logs.".to_owned()
            }
        }
    }
}

/// An inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// The first day in the range.
    pub start: Date,
    /// The last day in the range.
    pub end: Date,
}

impl DateRange {
    /// Create a range, swapping the ends if they are given in the wrong order.
    pub fn new(start: Date, end: Date) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Whether `date` falls inside the range.
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Totals for a date range.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpendingSummary {
    /// Sum of expense magnitudes.
    pub total_spending: f64,
    /// Sum of income.
    pub total_income: f64,
    /// Income minus spending.
    pub net_cash_flow: f64,
    /// Number of transactions in the range.
    pub transaction_count: u64,
    /// The category with the most spending, if there was any spending.
    pub top_category: Option<String>,
}

/// Spending in one category over a date range.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategoryTotal {
    /// The category name.
    pub name: String,
    /// The amount spent.
    #[serde(alias = "total")]
    pub value: f64,
}

/// Spending per month and category over a date range.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MonthlySpending {
    /// Month key → category → amount spent.
    pub data: MonthlyCategoryMatrix,
    /// The categories to chart, in display order.
    pub categories: Vec<String>,
}

/// The fields of a transaction the user may change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionUpdate {
    /// The new category.
    pub category: String,
}

/// The file formats spending can be exported to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Comma separated values.
    #[default]
    Csv,
    /// A JSON document.
    Json,
}

impl ExportFormat {
    /// The name the backend uses for the format.
    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(Error::InvalidExportFormat(other.to_owned())),
        }
    }
}

/// A request to write the spending in a range to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    /// The dates to export.
    pub range: DateRange,
    /// The output format.
    pub format: ExportFormat,
    /// Where the backend should write the file.
    pub file_path: String,
}

/// The kinds of bank statement the backend can import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// A CSV export from online banking.
    Csv,
    /// A PDF statement.
    Pdf,
}

impl StatementKind {
    /// Pick the statement kind from a file's extension.
    ///
    /// Anything that is not a `.pdf` file is treated as CSV.
    pub fn from_path(file_path: &str) -> Self {
        let is_pdf = file_path
            .trim()
            .rsplit_once('.')
            .is_some_and(|(_, extension)| extension.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            StatementKind::Pdf
        } else {
            StatementKind::Csv
        }
    }
}

/// The commands the views need from the backend.
///
/// Every call may fail and may take arbitrarily long. Implementations must
/// not retry on behalf of the caller.
#[async_trait]
pub trait Backend: std::fmt::Debug + Send + Sync {
    /// Every stored transaction.
    async fn get_transactions(&self) -> Result<Vec<Transaction>, BackendError>;

    /// Spending and income totals for `range`.
    async fn get_spending_summary(&self, range: DateRange)
    -> Result<SpendingSummary, BackendError>;

    /// Spending per category for `range`.
    async fn get_category_breakdown(
        &self,
        range: DateRange,
    ) -> Result<Vec<CategoryTotal>, BackendError>;

    /// Spending per month and category for `range`.
    async fn get_monthly_spending_by_category(
        &self,
        range: DateRange,
    ) -> Result<MonthlySpending, BackendError>;

    /// The known category vocabulary.
    async fn get_categories(&self) -> Result<Vec<String>, BackendError>;

    /// Apply `update` to the transaction `id`.
    async fn update_transaction(
        &self,
        id: &TransactionId,
        update: &TransactionUpdate,
    ) -> Result<(), BackendError>;

    /// Delete the transaction `id`.
    async fn delete_transaction(&self, id: &TransactionId) -> Result<(), BackendError>;

    /// Export spending and return the number of records written.
    async fn export_spending(&self, request: &ExportRequest) -> Result<u64, BackendError>;

    /// Import the statement at `file_path` and return the number of rows imported.
    async fn import_statement(
        &self,
        file_path: &str,
        kind: StatementKind,
    ) -> Result<u64, BackendError>;

    /// Whether the data is protected by a password.
    async fn check_password_status(&self) -> Result<bool, BackendError>;

    /// Check `password`, a wrong password is reported as [BackendError::Rejected].
    async fn verify_password(&self, password: &str) -> Result<(), BackendError>;

    /// Turn on password protection.
    async fn setup_password(&self, password: &str) -> Result<(), BackendError>;

    /// Replace the password.
    async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), BackendError>;

    /// Turn off password protection.
    async fn disable_password(&self, password: &str) -> Result<(), BackendError>;
}
