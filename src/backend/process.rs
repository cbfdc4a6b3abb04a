//! A backend that runs an external program for every command.

use std::{process::Stdio, sync::Arc};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::{io::AsyncWriteExt, process::Command};

use crate::transaction::{Transaction, TransactionId};

use super::{
    Backend, BackendError, CategoryTotal, DateRange, ExportRequest, MonthlySpending,
    SpendingSummary, StatementKind, TransactionUpdate,
    wire::{
        BreakdownPayload, CategoriesPayload, Empty, ExportPayload, ImportPayload,
        PasswordStatusPayload, Request, SummaryPayload, TransactionsPayload, decode,
    },
};

const UNKNOWN_ERROR: &str = "Unknown error";

/// Runs `program args...` once per command.
///
/// The request is written to the program's stdin as a single JSON object and
/// the response is read from its stdout. Diagnostics on stderr are logged.
#[derive(Debug, Clone)]
pub struct ProcessBackend {
    program: Arc<str>,
    args: Arc<[String]>,
}

impl ProcessBackend {
    /// Create a backend that runs `program` with `args`.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: Arc::from(program.into()),
            args: Arc::from(args),
        }
    }

    async fn call(&self, command: &str, args: Value) -> Result<Value, BackendError> {
        let request = serde_json::to_vec(&Request { command, args })
            .map_err(|error| BackendError::InvalidResponse(error.to_string()))?;

        tracing::debug!("Running backend command {command}");

        let mut child = Command::new(&*self.program)
            .args(self.args.iter())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .inspect_err(|error| {
                tracing::error!("Could not start backend program {}: {error}", self.program)
            })
            .map_err(|error| BackendError::Unavailable(error.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&request)
                .await
                .map_err(|error| BackendError::Unavailable(error.to_string()))?;
            // Dropping stdin closes the pipe so the program sees end of input.
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|error| BackendError::Unavailable(error.to_string()))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            tracing::debug!("Backend stderr for {command}: {stderr}");
        }

        if !output.status.success() {
            tracing::error!(
                "Backend command {command} exited with {}: {stderr}",
                output.status
            );
            return Err(BackendError::Unavailable(format!(
                "{command} exited with {}",
                output.status
            )));
        }

        parse_stdout(&String::from_utf8_lossy(&output.stdout))
    }

    async fn call_decode<T: DeserializeOwned>(
        &self,
        command: &str,
        args: Value,
        rejected_default: &str,
    ) -> Result<T, BackendError> {
        let response = self.call(command, args).await?;

        decode(response, rejected_default).inspect_err(|error| {
            tracing::warn!("Backend command {command} failed: {error}");
        })
    }
}

/// Parse the response from the program's output.
///
/// Programs that print progress before the response are tolerated by falling
/// back to the last non-empty line.
fn parse_stdout(stdout: &str) -> Result<Value, BackendError> {
    if let Ok(value) = serde_json::from_str(stdout) {
        return Ok(value);
    }

    let last_line = stdout
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or_default();

    serde_json::from_str(last_line).map_err(|error| {
        tracing::error!("Could not parse backend output {stdout:?}: {error}");
        BackendError::InvalidResponse(error.to_string())
    })
}

fn range_args(range: DateRange) -> Value {
    json!({
        "start_date": range.start.to_string(),
        "end_date": range.end.to_string(),
    })
}

#[async_trait]
impl Backend for ProcessBackend {
    async fn get_transactions(&self) -> Result<Vec<Transaction>, BackendError> {
        let payload: TransactionsPayload = self
            .call_decode("get_transactions", json!({}), UNKNOWN_ERROR)
            .await?;

        Ok(payload.into_transactions())
    }

    async fn get_spending_summary(
        &self,
        range: DateRange,
    ) -> Result<SpendingSummary, BackendError> {
        let payload: SummaryPayload = self
            .call_decode("get_spending_summary", range_args(range), UNKNOWN_ERROR)
            .await?;

        Ok(payload.summary)
    }

    async fn get_category_breakdown(
        &self,
        range: DateRange,
    ) -> Result<Vec<CategoryTotal>, BackendError> {
        let payload: BreakdownPayload = self
            .call_decode("get_category_breakdown", range_args(range), UNKNOWN_ERROR)
            .await?;

        Ok(payload.categories)
    }

    async fn get_monthly_spending_by_category(
        &self,
        range: DateRange,
    ) -> Result<MonthlySpending, BackendError> {
        self.call_decode(
            "get_monthly_spending_by_category",
            range_args(range),
            UNKNOWN_ERROR,
        )
        .await
    }

    async fn get_categories(&self) -> Result<Vec<String>, BackendError> {
        let payload: CategoriesPayload = self
            .call_decode("get_categories", json!({}), UNKNOWN_ERROR)
            .await?;

        Ok(payload.categories)
    }

    async fn update_transaction(
        &self,
        id: &TransactionId,
        update: &TransactionUpdate,
    ) -> Result<(), BackendError> {
        let args = json!({
            "transaction_id": id.as_str(),
            "updates": { "category": update.category },
        });

        self.call_decode::<Empty>("update_transaction", args, "Failed to update transaction")
            .await
            .map(|_| ())
    }

    async fn delete_transaction(&self, id: &TransactionId) -> Result<(), BackendError> {
        let args = json!({ "transaction_id": id.as_str() });

        self.call_decode::<Empty>("delete_transaction", args, "Failed to delete transaction")
            .await
            .map(|_| ())
    }

    async fn export_spending(&self, request: &ExportRequest) -> Result<u64, BackendError> {
        let args = json!({
            "start_date": request.range.start.to_string(),
            "end_date": request.range.end.to_string(),
            "format": request.format.as_str(),
            "file_path": request.file_path,
        });

        let payload: ExportPayload = self
            .call_decode("export_spending", args, "Export failed")
            .await?;

        Ok(payload.record_count)
    }

    async fn import_statement(
        &self,
        file_path: &str,
        kind: StatementKind,
    ) -> Result<u64, BackendError> {
        let command = match kind {
            StatementKind::Csv => "parse_csv",
            StatementKind::Pdf => "parse_pdf",
        };

        let payload: ImportPayload = self
            .call_decode(command, json!({ "file_path": file_path }), "Import failed")
            .await?;

        Ok(payload.count)
    }

    async fn check_password_status(&self) -> Result<bool, BackendError> {
        let payload: PasswordStatusPayload = self
            .call_decode("check_password_status", json!({}), UNKNOWN_ERROR)
            .await?;

        Ok(payload.password_enabled)
    }

    async fn verify_password(&self, password: &str) -> Result<(), BackendError> {
        self.call_decode::<Empty>(
            "verify_password",
            json!({ "password": password }),
            "Invalid password",
        )
        .await
        .map(|_| ())
    }

    async fn setup_password(&self, password: &str) -> Result<(), BackendError> {
        self.call_decode::<Empty>(
            "setup_password",
            json!({ "password": password }),
            "Failed to enable password protection",
        )
        .await
        .map(|_| ())
    }

    async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), BackendError> {
        self.call_decode::<Empty>(
            "change_password",
            json!({ "old_password": old_password, "new_password": new_password }),
            "Failed to change password",
        )
        .await
        .map(|_| ())
    }

    async fn disable_password(&self, password: &str) -> Result<(), BackendError> {
        self.call_decode::<Empty>(
            "disable_password",
            json!({ "password": password }),
            "Failed to disable password protection",
        )
        .await
        .map(|_| ())
    }
}
