//! The JSON envelope exchanged with the backend program.
//!
//! Requests look like `{"command": "get_transactions", "args": {...}}` and
//! responses like `{"success": true, ...payload}` or
//! `{"success": false, "error": "message"}`.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::transaction::Transaction;

use super::BackendError;

/// A command sent to the backend.
#[derive(Debug, Serialize)]
pub(super) struct Request<'a> {
    pub command: &'a str,
    pub args: Value,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Check the `success` flag of `response` and decode the payload fields.
///
/// `rejected_default` is used when the backend reports a failure without a
/// message.
pub(super) fn decode<T: DeserializeOwned>(
    response: Value,
    rejected_default: &str,
) -> Result<T, BackendError> {
    let envelope = Envelope::deserialize(&response)
        .map_err(|error| BackendError::InvalidResponse(error.to_string()))?;

    if !envelope.success {
        let message = envelope
            .error
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| rejected_default.to_owned());

        return Err(BackendError::Rejected(message));
    }

    T::deserialize(response).map_err(|error| BackendError::InvalidResponse(error.to_string()))
}

/// A response that carries no payload.
#[derive(Debug, Deserialize)]
pub(super) struct Empty {}

#[derive(Debug, Deserialize)]
pub(super) struct TransactionsPayload {
    pub transactions: Vec<Value>,
}

impl TransactionsPayload {
    /// Decode each record on its own, skipping the ones that are unusable.
    pub fn into_transactions(self) -> Vec<Transaction> {
        self.transactions
            .into_iter()
            .filter_map(|record| {
                serde_json::from_value(record)
                    .inspect_err(|error| {
                        tracing::warn!("Skipping transaction record the backend sent: {error}")
                    })
                    .ok()
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct SummaryPayload {
    pub summary: super::SpendingSummary,
}

#[derive(Debug, Deserialize)]
pub(super) struct BreakdownPayload {
    pub categories: Vec<super::CategoryTotal>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CategoriesPayload {
    pub categories: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ExportPayload {
    #[serde(default)]
    pub record_count: u64,
}

#[derive(Debug, Deserialize)]
pub(super) struct ImportPayload {
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Deserialize)]
pub(super) struct PasswordStatusPayload {
    pub password_enabled: bool,
}
