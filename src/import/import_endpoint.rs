//! The endpoint that hands a statement file to the backend.

use std::sync::Arc;

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use serde::Deserialize;

use crate::{
    AppState, Error,
    alert::Alert,
    backend::{Backend, StatementKind},
    session::{SharedSession, lock_session},
};

/// The state needed to import a statement.
#[derive(Debug, Clone)]
pub struct ImportState {
    /// The service that parses and stores statements.
    pub backend: Arc<dyn Backend>,
    /// The view session whose snapshot goes stale after an import.
    pub session: SharedSession,
}

impl FromRef<AppState> for ImportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            backend: state.backend.clone(),
            session: state.session.clone(),
        }
    }
}

/// The form submitted from the import page.
#[derive(Debug, Deserialize)]
pub struct ImportForm {
    /// The path of the statement on the machine running the backend.
    pub file_path: String,
}

/// Import the statement at the submitted path.
///
/// Files ending in `.pdf` are parsed as PDF statements, anything else as CSV.
pub async fn import_statement_endpoint(
    State(state): State<ImportState>,
    Form(form): Form<ImportForm>,
) -> Response {
    let file_path = form.file_path.trim();
    if file_path.is_empty() {
        return Error::EmptyFilePath.into_alert_response();
    }

    let kind = StatementKind::from_path(file_path);

    let count = match state.backend.import_statement(file_path, kind).await {
        Ok(count) => count,
        Err(error) => {
            tracing::warn!("Could not import {file_path} as {kind:?}: {error}");
            return Error::Backend(error).into_alert_response();
        }
    };

    tracing::info!("Imported {count} transactions from {file_path}");

    // The next visit to the transactions page reloads everything.
    match lock_session(&state.session) {
        Ok(mut session) => session.snapshot = None,
        Err(error) => return error.into_alert_response(),
    }

    Alert::Success {
        message: "Import complete".to_owned(),
        details: format!("Imported {count} transactions"),
    }
    .into_response()
}
