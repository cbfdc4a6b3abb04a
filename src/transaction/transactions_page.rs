//! Defines the route handler for the page that displays transactions as a table.

use std::sync::Arc;

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Query;
use maud::html;
use serde::Deserialize;

use crate::{
    AppState, Error,
    alert::Alert,
    backend::Backend,
    session::{SharedSession, lock_session, reload_snapshot},
};

use super::{
    CategorySelection, SortDirection, SortKey, SortSpec,
    view::{transactions_content, transactions_page},
};

/// The state needed for the transactions page and its row actions.
#[derive(Debug, Clone)]
pub struct TransactionsState {
    /// The service that owns the transactions.
    pub backend: Arc<dyn Backend>,
    /// The view session with the sort, filter and row editor.
    pub session: SharedSession,
}

impl FromRef<AppState> for TransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            backend: state.backend.clone(),
            session: state.session.clone(),
        }
    }
}

/// The query parameters for the transactions page.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionsQuery {
    /// The column to sort by.
    pub sort: Option<SortKey>,
    /// The sort direction, ascending if a column is given without one.
    pub direction: Option<SortDirection>,
    /// The categories to show.
    #[serde(default)]
    pub category: Vec<String>,
    /// Set by the filter form so that unticking every box clears the filter.
    pub filter: Option<String>,
}

impl TransactionsQuery {
    /// The sort the query asks for, if any.
    fn sort_spec(&self) -> Option<SortSpec> {
        self.sort.map(|key| {
            SortSpec::new(key, self.direction.unwrap_or(SortDirection::Ascending))
        })
    }

    /// The category selection the query asks for, if any.
    fn selection(&self) -> Option<CategorySelection> {
        if self.filter.is_some() || !self.category.is_empty() {
            Some(self.category.iter().map(String::as_str).collect())
        } else {
            None
        }
    }
}

/// Render the transactions table.
///
/// Every visit loads a fresh snapshot from the backend. If that fails the
/// last complete snapshot is shown together with an error.
pub async fn get_transactions_page(
    State(state): State<TransactionsState>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Response, Error> {
    {
        let mut session = lock_session(&state.session)?;

        if let Some(sort) = query.sort_spec() {
            session.sort = sort;
        }

        if let Some(selection) = query.selection() {
            session.selection = selection;
        }
    }

    let alert = match reload_snapshot(state.backend.as_ref(), &state.session).await {
        Ok(_) => None,
        Err(error) => Some(load_failed_alert(error)),
    };

    let mut session = lock_session(&state.session)?;
    let content = transactions_content(&mut session);
    let show_lock = session.password_enabled == Some(true);

    Ok(transactions_page(content, session.theme, show_lock, alert).into_response())
}

fn load_failed_alert(error: Error) -> Alert {
    Alert::Error {
        message: "Could not load transactions".to_owned(),
        details: error.user_message(),
    }
}

/// Re-render the table section, with `alert` swapped into the alert container.
///
/// Used by every row action so the table always reflects the session.
pub(crate) fn content_response(session: &SharedSession, alert: Option<Alert>) -> Response {
    let mut session = match lock_session(session) {
        Ok(session) => session,
        Err(error) => return error.into_alert_response(),
    };

    let content = transactions_content(&mut session);

    html! {
        (content)

        @if let Some(alert) = alert {
            (alert.into_html())
        }
    }
    .into_response()
}

/// Reload the snapshot after a change, returning an alert if that failed.
pub(crate) async fn reload_after_change(
    backend: &dyn Backend,
    session: &SharedSession,
) -> Option<Alert> {
    reload_snapshot(backend, session)
        .await
        .err()
        .map(load_failed_alert)
}
