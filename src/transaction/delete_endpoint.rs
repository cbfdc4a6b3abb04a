//! Route handlers for the two-step transaction delete.

use axum::{extract::State, response::Response};
use axum_extra::extract::Query;

use crate::{Error, alert::Alert, session::lock_session};

use super::{
    edit_endpoint::RowQuery,
    transactions_page::{TransactionsState, content_response, reload_after_change},
};

/// Ask the user to confirm deleting `transaction_id`.
pub async fn get_delete_transaction_row(
    State(state): State<TransactionsState>,
    Query(query): Query<RowQuery>,
) -> Response {
    {
        let mut session = match lock_session(&state.session) {
            Ok(session) => session,
            Err(error) => return error.into_alert_response(),
        };

        let is_loaded = session.snapshot.as_ref().is_some_and(|snapshot| {
            snapshot
                .transactions
                .iter()
                .any(|transaction| transaction.id == query.transaction_id)
        });

        if !is_loaded {
            tracing::warn!(
                "Tried to delete transaction {} which is not loaded",
                query.transaction_id
            );
            return Error::NotFound.into_alert_response();
        }

        session.editor.request_delete(query.transaction_id);
    }

    content_response(&state.session, None)
}

/// Dismiss the delete prompt.
pub async fn cancel_delete_transaction(State(state): State<TransactionsState>) -> Response {
    match lock_session(&state.session) {
        Ok(mut session) => session.editor.cancel_delete(),
        Err(error) => return error.into_alert_response(),
    }

    content_response(&state.session, None)
}

/// Delete a transaction whose deletion was confirmed, then reload.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionsState>,
    Query(query): Query<RowQuery>,
) -> Response {
    let confirmed = match lock_session(&state.session) {
        Ok(mut session) => session.editor.confirm_delete(&query.transaction_id),
        Err(error) => return error.into_alert_response(),
    };

    let id = match confirmed {
        Ok(id) => id,
        Err(error) => {
            let (_, alert) = error.into_alert();
            return content_response(&state.session, Some(alert));
        }
    };

    if let Err(error) = state.backend.delete_transaction(&id).await {
        tracing::warn!("Could not delete transaction {id}: {error}");
        return content_response(
            &state.session,
            Some(Alert::Error {
                message: "Could not delete transaction".to_owned(),
                details: error.user_message(),
            }),
        );
    }

    tracing::info!("Deleted transaction {id}");

    let alert = reload_after_change(state.backend.as_ref(), &state.session)
        .await
        .unwrap_or_else(|| Alert::Success {
            message: "Transaction deleted".to_owned(),
            details: String::new(),
        });

    content_response(&state.session, Some(alert))
}
