//! Route handlers for editing a transaction's category in place.

use axum::{extract::State, response::Response};
use axum_extra::extract::{Form, Query};
use serde::Deserialize;

use crate::{Error, alert::Alert, backend::TransactionUpdate, session::lock_session};

use super::{
    TransactionId,
    transactions_page::{TransactionsState, content_response, reload_after_change},
};

/// Identifies the row an action applies to.
#[derive(Debug, Deserialize)]
pub struct RowQuery {
    /// The backend's ID for the transaction.
    pub transaction_id: TransactionId,
}

/// The form submitted when saving a category.
#[derive(Debug, Deserialize)]
pub struct UpdateCategoryForm {
    /// The transaction being edited.
    pub transaction_id: TransactionId,
    /// The text in the category input.
    pub category: String,
}

/// Put the row for `transaction_id` into edit mode.
pub async fn get_edit_transaction_row(
    State(state): State<TransactionsState>,
    Query(query): Query<RowQuery>,
) -> Response {
    {
        let mut session = match lock_session(&state.session) {
            Ok(session) => session,
            Err(error) => return error.into_alert_response(),
        };

        let current_category = session.snapshot.as_ref().and_then(|snapshot| {
            snapshot
                .transactions
                .iter()
                .find(|transaction| transaction.id == query.transaction_id)
                .map(|transaction| transaction.category.clone())
        });

        let Some(current_category) = current_category else {
            tracing::warn!(
                "Tried to edit transaction {} which is not loaded",
                query.transaction_id
            );
            return Error::NotFound.into_alert_response();
        };

        session
            .editor
            .begin_edit(query.transaction_id, &current_category);
    }

    content_response(&state.session, None)
}

/// Leave edit mode without saving.
pub async fn cancel_edit_transaction(State(state): State<TransactionsState>) -> Response {
    match lock_session(&state.session) {
        Ok(mut session) => {
            session.editor.cancel();
        }
        Err(error) => return error.into_alert_response(),
    }

    content_response(&state.session, None)
}

/// Save the category typed into the row being edited.
///
/// A blank category is refused without contacting the backend. After a
/// successful save the transactions and categories are reloaded so new
/// categories show up in the filter. If the backend refuses, the row stays in
/// edit mode with the backend's message.
pub async fn update_transaction_endpoint(
    State(state): State<TransactionsState>,
    Form(form): Form<UpdateCategoryForm>,
) -> Response {
    let request = {
        let mut session = match lock_session(&state.session) {
            Ok(session) => session,
            Err(error) => return error.into_alert_response(),
        };

        let confirmed = session
            .editor
            .update_buffer(&form.transaction_id, &form.category)
            .and_then(|_| session.editor.confirm());

        match confirmed {
            Ok(request) => request,
            Err(Error::EmptyCategory) => {
                drop(session);
                return content_response(&state.session, None);
            }
            Err(error) => {
                drop(session);
                let (_, alert) = error.into_alert();
                return content_response(&state.session, Some(alert));
            }
        }
    };

    let update = TransactionUpdate {
        category: request.category.clone(),
    };

    match state.backend.update_transaction(&request.id, &update).await {
        Ok(()) => {
            tracing::info!(
                "Changed category of transaction {} to {:?}",
                request.id,
                request.category
            );

            match lock_session(&state.session) {
                Ok(mut session) => session.editor.save_succeeded(&request.id),
                Err(error) => return error.into_alert_response(),
            }

            let alert = reload_after_change(state.backend.as_ref(), &state.session).await;
            content_response(&state.session, alert)
        }
        Err(error) => {
            tracing::warn!("Could not update transaction {}: {error}", request.id);

            match lock_session(&state.session) {
                Ok(mut session) => session
                    .editor
                    .save_failed(&request.id, &error.user_message()),
                Err(error) => return error.into_alert_response(),
            }

            content_response(
                &state.session,
                Some(Alert::Error {
                    message: "Could not save category".to_owned(),
                    details: error.user_message(),
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode};
    use axum_extra::extract::{Form, Query};
    use scraper::Selector;
    use time::macros::date;

    use crate::{
        backend::{Backend, BackendError, MemoryBackend},
        session::{lock_session, new_shared_session, reload_snapshot},
        test_utils::{assert_valid_html, parse_html_fragment},
        transaction::{RowMode, Transaction, TransactionId},
    };

    use super::{
        RowQuery, TransactionsState, UpdateCategoryForm, cancel_edit_transaction,
        get_edit_transaction_row, update_transaction_endpoint,
    };

    fn transaction(id: &str, category: &str) -> Transaction {
        Transaction {
            id: TransactionId::new(id),
            date: Some(date!(2025 - 02 - 01)),
            merchant: "Corner Store".to_owned(),
            amount: Some(-12.0),
            category: category.to_owned(),
            confidence: Some(0.4),
        }
    }

    async fn loaded_state(backend: MemoryBackend) -> TransactionsState {
        let state = TransactionsState {
            backend: Arc::new(backend),
            session: new_shared_session(),
        };
        reload_snapshot(state.backend.as_ref(), &state.session)
            .await
            .unwrap();
        state
    }

    async fn begin_edit(state: &TransactionsState, id: &str) {
        let response = get_edit_transaction_row(
            State(state.clone()),
            Query(RowQuery {
                transaction_id: TransactionId::new(id),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    fn form(id: &str, category: &str) -> Form<UpdateCategoryForm> {
        Form(UpdateCategoryForm {
            transaction_id: TransactionId::new(id),
            category: category.to_owned(),
        })
    }

    #[tokio::test]
    async fn edit_row_contains_category_input() {
        let state = loaded_state(MemoryBackend::with_transactions(vec![transaction(
            "7", "Food",
        )]))
        .await;

        let response = get_edit_transaction_row(
            State(state.clone()),
            Query(RowQuery {
                transaction_id: TransactionId::new("7"),
            }),
        )
        .await;

        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let input = html
            .select(&Selector::parse("tbody form input[name=category]").unwrap())
            .next()
            .expect("editing row should have a category input");
        assert_eq!(input.value().attr("value"), Some("Food"));
    }

    #[tokio::test]
    async fn editing_unknown_row_is_not_found() {
        let state = loaded_state(MemoryBackend::new()).await;

        let response = get_edit_transaction_row(
            State(state),
            Query(RowQuery {
                transaction_id: TransactionId::new("missing"),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn save_updates_backend_and_reloads() {
        let backend = MemoryBackend::with_transactions(vec![transaction("7", "Food")]);
        let state = loaded_state(backend.clone()).await;
        begin_edit(&state, "7").await;

        let response = update_transaction_endpoint(State(state.clone()), form("7", " Pets ")).await;

        assert_eq!(response.status(), StatusCode::OK);
        let stored = backend.get_transactions().await.unwrap();
        assert_eq!(stored[0].category, "Pets");
        let session = lock_session(&state.session).unwrap();
        assert_eq!(session.editor.mode(), &RowMode::Viewing);
        let snapshot = session.snapshot.as_ref().unwrap();
        assert_eq!(snapshot.transactions[0].category, "Pets");
        assert!(snapshot.categories.contains(&"Pets".to_owned()));
    }

    #[tokio::test]
    async fn blank_category_is_refused_locally() {
        let backend = MemoryBackend::with_transactions(vec![transaction("7", "Food")]);
        let state = loaded_state(backend.clone()).await;
        begin_edit(&state, "7").await;
        backend.set_fault(Some(BackendError::Unavailable(
            "should not be called".to_owned(),
        )));

        let response = update_transaction_endpoint(State(state.clone()), form("7", "   ")).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        let error = html
            .select(&Selector::parse("tbody p[role=alert]").unwrap())
            .next()
            .expect("inline error should be shown");
        assert_eq!(error.text().collect::<String>(), "Category cannot be empty");
        assert!(lock_session(&state.session).unwrap().editor.is_editing(&TransactionId::new("7")));
    }

    #[tokio::test]
    async fn rejected_save_keeps_editing_with_message() {
        let backend = MemoryBackend::with_transactions(vec![transaction("7", "Food")]);
        let state = loaded_state(backend.clone()).await;
        begin_edit(&state, "7").await;
        backend.set_fault(Some(BackendError::Rejected(
            "Transaction is read-only".to_owned(),
        )));

        let response = update_transaction_endpoint(State(state.clone()), form("7", "Pets")).await;

        let html = parse_html_fragment(response).await;
        let alert_text = html
            .select(&Selector::parse("#alert-container").unwrap())
            .next()
            .expect("response should carry an alert")
            .text()
            .collect::<String>();
        assert!(alert_text.contains("Transaction is read-only"));
        let session = lock_session(&state.session).unwrap();
        match session.editor.mode() {
            RowMode::Editing { buffer, error, .. } => {
                assert_eq!(buffer, "Pets");
                assert_eq!(error.as_deref(), Some("Transaction is read-only"));
            }
            other => panic!("want editing mode, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn saving_a_row_that_is_not_being_edited_is_refused() {
        let backend = MemoryBackend::with_transactions(vec![
            transaction("7", "Food"),
            transaction("8", "Food"),
        ]);
        let state = loaded_state(backend.clone()).await;
        begin_edit(&state, "8").await;

        let response = update_transaction_endpoint(State(state.clone()), form("7", "Pets")).await;

        let html = parse_html_fragment(response).await;
        assert!(
            html.select(&Selector::parse("#alert-container").unwrap())
                .next()
                .is_some()
        );
        let stored = backend.get_transactions().await.unwrap();
        assert!(stored.iter().all(|transaction| transaction.category == "Food"));
    }

    #[tokio::test]
    async fn cancel_returns_to_viewing() {
        let state = loaded_state(MemoryBackend::with_transactions(vec![transaction(
            "7", "Food",
        )]))
        .await;
        begin_edit(&state, "7").await;

        let response = cancel_edit_transaction(State(state.clone())).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            lock_session(&state.session).unwrap().editor.mode(),
            &RowMode::Viewing
        );
    }
}
