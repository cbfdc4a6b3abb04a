//! Application router configuration with protected and unprotected route definitions.

use std::path::Path;

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    analytics::{export_endpoint, get_analytics_page},
    endpoints,
    import::{get_import_page, import_statement_endpoint},
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    password::{
        change_password_endpoint, disable_password_endpoint, get_settings_page, get_unlock_page,
        lock_endpoint, setup_password_endpoint, unlock_endpoint, unlock_guard, unlock_guard_hx,
    },
    theme::toggle_theme_endpoint,
    transaction::{
        cancel_delete_transaction, cancel_edit_transaction, delete_transaction_endpoint,
        get_delete_transaction_row, get_edit_transaction_row, get_transactions_page,
        update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
///
/// Files under `static_dir` are served from [endpoints::STATIC].
pub fn build_router(state: AppState, static_dir: &Path) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::UNLOCK_VIEW, get(get_unlock_page))
        .route(endpoints::UNLOCK_API, post(unlock_endpoint))
        .route(endpoints::THEME, post(toggle_theme_endpoint))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::TRANSACTIONS_VIEW, get(get_transactions_page))
        .route(endpoints::ANALYTICS_VIEW, get(get_analytics_page))
        .route(endpoints::IMPORT_VIEW, get(get_import_page))
        .route(endpoints::SETTINGS_VIEW, get(get_settings_page))
        .layer(middleware::from_fn_with_state(state.clone(), unlock_guard));

    // Routes requested by HTMX need the HX-REDIRECT header for the redirect to the unlock page to work.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(
                endpoints::EDIT_TRANSACTION_VIEW,
                get(get_edit_transaction_row),
            )
            .route(
                endpoints::CANCEL_EDIT_TRANSACTION,
                post(cancel_edit_transaction),
            )
            .route(
                endpoints::DELETE_TRANSACTION_VIEW,
                get(get_delete_transaction_row),
            )
            .route(
                endpoints::CANCEL_DELETE_TRANSACTION,
                post(cancel_delete_transaction),
            )
            .route(
                endpoints::TRANSACTIONS_API,
                axum::routing::put(update_transaction_endpoint).delete(delete_transaction_endpoint),
            )
            .route(endpoints::EXPORT, post(export_endpoint))
            .route(endpoints::IMPORT, post(import_statement_endpoint))
            .route(endpoints::LOCK, post(lock_endpoint))
            .route(endpoints::SETUP_PASSWORD, post(setup_password_endpoint))
            .route(endpoints::CHANGE_PASSWORD, post(change_password_endpoint))
            .route(endpoints::DISABLE_PASSWORD, post(disable_password_endpoint))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                unlock_guard_hx,
            )),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new(static_dir))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the transactions page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::TRANSACTIONS_VIEW)
}


#[cfg(test)]
mod router_tests {
    use std::path::Path;

    use axum::http::StatusCode;
    use axum_test::TestServer;
    use scraper::{Html, Selector};
    use serde::Serialize;
    use time::OffsetDateTime;

    use crate::{
        AppState,
        backend::{Backend, MemoryBackend},
        endpoints::{self, with_transaction_id},
    };

    use super::build_router;

    #[derive(Serialize)]
    struct PasswordForm<'a> {
        password: &'a str,
    }

    #[derive(Serialize)]
    struct CategoryForm<'a> {
        transaction_id: &'a str,
        category: &'a str,
    }

    fn get_test_server(backend: MemoryBackend) -> TestServer {
        let state = AppState::new(backend, "Etc/UTC");
        let app = build_router(state, Path::new("static/"));

        TestServer::new(app).expect("Could not create test server.")
    }

    fn sample_backend() -> MemoryBackend {
        MemoryBackend::with_sample_data(OffsetDateTime::now_utc().date())
    }

    fn row_ids(text: &str) -> Vec<String> {
        Html::parse_document(text)
            .select(&Selector::parse("tbody tr").unwrap())
            .filter_map(|row| row.value().attr("data-transaction-id"))
            .map(str::to_owned)
            .collect()
    }

    #[tokio::test]
    async fn pages_are_served_without_password() {
        let server = get_test_server(sample_backend());

        for endpoint in [
            endpoints::TRANSACTIONS_VIEW,
            endpoints::ANALYTICS_VIEW,
            endpoints::IMPORT_VIEW,
            endpoints::SETTINGS_VIEW,
        ] {
            server.get(endpoint).await.assert_status_ok();
        }
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let server = get_test_server(MemoryBackend::new());

        server
            .get("/does/not/exist")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn locked_session_must_unlock_first() {
        let backend = sample_backend();
        backend.setup_password("hunter222").await.unwrap();
        let server = get_test_server(backend);

        let response = server.get(endpoints::TRANSACTIONS_VIEW).await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), endpoints::UNLOCK_VIEW);

        server.get(endpoints::UNLOCK_VIEW).await.assert_status_ok();

        let response = server
            .post(endpoints::UNLOCK_API)
            .form(&PasswordForm {
                password: "hunter222",
            })
            .await;
        assert_eq!(response.header("hx-redirect"), endpoints::TRANSACTIONS_VIEW);

        server
            .get(endpoints::TRANSACTIONS_VIEW)
            .await
            .assert_status_ok();

        let response = server.post(endpoints::LOCK).await;
        assert_eq!(response.header("hx-redirect"), endpoints::UNLOCK_VIEW);
        server
            .get(endpoints::ANALYTICS_VIEW)
            .await
            .assert_status(StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn edit_and_delete_rows() {
        let server = get_test_server(sample_backend());
        let page = server.get(endpoints::TRANSACTIONS_VIEW).await.text();
        let ids = row_ids(&page);
        let first = ids.first().expect("sample data should have rows").clone();

        server
            .get(&with_transaction_id(endpoints::EDIT_TRANSACTION_VIEW, &first))
            .await
            .assert_status_ok();
        server
            .put(endpoints::TRANSACTIONS_API)
            .form(&CategoryForm {
                transaction_id: &first,
                category: "Bicycle Repairs",
            })
            .await
            .assert_status_ok();

        let page = server.get(endpoints::TRANSACTIONS_VIEW).await.text();
        assert!(page.contains("Bicycle Repairs"));

        server
            .get(&with_transaction_id(endpoints::DELETE_TRANSACTION_VIEW, &first))
            .await
            .assert_status_ok();
        server
            .delete(&with_transaction_id(endpoints::TRANSACTIONS_API, &first))
            .await
            .assert_status_ok();

        let page = server.get(endpoints::TRANSACTIONS_VIEW).await.text();
        assert_eq!(row_ids(&page).len(), ids.len() - 1);
        assert!(!row_ids(&page).contains(&first));
    }
}
