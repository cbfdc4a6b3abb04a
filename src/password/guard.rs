//! Middleware that sends locked sessions to the unlock page.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_htmx::HxRedirect;

use crate::{Error, endpoints, session::lock_session};

use super::PasswordState;

/// Whether requests may pass, checking the backend when the status is unknown.
async fn is_unlocked(state: &PasswordState) -> Result<bool, Error> {
    let (unlocked, password_enabled) = {
        let session = lock_session(&state.session)?;
        (session.unlocked, session.password_enabled)
    };

    if unlocked {
        return Ok(true);
    }

    let password_enabled = match password_enabled {
        Some(password_enabled) => password_enabled,
        None => {
            let password_enabled = state.backend.check_password_status().await?;
            lock_session(&state.session)?.password_enabled = Some(password_enabled);
            password_enabled
        }
    };

    Ok(!password_enabled)
}

#[inline]
async fn unlock_guard_internal(
    state: PasswordState,
    request: Request,
    next: Next,
    get_redirect: impl Fn(&str) -> Response,
) -> Response {
    match is_unlocked(&state).await {
        Ok(true) => next.run(request).await,
        Ok(false) => get_redirect(endpoints::UNLOCK_VIEW),
        Err(error) => {
            tracing::error!(
                "Could not check password status for {}: {error}. Redirecting to unlock page.",
                request.uri().path()
            );
            get_redirect(endpoints::UNLOCK_VIEW)
        }
    }
}

/// Middleware that redirects to the unlock page while the session is locked.
///
/// If the password status cannot be determined the request is refused.
pub async fn unlock_guard(
    State(state): State<PasswordState>,
    request: Request,
    next: Next,
) -> Response {
    unlock_guard_internal(state, request, next, |redirect_url| {
        Redirect::to(redirect_url).into_response()
    })
    .await
}

/// Like [unlock_guard], but responds with an HTMX redirect for requests made by HTMX.
pub async fn unlock_guard_hx(
    State(state): State<PasswordState>,
    request: Request,
    next: Next,
) -> Response {
    unlock_guard_internal(state, request, next, |redirect_url| {
        (HxRedirect(redirect_url.to_owned()), StatusCode::OK).into_response()
    })
    .await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{Router, http::StatusCode, middleware, response::Html, routing::get};
    use axum_test::TestServer;

    use crate::{
        backend::{Backend, BackendError, MemoryBackend},
        endpoints,
        session::{lock_session, new_shared_session},
    };

    use super::{PasswordState, unlock_guard, unlock_guard_hx};

    const TEST_PROTECTED_ROUTE: &str = "/protected";
    const TEST_API_ROUTE: &str = "/api/protected";

    async fn test_handler() -> Html<&'static str> {
        Html("<h1>Hello, World!</h1>")
    }

    fn get_test_server(state: PasswordState) -> TestServer {
        let app = Router::new()
            .route(TEST_PROTECTED_ROUTE, get(test_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), unlock_guard))
            .merge(
                Router::new()
                    .route(TEST_API_ROUTE, get(test_handler))
                    .route_layer(middleware::from_fn_with_state(state.clone(), unlock_guard_hx)),
            )
            .with_state(state);

        TestServer::new(app).expect("Could not create test server.")
    }

    async fn protected_state() -> PasswordState {
        let backend = MemoryBackend::new();
        backend.setup_password("hunter222").await.unwrap();

        PasswordState {
            backend: Arc::new(backend),
            session: new_shared_session(),
        }
    }

    #[tokio::test]
    async fn passes_when_password_disabled() {
        let state = PasswordState {
            backend: Arc::new(MemoryBackend::new()),
            session: new_shared_session(),
        };
        let server = get_test_server(state.clone());

        server.get(TEST_PROTECTED_ROUTE).await.assert_status_ok();
        assert_eq!(
            lock_session(&state.session).unwrap().password_enabled,
            Some(false)
        );
    }

    #[tokio::test]
    async fn redirects_when_locked() {
        let server = get_test_server(protected_state().await);

        let response = server.get(TEST_PROTECTED_ROUTE).await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), endpoints::UNLOCK_VIEW);
    }

    #[tokio::test]
    async fn htmx_redirects_when_locked() {
        let server = get_test_server(protected_state().await);

        let response = server.get(TEST_API_ROUTE).await;

        response.assert_status_ok();
        assert_eq!(response.header("hx-redirect"), endpoints::UNLOCK_VIEW);
    }

    #[tokio::test]
    async fn passes_when_unlocked() {
        let state = protected_state().await;
        lock_session(&state.session).unwrap().unlocked = true;
        let server = get_test_server(state);

        let response = server.get(TEST_PROTECTED_ROUTE).await;

        response.assert_status_ok();
        response.assert_text("<h1>Hello, World!</h1>");
    }

    #[tokio::test]
    async fn fails_closed_when_status_unknown() {
        let backend = MemoryBackend::new();
        backend.set_fault(Some(BackendError::Unavailable("down".to_owned())));
        let state = PasswordState {
            backend: Arc::new(backend),
            session: new_shared_session(),
        };
        let server = get_test_server(state.clone());

        let response = server.get(TEST_PROTECTED_ROUTE).await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(lock_session(&state.session).unwrap().password_enabled, None);
    }
}
