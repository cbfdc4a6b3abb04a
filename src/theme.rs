//! Switching between the light and dark colour schemes.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRefresh;

use crate::session::{SharedSession, lock_session};

/// Flip the session's theme and ask the client to reload the page.
pub async fn toggle_theme_endpoint(State(session): State<SharedSession>) -> Response {
    let theme = match lock_session(&session) {
        Ok(mut session) => {
            session.theme = session.theme.toggled();
            session.theme
        }
        Err(error) => return error.into_alert_response(),
    };

    tracing::debug!("Switched to {theme:?} theme");

    (HxRefresh(true), StatusCode::OK).into_response()
}
