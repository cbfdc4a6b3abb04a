//! The unlock page and the endpoints for unlocking and locking the session.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};

use crate::{
    Error,
    backend::BackendError,
    category::Theme,
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, base, loading_spinner, password_input},
    session::lock_session,
};

use super::{PasswordState, validation::UnlockForm};

const AUTHENTICATION_FAILED_MSG: &str = "Authentication failed. Please try again.";
const INVALID_PASSWORD_MSG: &str = "Invalid password";

fn unlock_form(error_message: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::UNLOCK_API)
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            hx-disabled-elt="#password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            (password_input("password", "Password", None))

            @if let Some(error_message) = error_message {
                p class="text-red-500 text-base" role="alert" { (error_message) }
            }

            button
                type="submit" id="submit-button" tabindex="0"
                class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Unlock"
            }
        }
    }
}

fn unlock_view(theme: Theme) -> Markup {
    let content = html! {
        div class=(FORM_CONTAINER_STYLE)
        {
            div class="w-full max-w-md space-y-4"
            {
                h1 class="text-xl font-bold leading-tight tracking-tight text-gray-900 md:text-2xl dark:text-white"
                {
                    "Spendview is locked"
                }

                (unlock_form(None))
            }
        }
    };

    base("Unlock", theme, &[], &content)
}

/// Display the unlock page, or go straight to the transactions if already unlocked.
pub async fn get_unlock_page(State(state): State<PasswordState>) -> Result<Response, Error> {
    let session = lock_session(&state.session)?;

    if session.unlocked || session.password_enabled == Some(false) {
        return Ok(Redirect::to(endpoints::TRANSACTIONS_VIEW).into_response());
    }

    Ok(unlock_view(session.theme).into_response())
}

/// Check the password and unlock the session.
///
/// On success the client is redirected to the transactions page, otherwise
/// the form is returned with an error message.
pub async fn unlock_endpoint(
    State(state): State<PasswordState>,
    Form(form): Form<UnlockForm>,
) -> Response {
    let password = match form.validate() {
        Ok(password) => password,
        Err(error) => return unlock_form(Some(&error.to_string())).into_response(),
    };

    match state.backend.verify_password(&password).await {
        Ok(()) => {}
        Err(BackendError::Rejected(message)) => {
            tracing::info!("Unlock attempt with an incorrect password");
            let message = if message.is_empty() {
                INVALID_PASSWORD_MSG.to_owned()
            } else {
                message
            };
            return unlock_form(Some(&message)).into_response();
        }
        Err(error) => {
            tracing::error!("Could not verify password: {error}");
            return unlock_form(Some(AUTHENTICATION_FAILED_MSG)).into_response();
        }
    }

    match lock_session(&state.session) {
        Ok(mut session) => {
            session.unlocked = true;
            session.password_enabled = Some(true);
        }
        Err(error) => return error.into_alert_response(),
    }

    tracing::info!("Session unlocked");

    (
        HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
        StatusCode::OK,
    )
        .into_response()
}

/// Lock the session and send the client to the unlock page.
pub async fn lock_endpoint(State(state): State<PasswordState>) -> Response {
    match lock_session(&state.session) {
        Ok(mut session) => session.unlocked = false,
        Err(error) => return error.into_alert_response(),
    }

    tracing::info!("Session locked");

    (HxRedirect(endpoints::UNLOCK_VIEW.to_owned()), StatusCode::OK).into_response()
}
