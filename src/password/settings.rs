//! The settings page for turning password protection on and off.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use maud::{Markup, html};

use crate::{
    Error,
    alert::Alert,
    endpoints,
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, CARD_STYLE, PAGE_CONTAINER_STYLE, base,
        password_input,
    },
    navigation::NavBar,
    session::lock_session,
};

use super::{
    MIN_PASSWORD_LENGTH, PasswordState,
    validation::{ChangePasswordForm, DisablePasswordForm, SetupPasswordForm},
};

const SETTINGS_CONTENT_ID: &str = "password-settings";
const SETTINGS_CONTENT_TARGET: &str = "#password-settings";

fn setup_form() -> Markup {
    html! {
        form
            hx-post=(endpoints::SETUP_PASSWORD)
            hx-target=(SETTINGS_CONTENT_TARGET)
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="space-y-4"
        {
            p class="text-sm text-gray-600 dark:text-gray-400"
            {
                "Require a password before anyone can view your transactions."
            }

            (password_input("password", "Password", Some(MIN_PASSWORD_LENGTH)))
            (password_input("confirm_password", "Confirm password", Some(MIN_PASSWORD_LENGTH)))

            div
                data-risk-warning
                class="p-4 space-y-2 text-sm rounded border-l-4 border-red-500 bg-red-50 \
                    text-red-900 dark:bg-red-900/20 dark:text-red-200"
            {
                p class="font-semibold"
                {
                    "If you forget your password, your financial data will be permanently lost."
                }
                p { "There is no password recovery and no \"forgot password\" option." }
            }

            div class="flex items-center gap-3"
            {
                input
                    type="checkbox"
                    id="accept_risk"
                    name="accept_risk"
                    value="true"
                    required
                    class="w-4 h-4 rounded";
                label for="accept_risk" class="text-sm font-medium"
                {
                    "I understand and accept this risk"
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Enable password protection" }
        }
    }
}

fn change_form() -> Markup {
    html! {
        form
            hx-post=(endpoints::CHANGE_PASSWORD)
            hx-target=(SETTINGS_CONTENT_TARGET)
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="space-y-4"
        {
            h3 class="font-semibold" { "Change password" }

            (password_input("current_password", "Current password", None))
            (password_input("new_password", "New password", Some(MIN_PASSWORD_LENGTH)))
            (password_input("confirm_password", "Confirm new password", Some(MIN_PASSWORD_LENGTH)))

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Change password" }
        }
    }
}

fn disable_form() -> Markup {
    html! {
        form
            hx-post=(endpoints::DISABLE_PASSWORD)
            hx-target=(SETTINGS_CONTENT_TARGET)
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            hx-confirm="Turn off password protection?"
            class="space-y-4"
        {
            h3 class="font-semibold" { "Disable password protection" }

            // Named apart from the change form's field so element IDs stay unique.
            (password_input("disable_password", "Current password", None))

            button type="submit" class=(BUTTON_DELETE_STYLE) { "Disable password protection" }
        }
    }
}

/// The password section, which depends on whether protection is on.
fn settings_content(password_enabled: Option<bool>) -> Markup {
    html! {
        section id=(SETTINGS_CONTENT_ID) class={ (CARD_STYLE) " space-y-6 dark:text-white" }
        {
            h2 class="text-lg font-semibold" { "Password protection" }

            @match password_enabled {
                Some(true) => {
                    p data-password-status="enabled" { "Password protection is enabled." }
                    (change_form())
                    hr class="border-gray-200 dark:border-gray-700";
                    (disable_form())
                }
                Some(false) => {
                    p data-password-status="disabled" { "Password protection is disabled." }
                    (setup_form())
                }
                None => {
                    p data-password-status="unknown" class="text-red-700 dark:text-red-400"
                    {
                        "Could not check whether password protection is enabled. \
                        Reload the page to try again."
                    }
                }
            }
        }
    }
}

/// Display the settings page.
pub async fn get_settings_page(State(state): State<PasswordState>) -> Result<Response, Error> {
    let password_enabled = match state.backend.check_password_status().await {
        Ok(password_enabled) => Some(password_enabled),
        Err(error) => {
            tracing::error!("Could not check password status: {error}");
            None
        }
    };

    let mut session = lock_session(&state.session)?;
    if password_enabled.is_some() {
        session.password_enabled = password_enabled;
    }

    let nav_bar = NavBar::new(endpoints::SETTINGS_VIEW)
        .with_lock(password_enabled == Some(true))
        .into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-md space-y-4"
            {
                h1 class="text-xl font-bold dark:text-white" { "Settings" }
                (settings_content(password_enabled))
            }
        }
    };

    Ok(base("Settings", session.theme, &[], &content).into_response())
}

/// Re-render the password section with a success alert and record the new status.
fn settings_updated(state: &PasswordState, password_enabled: bool, message: &str) -> Response {
    match lock_session(&state.session) {
        Ok(mut session) => {
            session.password_enabled = Some(password_enabled);
            // Whoever changed the setting already knows the password.
            session.unlocked = password_enabled;
        }
        Err(error) => return error.into_alert_response(),
    }

    html! {
        (settings_content(Some(password_enabled)))
        (Alert::Success {
            message: message.to_owned(),
            details: String::new(),
        }
        .into_html())
    }
    .into_response()
}

/// Turn on password protection.
pub async fn setup_password_endpoint(
    State(state): State<PasswordState>,
    Form(form): Form<SetupPasswordForm>,
) -> Response {
    let password = match form.validate() {
        Ok(password) => password,
        Err(error) => return error.into_alert_response(),
    };

    if let Err(error) = state.backend.setup_password(password.as_str()).await {
        tracing::warn!("Could not enable password protection: {error}");
        return Error::Backend(error).into_alert_response();
    }

    tracing::info!("Password protection enabled");
    settings_updated(&state, true, "Password protection enabled successfully")
}

/// Replace the password.
pub async fn change_password_endpoint(
    State(state): State<PasswordState>,
    Form(form): Form<ChangePasswordForm>,
) -> Response {
    let (current_password, new_password) = match form.validate() {
        Ok(passwords) => passwords,
        Err(error) => return error.into_alert_response(),
    };

    if let Err(error) = state
        .backend
        .change_password(&current_password, new_password.as_str())
        .await
    {
        tracing::warn!("Could not change password: {error}");
        return Error::Backend(error).into_alert_response();
    }

    tracing::info!("Password changed");
    settings_updated(&state, true, "Password changed successfully")
}

/// Turn off password protection.
pub async fn disable_password_endpoint(
    State(state): State<PasswordState>,
    Form(form): Form<DisablePasswordForm>,
) -> Response {
    let current_password = match form.validate() {
        Ok(current_password) => current_password,
        Err(error) => return error.into_alert_response(),
    };

    if let Err(error) = state.backend.disable_password(&current_password).await {
        tracing::warn!("Could not disable password protection: {error}");
        return Error::Backend(error).into_alert_response();
    }

    tracing::info!("Password protection disabled");
    settings_updated(&state, false, "Password protection disabled")
}
