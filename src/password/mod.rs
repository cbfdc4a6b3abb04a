//! Optional password protection.
//!
//! The backend stores and checks the password. This module keeps track of
//! whether the current session has been unlocked, guards the other pages and
//! serves the unlock and settings pages.

mod guard;
mod settings;
mod unlock;
mod validation;

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{AppState, backend::Backend, session::SharedSession};

pub use guard::{unlock_guard, unlock_guard_hx};
pub use settings::{
    change_password_endpoint, disable_password_endpoint, get_settings_page,
    setup_password_endpoint,
};
pub use unlock::{get_unlock_page, lock_endpoint, unlock_endpoint};
pub use validation::MIN_PASSWORD_LENGTH;

/// The state needed by the password pages and the unlock guard.
#[derive(Debug, Clone)]
pub struct PasswordState {
    /// The service that stores and checks the password.
    pub backend: Arc<dyn Backend>,
    /// The view session that records whether it has been unlocked.
    pub session: SharedSession,
}

impl FromRef<AppState> for PasswordState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            backend: state.backend.clone(),
            session: state.session.clone(),
        }
    }
}
