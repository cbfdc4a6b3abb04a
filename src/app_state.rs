//! Implements a struct that holds the state of the REST server.

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    backend::Backend,
    session::{SharedSession, new_shared_session},
};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The service that owns the transactions and the password.
    pub backend: Arc<dyn Backend>,

    /// The view session shared by every request.
    pub session: SharedSession,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl AppState {
    /// Create a new [AppState] with a fresh session.
    ///
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    pub fn new(backend: impl Backend + 'static, local_timezone: &str) -> Self {
        Self {
            backend: Arc::new(backend),
            session: new_shared_session(),
            local_timezone: local_timezone.to_owned(),
        }
    }
}

impl FromRef<AppState> for SharedSession {
    fn from_ref(state: &AppState) -> Self {
        state.session.clone()
    }
}
