//! The view session: everything the pages remember between requests.
//!
//! The server is local and single-user, so there is one session per process.

use std::{
    collections::BTreeSet,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::{
    Error,
    backend::{Backend, BackendError},
    category::{CategoryColorTable, Theme},
    transaction::{CategorySelection, RowEditor, SortSpec, Transaction},
};

/// The transactions and category vocabulary from the last successful load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Every transaction, in the order the backend returned them.
    pub transactions: Vec<Transaction>,
    /// The backend's category vocabulary.
    pub categories: Vec<String>,
}

impl Snapshot {
    /// Fetch a complete snapshot, failing if either half fails.
    pub async fn load(backend: &dyn Backend) -> Result<Self, BackendError> {
        let (transactions, categories) =
            tokio::try_join!(backend.get_transactions(), backend.get_categories())?;

        Ok(Self {
            transactions,
            categories,
        })
    }

    /// The categories a user can filter or edit by: the vocabulary plus any
    /// category that appears on a transaction, sorted and without duplicates.
    pub fn category_options(&self) -> Vec<String> {
        self.categories
            .iter()
            .chain(self.transactions.iter().map(|transaction| &transaction.category))
            .filter(|category| !category.trim().is_empty())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Per-process view state.
#[derive(Debug, Default)]
pub struct ViewSession {
    /// How the transactions table is sorted.
    pub sort: SortSpec,
    /// Which categories the transactions table shows.
    pub selection: CategorySelection,
    /// The row being edited or deleted, if any.
    pub editor: RowEditor,
    /// Colours handed out so far.
    pub colors: CategoryColorTable,
    /// The colour scheme pages are rendered with.
    pub theme: Theme,
    /// Whether the password has been entered this session.
    pub unlocked: bool,
    /// The last password status reported by the backend.
    pub password_enabled: Option<bool>,
    /// The last snapshot that loaded completely.
    pub snapshot: Option<Snapshot>,
}

/// The session shared between handlers.
///
/// Never hold the lock across a backend call.
pub type SharedSession = Arc<Mutex<ViewSession>>;

/// Create an empty session.
pub fn new_shared_session() -> SharedSession {
    Arc::new(Mutex::new(ViewSession::default()))
}

/// Acquire the session lock.
///
/// # Errors
/// Returns [Error::SessionLockError] if another thread panicked while holding the lock.
pub fn lock_session(session: &SharedSession) -> Result<MutexGuard<'_, ViewSession>, Error> {
    session
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire session lock: {error}"))
        .map_err(|_| Error::SessionLockError)
}

/// Load a fresh snapshot and store it in the session.
///
/// On failure the previous snapshot is left untouched so pages can keep
/// showing the last complete data.
pub async fn reload_snapshot(
    backend: &dyn Backend,
    session: &SharedSession,
) -> Result<Snapshot, Error> {
    let snapshot = Snapshot::load(backend)
        .await
        .inspect_err(|error| tracing::error!("could not load transactions: {error}"))?;

    lock_session(session)?.snapshot = Some(snapshot.clone());

    Ok(snapshot)
}
