//! The API endpoints URIs.
//!
//! Transaction IDs are opaque strings chosen by the backend, so they are sent
//! as the `transaction_id` query or form parameter instead of a path segment.

/// The root route which redirects to the transactions page.
pub const ROOT: &str = "/";
/// The page for displaying transactions.
pub const TRANSACTIONS_VIEW: &str = "/transactions";
/// The row partial for editing a transaction's category.
pub const EDIT_TRANSACTION_VIEW: &str = "/transactions/edit";
/// Leave a row's edit mode without saving.
pub const CANCEL_EDIT_TRANSACTION: &str = "/transactions/edit/cancel";
/// The row partial asking the user to confirm a deletion.
pub const DELETE_TRANSACTION_VIEW: &str = "/transactions/delete";
/// Leave a row's pending deletion without deleting.
pub const CANCEL_DELETE_TRANSACTION: &str = "/transactions/delete/cancel";
/// The page with spending summaries and charts.
pub const ANALYTICS_VIEW: &str = "/analytics";
/// The page for importing bank statements.
pub const IMPORT_VIEW: &str = "/import";
/// The page for managing password protection.
pub const SETTINGS_VIEW: &str = "/settings";
/// The page for entering the password.
pub const UNLOCK_VIEW: &str = "/unlock";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route to update (PUT) or delete (DELETE) a transaction.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route to export spending to a file.
pub const EXPORT: &str = "/api/export";
/// The route to import a bank statement.
pub const IMPORT: &str = "/api/import";
/// The route for checking the password.
pub const UNLOCK_API: &str = "/api/unlock";
/// The route for locking the session again.
pub const LOCK: &str = "/api/lock";
/// The route for turning on password protection.
pub const SETUP_PASSWORD: &str = "/api/password/setup";
/// The route for changing the password.
pub const CHANGE_PASSWORD: &str = "/api/password/change";
/// The route for turning off password protection.
pub const DISABLE_PASSWORD: &str = "/api/password/disable";
/// The route for switching between light and dark mode.
pub const THEME: &str = "/api/theme";

/// Append `transaction_id` to `endpoint` as a query parameter.
pub fn with_transaction_id(endpoint: &str, transaction_id: &str) -> String {
    match serde_urlencoded::to_string([("transaction_id", transaction_id)]) {
        Ok(query) => format!("{endpoint}?{query}"),
        Err(error) => {
            tracing::error!("could not encode transaction id {transaction_id:?}: {error}");
            endpoint.to_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EDIT_TRANSACTION_VIEW, with_transaction_id};

    #[test]
    fn appends_transaction_id() {
        assert_eq!(
            with_transaction_id(EDIT_TRANSACTION_VIEW, "42"),
            "/transactions/edit?transaction_id=42"
        );
    }

    #[test]
    fn encodes_reserved_characters() {
        assert_eq!(
            with_transaction_id(EDIT_TRANSACTION_VIEW, "a/b&c d"),
            "/transactions/edit?transaction_id=a%2Fb%26c+d"
        );
    }
}
