//! The transactions table.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model as decoded from the backend
//! - The sort and category filter pipeline
//! - The row editor state machine for in-place category edits and deletes
//! - View handlers for the table and its row actions

mod delete_endpoint;
mod edit;
mod edit_endpoint;
mod model;
pub mod pipeline;
mod transactions_page;
mod view;

pub use delete_endpoint::{
    cancel_delete_transaction, delete_transaction_endpoint, get_delete_transaction_row,
};
pub use edit::{RowEditor, RowMode, SaveRequest};
pub use edit_endpoint::{
    cancel_edit_transaction, get_edit_transaction_row, update_transaction_endpoint,
};
pub(crate) use model::DATE_FORMAT;
pub use model::{Transaction, TransactionId, UNCATEGORIZED, parse_date};
pub use pipeline::{CategorySelection, SortDirection, SortKey, SortSpec};
pub use transactions_page::{TransactionsState, get_transactions_page};
