//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    alert::Alert, backend::BackendError, internal_server_error::InternalServerError,
    not_found::NotFoundError,
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A backend command failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The user tried to save a blank category.
    #[error("Category cannot be empty")]
    EmptyCategory,

    /// A category was submitted for a row that is not being edited, e.g.
    /// because another row was opened for editing in the meantime.
    #[error("that transaction is not being edited")]
    NotEditing,

    /// A delete was submitted without first being requested for the same row.
    #[error("the deletion was not confirmed")]
    DeleteNotConfirmed,

    /// A new password is shorter than [crate::password::MIN_PASSWORD_LENGTH].
    #[error("Password must be at least 8 characters")]
    PasswordTooShort,

    /// Password protection was requested without accepting that a forgotten
    /// password cannot be recovered.
    #[error("Please confirm that you understand a forgotten password cannot be recovered")]
    RiskNotAccepted,

    /// The password and its confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// The replacement password is too short.
    #[error("New password must be at least 8 characters")]
    NewPasswordTooShort,

    /// The replacement password and its confirmation differ.
    #[error("New passwords do not match")]
    NewPasswordMismatch,

    /// The current password is needed but was left blank.
    #[error("Please enter your current password")]
    MissingCurrentPassword,

    /// The unlock form was submitted without a password.
    #[error("Please enter your password")]
    MissingPassword,

    /// An import or export was requested without a file path.
    #[error("Please enter a file path")]
    EmptyFilePath,

    /// An export was requested in a format that is not supported.
    #[error("\"{0}\" is not a supported export format, choose CSV or JSON")]
    InvalidExportFormat(String),

    /// A date in a request could not be parsed.
    #[error("\"{0}\" is not a valid date, use YYYY-MM-DD")]
    InvalidDate(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the lock on the view session.
    #[error("could not acquire the session lock")]
    SessionLockError,

    /// The requested resource was not found.
    #[error("the requested resource could not be found")]
    NotFound,
}

impl Error {
    /// Whether the error was caught before anything was sent to the backend.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Error::EmptyCategory
                | Error::RiskNotAccepted
                | Error::PasswordTooShort
                | Error::PasswordMismatch
                | Error::NewPasswordTooShort
                | Error::NewPasswordMismatch
                | Error::MissingCurrentPassword
                | Error::MissingPassword
                | Error::EmptyFilePath
                | Error::InvalidExportFormat(_)
                | Error::InvalidDate(_)
        )
    }

    /// The text to show the user for this error.
    pub fn user_message(&self) -> String {
        match self {
            Error::Backend(error) => error.user_message(),
            error if error.is_validation_error() => error.to_string(),
            Error::NotEditing => {
                "This transaction is no longer being edited. Refresh the page and try again."
                    .to_owned()
            }
            Error::DeleteNotConfirmed => {
                "Confirm the deletion before deleting the transaction.".to_owned()
            }
            _ => "An unexpected error occurred, check the server logs for more details.".to_owned(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFoundError.into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::Backend(error) => {
                tracing::error!("A backend command failed while rendering a page: {error}");
                InternalServerError {
                    description: "Could not load your data.",
                    fix: &error.user_message(),
                }
                .into_response()
            }
            Error::SessionLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, alert) = self.into_alert();

        (status_code, alert.into_html()).into_response()
    }

    /// The status code and alert describing the error.
    pub fn into_alert(self) -> (StatusCode, Alert) {
        match self {
            error if error.is_validation_error() => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Alert::ErrorSimple {
                    message: error.to_string(),
                },
            ),
            Error::Backend(BackendError::Rejected(message)) => {
                (StatusCode::BAD_REQUEST, Alert::ErrorSimple { message })
            }
            Error::Backend(error) => {
                tracing::error!("A backend command failed: {error}");
                (
                    StatusCode::BAD_GATEWAY,
                    Alert::Error {
                        message: "Something went wrong".to_owned(),
                        details: error.user_message(),
                    },
                )
            }
            Error::NotEditing => (
                StatusCode::CONFLICT,
                Alert::Error {
                    message: "Could not save category".to_owned(),
                    details: Error::NotEditing.user_message(),
                },
            ),
            Error::DeleteNotConfirmed => (
                StatusCode::CONFLICT,
                Alert::Error {
                    message: "Could not delete transaction".to_owned(),
                    details: Error::DeleteNotConfirmed.user_message(),
                },
            ),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Transaction not found".to_owned(),
                    details: "Try refreshing the page to see if the transaction has already \
                        been deleted."
                        .to_owned(),
                },
            ),
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            ),
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Alert::Error {
                        message: "Something went wrong".to_owned(),
                        details:
                            "An unexpected error occurred, check the server logs for more details."
                                .to_owned(),
                    },
                )
            }
        }
    }
}
