//! Checks on password forms that run before anything is sent to the backend.

use serde::Deserialize;

use crate::Error;

/// The shortest password accepted when setting or changing the password.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// A password that is long enough to be set as the new password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// The password text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_long_enough(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
}

/// The form for turning on password protection.
#[derive(Debug, Deserialize)]
pub struct SetupPasswordForm {
    /// The new password.
    pub password: String,
    /// The new password again.
    pub confirm_password: String,
    /// Whether the user ticked the box saying a forgotten password means the
    /// data cannot be recovered. Unticked boxes are not submitted.
    #[serde(default)]
    pub accept_risk: bool,
}

impl SetupPasswordForm {
    /// Check that the risk was accepted, the password's length and that it
    /// was typed the same twice.
    ///
    /// # Errors
    /// Returns [Error::RiskNotAccepted], [Error::PasswordTooShort] or
    /// [Error::PasswordMismatch].
    pub fn validate(self) -> Result<ValidatedPassword, Error> {
        if !self.accept_risk {
            return Err(Error::RiskNotAccepted);
        }

        if !is_long_enough(&self.password) {
            return Err(Error::PasswordTooShort);
        }

        if self.password != self.confirm_password {
            return Err(Error::PasswordMismatch);
        }

        Ok(ValidatedPassword(self.password))
    }
}

/// The form for replacing the password.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordForm {
    /// The password in use.
    pub current_password: String,
    /// The replacement password.
    pub new_password: String,
    /// The replacement password again.
    pub confirm_password: String,
}

impl ChangePasswordForm {
    /// Check that the current password was given and the new one is acceptable.
    ///
    /// Returns the current password and the validated new password.
    ///
    /// # Errors
    /// Returns [Error::MissingCurrentPassword], [Error::NewPasswordTooShort]
    /// or [Error::NewPasswordMismatch].
    pub fn validate(self) -> Result<(String, ValidatedPassword), Error> {
        if self.current_password.is_empty() {
            return Err(Error::MissingCurrentPassword);
        }

        if !is_long_enough(&self.new_password) {
            return Err(Error::NewPasswordTooShort);
        }

        if self.new_password != self.confirm_password {
            return Err(Error::NewPasswordMismatch);
        }

        Ok((self.current_password, ValidatedPassword(self.new_password)))
    }
}

/// The form for turning off password protection.
#[derive(Debug, Deserialize)]
pub struct DisablePasswordForm {
    /// The password in use.
    ///
    /// Submitted as `disable_password` so its element ID differs from the
    /// change form's current password field.
    #[serde(rename = "disable_password")]
    pub current_password: String,
}

impl DisablePasswordForm {
    /// # Errors
    /// Returns [Error::MissingCurrentPassword] if the password was left blank.
    pub fn validate(self) -> Result<String, Error> {
        if self.current_password.is_empty() {
            Err(Error::MissingCurrentPassword)
        } else {
            Ok(self.current_password)
        }
    }
}

/// The form on the unlock page.
#[derive(Debug, Deserialize)]
pub struct UnlockForm {
    /// The password to check.
    pub password: String,
}

impl UnlockForm {
    /// # Errors
    /// Returns [Error::MissingPassword] if the password was left blank.
    pub fn validate(self) -> Result<String, Error> {
        if self.password.is_empty() {
            Err(Error::MissingPassword)
        } else {
            Ok(self.password)
        }
    }
}
