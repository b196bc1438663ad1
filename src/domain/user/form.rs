//! Username submission form and its validation schema

use validator::Validate;

use super::errors::FormErrors;

pub const USERNAME_FIELD: &str = "username";
pub const USERNAME_MIN_LENGTH: u64 = 3;
pub const USERNAME_MAX_LENGTH: u64 = 25;

pub const REQUIRED_MESSAGE: &str = "This field is required.";
pub const LENGTH_MESSAGE: &str = "Field must be between 3 and 25 characters long.";

/// Submitted user form, normalized but not yet validated
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct UserForm {
    #[validate(
        required(message = "This field is required."),
        length(min = 3, max = 25, message = "Field must be between 3 and 25 characters long.")
    )]
    pub username: Option<String>,
}

/// A username that passed every field constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUser {
    pub username: String,
}

impl UserForm {
    /// Build the form from raw submitted data.
    ///
    /// Surrounding whitespace is trimmed and blank input is treated as absent,
    /// so length limits apply to the trimmed value.
    pub fn from_submission(username: Option<String>) -> Self {
        let username = username
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        Self { username }
    }

    /// Run the schema. A missing value stops at the presence check and yields
    /// exactly one message.
    pub fn validate_input(&self) -> Result<ValidatedUser, FormErrors> {
        self.validate().map_err(FormErrors::from)?;

        match &self.username {
            Some(username) => Ok(ValidatedUser {
                username: username.clone(),
            }),
            None => Err(FormErrors::single(USERNAME_FIELD, REQUIRED_MESSAGE)),
        }
    }
}
