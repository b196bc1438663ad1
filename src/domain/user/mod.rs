//! User form domain

mod errors;
mod form;

pub use errors::FormErrors;
pub use form::{
    UserForm, ValidatedUser, LENGTH_MESSAGE, REQUIRED_MESSAGE, USERNAME_FIELD,
    USERNAME_MAX_LENGTH, USERNAME_MIN_LENGTH,
};
