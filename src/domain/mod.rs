//! Domain layer - form schema and validation

pub mod user;

pub use user::{FormErrors, UserForm, ValidatedUser};
