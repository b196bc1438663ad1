//! Infrastructure layer - signing and logging

pub mod csrf;
pub mod logging;
