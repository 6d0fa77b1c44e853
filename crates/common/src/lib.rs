//! Common types shared by the Feishu driver crates

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::{Secret, resolve_secret};
