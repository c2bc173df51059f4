//! Common types shared by the login crates and the demo service

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
