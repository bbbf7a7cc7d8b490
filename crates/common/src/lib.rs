//! Types shared by the token service crates

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
