//! The `utils` module holds what every other module leans on: the crate error
//! type and logging setup.

pub mod error;
pub mod logging;

pub use error::{Result, TalkerError};
