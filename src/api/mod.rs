//! REST API layer for Game Group.

mod auth_helpers;
mod error;
mod import;
mod rest;
mod types;

pub use auth_helpers::*;
pub use error::*;
pub use import::*;
pub use rest::*;
pub use types::*;
