//! Core domain types for the game catalogue.

mod types;

pub use types::*;
