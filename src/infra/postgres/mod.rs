//! PostgreSQL store implementations.

mod game_store;
mod token_store;
mod user_store;

pub use game_store::*;
pub use token_store::*;
pub use user_store::*;
