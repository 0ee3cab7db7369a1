//! Infrastructure: persistence traits and their implementations.

mod error;
pub mod memory;
pub mod postgres;
mod traits;

pub use error::*;
pub use memory::*;
pub use postgres::*;
pub use traits::*;
