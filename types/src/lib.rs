//! Shared data model for the sahra virtual economy.
//!
//! Everything that crosses the persistence boundary (account records,
//! balance deltas, game settings) carries a deterministic binary codec so
//! the remote document store can treat values as opaque blobs.

mod account;
mod catalog;
mod codec;
mod constants;
mod event;
mod settings;

pub use account::*;
pub use catalog::*;
pub use codec::{read_f64, read_string, string_encode_size, write_f64, write_string};
pub use constants::*;
pub use event::*;
pub use settings::*;

#[cfg(test)]
mod tests;
