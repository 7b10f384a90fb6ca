//! Type definitions for retroshelf

mod error;
mod game;

pub use error::*;
pub use game::*;
