//! Data models for Isleguard

mod flag;
mod island;
mod rank;

pub use flag::*;
pub use island::*;
pub use rank::*;
