//! LE Controller Commands
//!
//! The LE controller commands are grouped by the features of the controller they are used for.

pub mod mandatory;
pub mod receiver;
pub mod transmitter;
