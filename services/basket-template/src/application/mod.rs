//! 应用层

mod commands;
mod events;
mod handler;
mod staging;

pub use commands::*;
pub use events::*;
pub use handler::*;
pub use staging::*;
