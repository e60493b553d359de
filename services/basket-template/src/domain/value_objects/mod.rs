//! 值对象

mod ids;
mod required_quantity;

pub use ids::*;
pub use required_quantity::RequiredQuantity;
