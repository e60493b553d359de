//! 领域服务

mod report;
mod validator;

pub use report::*;
pub use validator::*;
