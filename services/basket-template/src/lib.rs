//! basket-template - 礼品篮模板配额规则的编辑与组合校验

pub mod application;
pub mod cli;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod settings;
