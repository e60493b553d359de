//! 远程目录 API 适配器
//!
//! 外部载荷只在这里解码、归一化为领域模型，业务代码不再处理字段名变体。

mod catalog_gateway;
mod client;
pub mod converters;
pub mod dto;
mod rule_repository;

pub use catalog_gateway::HttpCatalogGateway;
pub use client::CatalogApiClient;
pub use rule_repository::HttpQuotaRuleRepository;
