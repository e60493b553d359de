//! 仓储接口模块

mod product_lookup;
mod quota_rule_repository;

pub use product_lookup::ProductLookup;
pub use quota_rule_repository::QuotaRuleRepository;
