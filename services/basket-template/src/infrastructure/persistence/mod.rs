//! 本地仓储实现

mod memory;

pub use memory::InMemoryQuotaRuleRepository;
