//! 实体

mod basket_template;
mod category;
mod composition;
mod product;
mod quota_rule;

pub use basket_template::BasketTemplate;
pub use category::Category;
pub use composition::CompositionEntry;
pub use product::Product;
pub use quota_rule::{PendingRule, QuotaRule};
