//! 礼品篮模板

use domain_core::{Entity, Weight};
use serde::{Deserialize, Serialize};

use crate::domain::entities::QuotaRule;
use crate::domain::value_objects::{CategoryId, TemplateId};

/// 礼品篮模板：一组分类配额加可选的总重量上限
///
/// 删除模板不会级联删除规则，规则清理由管理员负责。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasketTemplate {
    pub id: TemplateId,
    pub name: String,
    pub max_total_weight: Option<Weight>,
    #[serde(default)]
    pub rules: Vec<QuotaRule>,
}

impl BasketTemplate {
    pub fn new(id: TemplateId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            max_total_weight: None,
            rules: Vec::new(),
        }
    }

    pub fn with_max_total_weight(mut self, max_total_weight: Weight) -> Self {
        self.max_total_weight = Some(max_total_weight);
        self
    }

    pub fn with_rules(mut self, rules: Vec<QuotaRule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn rule_for(&self, category_id: CategoryId) -> Option<&QuotaRule> {
        self.rules.iter().find(|rule| rule.category_id == category_id)
    }
}

impl Entity for BasketTemplate {
    type Id = TemplateId;

    fn id(&self) -> &TemplateId {
        &self.id
    }
}
