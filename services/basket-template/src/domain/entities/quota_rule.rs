//! 配额规则

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{CategoryId, RequiredQuantity, RuleId, TemplateId};

/// 配额规则：模板要求从 `category_id` 分类中选 `required_quantity` 件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaRule {
    /// 持久化后才有
    pub id: Option<RuleId>,
    pub template_id: TemplateId,
    pub category_id: CategoryId,
    pub required_quantity: RequiredQuantity,
    /// 分类名称的展示副本
    pub category_name: String,
}

impl QuotaRule {
    /// 已持久化的规则
    pub fn persisted(
        id: RuleId,
        template_id: TemplateId,
        category_id: CategoryId,
        required_quantity: RequiredQuantity,
        category_name: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id),
            template_id,
            category_id,
            required_quantity,
            category_name: category_name.into(),
        }
    }

    /// 尚未发送到远程的规则
    pub fn unsaved(
        template_id: TemplateId,
        category_id: CategoryId,
        required_quantity: RequiredQuantity,
        category_name: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            template_id,
            category_id,
            required_quantity,
            category_name: category_name.into(),
        }
    }
}

/// 本地已添加、尚未提交的规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRule {
    pub category_id: CategoryId,
    pub required_quantity: RequiredQuantity,
}

impl PendingRule {
    pub fn new(category_id: CategoryId, required_quantity: RequiredQuantity) -> Self {
        Self {
            category_id,
            required_quantity,
        }
    }
}
