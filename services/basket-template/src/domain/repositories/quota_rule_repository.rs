//! 配额规则仓储接口

use async_trait::async_trait;
use errors::AppResult;

use crate::domain::entities::QuotaRule;
use crate::domain::value_objects::{CategoryId, RequiredQuantity, RuleId, TemplateId};

/// 配额规则的远程存储
///
/// 每次调用都可能因网络或服务端校验（如分类重复、数量非法）失败，
/// 错误原样向上传递。超时与重试由实现方负责。
#[async_trait]
pub trait QuotaRuleRepository: Send + Sync {
    /// 创建规则，返回服务端分配的 ID
    async fn create(
        &self,
        template_id: TemplateId,
        category_id: CategoryId,
        quantity: RequiredQuantity,
    ) -> AppResult<RuleId>;

    /// 更新规则的分类与数量
    async fn update(
        &self,
        rule_id: RuleId,
        category_id: CategoryId,
        quantity: RequiredQuantity,
    ) -> AppResult<()>;

    /// 删除规则
    async fn delete(&self, rule_id: RuleId) -> AppResult<()>;

    /// 列出模板当前的全部规则
    async fn list_by_template(&self, template_id: TemplateId) -> AppResult<Vec<QuotaRule>>;
}
