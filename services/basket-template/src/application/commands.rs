//! 规则维护命令

use std::collections::HashSet;

use errors::{AppError, AppResult};

use crate::domain::entities::PendingRule;
use crate::domain::value_objects::{CategoryId, RequiredQuantity, RuleId, TemplateId};

/// 将模板规则同步为期望列表：已提交的分类跳过，其余暂存后一次提交
#[derive(Debug, Clone)]
pub struct SyncRulesCommand {
    pub template_id: TemplateId,
    pub rules: Vec<PendingRule>,
}

impl SyncRulesCommand {
    pub fn validate(&self) -> AppResult<()> {
        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !seen.insert(rule.category_id) {
                return Err(AppError::validation(format!(
                    "category {} is listed more than once",
                    rule.category_id
                )));
            }
        }
        Ok(())
    }
}

/// 修改已提交规则
#[derive(Debug, Clone, Copy)]
pub struct EditRuleCommand {
    pub template_id: TemplateId,
    pub rule_id: RuleId,
    pub category_id: CategoryId,
    pub required_quantity: RequiredQuantity,
}

/// 删除已提交规则
#[derive(Debug, Clone, Copy)]
pub struct DeleteRuleCommand {
    pub template_id: TemplateId,
    pub rule_id: RuleId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_rejects_repeated_category() {
        let quantity = RequiredQuantity::new(1).unwrap();
        let cmd = SyncRulesCommand {
            template_id: TemplateId(1),
            rules: vec![
                PendingRule::new(CategoryId(3), quantity),
                PendingRule::new(CategoryId(3), quantity),
            ],
        };
        assert!(matches!(cmd.validate(), Err(AppError::Validation(_))));
    }
}
