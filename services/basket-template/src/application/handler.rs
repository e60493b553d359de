//! Business logic handler

use std::sync::Arc;

use errors::{AppError, AppResult, ProblemDetails};
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::entities::{BasketTemplate, Category, CompositionEntry, PendingRule, QuotaRule};
use crate::domain::repositories::{ProductLookup, QuotaRuleRepository};
use crate::domain::services::{CompositionValidator, ValidationReport};
use crate::domain::value_objects::{CategoryId, TemplateId};

use super::commands::*;
use super::events::StagingEvent;
use super::staging::StagingSession;

/// 规则同步结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub template_id: TemplateId,
    /// 本次新建的规则
    pub committed: Vec<QuotaRule>,
    /// 分类已有规则而跳过的条目
    pub skipped: Vec<CategoryId>,
    /// 提交中断后仍未发送的条目
    pub remaining: Vec<PendingRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProblemDetails>,
}

impl SyncReport {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

pub struct ServiceHandler {
    rule_repo: Arc<dyn QuotaRuleRepository>,
    validator: CompositionValidator,
}

impl ServiceHandler {
    pub fn new(rule_repo: Arc<dyn QuotaRuleRepository>, validator: CompositionValidator) -> Self {
        Self {
            rule_repo,
            validator,
        }
    }

    // ========== 组合校验 ==========

    pub fn validate_composition(
        &self,
        template: &BasketTemplate,
        composition: &[CompositionEntry],
        catalog: &dyn ProductLookup,
    ) -> AppResult<ValidationReport> {
        let report = self.validator.validate(template, composition, catalog)?;
        info!(
            template_id = %template.id,
            entries = composition.len(),
            mode = ?self.validator.mode(),
            is_valid = report.is_valid,
            "Composition validated"
        );
        Ok(report)
    }

    // ========== 配额规则 ==========

    /// 打开一个规则编辑会话，分类目录用于填写本地规则的显示名称
    pub async fn open_session(
        &self,
        template_id: TemplateId,
        categories: &[Category],
    ) -> AppResult<StagingSession> {
        let session = StagingSession::open(&*self.rule_repo, template_id).await?;
        Ok(session.with_categories(categories))
    }

    pub async fn list_rules(&self, template_id: TemplateId) -> AppResult<Vec<QuotaRule>> {
        self.rule_repo.list_by_template(template_id).await
    }

    /// 按期望列表补齐模板规则
    ///
    /// 提交中途失败不视为错误返回：结果中带上已提交部分、剩余部分与失败原因。
    pub async fn sync_rules(
        &self,
        cmd: SyncRulesCommand,
        categories: &[Category],
    ) -> AppResult<SyncReport> {
        cmd.validate()?;

        let mut session = self.open_session(cmd.template_id, categories).await?;
        let mut skipped = Vec::new();
        for rule in &cmd.rules {
            if session.is_category_taken(rule.category_id) {
                skipped.push(rule.category_id);
                continue;
            }
            session.stage_new(rule.category_id, rule.required_quantity)?;
        }

        let mut report = SyncReport {
            template_id: cmd.template_id,
            committed: Vec::new(),
            skipped,
            remaining: Vec::new(),
            error: None,
        };
        if session.pending().is_empty() {
            info!(template_id = %cmd.template_id, "Quota rules already in sync");
            return Ok(report);
        }

        match session.commit_all(&*self.rule_repo).await {
            Ok(event) => {
                let StagingEvent::Committed { rules: committed } = event else {
                    return Err(AppError::internal("commit produced no committed event"));
                };
                info!(
                    template_id = %cmd.template_id,
                    committed = committed.len(),
                    skipped = report.skipped.len(),
                    "Quota rules synchronized"
                );
                report.committed = committed;
            }
            Err(failure) => {
                warn!(
                    template_id = %cmd.template_id,
                    committed = failure.committed.len(),
                    remaining = failure.remaining.len(),
                    error = %failure.source,
                    "Quota rule sync stopped early"
                );
                report.error = Some(failure.source.to_problem_details());
                report.committed = failure.committed;
                report.remaining = failure.remaining;
            }
        }
        Ok(report)
    }

    pub async fn edit_rule(&self, cmd: EditRuleCommand) -> AppResult<QuotaRule> {
        let mut session = self.open_session(cmd.template_id, &[]).await?;
        session
            .edit_committed(
                &*self.rule_repo,
                cmd.rule_id,
                cmd.category_id,
                cmd.required_quantity,
            )
            .await?;

        session
            .committed()
            .iter()
            .find(|rule| rule.id == Some(cmd.rule_id))
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("quota rule {}", cmd.rule_id)))
    }

    pub async fn delete_rule(&self, cmd: DeleteRuleCommand) -> AppResult<()> {
        let mut session = self.open_session(cmd.template_id, &[]).await?;
        session
            .delete_committed(&*self.rule_repo, cmd.rule_id)
            .await?;
        Ok(())
    }
}
