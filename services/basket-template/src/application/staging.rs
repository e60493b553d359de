//! 配额规则暂存会话
//!
//! 管理员编辑模板规则时的本地工作区：`committed` 镜像远程，`pending` 为本地新增、
//! 尚未发送的规则，`draft` 为表单中正在编辑的一条。任何时刻 `committed` 与
//! `pending` 的分类 ID 合起来不重复；重复检查在任何远程调用之前完成。

use std::collections::HashMap;

use errors::AppError;
use metrics::counter;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use super::events::StagingEvent;
use crate::domain::entities::{BasketTemplate, Category, CompositionEntry, PendingRule, QuotaRule};
use crate::domain::repositories::{ProductLookup, QuotaRuleRepository};
use crate::domain::services::{CompositionValidator, ValidationReport};
use crate::domain::value_objects::{CategoryId, RequiredQuantity, RuleId, TemplateId};
use crate::error::{ServiceError, ServiceResult};

/// 表单中正在编辑的规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDraft {
    pub category_id: CategoryId,
    pub required_quantity: RequiredQuantity,
    /// 编辑已提交规则时为其 ID，新建时为空
    pub editing: Option<RuleId>,
}

impl RuleDraft {
    pub fn new(category_id: CategoryId, required_quantity: RequiredQuantity) -> Self {
        Self {
            category_id,
            required_quantity,
            editing: None,
        }
    }

    fn for_rule(rule: &QuotaRule) -> Option<Self> {
        rule.id.map(|id| Self {
            category_id: rule.category_id,
            required_quantity: rule.required_quantity,
            editing: Some(id),
        })
    }
}

/// `commit_all` 中途失败
///
/// 已写入远程的规则不会回滚；`remaining` 仍留在会话的待提交列表中，可再次提交。
#[derive(Debug, Error)]
#[error("commit stopped with {} quota rule(s) still pending: {source}", .remaining.len())]
pub struct PartialCommitFailure {
    /// 本次已成功创建的规则
    pub committed: Vec<QuotaRule>,
    /// 创建失败的那一条；全部创建成功但刷新失败时为空
    pub failed: Option<PendingRule>,
    /// 仍待提交的规则（含 `failed`）
    pub remaining: Vec<PendingRule>,
    pub source: AppError,
}

impl From<PartialCommitFailure> for ServiceError {
    fn from(failure: PartialCommitFailure) -> Self {
        ServiceError::RepositoryFailure(failure.source)
    }
}

/// 单个模板的规则编辑会话，由调用方持有
#[derive(Debug, Clone)]
pub struct StagingSession {
    template_id: TemplateId,
    committed: Vec<QuotaRule>,
    pending: Vec<PendingRule>,
    draft: Option<RuleDraft>,
    category_names: HashMap<CategoryId, String>,
}

impl StagingSession {
    pub fn new(template_id: TemplateId) -> Self {
        Self {
            template_id,
            committed: Vec::new(),
            pending: Vec::new(),
            draft: None,
            category_names: HashMap::new(),
        }
    }

    /// 创建会话并立即从远程加载已提交规则
    pub async fn open(
        repo: &dyn QuotaRuleRepository,
        template_id: TemplateId,
    ) -> ServiceResult<Self> {
        let mut session = Self::new(template_id);
        session.reload(repo).await?;
        Ok(session)
    }

    /// 设置分类名称目录，用于给本地生成的规则填写显示名称
    pub fn with_categories<'a>(mut self, categories: impl IntoIterator<Item = &'a Category>) -> Self {
        self.category_names.extend(
            categories
                .into_iter()
                .map(|category| (category.id, category.name.clone())),
        );
        self
    }

    pub fn template_id(&self) -> TemplateId {
        self.template_id
    }

    pub fn committed(&self) -> &[QuotaRule] {
        &self.committed
    }

    pub fn pending(&self) -> &[PendingRule] {
        &self.pending
    }

    pub fn draft(&self) -> Option<&RuleDraft> {
        self.draft.as_ref()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        !self.pending.is_empty() || self.draft.is_some()
    }

    /// 分类是否已被已提交或待提交规则占用
    pub fn is_category_taken(&self, category_id: CategoryId) -> bool {
        self.committed.iter().any(|rule| rule.category_id == category_id)
            || self.pending.iter().any(|rule| rule.category_id == category_id)
    }

    // ========== 待提交规则 ==========

    /// 添加一条待提交规则；分类已占用时返回 `DuplicateCategory` 且不改变状态
    pub fn stage_new(
        &mut self,
        category_id: CategoryId,
        required_quantity: RequiredQuantity,
    ) -> ServiceResult<StagingEvent> {
        if self.is_category_taken(category_id) {
            return Err(ServiceError::DuplicateCategory { category_id });
        }

        let rule = PendingRule::new(category_id, required_quantity);
        self.pending.push(rule);
        info!(
            template_id = %self.template_id,
            category_id = %category_id,
            quantity = required_quantity.get(),
            "Quota rule staged"
        );
        Ok(StagingEvent::Staged { rule })
    }

    /// 移除待提交规则，不存在时无操作
    pub fn unstage(&mut self, category_id: CategoryId) -> StagingEvent {
        match self
            .pending
            .iter()
            .position(|rule| rule.category_id == category_id)
        {
            Some(index) => {
                let rule = self.pending.remove(index);
                StagingEvent::Unstaged { rule }
            }
            None => StagingEvent::Unchanged,
        }
    }

    /// 丢弃全部待提交规则与草稿
    pub fn discard(&mut self) -> StagingEvent {
        self.draft = None;
        let pending = std::mem::take(&mut self.pending);
        if !pending.is_empty() {
            info!(
                template_id = %self.template_id,
                discarded = pending.len(),
                "Staged quota rules discarded"
            );
        }
        StagingEvent::Discarded { pending }
    }

    // ========== 草稿 ==========

    pub fn set_draft(&mut self, draft: RuleDraft) -> StagingEvent {
        self.draft = Some(draft);
        StagingEvent::DraftChanged { draft: self.draft }
    }

    pub fn clear_draft(&mut self) -> StagingEvent {
        if self.draft.take().is_none() {
            return StagingEvent::Unchanged;
        }
        StagingEvent::DraftChanged { draft: None }
    }

    /// 将已提交规则载入草稿以便编辑
    pub fn edit_draft_from(&mut self, rule_id: RuleId) -> ServiceResult<StagingEvent> {
        let draft = self
            .committed
            .iter()
            .find(|rule| rule.id == Some(rule_id))
            .and_then(RuleDraft::for_rule)
            .ok_or_else(|| ServiceError::not_found(format!("quota rule {rule_id}")))?;
        Ok(self.set_draft(draft))
    }

    /// 提交草稿：新建草稿进入待提交列表，编辑草稿直接更新远程
    ///
    /// 失败时草稿保留，用户输入不丢失。
    pub async fn submit_draft(
        &mut self,
        repo: &dyn QuotaRuleRepository,
    ) -> ServiceResult<StagingEvent> {
        let draft = self
            .draft
            .ok_or_else(|| ServiceError::invalid_argument("there is no draft rule to submit"))?;

        let event = match draft.editing {
            None => self.stage_new(draft.category_id, draft.required_quantity)?,
            Some(rule_id) => {
                self.edit_committed(repo, rule_id, draft.category_id, draft.required_quantity)
                    .await?
            }
        };
        self.draft = None;
        Ok(event)
    }

    // ========== 远程操作 ==========

    /// 按添加顺序逐条创建待提交规则
    ///
    /// 每次创建都等待完成后再发下一条；遇到第一个失败即停止，已成功的不回滚。
    /// 分类已在 `committed` 中的条目（刷新后与远程冲突）在本地拒绝，不发送。
    /// 结束后从远程刷新 `committed`，成功的条目从 `pending` 中移除。
    pub async fn commit_all(
        &mut self,
        repo: &dyn QuotaRuleRepository,
    ) -> Result<StagingEvent, PartialCommitFailure> {
        let mut created: Vec<QuotaRule> = Vec::with_capacity(self.pending.len());
        let mut failure: Option<(PendingRule, AppError)> = None;

        for entry in &self.pending {
            if self
                .committed
                .iter()
                .any(|rule| rule.category_id == entry.category_id)
            {
                counter!("basket_quota_rule_commit_failures_total").increment(1);
                warn!(
                    template_id = %self.template_id,
                    category_id = %entry.category_id,
                    "Staged quota rule collides with a committed rule, not sent"
                );
                let source = AppError::from(ServiceError::DuplicateCategory {
                    category_id: entry.category_id,
                });
                failure = Some((*entry, source));
                break;
            }

            match repo
                .create(self.template_id, entry.category_id, entry.required_quantity)
                .await
            {
                Ok(rule_id) => {
                    counter!("basket_quota_rules_committed_total").increment(1);
                    info!(
                        template_id = %self.template_id,
                        category_id = %entry.category_id,
                        rule_id = %rule_id,
                        "Quota rule committed"
                    );
                    created.push(self.rule_from_pending(rule_id, entry));
                }
                Err(e) => {
                    counter!("basket_quota_rule_commit_failures_total").increment(1);
                    warn!(
                        template_id = %self.template_id,
                        category_id = %entry.category_id,
                        error = %e,
                        "Quota rule commit failed"
                    );
                    failure = Some((*entry, e));
                    break;
                }
            }
        }

        self.pending.drain(..created.len());
        let reloaded = self.reload_committed(repo).await;

        match (failure, reloaded) {
            (None, Ok(())) => Ok(StagingEvent::Committed {
                rules: created
                    .into_iter()
                    .map(|rule| {
                        self.committed
                            .iter()
                            .find(|remote| remote.id == rule.id)
                            .cloned()
                            .unwrap_or(rule)
                    })
                    .collect(),
            }),
            (None, Err(source)) => {
                warn!(
                    template_id = %self.template_id,
                    error = %source,
                    "Reload after commit failed, keeping created rules locally"
                );
                self.merge_committed(&created);
                Err(PartialCommitFailure {
                    committed: created,
                    failed: None,
                    remaining: self.pending.clone(),
                    source,
                })
            }
            (Some((failed, source)), reloaded) => {
                if let Err(e) = reloaded {
                    warn!(
                        template_id = %self.template_id,
                        error = %e,
                        "Reload after partial commit failed, keeping created rules locally"
                    );
                    self.merge_committed(&created);
                }
                Err(PartialCommitFailure {
                    committed: created,
                    failed: Some(failed),
                    remaining: self.pending.clone(),
                    source,
                })
            }
        }
    }

    /// 修改已提交规则
    pub async fn edit_committed(
        &mut self,
        repo: &dyn QuotaRuleRepository,
        rule_id: RuleId,
        new_category_id: CategoryId,
        new_required_quantity: RequiredQuantity,
    ) -> ServiceResult<StagingEvent> {
        let index = self.committed_index(rule_id)?;

        let collides = self
            .committed
            .iter()
            .any(|rule| rule.category_id == new_category_id && rule.id != Some(rule_id))
            || self
                .pending
                .iter()
                .any(|rule| rule.category_id == new_category_id);
        if collides {
            return Err(ServiceError::DuplicateCategory {
                category_id: new_category_id,
            });
        }

        repo.update(rule_id, new_category_id, new_required_quantity)
            .await?;

        let category_name = if self.committed[index].category_id == new_category_id {
            self.committed[index].category_name.clone()
        } else {
            self.category_name(new_category_id)
        };
        let rule = &mut self.committed[index];
        rule.category_id = new_category_id;
        rule.required_quantity = new_required_quantity;
        rule.category_name = category_name;

        info!(
            template_id = %self.template_id,
            rule_id = %rule_id,
            category_id = %new_category_id,
            quantity = new_required_quantity.get(),
            "Quota rule updated"
        );
        Ok(StagingEvent::RuleUpdated { rule: rule.clone() })
    }

    /// 删除已提交规则
    pub async fn delete_committed(
        &mut self,
        repo: &dyn QuotaRuleRepository,
        rule_id: RuleId,
    ) -> ServiceResult<StagingEvent> {
        let index = self.committed_index(rule_id)?;

        repo.delete(rule_id).await?;
        self.committed.remove(index);
        if self.draft.is_some_and(|draft| draft.editing == Some(rule_id)) {
            self.draft = None;
        }

        info!(template_id = %self.template_id, rule_id = %rule_id, "Quota rule deleted");
        Ok(StagingEvent::RuleDeleted { rule_id })
    }

    /// 用远程列表替换 `committed`，不影响 `pending`
    pub async fn reload(&mut self, repo: &dyn QuotaRuleRepository) -> ServiceResult<StagingEvent> {
        self.reload_committed(repo).await?;

        let conflicts: Vec<CategoryId> = self
            .pending
            .iter()
            .filter(|pending| {
                self.committed
                    .iter()
                    .any(|rule| rule.category_id == pending.category_id)
            })
            .map(|pending| pending.category_id)
            .collect();
        if !conflicts.is_empty() {
            warn!(
                template_id = %self.template_id,
                conflicts = ?conflicts,
                "Staged quota rules now collide with remote rules"
            );
        }

        Ok(StagingEvent::Reloaded {
            rules: self.committed.len(),
            conflicts,
        })
    }

    // ========== 提交前校验 ==========

    /// 提交后模板的样子：已提交规则加上待提交规则
    pub fn staged_template(&self, template: &BasketTemplate) -> BasketTemplate {
        let mut rules = self.committed.clone();
        rules.extend(self.pending.iter().map(|entry| {
            QuotaRule::unsaved(
                self.template_id,
                entry.category_id,
                entry.required_quantity,
                self.category_name(entry.category_id),
            )
        }));
        template.clone().with_rules(rules)
    }

    /// 用暂存后的模板校验组合，作为保存前的检查
    pub fn check_composition(
        &self,
        template: &BasketTemplate,
        composition: &[CompositionEntry],
        catalog: &dyn ProductLookup,
        validator: &CompositionValidator,
    ) -> ServiceResult<ValidationReport> {
        validator.validate(&self.staged_template(template), composition, catalog)
    }

    // ========== 内部 ==========

    async fn reload_committed(&mut self, repo: &dyn QuotaRuleRepository) -> Result<(), AppError> {
        let rules = repo.list_by_template(self.template_id).await?;
        for rule in &rules {
            self.category_names
                .entry(rule.category_id)
                .or_insert_with(|| rule.category_name.clone());
        }
        self.committed = rules;
        Ok(())
    }

    fn merge_committed(&mut self, created: &[QuotaRule]) {
        for rule in created {
            if !self.committed.iter().any(|existing| existing.id == rule.id) {
                self.committed.push(rule.clone());
            }
        }
    }

    fn committed_index(&self, rule_id: RuleId) -> ServiceResult<usize> {
        self.committed
            .iter()
            .position(|rule| rule.id == Some(rule_id))
            .ok_or_else(|| ServiceError::not_found(format!("quota rule {rule_id}")))
    }

    fn rule_from_pending(&self, rule_id: RuleId, entry: &PendingRule) -> QuotaRule {
        QuotaRule::persisted(
            rule_id,
            self.template_id,
            entry.category_id,
            entry.required_quantity,
            self.category_name(entry.category_id),
        )
    }

    fn category_name(&self, category_id: CategoryId) -> String {
        self.category_names
            .get(&category_id)
            .cloned()
            .unwrap_or_else(|| Category::fallback_name(category_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::ProductCatalog;
    use crate::domain::entities::Product;
    use crate::domain::value_objects::ProductId;
    use crate::infrastructure::persistence::InMemoryQuotaRuleRepository;
    use async_trait::async_trait;
    use domain_core::Weight;
    use errors::AppResult;
    use mockall::predicate::{always, eq};
    use mockall::{Sequence, mock};

    mock! {
        pub RuleRepo {}

        #[async_trait]
        impl QuotaRuleRepository for RuleRepo {
            async fn create(
                &self,
                template_id: TemplateId,
                category_id: CategoryId,
                quantity: RequiredQuantity,
            ) -> AppResult<RuleId>;
            async fn update(
                &self,
                rule_id: RuleId,
                category_id: CategoryId,
                quantity: RequiredQuantity,
            ) -> AppResult<()>;
            async fn delete(&self, rule_id: RuleId) -> AppResult<()>;
            async fn list_by_template(&self, template_id: TemplateId) -> AppResult<Vec<QuotaRule>>;
        }
    }

    const TEMPLATE: TemplateId = TemplateId(1);
    const CAT_A: CategoryId = CategoryId(10);
    const CAT_B: CategoryId = CategoryId(20);
    const CAT_C: CategoryId = CategoryId(30);

    fn qty(value: u32) -> RequiredQuantity {
        RequiredQuantity::new(value).unwrap()
    }

    fn categories() -> Vec<Category> {
        vec![
            Category::new(CAT_A, "Wine"),
            Category::new(CAT_B, "Cheese"),
            Category::new(CAT_C, "Crackers"),
        ]
    }

    fn persisted(id: i64, category_id: CategoryId, quantity: u32) -> QuotaRule {
        QuotaRule::persisted(RuleId(id), TEMPLATE, category_id, qty(quantity), "remote")
    }

    fn committed_rules(event: StagingEvent) -> Vec<QuotaRule> {
        match event {
            StagingEvent::Committed { rules } => rules,
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_stage_same_category_twice_is_rejected() {
        let mut session = StagingSession::new(TEMPLATE);

        session.stage_new(CAT_A, qty(3)).unwrap();
        let second = session.stage_new(CAT_A, qty(5));

        assert!(matches!(
            second,
            Err(ServiceError::DuplicateCategory { category_id }) if category_id == CAT_A
        ));
        assert_eq!(session.pending(), &[PendingRule::new(CAT_A, qty(3))]);
    }

    #[tokio::test]
    async fn test_stage_committed_category_is_rejected() {
        let repo = InMemoryQuotaRuleRepository::new();
        repo.create(TEMPLATE, CAT_A, qty(1)).await.unwrap();
        let mut session = StagingSession::open(&repo, TEMPLATE).await.unwrap();

        let result = session.stage_new(CAT_A, qty(2));

        assert!(matches!(result, Err(ServiceError::DuplicateCategory { .. })));
        assert!(session.pending().is_empty());
        assert_eq!(session.committed().len(), 1);
    }

    #[test]
    fn test_unstage() {
        let mut session = StagingSession::new(TEMPLATE);
        session.stage_new(CAT_A, qty(1)).unwrap();
        session.stage_new(CAT_B, qty(2)).unwrap();

        let event = session.unstage(CAT_A);

        assert_eq!(
            event,
            StagingEvent::Unstaged {
                rule: PendingRule::new(CAT_A, qty(1))
            }
        );
        assert_eq!(session.unstage(CAT_A), StagingEvent::Unchanged);
        assert_eq!(session.pending(), &[PendingRule::new(CAT_B, qty(2))]);
        // 移除后可重新添加
        assert!(session.stage_new(CAT_A, qty(4)).is_ok());
    }

    #[tokio::test]
    async fn test_commit_all_in_insertion_order() {
        let repo = InMemoryQuotaRuleRepository::new();
        let mut session = StagingSession::new(TEMPLATE).with_categories(&categories());
        session.stage_new(CAT_B, qty(1)).unwrap();
        session.stage_new(CAT_A, qty(2)).unwrap();

        let created = committed_rules(session.commit_all(&repo).await.unwrap());

        assert_eq!(
            created.iter().map(|rule| rule.category_id).collect::<Vec<_>>(),
            vec![CAT_B, CAT_A]
        );
        assert!(created.iter().all(|rule| rule.id.is_some()));
        assert_eq!(created[0].category_name, "Cheese");
        assert!(session.pending().is_empty());
        assert_eq!(session.committed().len(), 2);
        assert!(!session.has_unsaved_changes());
    }

    #[tokio::test]
    async fn test_commit_with_nothing_pending_only_reloads() {
        let mut repo = MockRuleRepo::new();
        repo.expect_create().never();
        repo.expect_list_by_template()
            .with(eq(TEMPLATE))
            .times(1)
            .returning(|_| Ok(vec![persisted(1, CAT_A, 1)]));
        let mut session = StagingSession::new(TEMPLATE);

        let created = committed_rules(session.commit_all(&repo).await.unwrap());

        assert!(created.is_empty());
        assert_eq!(session.committed().len(), 1);
    }

    #[tokio::test]
    async fn test_partial_commit_stops_and_keeps_remaining() {
        let mut repo = MockRuleRepo::new();
        let mut seq = Sequence::new();
        repo.expect_create()
            .with(eq(TEMPLATE), eq(CAT_A), always())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(RuleId(101)));
        repo.expect_create()
            .with(eq(TEMPLATE), eq(CAT_B), always())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Err(AppError::external_service("connection reset")));
        repo.expect_list_by_template()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![persisted(101, CAT_A, 1)]));

        let mut session = StagingSession::new(TEMPLATE);
        session.stage_new(CAT_A, qty(1)).unwrap();
        session.stage_new(CAT_B, qty(2)).unwrap();
        session.stage_new(CAT_C, qty(3)).unwrap();

        let failure = session.commit_all(&repo).await.unwrap_err();

        assert_eq!(failure.committed.len(), 1);
        assert_eq!(failure.committed[0].id, Some(RuleId(101)));
        assert_eq!(failure.failed, Some(PendingRule::new(CAT_B, qty(2))));
        assert_eq!(
            failure.remaining,
            vec![PendingRule::new(CAT_B, qty(2)), PendingRule::new(CAT_C, qty(3))]
        );
        assert_eq!(failure.source, AppError::external_service("connection reset"));
        assert_eq!(session.pending(), failure.remaining.as_slice());
        assert_eq!(session.committed().len(), 1);
    }

    #[tokio::test]
    async fn test_retry_after_partial_commit_only_resends_pending() {
        let mut repo = MockRuleRepo::new();
        let mut seq = Sequence::new();
        // 第一次提交：A 成功，B 失败
        repo.expect_create()
            .with(eq(TEMPLATE), eq(CAT_A), always())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(RuleId(1)));
        repo.expect_create()
            .with(eq(TEMPLATE), eq(CAT_B), always())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Err(AppError::external_service("timeout")));
        repo.expect_list_by_template()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![persisted(1, CAT_A, 1)]));
        // 第二次提交：只重发 B
        repo.expect_create()
            .with(eq(TEMPLATE), eq(CAT_B), eq(qty(2)))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(RuleId(2)));
        repo.expect_list_by_template()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![persisted(1, CAT_A, 1), persisted(2, CAT_B, 2)]));

        let mut session = StagingSession::new(TEMPLATE);
        session.stage_new(CAT_A, qty(1)).unwrap();
        session.stage_new(CAT_B, qty(2)).unwrap();

        assert!(session.commit_all(&repo).await.is_err());
        let created = committed_rules(session.commit_all(&repo).await.unwrap());

        assert_eq!(created.len(), 1);
        assert_eq!(created[0].id, Some(RuleId(2)));
        assert!(session.pending().is_empty());
        assert_eq!(session.committed().len(), 2);
    }

    #[tokio::test]
    async fn test_commit_rejects_pending_that_collides_after_reload() {
        let mut repo = MockRuleRepo::new();
        repo.expect_create().never();
        repo.expect_list_by_template()
            .with(eq(TEMPLATE))
            .times(2)
            .returning(|_| Ok(vec![persisted(5, CAT_A, 1)]));

        let mut session = StagingSession::new(TEMPLATE);
        session.stage_new(CAT_A, qty(2)).unwrap();
        session.stage_new(CAT_B, qty(1)).unwrap();
        let event = session.reload(&repo).await.unwrap();
        assert_eq!(
            event,
            StagingEvent::Reloaded {
                rules: 1,
                conflicts: vec![CAT_A],
            }
        );

        let failure = session.commit_all(&repo).await.unwrap_err();

        assert!(failure.committed.is_empty());
        assert_eq!(failure.failed, Some(PendingRule::new(CAT_A, qty(2))));
        assert_eq!(
            failure.remaining,
            vec![PendingRule::new(CAT_A, qty(2)), PendingRule::new(CAT_B, qty(1))]
        );
        assert!(matches!(failure.source, AppError::Conflict(_)));
        assert_eq!(session.committed().len(), 1);
    }

    #[tokio::test]
    async fn test_reload_failure_after_commit_keeps_rules_locally() {
        let mut repo = MockRuleRepo::new();
        repo.expect_create().times(1).returning(|_, _, _| Ok(RuleId(7)));
        repo.expect_list_by_template()
            .times(1)
            .returning(|_| Err(AppError::external_service("bad gateway")));

        let mut session = StagingSession::new(TEMPLATE).with_categories(&categories());
        session.stage_new(CAT_C, qty(1)).unwrap();

        let failure = session.commit_all(&repo).await.unwrap_err();

        assert!(failure.failed.is_none());
        assert!(failure.remaining.is_empty());
        assert!(session.pending().is_empty());
        assert_eq!(session.committed().len(), 1);
        assert_eq!(session.committed()[0].category_name, "Crackers");
        // 分类仍被占用
        assert!(session.stage_new(CAT_C, qty(1)).is_err());
    }

    #[tokio::test]
    async fn test_edit_committed() {
        let repo = InMemoryQuotaRuleRepository::new().with_categories(&categories());
        let rule_id = repo.create(TEMPLATE, CAT_A, qty(1)).await.unwrap();
        let mut session = StagingSession::open(&repo, TEMPLATE)
            .await
            .unwrap()
            .with_categories(&categories());

        let event = session
            .edit_committed(&repo, rule_id, CAT_B, qty(4))
            .await
            .unwrap();

        let rule = match event {
            StagingEvent::RuleUpdated { rule } => rule,
            other => panic!("unexpected event: {other:?}"),
        };
        assert_eq!(rule.category_id, CAT_B);
        assert_eq!(rule.required_quantity, qty(4));
        assert_eq!(rule.category_name, "Cheese");
        assert_eq!(repo.list_by_template(TEMPLATE).await.unwrap()[0].category_id, CAT_B);
    }

    #[tokio::test]
    async fn test_edit_keeping_own_category_is_allowed() {
        let repo = InMemoryQuotaRuleRepository::new();
        let rule_id = repo.create(TEMPLATE, CAT_A, qty(1)).await.unwrap();
        let mut session = StagingSession::open(&repo, TEMPLATE).await.unwrap();

        let result = session.edit_committed(&repo, rule_id, CAT_A, qty(6)).await;

        assert!(result.is_ok());
        assert_eq!(session.committed()[0].required_quantity, qty(6));
    }

    #[tokio::test]
    async fn test_edit_rejects_collisions_before_calling_repository() {
        let mut repo = MockRuleRepo::new();
        repo.expect_list_by_template()
            .returning(|_| Ok(vec![persisted(1, CAT_A, 1), persisted(2, CAT_B, 1)]));
        repo.expect_update().never();

        let mut session = StagingSession::open(&repo, TEMPLATE).await.unwrap();
        session.stage_new(CAT_C, qty(1)).unwrap();

        let committed_clash = session.edit_committed(&repo, RuleId(1), CAT_B, qty(1)).await;
        let pending_clash = session.edit_committed(&repo, RuleId(1), CAT_C, qty(1)).await;
        let missing = session.edit_committed(&repo, RuleId(99), CAT_A, qty(1)).await;

        assert!(matches!(committed_clash, Err(ServiceError::DuplicateCategory { .. })));
        assert!(matches!(pending_clash, Err(ServiceError::DuplicateCategory { .. })));
        assert!(matches!(missing, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_edit_repository_failure_leaves_rule_unchanged() {
        let mut repo = MockRuleRepo::new();
        repo.expect_list_by_template()
            .returning(|_| Ok(vec![persisted(1, CAT_A, 1)]));
        repo.expect_update()
            .times(1)
            .returning(|_, _, _| Err(AppError::validation("quantity must be positive")));

        let mut session = StagingSession::open(&repo, TEMPLATE).await.unwrap();
        let result = session.edit_committed(&repo, RuleId(1), CAT_B, qty(2)).await;

        assert!(matches!(result, Err(ServiceError::RepositoryFailure(AppError::Validation(_)))));
        assert_eq!(session.committed()[0], persisted(1, CAT_A, 1));
    }

    #[tokio::test]
    async fn test_delete_committed() {
        let repo = InMemoryQuotaRuleRepository::new();
        let rule_id = repo.create(TEMPLATE, CAT_A, qty(1)).await.unwrap();
        let mut session = StagingSession::open(&repo, TEMPLATE).await.unwrap();
        session.edit_draft_from(rule_id).unwrap();

        let event = session.delete_committed(&repo, rule_id).await.unwrap();

        assert_eq!(event, StagingEvent::RuleDeleted { rule_id });
        assert!(session.committed().is_empty());
        assert!(session.draft().is_none());
        assert!(repo.list_by_template(TEMPLATE).await.unwrap().is_empty());
        assert!(matches!(
            session.delete_committed(&repo, rule_id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_reload_keeps_pending_and_reports_conflicts() {
        let repo = InMemoryQuotaRuleRepository::new();
        let mut session = StagingSession::open(&repo, TEMPLATE).await.unwrap();
        session.stage_new(CAT_A, qty(1)).unwrap();
        session.stage_new(CAT_B, qty(1)).unwrap();
        // 另一个管理员先提交了 B
        repo.create(TEMPLATE, CAT_B, qty(5)).await.unwrap();

        let event = session.reload(&repo).await.unwrap();

        assert_eq!(
            event,
            StagingEvent::Reloaded {
                rules: 1,
                conflicts: vec![CAT_B]
            }
        );
        assert_eq!(session.pending().len(), 2);
    }

    #[tokio::test]
    async fn test_submit_new_draft() {
        let repo = InMemoryQuotaRuleRepository::new();
        let mut session = StagingSession::new(TEMPLATE);
        session.set_draft(RuleDraft::new(CAT_A, qty(2)));

        let event = session.submit_draft(&repo).await.unwrap();

        assert!(matches!(event, StagingEvent::Staged { .. }));
        assert!(session.draft().is_none());
        assert_eq!(session.pending().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_draft_is_preserved() {
        let repo = InMemoryQuotaRuleRepository::new();
        let mut session = StagingSession::new(TEMPLATE);
        session.stage_new(CAT_A, qty(1)).unwrap();
        session.set_draft(RuleDraft::new(CAT_A, qty(9)));

        let result = session.submit_draft(&repo).await;

        assert!(matches!(result, Err(ServiceError::DuplicateCategory { .. })));
        assert_eq!(session.draft(), Some(&RuleDraft::new(CAT_A, qty(9))));
        assert_eq!(session.clear_draft(), StagingEvent::DraftChanged { draft: None });
        assert_eq!(session.clear_draft(), StagingEvent::Unchanged);
    }

    #[tokio::test]
    async fn test_submit_edit_draft_updates_remote() {
        let repo = InMemoryQuotaRuleRepository::new();
        let rule_id = repo.create(TEMPLATE, CAT_A, qty(1)).await.unwrap();
        let mut session = StagingSession::open(&repo, TEMPLATE).await.unwrap();

        session.edit_draft_from(rule_id).unwrap();
        let mut draft = *session.draft().unwrap();
        draft.required_quantity = qty(3);
        session.set_draft(draft);
        session.submit_draft(&repo).await.unwrap();

        assert_eq!(
            repo.list_by_template(TEMPLATE).await.unwrap()[0].required_quantity,
            qty(3)
        );
        assert!(session.pending().is_empty());
    }

    #[tokio::test]
    async fn test_submit_without_draft_fails() {
        let repo = InMemoryQuotaRuleRepository::new();
        let mut session = StagingSession::new(TEMPLATE);

        let result = session.submit_draft(&repo).await;

        assert!(matches!(result, Err(ServiceError::InvalidArgument(_))));
    }

    #[test]
    fn test_discard() {
        let mut session = StagingSession::new(TEMPLATE);
        session.stage_new(CAT_A, qty(1)).unwrap();
        session.set_draft(RuleDraft::new(CAT_B, qty(1)));

        let event = session.discard();

        assert_eq!(
            event,
            StagingEvent::Discarded {
                pending: vec![PendingRule::new(CAT_A, qty(1))]
            }
        );
        assert!(!session.has_unsaved_changes());
    }

    #[test]
    fn test_check_composition_uses_pending_rules() {
        let mut session = StagingSession::new(TEMPLATE).with_categories(&categories());
        session.stage_new(CAT_A, qty(2)).unwrap();
        let template = BasketTemplate::new(TEMPLATE, "Wine duo");
        let catalog = ProductCatalog::new(
            [Product::new(
                ProductId(1),
                "Merlot",
                Some(CAT_A),
                Weight::from_grams(750.0).unwrap(),
            )],
            categories(),
        );
        let composition = [CompositionEntry::new(ProductId(1), 1).unwrap()];

        let report = session
            .check_composition(&template, &composition, &catalog, &CompositionValidator::default())
            .unwrap();

        let wine = report.category(CAT_A).unwrap();
        assert_eq!(wine.category_name, "Wine");
        assert_eq!((wine.actual, wine.required), (1, 2));
        assert!(!report.is_valid);
    }
}
