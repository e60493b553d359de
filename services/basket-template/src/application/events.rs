//! 暂存会话的状态变迁
//!
//! 每个暂存操作都返回一个事件，调用方据此增量更新视图，无需整页重载。

use serde::Serialize;

use crate::domain::entities::{PendingRule, QuotaRule};
use crate::domain::value_objects::{CategoryId, RuleId};

use super::staging::RuleDraft;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StagingEvent {
    /// 新规则进入待提交列表
    Staged { rule: PendingRule },
    /// 待提交规则被移除
    Unstaged { rule: PendingRule },
    /// 操作未改变任何状态
    Unchanged,
    /// 草稿被设置或清空
    DraftChanged { draft: Option<RuleDraft> },
    /// 待提交规则已全部写入远程
    Committed { rules: Vec<QuotaRule> },
    /// 已提交规则被修改
    RuleUpdated { rule: QuotaRule },
    /// 已提交规则被删除
    RuleDeleted { rule_id: RuleId },
    /// 已提交列表从远程刷新
    ///
    /// `conflicts` 为刷新后与远程规则分类重复的待提交项，`commit_all` 会在本地拒绝它们。
    Reloaded {
        rules: usize,
        conflicts: Vec<CategoryId>,
    },
    /// 会话被丢弃，返回丢弃的待提交项
    Discarded { pending: Vec<PendingRule> },
}
