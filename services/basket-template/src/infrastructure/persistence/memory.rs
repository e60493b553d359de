//! 内存配额规则仓储
//!
//! 模拟远程规则存储，包括服务端的"同模板分类唯一"约束。用于离线演练和测试。

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use errors::{AppError, AppResult};
use parking_lot::Mutex;
use tracing::debug;

use crate::domain::entities::{Category, QuotaRule};
use crate::domain::repositories::QuotaRuleRepository;
use crate::domain::value_objects::{CategoryId, RequiredQuantity, RuleId, TemplateId};

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    rules: Vec<QuotaRule>,
    category_names: HashMap<CategoryId, String>,
    rejected_categories: HashSet<CategoryId>,
    create_calls: usize,
}

#[derive(Debug, Default)]
pub struct InMemoryQuotaRuleRepository {
    state: Mutex<State>,
}

impl InMemoryQuotaRuleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置规则（如从远程快照复制）
    pub fn with_rules(self, rules: impl IntoIterator<Item = QuotaRule>) -> Self {
        {
            let mut state = self.state.lock();
            for rule in rules {
                if let Some(id) = rule.id {
                    state.next_id = state.next_id.max(id.value());
                }
                state.rules.push(rule);
            }
        }
        self
    }

    pub fn with_categories<'a>(self, categories: impl IntoIterator<Item = &'a Category>) -> Self {
        self.state.lock().category_names.extend(
            categories
                .into_iter()
                .map(|category| (category.id, category.name.clone())),
        );
        self
    }

    /// 之后对该分类的创建请求都以服务端错误失败
    pub fn reject_category(&self, category_id: CategoryId) {
        self.state.lock().rejected_categories.insert(category_id);
    }

    pub fn accept_category(&self, category_id: CategoryId) {
        self.state.lock().rejected_categories.remove(&category_id);
    }

    /// 累计收到的创建请求数（含失败的）
    pub fn create_calls(&self) -> usize {
        self.state.lock().create_calls
    }
}

impl State {
    fn ensure_category_free(
        &self,
        template_id: TemplateId,
        category_id: CategoryId,
        except: Option<RuleId>,
    ) -> AppResult<()> {
        let taken = self.rules.iter().any(|rule| {
            rule.template_id == template_id && rule.category_id == category_id && rule.id != except
        });
        if taken {
            return Err(AppError::conflict(format!(
                "category {} already has a rule in template {}",
                category_id, template_id
            )));
        }
        Ok(())
    }

    fn category_name(&self, category_id: CategoryId) -> String {
        self.category_names
            .get(&category_id)
            .cloned()
            .unwrap_or_else(|| Category::fallback_name(category_id))
    }
}

#[async_trait]
impl QuotaRuleRepository for InMemoryQuotaRuleRepository {
    async fn create(
        &self,
        template_id: TemplateId,
        category_id: CategoryId,
        quantity: RequiredQuantity,
    ) -> AppResult<RuleId> {
        let mut state = self.state.lock();
        state.create_calls += 1;

        if state.rejected_categories.contains(&category_id) {
            return Err(AppError::external_service(format!(
                "503 Service Unavailable while creating rule for category {category_id}"
            )));
        }
        state.ensure_category_free(template_id, category_id, None)?;

        state.next_id += 1;
        let rule_id = RuleId(state.next_id);
        let name = state.category_name(category_id);
        state.rules.push(QuotaRule::persisted(
            rule_id,
            template_id,
            category_id,
            quantity,
            name,
        ));

        debug!(template_id = %template_id, rule_id = %rule_id, "In-memory rule created");
        Ok(rule_id)
    }

    async fn update(
        &self,
        rule_id: RuleId,
        category_id: CategoryId,
        quantity: RequiredQuantity,
    ) -> AppResult<()> {
        let mut state = self.state.lock();
        let index = state
            .rules
            .iter()
            .position(|rule| rule.id == Some(rule_id))
            .ok_or_else(|| AppError::not_found(format!("quota rule {rule_id}")))?;

        let template_id = state.rules[index].template_id;
        state.ensure_category_free(template_id, category_id, Some(rule_id))?;

        let name = state.category_name(category_id);
        let rule = &mut state.rules[index];
        rule.category_id = category_id;
        rule.required_quantity = quantity;
        rule.category_name = name;
        Ok(())
    }

    async fn delete(&self, rule_id: RuleId) -> AppResult<()> {
        let mut state = self.state.lock();
        let before = state.rules.len();
        state.rules.retain(|rule| rule.id != Some(rule_id));
        if state.rules.len() == before {
            return Err(AppError::not_found(format!("quota rule {rule_id}")));
        }
        Ok(())
    }

    async fn list_by_template(&self, template_id: TemplateId) -> AppResult<Vec<QuotaRule>> {
        Ok(self
            .state
            .lock()
            .rules
            .iter()
            .filter(|rule| rule.template_id == template_id)
            .cloned()
            .collect())
    }
}
