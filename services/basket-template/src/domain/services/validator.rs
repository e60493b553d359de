//! 组合校验
//!
//! 纯计算：给定模板、组合与商品目录，产出逐分类的诊断报告。

use std::collections::{BTreeMap, HashSet};

use domain_core::Weight;
use tracing::debug;

use super::report::{CategoryReport, MatchMode, UnlistedCategory, ValidationReport};
use crate::domain::entities::{BasketTemplate, CompositionEntry};
use crate::domain::repositories::ProductLookup;
use crate::domain::value_objects::{CategoryId, ProductId};
use crate::error::{ServiceError, ServiceResult};

/// 组合校验器
#[derive(Debug, Clone, Copy, Default)]
pub struct CompositionValidator {
    mode: MatchMode,
}

impl CompositionValidator {
    pub fn new(mode: MatchMode) -> Self {
        Self { mode }
    }

    pub fn strict() -> Self {
        Self::new(MatchMode::Strict)
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// 校验组合是否满足模板
    ///
    /// 找不到的商品不报错，按未分类、零重量处理并记入 `unknown_products`。
    /// 件数为 0 或模板对同一分类有多条规则时直接返回 `InvalidArgument`。
    pub fn validate(
        &self,
        template: &BasketTemplate,
        composition: &[CompositionEntry],
        catalog: &dyn ProductLookup,
    ) -> ServiceResult<ValidationReport> {
        ensure_unique_rules(template)?;
        for entry in composition {
            entry.ensure_valid()?;
        }

        let tally = Tally::count(composition, catalog);

        let categories: Vec<CategoryReport> = template
            .rules
            .iter()
            .map(|rule| {
                CategoryReport::compare(
                    rule.category_id,
                    rule.category_name.clone(),
                    rule.required_quantity.get(),
                    tally.actual(rule.category_id),
                )
            })
            .collect();

        let unlisted: Vec<UnlistedCategory> = tally
            .per_category
            .iter()
            .filter(|(category_id, _)| template.rule_for(**category_id).is_none())
            .map(|(category_id, quantity)| UnlistedCategory {
                category_id: *category_id,
                category_name: catalog.category_name(*category_id).map(str::to_owned),
                quantity: *quantity,
            })
            .collect();

        let weight_exceeded = template
            .max_total_weight
            .is_some_and(|max| tally.total_weight > max);

        let quotas_met = categories.iter().all(CategoryReport::is_satisfied);
        let extras_allowed = match self.mode {
            MatchMode::MinimumOnly => true,
            MatchMode::Strict => unlisted.is_empty() && tally.uncategorized == 0,
        };
        let is_valid = !weight_exceeded && quotas_met && extras_allowed;

        debug!(
            template_id = %template.id,
            entries = composition.len(),
            total_weight_g = tally.total_weight.grams(),
            weight_exceeded,
            unknown_products = tally.unknown.len(),
            is_valid,
            "Composition validated"
        );

        Ok(ValidationReport {
            match_mode: self.mode,
            categories,
            unlisted,
            uncategorized_quantity: tally.uncategorized,
            unknown_products: tally.unknown,
            total_weight: tally.total_weight,
            max_total_weight: template.max_total_weight,
            weight_exceeded,
            is_valid,
        })
    }
}

/// 以 `MinimumOnly` 策略校验
pub fn validate(
    template: &BasketTemplate,
    composition: &[CompositionEntry],
    catalog: &dyn ProductLookup,
) -> ServiceResult<ValidationReport> {
    CompositionValidator::default().validate(template, composition, catalog)
}

fn ensure_unique_rules(template: &BasketTemplate) -> ServiceResult<()> {
    let mut seen = HashSet::with_capacity(template.rules.len());
    for rule in &template.rules {
        if !seen.insert(rule.category_id) {
            return Err(ServiceError::invalid_argument(format!(
                "template {} has more than one rule for category {}",
                template.id, rule.category_id
            )));
        }
    }
    Ok(())
}

/// 组合按分类汇总后的计数
struct Tally {
    per_category: BTreeMap<CategoryId, u32>,
    uncategorized: u32,
    unknown: Vec<ProductId>,
    total_weight: Weight,
}

impl Tally {
    fn count(composition: &[CompositionEntry], catalog: &dyn ProductLookup) -> Self {
        let mut tally = Self {
            per_category: BTreeMap::new(),
            uncategorized: 0,
            unknown: Vec::new(),
            total_weight: Weight::ZERO,
        };

        for entry in composition {
            let Some(product) = catalog.resolve(entry.product_id) else {
                if !tally.unknown.contains(&entry.product_id) {
                    tally.unknown.push(entry.product_id);
                }
                continue;
            };

            tally.total_weight = tally.total_weight + product.unit_weight * entry.quantity;

            match product.category_id {
                Some(category_id) => {
                    let count = tally.per_category.entry(category_id).or_insert(0);
                    *count = count.saturating_add(entry.quantity);
                }
                None => tally.uncategorized = tally.uncategorized.saturating_add(entry.quantity),
            }
        }

        tally
    }

    fn actual(&self, category_id: CategoryId) -> u32 {
        self.per_category.get(&category_id).copied().unwrap_or(0)
    }
}
