//! 校验报告

use domain_core::Weight;
use serde::Serialize;

use crate::domain::value_objects::{CategoryId, ProductId};

/// 对模板中未列出分类的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    /// 模板规则是穷举的
    Strict,
    /// 模板规则只是最低要求
    #[default]
    MinimumOnly,
}

/// 单个分类的配额判定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuotaStatus {
    Satisfied,
    Under,
    Over,
}

/// 模板中一条规则的实际与要求对比
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryReport {
    pub category_id: CategoryId,
    pub category_name: String,
    pub required: u32,
    pub actual: u32,
    pub status: QuotaStatus,
    /// 与要求数量之差的绝对值，`Satisfied` 时为 0
    pub difference: u32,
}

impl CategoryReport {
    pub fn compare(
        category_id: CategoryId,
        category_name: impl Into<String>,
        required: u32,
        actual: u32,
    ) -> Self {
        let status = match actual.cmp(&required) {
            std::cmp::Ordering::Equal => QuotaStatus::Satisfied,
            std::cmp::Ordering::Less => QuotaStatus::Under,
            std::cmp::Ordering::Greater => QuotaStatus::Over,
        };
        Self {
            category_id,
            category_name: category_name.into(),
            required,
            actual,
            status,
            difference: actual.abs_diff(required),
        }
    }

    pub fn is_satisfied(&self) -> bool {
        self.status == QuotaStatus::Satisfied
    }

    /// 一行可读描述
    pub fn describe(&self) -> String {
        match self.status {
            QuotaStatus::Satisfied => format!(
                "{}: {}/{} ok",
                self.category_name, self.actual, self.required
            ),
            QuotaStatus::Under => format!(
                "{}: {}/{}, add {} more",
                self.category_name, self.actual, self.required, self.difference
            ),
            QuotaStatus::Over => format!(
                "{}: {}/{}, remove {}",
                self.category_name, self.actual, self.required, self.difference
            ),
        }
    }
}

/// 组合中出现但模板没有规则的分类
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlistedCategory {
    pub category_id: CategoryId,
    pub category_name: Option<String>,
    pub quantity: u32,
}

/// 组合校验结果，每次组合或模板变化后重新计算，不持久化
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub match_mode: MatchMode,
    pub categories: Vec<CategoryReport>,
    pub unlisted: Vec<UnlistedCategory>,
    /// 未分类商品的总件数
    pub uncategorized_quantity: u32,
    /// 目录中找不到的商品
    pub unknown_products: Vec<ProductId>,
    pub total_weight: Weight,
    pub max_total_weight: Option<Weight>,
    pub weight_exceeded: bool,
    pub is_valid: bool,
}

impl ValidationReport {
    pub fn category(&self, category_id: CategoryId) -> Option<&CategoryReport> {
        self.categories
            .iter()
            .find(|report| report.category_id == category_id)
    }

    /// 未满足的分类
    pub fn violations(&self) -> impl Iterator<Item = &CategoryReport> {
        self.categories.iter().filter(|report| !report.is_satisfied())
    }

    pub fn summary(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.categories.iter().map(CategoryReport::describe).collect();

        if self.match_mode == MatchMode::Strict {
            for unlisted in &self.unlisted {
                let name = unlisted
                    .category_name
                    .clone()
                    .unwrap_or_else(|| format!("category {}", unlisted.category_id));
                lines.push(format!("{}: {} not allowed by this template", name, unlisted.quantity));
            }
            if self.uncategorized_quantity > 0 {
                lines.push(format!(
                    "{} uncategorized item(s) not allowed by this template",
                    self.uncategorized_quantity
                ));
            }
        }

        match self.max_total_weight {
            Some(max) if self.weight_exceeded => {
                lines.push(format!("weight {} exceeds limit {}", self.total_weight, max))
            }
            Some(max) => lines.push(format!("weight {} within limit {}", self.total_weight, max)),
            None => lines.push(format!("weight {}", self.total_weight)),
        }

        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare() {
        let under = CategoryReport::compare(CategoryId(1), "Wine", 2, 1);
        assert_eq!(under.status, QuotaStatus::Under);
        assert_eq!(under.difference, 1);
        assert_eq!(under.describe(), "Wine: 1/2, add 1 more");

        let over = CategoryReport::compare(CategoryId(1), "Wine", 2, 5);
        assert_eq!(over.status, QuotaStatus::Over);
        assert_eq!(over.difference, 3);

        let exact = CategoryReport::compare(CategoryId(1), "Wine", 2, 2);
        assert!(exact.is_satisfied());
        assert_eq!(exact.difference, 0);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_value(CategoryReport::compare(CategoryId(4), "Cheese", 1, 0)).unwrap();
        assert_eq!(json["status"], "UNDER");
        assert_eq!(json["categoryId"], 4);
        assert_eq!(serde_json::to_value(MatchMode::MinimumOnly).unwrap(), "minimum-only");
    }
}
