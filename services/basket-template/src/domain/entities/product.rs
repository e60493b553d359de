//! 商品

use domain_core::{Entity, Money, Weight};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{CategoryId, ProductId};

/// 商品（外部目录拥有，核心只读）
///
/// 未分类商品（`category_id` 为空）不参与配额统计，但计入总重量。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category_id: Option<CategoryId>,
    /// 单件重量
    pub unit_weight: Weight,
    pub price: Money,
}

impl Product {
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        category_id: Option<CategoryId>,
        unit_weight: Weight,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            category_id,
            unit_weight,
            price: Money::default(),
        }
    }

    pub fn with_price(mut self, price: Money) -> Self {
        self.price = price;
        self
    }

    pub fn is_categorized(&self) -> bool {
        self.category_id.is_some()
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &ProductId {
        &self.id
    }
}
