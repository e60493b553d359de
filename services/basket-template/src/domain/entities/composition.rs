//! 组合条目

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::ProductId;
use crate::error::{ServiceError, ServiceResult};

/// 用户为礼品篮选择的一种商品及其件数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionEntry {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl CompositionEntry {
    pub fn new(product_id: ProductId, quantity: u32) -> ServiceResult<Self> {
        let entry = Self {
            product_id,
            quantity,
        };
        entry.ensure_valid()?;
        Ok(entry)
    }

    /// 件数必须至少为 1
    pub fn ensure_valid(&self) -> ServiceResult<()> {
        if self.quantity == 0 {
            return Err(ServiceError::invalid_argument(format!(
                "quantity for product {} must be at least 1",
                self.product_id
            )));
        }
        Ok(())
    }
}
