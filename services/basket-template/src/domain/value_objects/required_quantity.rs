//! 配额要求数量

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ServiceError, ServiceResult};

/// 模板对某分类要求的商品件数，至少为 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct RequiredQuantity(u32);

impl RequiredQuantity {
    pub fn new(quantity: u32) -> ServiceResult<Self> {
        if quantity == 0 {
            return Err(ServiceError::invalid_argument(
                "required quantity must be at least 1",
            ));
        }
        Ok(Self(quantity))
    }

    /// 从外部输入（可能为负）构造
    pub fn from_signed(quantity: i64) -> ServiceResult<Self> {
        let quantity = u32::try_from(quantity).map_err(|_| {
            ServiceError::invalid_argument(format!(
                "required quantity {quantity} is out of range"
            ))
        })?;
        Self::new(quantity)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for RequiredQuantity {
    type Error = ServiceError;

    fn try_from(quantity: u32) -> Result<Self, Self::Error> {
        Self::new(quantity)
    }
}

impl From<RequiredQuantity> for u32 {
    fn from(quantity: RequiredQuantity) -> Self {
        quantity.0
    }
}

impl fmt::Display for RequiredQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
