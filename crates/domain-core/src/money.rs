//! 货币值对象

use serde::{Deserialize, Serialize};
use std::fmt;

/// 货币代码
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency(pub String);

impl Currency {
    pub fn new(code: &str) -> Self {
        Self(code.to_uppercase())
    }

    pub fn usd() -> Self {
        Self("USD".to_string())
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::usd()
    }
}

/// 金额值对象
///
/// 商品只携带标价，核心逻辑不做任何价格计算。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// 金额（以最小单位存储，如分）
    pub amount: i64,
    /// 货币代码
    pub currency: Currency,
}

impl Money {
    pub fn new(amount: i64, currency: Currency) -> Self {
        Self { amount, currency }
    }

    pub fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    /// 从十进制金额创建（如 12.5 -> 1250 分）
    pub fn from_decimal(amount: f64, currency: Currency) -> Self {
        Self::new((amount * 100.0).round() as i64, currency)
    }

    /// 转换为浮点数（用于显示）
    pub fn to_decimal(&self) -> f64 {
        self.amount as f64 / 100.0
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero(Currency::default())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} {}", self.to_decimal(), self.currency.0)
    }
}
