//! 重量值对象

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul};
use thiserror::Error;

/// 每克对应的存储单位数（毫克）
const MILLIGRAMS_PER_GRAM: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum WeightError {
    #[error("weight must not be negative, got {0} g")]
    Negative(f64),

    #[error("weight must be a finite number")]
    NotFinite,

    #[error("weight {0} g is too large")]
    TooLarge(f64),
}

/// 非负重量
///
/// 以整数毫克存储，避免浮点累加误差；对外以克表示。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Weight {
    milligrams: u64,
}

impl Weight {
    pub const ZERO: Weight = Weight { milligrams: 0 };

    /// 以克创建，精确到毫克
    ///
    /// 不足 0.5 mg 的部分四舍五入；超出 `u64` 毫克范围返回 `TooLarge`。
    pub fn from_grams(grams: f64) -> Result<Self, WeightError> {
        if !grams.is_finite() {
            return Err(WeightError::NotFinite);
        }
        if grams < 0.0 {
            return Err(WeightError::Negative(grams));
        }
        let milligrams = (grams * MILLIGRAMS_PER_GRAM).round();
        // u64::MAX as f64 向上取整为 2^64，本身已越界
        if milligrams >= u64::MAX as f64 {
            return Err(WeightError::TooLarge(grams));
        }
        Ok(Self {
            milligrams: milligrams as u64,
        })
    }

    pub fn from_milligrams(milligrams: u64) -> Self {
        Self { milligrams }
    }

    pub fn milligrams(&self) -> u64 {
        self.milligrams
    }

    pub fn grams(&self) -> f64 {
        self.milligrams as f64 / MILLIGRAMS_PER_GRAM
    }

    pub fn is_zero(&self) -> bool {
        self.milligrams == 0
    }
}

impl TryFrom<f64> for Weight {
    type Error = WeightError;

    fn try_from(grams: f64) -> Result<Self, Self::Error> {
        Self::from_grams(grams)
    }
}

impl From<Weight> for f64 {
    fn from(weight: Weight) -> Self {
        weight.grams()
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}g", self.grams())
    }
}

impl Add for Weight {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::from_milligrams(self.milligrams.saturating_add(other.milligrams))
    }
}

impl Mul<u32> for Weight {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self {
        Self::from_milligrams(self.milligrams.saturating_mul(u64::from(quantity)))
    }
}

impl Sum for Weight {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_grams() {
        let weight = Weight::from_grams(300.5).unwrap();
        assert_eq!(weight.milligrams(), 300_500);
        assert_eq!(weight.grams(), 300.5);
        assert_eq!(weight.to_string(), "300.5g");
    }

    #[test]
    fn test_rejects_negative_and_nan() {
        assert_eq!(Weight::from_grams(-1.0), Err(WeightError::Negative(-1.0)));
        assert_eq!(Weight::from_grams(f64::NAN), Err(WeightError::NotFinite));
        assert_eq!(Weight::from_grams(f64::INFINITY), Err(WeightError::NotFinite));
    }

    #[test]
    fn test_precision_and_range() {
        assert_eq!(Weight::from_grams(0.0004).unwrap(), Weight::ZERO);
        assert_eq!(Weight::from_grams(0.0006).unwrap().milligrams(), 1);
        assert_eq!(Weight::from_grams(1e17), Err(WeightError::TooLarge(1e17)));
        assert_eq!(Weight::from_grams(f64::MAX), Err(WeightError::TooLarge(f64::MAX)));
        assert!(Weight::from_grams(1e12).is_ok());
    }

    #[test]
    fn test_arithmetic() {
        let unit = Weight::from_grams(300.0).unwrap();
        let total: Weight = [unit * 2, Weight::from_grams(100.0).unwrap()]
            .into_iter()
            .sum();
        assert_eq!(total, Weight::from_grams(700.0).unwrap());
        assert!(total > Weight::from_grams(500.0).unwrap());
    }

    #[test]
    fn test_serde_uses_grams() {
        let weight: Weight = serde_json::from_str("125.25").unwrap();
        assert_eq!(weight.milligrams(), 125_250);
        assert_eq!(serde_json::to_string(&weight).unwrap(), "125.25");
        assert!(serde_json::from_str::<Weight>("-3").is_err());
    }
}
