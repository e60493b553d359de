//! 强类型 ID 定义
//!
//! 远程目录使用整数主键，这里只做类型区分，不解释其取值。

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use std::num::ParseIntError;
use std::str::FromStr;

macro_rules! integer_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, From,
        )]
        #[serde(transparent)]
        #[display("{_0}")]
        pub struct $name(pub i64);

        impl $name {
            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.trim().parse()?))
            }
        }
    };
}

integer_id!(
    /// 商品分类 ID
    CategoryId
);

integer_id!(
    /// 商品 ID
    ProductId
);

integer_id!(
    /// 配额规则 ID（仅在远程持久化后存在）
    RuleId
);

integer_id!(
    /// 礼品篮模板 ID
    TemplateId
);
