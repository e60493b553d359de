//! 商品分类

use domain_core::Entity;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::CategoryId;

/// 商品分类（由外部目录提供，只读）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

impl Category {
    pub fn new(id: CategoryId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// 目录中没有名称时的显示名称
    pub fn fallback_name(id: CategoryId) -> String {
        format!("Category {id}")
    }
}

impl Entity for Category {
    type Id = CategoryId;

    fn id(&self) -> &CategoryId {
        &self.id
    }
}
