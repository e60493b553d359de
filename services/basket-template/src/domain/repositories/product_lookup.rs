//! 商品目录查询接口

use std::collections::HashMap;

use crate::domain::entities::Product;
use crate::domain::value_objects::{CategoryId, ProductId};

/// 只读商品查询，单次校验期间视为一致
pub trait ProductLookup {
    fn resolve(&self, product_id: ProductId) -> Option<&Product>;

    /// 分类显示名称，未知时返回 `None`
    fn category_name(&self, _category_id: CategoryId) -> Option<&str> {
        None
    }
}

impl ProductLookup for HashMap<ProductId, Product> {
    fn resolve(&self, product_id: ProductId) -> Option<&Product> {
        self.get(&product_id)
    }
}
