//! 内存商品目录

use std::collections::HashMap;

use domain_core::Entity;

use crate::domain::entities::{Category, Product};
use crate::domain::repositories::ProductLookup;
use crate::domain::value_objects::{CategoryId, ProductId};

/// 从外部目录一次性加载的商品与分类快照
#[derive(Debug, Clone, Default)]
pub struct ProductCatalog {
    products: HashMap<ProductId, Product>,
    categories: HashMap<CategoryId, Category>,
}

impl ProductCatalog {
    pub fn new(
        products: impl IntoIterator<Item = Product>,
        categories: impl IntoIterator<Item = Category>,
    ) -> Self {
        let mut catalog = Self::default();
        for category in categories {
            catalog.insert_category(category);
        }
        for product in products {
            catalog.insert_product(product);
        }
        catalog
    }

    /// 同 ID 的商品后写覆盖先写
    pub fn insert_product(&mut self, product: Product) {
        self.products.insert(*product.id(), product);
    }

    pub fn insert_category(&mut self, category: Category) {
        self.categories.insert(*category.id(), category);
    }

    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl ProductLookup for ProductCatalog {
    fn resolve(&self, product_id: ProductId) -> Option<&Product> {
        self.products.get(&product_id)
    }

    fn category_name(&self, category_id: CategoryId) -> Option<&str> {
        self.categories
            .get(&category_id)
            .map(|category| category.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_core::Weight;

    #[test]
    fn test_lookup() {
        let catalog = ProductCatalog::new(
            [Product::new(
                ProductId(1),
                "Dark chocolate",
                Some(CategoryId(10)),
                Weight::from_grams(100.0).unwrap(),
            )],
            [Category::new(CategoryId(10), "Sweets")],
        );

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.resolve(ProductId(1)).map(|p| p.name.as_str()), Some("Dark chocolate"));
        assert!(catalog.resolve(ProductId(2)).is_none());
        assert_eq!(catalog.category_name(CategoryId(10)), Some("Sweets"));
        assert_eq!(catalog.category_name(CategoryId(11)), None);
    }
}
