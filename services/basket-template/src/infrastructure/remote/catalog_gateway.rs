//! 模板与商品目录读取

use errors::AppResult;
use tracing::info;

use crate::domain::catalog::ProductCatalog;
use crate::domain::entities::{BasketTemplate, Category};
use crate::domain::value_objects::TemplateId;

use super::client::CatalogApiClient;
use super::converters::{
    categories_from_dtos, products_from_dtos, quota_rule_from_dto, template_from_dto,
};
use super::dto::{
    BasketTemplateDto, CategoryDto, ItemEnvelope, ListEnvelope, ProductDto, QuotaRuleDto,
};
use super::rule_repository::malformed;

/// 只读网关：模板（含规则）与商品目录快照
pub struct HttpCatalogGateway {
    client: CatalogApiClient,
}

impl HttpCatalogGateway {
    pub fn new(client: CatalogApiClient) -> Self {
        Self { client }
    }

    /// 读取模板；模板载荷未内嵌规则时再单独拉取规则列表
    pub async fn fetch_template(&self, template_id: TemplateId) -> AppResult<BasketTemplate> {
        let envelope: ItemEnvelope<BasketTemplateDto> = self
            .client
            .get_json(&format!("templates/{template_id}"))
            .await?;
        let mut dto = envelope.into_item();
        if dto.id.is_none() {
            dto.id = Some(template_id.value());
        }
        let embedded_rules = dto.rules.is_some();
        let template = template_from_dto(dto).map_err(malformed)?;

        if embedded_rules {
            return Ok(template);
        }

        let rules: ListEnvelope<QuotaRuleDto> = self
            .client
            .get_json(&format!("templates/{template_id}/rules"))
            .await?;
        let rules = rules
            .into_items()
            .into_iter()
            .map(|dto| quota_rule_from_dto(dto, template_id).map_err(malformed))
            .collect::<AppResult<Vec<_>>>()?;
        Ok(template.with_rules(rules))
    }

    pub async fn fetch_categories(&self) -> AppResult<Vec<Category>> {
        let categories: ListEnvelope<CategoryDto> = self.client.get_json("categories").await?;
        categories_from_dtos(categories.into_items()).map_err(malformed)
    }

    pub async fn fetch_catalog(&self) -> AppResult<ProductCatalog> {
        let products: ListEnvelope<ProductDto> = self.client.get_json("products").await?;
        let products = products_from_dtos(products.into_items()).map_err(malformed)?;
        let categories = self.fetch_categories().await?;
        info!(
            products = products.len(),
            categories = categories.len(),
            "Product catalog loaded"
        );
        Ok(ProductCatalog::new(products, categories))
    }
}
