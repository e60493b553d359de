//! API 载荷到领域对象的转换
//!
//! 所有数值约束在这里一次性检查：负重量、非正数量、缺失 ID 都会被拒绝。

use domain_core::{Currency, Money, Weight};

use crate::domain::entities::{
    BasketTemplate, Category, CompositionEntry, PendingRule, Product, QuotaRule,
};
use crate::domain::value_objects::{
    CategoryId, ProductId, RequiredQuantity, RuleId, TemplateId,
};
use crate::error::{ServiceError, ServiceResult};

use super::dto::{
    BasketTemplateDto, CategoryDto, CompositionEntryDto, DesiredRuleDto, ProductDto, QuotaRuleDto,
};

fn required<T>(value: Option<T>, what: &str) -> ServiceResult<T> {
    value.ok_or_else(|| ServiceError::invalid_argument(format!("{what} is missing")))
}

fn weight_from_grams(grams: f64, what: &str) -> ServiceResult<Weight> {
    Weight::from_grams(grams)
        .map_err(|e| ServiceError::invalid_argument(format!("{what}: {e}")))
}

/// 将 CategoryDto 转换为 Category
pub fn category_from_dto(dto: CategoryDto) -> ServiceResult<Category> {
    let id = CategoryId::from(required(dto.id, "category id")?);
    let name = dto
        .name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| Category::fallback_name(id));
    Ok(Category::new(id, name))
}

/// 将 ProductDto 转换为 Product
///
/// 分类可以是平铺的 `categoryId`，也可以是嵌套的 `category` 对象；两者都缺失即为未分类商品。
/// 缺失的单位重量按 0 处理。
pub fn product_from_dto(dto: ProductDto) -> ServiceResult<Product> {
    let id = ProductId::from(required(dto.id, "product id")?);
    let category_id = dto
        .category_id
        .or_else(|| dto.category.as_ref().and_then(|category| category.id))
        .map(CategoryId::from);
    let unit_weight = match dto.unit_weight {
        Some(grams) => weight_from_grams(grams, &format!("unit weight of product {id}"))?,
        None => Weight::ZERO,
    };
    let name = dto.name.unwrap_or_else(|| format!("Product {id}"));

    let mut product = Product::new(id, name, category_id, unit_weight);
    if let Some(price) = dto.price {
        if !price.is_finite() || price < 0.0 {
            return Err(ServiceError::invalid_argument(format!(
                "price of product {id} must be a non-negative number"
            )));
        }
        let currency = dto
            .currency
            .as_deref()
            .map(Currency::new)
            .unwrap_or_default();
        product = product.with_price(Money::from_decimal(price, currency));
    }
    Ok(product)
}

/// 将 QuotaRuleDto 转换为已持久化的 QuotaRule
///
/// 响应中缺少模板 ID 时使用请求的模板 ID。
pub fn quota_rule_from_dto(dto: QuotaRuleDto, template_id: TemplateId) -> ServiceResult<QuotaRule> {
    let id = RuleId::from(required(dto.id, "quota rule id")?);
    let category_id = dto
        .category_id
        .or_else(|| dto.category.as_ref().and_then(|category| category.id))
        .map(CategoryId::from)
        .ok_or_else(|| {
            ServiceError::invalid_argument(format!("category of quota rule {id} is missing"))
        })?;
    let required_quantity = RequiredQuantity::from_signed(required(
        dto.required_quantity,
        "required quantity",
    )?)?;
    let category_name = dto
        .category_name
        .or_else(|| dto.category.and_then(|category| category.name))
        .unwrap_or_else(|| Category::fallback_name(category_id));

    Ok(QuotaRule::persisted(
        id,
        dto.template_id.map(TemplateId::from).unwrap_or(template_id),
        category_id,
        required_quantity,
        category_name,
    ))
}

/// 将 BasketTemplateDto 转换为 BasketTemplate（含内嵌规则）
pub fn template_from_dto(dto: BasketTemplateDto) -> ServiceResult<BasketTemplate> {
    let id = TemplateId::from(required(dto.id, "template id")?);
    let mut template =
        BasketTemplate::new(id, dto.name.unwrap_or_else(|| format!("Template {id}")));

    if let Some(grams) = dto.max_total_weight {
        template = template
            .with_max_total_weight(weight_from_grams(grams, &format!("weight limit of template {id}"))?);
    }

    let rules = dto
        .rules
        .unwrap_or_default()
        .into_iter()
        .map(|rule| quota_rule_from_dto(rule, id))
        .collect::<ServiceResult<Vec<_>>>()?;
    Ok(template.with_rules(rules))
}

/// 将 CompositionEntryDto 转换为 CompositionEntry
pub fn composition_entry_from_dto(dto: CompositionEntryDto) -> ServiceResult<CompositionEntry> {
    let product_id = ProductId::from(dto.product_id);
    let quantity = u32::try_from(dto.quantity).map_err(|_| {
        ServiceError::invalid_argument(format!(
            "quantity {} for product {product_id} is out of range",
            dto.quantity
        ))
    })?;
    CompositionEntry::new(product_id, quantity)
}

/// 将 DesiredRuleDto 转换为尚未发送的 PendingRule
pub fn pending_rule_from_dto(dto: DesiredRuleDto) -> ServiceResult<PendingRule> {
    Ok(PendingRule::new(
        CategoryId::from(dto.category_id),
        RequiredQuantity::from_signed(dto.required_quantity)?,
    ))
}

pub fn categories_from_dtos(dtos: Vec<CategoryDto>) -> ServiceResult<Vec<Category>> {
    dtos.into_iter().map(category_from_dto).collect()
}

pub fn products_from_dtos(dtos: Vec<ProductDto>) -> ServiceResult<Vec<Product>> {
    dtos.into_iter().map(product_from_dto).collect()
}

pub fn composition_from_dtos(dtos: Vec<CompositionEntryDto>) -> ServiceResult<Vec<CompositionEntry>> {
    dtos.into_iter().map(composition_entry_from_dto).collect()
}

pub fn pending_rules_from_dtos(dtos: Vec<DesiredRuleDto>) -> ServiceResult<Vec<PendingRule>> {
    dtos.into_iter().map(pending_rule_from_dto).collect()
}
