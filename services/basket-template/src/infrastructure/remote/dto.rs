//! API 载荷
//!
//! 后台不同接口对同一字段使用不同的命名风格（camelCase、snake_case、PascalCase），
//! 这里用别名一次性收敛。所有字段都是可选的，缺失与否由转换器判定。

use serde::{Deserialize, Serialize};

/// 列表响应：裸数组或 `{ "data": [...] }` 包装
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListEnvelope<T> {
    Bare(Vec<T>),
    Wrapped {
        #[serde(alias = "items", alias = "results", alias = "Data")]
        data: Vec<T>,
    },
}

impl<T> ListEnvelope<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Bare(items) | Self::Wrapped { data: items } => items,
        }
    }
}

/// 单个对象响应：裸对象或 `{ "data": {...} }` 包装
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ItemEnvelope<T> {
    Wrapped {
        #[serde(alias = "Data")]
        data: T,
    },
    Bare(T),
}

impl<T> ItemEnvelope<T> {
    pub fn into_item(self) -> T {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryDto {
    #[serde(default, alias = "categoryId", alias = "CategoryId", alias = "Id")]
    pub id: Option<i64>,
    #[serde(default, alias = "Name", alias = "categoryName", alias = "CategoryName")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductDto {
    #[serde(default, alias = "productId", alias = "ProductId", alias = "Id")]
    pub id: Option<i64>,
    #[serde(default, alias = "Name", alias = "productName", alias = "ProductName")]
    pub name: Option<String>,
    #[serde(default, alias = "categoryId", alias = "CategoryId")]
    pub category_id: Option<i64>,
    #[serde(default, alias = "Category")]
    pub category: Option<CategoryDto>,
    #[serde(
        default,
        alias = "unitWeight",
        alias = "UnitWeight",
        alias = "weight",
        alias = "Weight"
    )]
    pub unit_weight: Option<f64>,
    #[serde(default, alias = "Price")]
    pub price: Option<f64>,
    #[serde(default, alias = "Currency")]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuotaRuleDto {
    #[serde(default, alias = "ruleId", alias = "RuleId", alias = "Id")]
    pub id: Option<i64>,
    #[serde(
        default,
        alias = "templateId",
        alias = "TemplateId",
        alias = "basketTemplateId"
    )]
    pub template_id: Option<i64>,
    #[serde(default, alias = "categoryId", alias = "CategoryId")]
    pub category_id: Option<i64>,
    #[serde(default, alias = "Category")]
    pub category: Option<CategoryDto>,
    #[serde(
        default,
        alias = "requiredQuantity",
        alias = "RequiredQuantity",
        alias = "quantity",
        alias = "Quantity"
    )]
    pub required_quantity: Option<i64>,
    #[serde(default, alias = "categoryName", alias = "CategoryName")]
    pub category_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BasketTemplateDto {
    #[serde(default, alias = "templateId", alias = "TemplateId", alias = "Id")]
    pub id: Option<i64>,
    #[serde(default, alias = "Name", alias = "templateName", alias = "TemplateName")]
    pub name: Option<String>,
    #[serde(
        default,
        alias = "maxTotalWeight",
        alias = "MaxTotalWeight",
        alias = "maxWeight",
        alias = "MaxWeight"
    )]
    pub max_total_weight: Option<f64>,
    #[serde(default, alias = "Rules", alias = "quotaRules", alias = "QuotaRules")]
    pub rules: Option<Vec<QuotaRuleDto>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompositionEntryDto {
    #[serde(alias = "productId", alias = "ProductId")]
    pub product_id: i64,
    #[serde(alias = "Quantity", alias = "qty")]
    pub quantity: i64,
}

/// 规则同步文件中的一条期望规则
#[derive(Debug, Clone, Deserialize)]
pub struct DesiredRuleDto {
    #[serde(alias = "categoryId", alias = "CategoryId")]
    pub category_id: i64,
    #[serde(
        alias = "requiredQuantity",
        alias = "RequiredQuantity",
        alias = "quantity",
        alias = "Quantity"
    )]
    pub required_quantity: i64,
}

/// 创建规则接口的响应：裸 ID、规则对象或包装对象
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CreatedRuleDto {
    Id(i64),
    Rule(ItemEnvelope<QuotaRuleDto>),
}

/// 创建 / 更新规则的请求体
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleWriteRequest {
    pub category_id: i64,
    pub required_quantity: u32,
}

/// CLI 本地校验用的夹具文件
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationFixtureDto {
    #[serde(alias = "Template")]
    pub template: BasketTemplateDto,
    #[serde(default, alias = "Categories")]
    pub categories: Vec<CategoryDto>,
    #[serde(default, alias = "Products")]
    pub products: Vec<ProductDto>,
    #[serde(default, alias = "Composition", alias = "items")]
    pub composition: Vec<CompositionEntryDto>,
}
