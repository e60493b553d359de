//! 基于目录 API 的配额规则仓储

use async_trait::async_trait;
use errors::{AppError, AppResult};
use tracing::debug;

use crate::domain::entities::QuotaRule;
use crate::domain::repositories::QuotaRuleRepository;
use crate::domain::value_objects::{CategoryId, RequiredQuantity, RuleId, TemplateId};
use crate::error::ServiceError;

use super::client::CatalogApiClient;
use super::converters::quota_rule_from_dto;
use super::dto::{CreatedRuleDto, ListEnvelope, QuotaRuleDto, RuleWriteRequest};

/// 解码失败统一视为上游载荷不合法
pub(super) fn malformed(err: ServiceError) -> AppError {
    AppError::decode(err.to_string())
}

pub struct HttpQuotaRuleRepository {
    client: CatalogApiClient,
}

impl HttpQuotaRuleRepository {
    pub fn new(client: CatalogApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl QuotaRuleRepository for HttpQuotaRuleRepository {
    async fn create(
        &self,
        template_id: TemplateId,
        category_id: CategoryId,
        required_quantity: RequiredQuantity,
    ) -> AppResult<RuleId> {
        let request = RuleWriteRequest {
            category_id: category_id.value(),
            required_quantity: required_quantity.get(),
        };
        let created: CreatedRuleDto = self
            .client
            .post_json(&format!("templates/{template_id}/rules"), &request)
            .await?;

        let rule_id = match created {
            CreatedRuleDto::Id(id) => RuleId::from(id),
            CreatedRuleDto::Rule(envelope) => envelope
                .into_item()
                .id
                .map(RuleId::from)
                .ok_or_else(|| AppError::decode("created quota rule carries no id"))?,
        };
        debug!(template_id = %template_id, rule_id = %rule_id, "Quota rule created remotely");
        Ok(rule_id)
    }

    async fn update(
        &self,
        rule_id: RuleId,
        category_id: CategoryId,
        required_quantity: RequiredQuantity,
    ) -> AppResult<()> {
        let request = RuleWriteRequest {
            category_id: category_id.value(),
            required_quantity: required_quantity.get(),
        };
        self.client
            .put_json(&format!("rules/{rule_id}"), &request)
            .await
    }

    async fn delete(&self, rule_id: RuleId) -> AppResult<()> {
        self.client.delete(&format!("rules/{rule_id}")).await
    }

    async fn list_by_template(&self, template_id: TemplateId) -> AppResult<Vec<QuotaRule>> {
        let envelope: ListEnvelope<QuotaRuleDto> = self
            .client
            .get_json(&format!("templates/{template_id}/rules"))
            .await?;

        envelope
            .into_items()
            .into_iter()
            .map(|dto| quota_rule_from_dto(dto, template_id).map_err(malformed))
            .collect()
    }
}
