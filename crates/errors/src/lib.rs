//! errors - 协作方边缘的统一错误
//!
//! 基于 RFC 7807 Problem Details 规范

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 应用错误类型
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn external_service(msg: impl Into<String>) -> Self {
        Self::ExternalService(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// 转换为 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::Conflict(_) => 409,
            Self::ExternalService(_) => 502,
            Self::Decode(_) => 502,
            Self::Internal(_) => 500,
        }
    }

    /// 转换为 Problem Details
    pub fn to_problem_details(&self) -> ProblemDetails {
        ProblemDetails {
            r#type: format!("https://giftbox.example/problems/{}", self.problem_slug()),
            title: self.problem_title().to_string(),
            status: self.status_code(),
            detail: self.to_string(),
            instance: None,
        }
    }

    fn problem_slug(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not-found",
            Self::Validation(_) => "validation",
            Self::Conflict(_) => "conflict",
            Self::ExternalService(_) => "external-service",
            Self::Decode(_) => "decode",
            Self::Internal(_) => "internal",
        }
    }

    fn problem_title(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "Resource Not Found",
            Self::Validation(_) => "Validation Error",
            Self::Conflict(_) => "Conflict",
            Self::ExternalService(_) => "External Service Error",
            Self::Decode(_) => "Malformed Upstream Payload",
            Self::Internal(_) => "Internal Error",
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// RFC 7807 Problem Details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    pub r#type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl ProblemDetails {
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }
}

/// Result 类型别名
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::not_found("rule 3").status_code(), 404);
        assert_eq!(AppError::conflict("category 1").status_code(), 409);
        assert_eq!(AppError::external_service("down").status_code(), 502);
    }

    #[test]
    fn test_problem_details() {
        let problem = AppError::conflict("category 7 already has a rule")
            .to_problem_details()
            .with_instance("/templates/4/rules");

        assert_eq!(problem.status, 409);
        assert_eq!(problem.title, "Conflict");
        assert!(problem.r#type.ends_with("/conflict"));
        assert_eq!(problem.detail, "Conflict: category 7 already has a rule");

        let json = serde_json::to_value(&problem).unwrap();
        assert_eq!(json["instance"], "/templates/4/rules");
    }

    #[test]
    fn test_instance_omitted_when_absent() {
        let json = serde_json::to_value(AppError::internal("boom").to_problem_details()).unwrap();
        assert!(json.get("instance").is_none());
    }

    #[test]
    fn test_json_error_maps_to_decode() {
        let err = serde_json::from_str::<u32>("\"x\"").unwrap_err();
        assert!(matches!(AppError::from(err), AppError::Decode(_)));
    }
}
