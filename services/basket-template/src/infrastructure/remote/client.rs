//! 目录 API HTTP 客户端

use std::fmt;
use std::time::Duration;

use common::{RetryPolicy, is_transient_error, retry_if};
use config::CatalogApiConfig;
use errors::{AppError, AppResult};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

/// 目录 API 客户端
///
/// 只有幂等的 GET 会按重试策略重试；创建、更新、删除只发送一次，
/// 失败直接交给调用方处理。
#[derive(Clone)]
pub struct CatalogApiClient {
    http: reqwest::Client,
    base_url: Url,
    api_token: Option<Secret<String>>,
    retry: RetryPolicy,
}

impl CatalogApiClient {
    pub fn new(config: &CatalogApiConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: normalize_base_url(&config.base_url)?,
            api_token: config.api_token.clone(),
            retry: config.retry.clone(),
        })
    }

    /// GET 并解码 JSON，瞬时错误按策略重试
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let url = self.endpoint(path)?;
        let operation = format!("GET {path}");

        let response = retry_if(
            &self.retry,
            &operation,
            || self.send(self.http.request(Method::GET, url.clone())),
            is_retryable,
        )
        .await?;
        decode_json(response).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let response = self
            .send(self.http.request(Method::POST, url).json(body))
            .await?;
        decode_json(response).await
    }

    pub async fn put_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> AppResult<()> {
        let url = self.endpoint(path)?;
        self.send(self.http.request(Method::PUT, url).json(body))
            .await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> AppResult<()> {
        let url = self.endpoint(path)?;
        self.send(self.http.request(Method::DELETE, url)).await?;
        Ok(())
    }

    fn endpoint(&self, path: &str) -> AppResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| AppError::internal(format!("invalid catalog API path {path}: {e}")))
    }

    async fn send(&self, request: RequestBuilder) -> AppResult<Response> {
        let request = match &self.api_token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        };

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "Catalog API responded");

        if status.is_success() {
            return Ok(response);
        }
        let body = response_body(status, response.text().await);
        Err(error_for_status(status, body))
    }
}

/// 统一以 `/` 结尾，保证 `join` 追加而不是替换最后一段路径
fn normalize_base_url(base_url: &str) -> AppResult<Url> {
    let mut raw = base_url.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    Url::parse(&raw)
        .map_err(|e| AppError::validation(format!("invalid catalog API base URL {base_url}: {e}")))
}

fn is_retryable(error: &AppError) -> bool {
    matches!(error, AppError::ExternalService(msg) if is_transient_error(msg))
}

/// 错误响应体读取失败时记录原因并返回空串，由状态码的标准原因短语代替
fn response_body<E: fmt::Display>(status: StatusCode, body: Result<String, E>) -> String {
    body.unwrap_or_else(|e| {
        debug!(status = status.as_u16(), error = %e, "Failed to read error response body");
        String::new()
    })
}

/// HTTP 状态码到应用错误；服务端返回的消息原样保留
fn error_for_status(status: StatusCode, body: String) -> AppError {
    let message = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body
    };

    match status {
        StatusCode::NOT_FOUND => AppError::NotFound(message),
        StatusCode::CONFLICT => AppError::Conflict(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => AppError::Validation(message),
        _ => AppError::ExternalService(format!("{status}: {message}")),
    }
}

/// 传输层错误带上完整的错误链，使底层原因（如 connection refused）可被识别
fn transport_error(error: reqwest::Error) -> AppError {
    let mut message = if error.is_timeout() {
        format!("request timed out: {error}")
    } else {
        error.to_string()
    };

    let mut source = std::error::Error::source(&error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    AppError::ExternalService(message)
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> AppResult<T> {
    let bytes = response
        .bytes()
        .await
        .map_err(transport_error)?;
    serde_json::from_slice(&bytes).map_err(AppError::from)
}
