//! config - 配置加载库

use common::RetryPolicy;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use secrecy::Secret;
use serde::Deserialize;
use thiserror::Error;

/// 环境变量前缀，嵌套字段用 `__` 分隔，如 `GIFTBOX_CATALOG_API__BASE_URL`
pub const ENV_PREFIX: &str = "GIFTBOX_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] figment::Error),
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// 组合校验时对"模板未列出的分类"的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryMatching {
    /// 模板规则是穷举的：未列出分类或未分类商品都会使组合无效
    Strict,
    /// 模板规则只是最低要求：多出的分类不计入判定
    #[default]
    MinimumOnly,
}

/// 校验配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValidationConfig {
    #[serde(default)]
    pub match_mode: CategoryMatching,
}

/// 商品目录 / 规则仓储 API 配置
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogApiConfig {
    pub base_url: String,
    pub api_token: Option<Secret<String>>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_timeout_secs() -> u64 {
    10
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    #[serde(default = "default_app_env")]
    pub app_env: String,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    pub catalog_api: CatalogApiConfig,
}

fn default_app_env() -> String {
    "development".to_string()
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 依次合并 `default.toml`、`{APP_ENV}.toml` 与 `GIFTBOX_` 前缀的环境变量，后者优先。
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| default_app_env());

        let config: Self = Figment::new()
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Ok(config)
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    /// 是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}

#[cfg(test)]
mod tests;
