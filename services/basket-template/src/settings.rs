//! 运行时配置装配

use config::{AppConfig, CategoryMatching};
use errors::{AppError, AppResult};
use telemetry::LogFormat;
use tracing::info;

use crate::domain::services::{CompositionValidator, MatchMode};

impl From<CategoryMatching> for MatchMode {
    fn from(matching: CategoryMatching) -> Self {
        match matching {
            CategoryMatching::Strict => MatchMode::Strict,
            CategoryMatching::MinimumOnly => MatchMode::MinimumOnly,
        }
    }
}

/// 加载配置并初始化日志
pub fn init_runtime(config_dir: &str) -> AppResult<AppConfig> {
    let config = AppConfig::load(config_dir).map_err(|e| AppError::internal(e.to_string()))?;

    telemetry::init_tracing(
        &config.telemetry.log_level,
        LogFormat::for_environment(&config.app_env),
    );
    info!(
        app = %config.app_name,
        env = %config.app_env,
        catalog_api = %config.catalog_api.base_url,
        "Configuration loaded"
    );
    Ok(config)
}

/// 配置的匹配模式，命令行指定时优先
pub fn validator_for(config: &AppConfig, override_mode: Option<MatchMode>) -> CompositionValidator {
    CompositionValidator::new(override_mode.unwrap_or_else(|| config.validation.match_mode.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_matching_maps_to_match_mode() {
        assert_eq!(MatchMode::from(CategoryMatching::Strict), MatchMode::Strict);
        assert_eq!(MatchMode::from(CategoryMatching::default()), MatchMode::MinimumOnly);
    }
}
