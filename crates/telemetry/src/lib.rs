//! telemetry - 日志初始化

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// 人类可读（开发环境）
    Pretty,
    /// JSON（生产环境）
    Json,
}

impl LogFormat {
    pub fn for_environment(app_env: &str) -> Self {
        if app_env == "production" {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// 构建过滤器：优先使用 `RUST_LOG`，否则回退到配置的级别
pub fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
}

/// 初始化 tracing
///
/// 日志写到 stderr，stdout 留给命令输出。重复初始化时静默忽略。
pub fn init_tracing(log_level: &str, format: LogFormat) {
    let registry = tracing_subscriber::registry().with(env_filter(log_level));

    let result = match format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "tracing subscriber already installed");
    }
}
