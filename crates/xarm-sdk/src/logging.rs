//! 日志初始化
//!
//! 安装 `tracing-subscriber` 的 fmt 输出，过滤规则取自 `RUST_LOG`，
//! 未设置时为 `info`。`log` 记录经 `tracing-log` 转发。

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// 默认过滤规则
pub const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("Global subscriber already set: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("Failed to install log bridge: {0}")]
    LogBridge(#[from] tracing_log::log::SetLoggerError),
}

/// 初始化日志，重复调用时忽略
pub fn init() {
    let _ = try_init();
}

/// 初始化日志（`RUST_LOG` 优先，否则 [`DEFAULT_FILTER`]）
pub fn try_init() -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))?;
    install(filter)
}

/// 使用指定过滤规则初始化日志，忽略 `RUST_LOG`
///
/// ```no_run
/// xarm_sdk::logging::try_init_with_filter("xarm_driver=debug,info").unwrap();
/// ```
pub fn try_init_with_filter(directives: &str) -> Result<(), LoggingError> {
    install(EnvFilter::try_new(directives)?)
}

fn install(filter: EnvFilter) -> Result<(), LoggingError> {
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_once() {
        assert!(matches!(
            try_init_with_filter("xarm_driver=loud"),
            Err(LoggingError::Filter(_))
        ));
        assert!(try_init_with_filter("debug").is_ok());
        assert!(matches!(try_init(), Err(LoggingError::Subscriber(_))));
        // 已初始化后静默忽略
        init();
    }
}
