//! 日志系统模块
//!
//! 基于 `tracing` 提供结构化的日志记录功能。
//!
//! # 使用示例
//!
//! ```no_run
//! use d3d12_demos::core::{config::LogLevel, log};
//!
//! log::init_logger(LogLevel::Info, false, None);
//! tracing::info!(width = 800, height = 600, "Window created");
//! ```

use std::path::Path;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use tracing_appender::rolling::{RollingFileAppender, Rotation};

use super::config::LogLevel;

const DEFAULT_LOG_FILE: &str = "d3d12_demos.log";

/// 初始化日志系统
///
/// 必须在程序开始时调用一次。设置了 `RUST_LOG` 环境变量时以其为准。
///
/// # 参数
///
/// * `level` - 日志级别
/// * `file_output` - 是否同时输出到文件（按天滚动）
/// * `log_file_path` - 日志文件路径，默认为 "d3d12_demos.log"
pub fn init_logger(level: LogLevel, file_output: bool, log_file_path: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter()));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_ansi(true);

    if file_output {
        let log_path = Path::new(log_file_path.unwrap_or(DEFAULT_LOG_FILE));
        let directory = log_path.parent().unwrap_or(Path::new("."));
        let filename = log_path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or(DEFAULT_LOG_FILE);

        let file_appender = RollingFileAppender::new(Rotation::DAILY, directory, filename);

        let file_layer = fmt::layer()
            .with_target(true)
            .with_ansi(false) // 文件不需要 ANSI 颜色
            .with_writer(file_appender);

        // try_init: 重复初始化（例如测试中）时静默忽略
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .with(file_layer)
            .try_init();
    } else {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .try_init();
    }
}

impl LogLevel {
    /// `EnvFilter` 指令字符串
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// 日志级别转换
impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(Level::from(LogLevel::Info), Level::INFO);
        assert_eq!(Level::from(LogLevel::Error), Level::ERROR);
        assert_eq!(LogLevel::Warn.as_filter(), "warn");
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init_logger(LogLevel::Debug, false, None);
        init_logger(LogLevel::Info, false, None);
    }
}
