//! 核心功能模块
//!
//! 与图形 API 无关的基础功能：配置管理、错误处理、日志系统和数学库。
//!
//! # 模块组织
//!
//! - `config`：配置管理，支持从配置文件和命令行加载设置
//! - `error`：错误处理，定义统一的错误类型
//! - `log`：日志系统，提供结构化的日志记录功能
//! - `math`：左手坐标系变换

pub mod config;
pub mod error;
pub mod log;
pub mod math;

// 重新导出常用类型，方便使用
pub use config::{Config, DemoKind, MvpBindingKind};
pub use error::{DemoError, Result};
