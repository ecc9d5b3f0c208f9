//! 错误处理模块
//!
//! 定义了示例程序使用的统一错误类型。
//!
//! Direct3D 12 调用失败时不做任何恢复：错误沿 `?` 一路返回到入口点，
//! 由入口点记录日志后退出进程。

use std::fmt;
use std::path::PathBuf;

/// 统一的 Result 类型
pub type Result<T> = std::result::Result<T, DemoError>;

/// 示例程序的错误类型
#[derive(Debug)]
pub enum DemoError {
    /// 配置错误
    Config(ConfigError),

    /// 图形 API 错误
    Graphics(GraphicsError),

    /// 资源文件（纹理、着色器）错误
    Asset(AssetError),

    /// IO 错误
    Io(std::io::Error),

    /// 初始化错误
    Initialization(String),

    /// 运行时错误
    Runtime(String),
}

/// 配置相关的错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置文件未找到
    FileNotFound(String),

    /// 配置文件解析失败
    ParseError(String),

    /// 配置值无效
    InvalidValue { field: String, reason: String },

    /// 命令行参数无效
    InvalidArgument { arg: String, reason: String },
}

/// 图形 API 相关的错误
#[derive(Debug)]
pub enum GraphicsError {
    /// 没有可用的硬件适配器
    NoAdapter,

    /// 设备创建失败
    DeviceCreation(String),

    /// 交换链错误
    SwapchainError(String),

    /// 着色器编译失败（包含编译器输出）
    ShaderCompilation { entry: String, message: String },

    /// 根签名序列化或创建失败
    RootSignature(String),

    /// 管线状态对象创建失败
    Pipeline(String),

    /// 资源创建失败
    ResourceCreation(String),

    /// 命令执行失败
    CommandExecution(String),

    /// 未附加上下文的 HRESULT 失败
    Hresult { code: i32, message: String },
}

/// 资源文件相关的错误
#[derive(Debug)]
pub enum AssetError {
    /// 文件不存在
    FileNotFound(PathBuf),

    /// 图像解码失败
    ImageDecode { path: PathBuf, reason: String },

    /// 数据无效
    InvalidData(String),
}

impl fmt::Display for DemoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemoError::Config(e) => write!(f, "Configuration error: {}", e),
            DemoError::Graphics(e) => write!(f, "Graphics error: {}", e),
            DemoError::Asset(e) => write!(f, "Asset error: {}", e),
            DemoError::Io(e) => write!(f, "IO error: {}", e),
            DemoError::Initialization(msg) => write!(f, "Initialization error: {}", msg),
            DemoError::Runtime(msg) => write!(f, "Runtime error: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {}", path),
            ConfigError::ParseError(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
            ConfigError::InvalidArgument { arg, reason } => {
                write!(f, "Invalid argument '{}': {}", arg, reason)
            }
        }
    }
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphicsError::NoAdapter => write!(f, "No suitable Direct3D 12 adapter found"),
            GraphicsError::DeviceCreation(msg) => write!(f, "Device creation failed: {}", msg),
            GraphicsError::SwapchainError(msg) => write!(f, "Swapchain error: {}", msg),
            GraphicsError::ShaderCompilation { entry, message } => {
                write!(f, "Shader compilation failed ({}): {}", entry, message)
            }
            GraphicsError::RootSignature(msg) => write!(f, "Root signature error: {}", msg),
            GraphicsError::Pipeline(msg) => write!(f, "Pipeline state creation failed: {}", msg),
            GraphicsError::ResourceCreation(msg) => write!(f, "Resource creation failed: {}", msg),
            GraphicsError::CommandExecution(msg) => write!(f, "Command execution failed: {}", msg),
            GraphicsError::Hresult { code, message } => {
                write!(f, "HRESULT failed: 0x{:08X} ({})", *code as u32, message)
            }
        }
    }
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::FileNotFound(path) => write!(f, "Asset not found: {}", path.display()),
            AssetError::ImageDecode { path, reason } => {
                write!(f, "Failed to decode image {}: {}", path.display(), reason)
            }
            AssetError::InvalidData(msg) => write!(f, "Invalid asset data: {}", msg),
        }
    }
}

impl std::error::Error for DemoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DemoError::Io(e) => Some(e),
            DemoError::Config(e) => Some(e),
            DemoError::Graphics(e) => Some(e),
            DemoError::Asset(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for GraphicsError {}
impl std::error::Error for AssetError {}

impl From<std::io::Error> for DemoError {
    fn from(err: std::io::Error) -> Self {
        DemoError::Io(err)
    }
}

impl From<ConfigError> for DemoError {
    fn from(err: ConfigError) -> Self {
        DemoError::Config(err)
    }
}

impl From<GraphicsError> for DemoError {
    fn from(err: GraphicsError) -> Self {
        DemoError::Graphics(err)
    }
}

impl From<AssetError> for DemoError {
    fn from(err: AssetError) -> Self {
        DemoError::Asset(err)
    }
}

#[cfg(target_os = "windows")]
impl From<windows::core::Error> for DemoError {
    fn from(err: windows::core::Error) -> Self {
        DemoError::Graphics(GraphicsError::Hresult {
            code: err.code().0,
            message: err.message().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hresult_display_is_hex() {
        let err = GraphicsError::Hresult {
            code: 0x887A0005u32 as i32,
            message: "device removed".to_string(),
        };
        assert_eq!(err.to_string(), "HRESULT failed: 0x887A0005 (device removed)");
    }

    #[test]
    fn test_error_conversion_and_source() {
        let err: DemoError = ConfigError::InvalidValue {
            field: "window.width".to_string(),
            reason: "must be greater than 0".to_string(),
        }
        .into();
        assert!(matches!(err, DemoError::Config(_)));
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().starts_with("Configuration error"));
    }

    #[test]
    fn test_shader_error_names_entry_point() {
        let err = GraphicsError::ShaderCompilation {
            entry: "CSMain".to_string(),
            message: "undeclared identifier 'time'".to_string(),
        };
        assert!(err.to_string().contains("CSMain"));
    }
}
