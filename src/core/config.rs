//! 配置管理模块
//!
//! 从 `config.toml` 加载示例程序的配置，缺省项使用默认值，
//! 之后可以由命令行参数覆盖。
//!
//! # 配置文件格式 (config.toml)
//!
//! ```toml
//! demo = "descriptor-table"   # descriptor-table / mvp-matrix / uav-compute
//!
//! [window]
//! width = 800
//! height = 600
//!
//! [graphics]
//! vsync = true
//! frame_count = 2
//!
//! [mvp]
//! binding = "root-constants"  # root-constants / root-cbv / descriptor-table
//! ```

use serde::de::{value::StrDeserializer, IntoDeserializer};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::{ConfigError, Result};

/// 示例程序配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// 要运行的示例
    #[serde(default)]
    pub demo: DemoKind,

    /// 窗口配置
    #[serde(default)]
    pub window: WindowConfig,

    /// 图形配置
    #[serde(default)]
    pub graphics: GraphicsConfig,

    /// 摄像机配置
    #[serde(default)]
    pub camera: CameraConfig,

    /// 资源路径
    #[serde(default)]
    pub assets: AssetsConfig,

    /// MVP 示例的绑定方式
    #[serde(default)]
    pub mvp: MvpConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 示例类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DemoKind {
    /// 描述符表 + 纹理立方体
    #[default]
    DescriptorTable,
    /// 三种 MVP 绑定方式
    MvpMatrix,
    /// 计算着色器写入 UAV
    UavCompute,
}

/// 窗口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// 窗口宽度
    #[serde(default = "default_width")]
    pub width: u32,

    /// 窗口高度
    #[serde(default = "default_height")]
    pub height: u32,

    /// 窗口标题，为空时使用示例名称
    #[serde(default)]
    pub title: Option<String>,

    /// 是否可调整大小
    #[serde(default)]
    pub resizable: bool,
}

/// 图形配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphicsConfig {
    /// 垂直同步
    #[serde(default = "default_true")]
    pub vsync: bool,

    /// 启用 D3D12 调试层
    #[serde(default = "default_debug_layer")]
    pub debug_layer: bool,

    /// 优先选择高性能适配器
    #[serde(default = "default_true")]
    pub high_performance_adapter: bool,

    /// 交换链缓冲数量
    #[serde(default = "default_frame_count")]
    pub frame_count: u32,

    /// 清屏颜色 (RGBA)
    #[serde(default = "default_clear_color")]
    pub clear_color: [f32; 4],
}

/// 摄像机配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_eye")]
    pub eye: [f32; 3],

    #[serde(default)]
    pub target: [f32; 3],

    #[serde(default = "default_up")]
    pub up: [f32; 3],

    /// 垂直视场角（度）
    #[serde(default = "default_fov")]
    pub fov_degrees: f32,

    #[serde(default = "default_near")]
    pub near: f32,

    #[serde(default = "default_far")]
    pub far: f32,
}

/// 资源路径配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// 着色器目录，为空时使用编译进程序的着色器
    #[serde(default)]
    pub shader_dir: Option<String>,

    /// 描述符表示例使用的纹理
    #[serde(default = "default_texture")]
    pub texture: String,
}

/// MVP 示例配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MvpConfig {
    /// 顶点着色器读取哪一份 MVP
    #[serde(default)]
    pub binding: MvpBindingKind,
}

/// MVP 矩阵的绑定方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MvpBindingKind {
    /// 根常量
    RootConstants,
    /// 根描述符（CBV）
    RootCbv,
    /// 描述符表
    #[default]
    DescriptorTable,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// 是否输出到文件
    #[serde(default)]
    pub file_output: bool,

    /// 日志文件路径
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

// 默认值函数
fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }
fn default_true() -> bool { true }
fn default_debug_layer() -> bool { cfg!(debug_assertions) }
fn default_frame_count() -> u32 { 2 }
fn default_clear_color() -> [f32; 4] { [0.1, 0.1, 0.1, 1.0] }
fn default_eye() -> [f32; 3] { [0.0, 0.0, -5.0] }
fn default_up() -> [f32; 3] { [0.0, 1.0, 0.0] }
fn default_fov() -> f32 { 90.0 }
fn default_near() -> f32 { 0.1 }
fn default_far() -> f32 { 100.0 }
fn default_texture() -> String { "block.png".to_string() }
fn default_log_level() -> LogLevel { LogLevel::Info }
fn default_log_file() -> String { "d3d12_demos.log".to_string() }

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            title: None,
            resizable: false,
        }
    }
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            vsync: true,
            debug_layer: default_debug_layer(),
            high_performance_adapter: true,
            frame_count: default_frame_count(),
            clear_color: default_clear_color(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: default_eye(),
            target: [0.0; 3],
            up: default_up(),
            fov_degrees: default_fov(),
            near: default_near(),
            far: default_far(),
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            shader_dir: None,
            texture: default_texture(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_output: false,
            log_file: default_log_file(),
        }
    }
}

impl Config {
    /// 从配置文件加载
    ///
    /// # 参数
    ///
    /// * `path` - 配置文件路径
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound(path_str.clone()).into(),
            _ => crate::core::error::DemoError::Io(e),
        })?;

        Self::from_toml(&contents)
    }

    /// 从 TOML 字符串解析
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()).into())
    }

    /// 从配置文件加载，如果文件不存在则使用默认配置
    ///
    /// 只有文件不存在时回退；文件存在但读取或解析失败时返回错误，
    /// 此时日志系统通常尚未初始化。
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        match Self::from_file(&path) {
            Err(crate::core::error::DemoError::Config(ConfigError::FileNotFound(_))) => {
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// 从命令行参数覆盖配置
    ///
    /// 支持的参数：
    /// - `--demo <descriptor-table|mvp-matrix|uav-compute>`
    /// - `--width <value>` / `--height <value>`
    /// - `--binding <root-constants|root-cbv|descriptor-table>`
    /// - `--no-vsync`
    /// - `--debug-layer`
    /// - `--texture <path>`
    /// - `--shader-dir <path>`
    ///
    /// 未知参数被忽略；已知参数的值无效时返回错误。
    pub fn apply_args<I>(&mut self, args: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

        if args.iter().any(|a| a == "--no-vsync") {
            self.graphics.vsync = false;
        }

        if args.iter().any(|a| a == "--debug-layer") {
            self.graphics.debug_layer = true;
        }

        if let Some(value) = arg_value(&args, "--demo")? {
            self.demo = parse_kebab(value, "--demo")?;
        }

        if let Some(value) = arg_value(&args, "--binding")? {
            self.mvp.binding = parse_kebab(value, "--binding")?;
        }

        if let Some(value) = arg_value(&args, "--width")? {
            self.window.width = parse_number(value, "--width")?;
        }

        if let Some(value) = arg_value(&args, "--height")? {
            self.window.height = parse_number(value, "--height")?;
        }

        if let Some(value) = arg_value(&args, "--texture")? {
            self.assets.texture = value.to_string();
        }

        if let Some(value) = arg_value(&args, "--shader-dir")? {
            self.assets.shader_dir = Some(value.to_string());
        }

        Ok(())
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(invalid("window.width/height", "Window dimensions must be greater than 0"));
        }

        // DXGI 翻转模型要求 2..=16 个缓冲
        if !(2..=16).contains(&self.graphics.frame_count) {
            return Err(invalid("graphics.frame_count", "Frame count must be between 2 and 16"));
        }

        let camera = &self.camera;
        if !(camera.near > 0.0 && camera.near < camera.far) {
            return Err(invalid("camera.near/far", "Require 0 < near < far"));
        }

        if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
            return Err(invalid("camera.fov_degrees", "Field of view must be in (0, 180)"));
        }

        if self.assets.texture.trim().is_empty() {
            return Err(invalid("assets.texture", "Texture path must not be empty"));
        }

        Ok(())
    }

    /// 窗口标题
    pub fn window_title(&self) -> String {
        self.window
            .title
            .clone()
            .unwrap_or_else(|| format!("D3D12 - {}", self.demo.name()))
    }
}

impl DemoKind {
    /// 获取示例名称
    pub fn name(&self) -> &'static str {
        match self {
            DemoKind::DescriptorTable => "Descriptor Table",
            DemoKind::MvpMatrix => "MVP Matrix",
            DemoKind::UavCompute => "UAV Compute Shader",
        }
    }

    /// 是否需要深度缓冲
    pub fn uses_depth(&self) -> bool {
        !matches!(self, DemoKind::UavCompute)
    }
}

fn invalid(field: &str, reason: &str) -> crate::core::error::DemoError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Result<Option<&'a str>> {
    match args.iter().position(|a| a == flag) {
        None => Ok(None),
        Some(idx) => match args.get(idx + 1) {
            Some(value) if !value.starts_with("--") => Ok(Some(value.as_str())),
            _ => Err(ConfigError::InvalidArgument {
                arg: flag.to_string(),
                reason: "missing value".to_string(),
            }
            .into()),
        },
    }
}

fn parse_number(value: &str, flag: &str) -> Result<u32> {
    value.parse().map_err(|_| {
        ConfigError::InvalidArgument {
            arg: flag.to_string(),
            reason: format!("'{}' is not a positive integer", value),
        }
        .into()
    })
}

// 复用 serde 的 kebab-case 映射解析枚举值
fn parse_kebab<T: serde::de::DeserializeOwned>(value: &str, flag: &str) -> Result<T> {
    let de: StrDeserializer<'_, serde::de::value::Error> = value.into_deserializer();
    T::deserialize(de).map_err(|_| {
        ConfigError::InvalidArgument {
            arg: flag.to_string(),
            reason: format!("unknown value '{}'", value),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.graphics.frame_count, 2);
        assert_eq!(config.graphics.clear_color, [0.1, 0.1, 0.1, 1.0]);
        assert_eq!(config.demo, DemoKind::DescriptorTable);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml(
            r#"
            demo = "uav-compute"

            [window]
            width = 1024

            [mvp]
            binding = "root-cbv"
            "#,
        )
        .unwrap();

        assert_eq!(config.demo, DemoKind::UavCompute);
        assert_eq!(config.window.width, 1024);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.mvp.binding, MvpBindingKind::RootCbv);
        assert_eq!(config.camera.eye, [0.0, 0.0, -5.0]);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let err = Config::from_toml("demo = \"teapot\"").unwrap_err();
        assert!(matches!(
            err,
            crate::core::error::DemoError::Config(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_apply_args() {
        let mut config = Config::default();
        config
            .apply_args([
                "prog", "--demo", "mvp-matrix", "--binding", "root-constants",
                "--width", "640", "--height", "480", "--no-vsync",
            ])
            .unwrap();

        assert_eq!(config.demo, DemoKind::MvpMatrix);
        assert_eq!(config.mvp.binding, MvpBindingKind::RootConstants);
        assert_eq!(config.window.width, 640);
        assert_eq!(config.window.height, 480);
        assert!(!config.graphics.vsync);
    }

    #[test]
    fn test_apply_args_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.apply_args(["--width", "wide"]).is_err());
        assert!(config.apply_args(["--demo", "teapot"]).is_err());
        assert!(config.apply_args(["--texture"]).is_err());
        assert!(config.apply_args(["--height", "--no-vsync"]).is_err());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.window.width = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.graphics.frame_count = 1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.camera.near = 200.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.camera.fov_degrees = 180.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.assets.texture = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let path = std::env::temp_dir().join(format!("d3d12_demos_cfg_{}.toml", std::process::id()));
        let mut config = Config::default();
        config.demo = DemoKind::MvpMatrix;
        config.window.title = Some("custom".to_string());
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.demo, DemoKind::MvpMatrix);
        assert_eq!(loaded.window_title(), "custom");
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = Config::from_file_or_default("definitely/not/here.toml").unwrap();
        assert_eq!(config.window.width, 800);
        assert_eq!(Config::default().window_title(), "D3D12 - Descriptor Table");
    }

    #[test]
    fn test_malformed_file_is_reported() {
        let path = std::env::temp_dir()
            .join(format!("d3d12_demos_bad_cfg_{}.toml", std::process::id()));
        std::fs::write(&path, "[window]\nwidth = \"huge\"\n").unwrap();

        let result = Config::from_file_or_default(&path);
        std::fs::remove_file(&path).ok();

        assert!(matches!(
            result,
            Err(crate::core::error::DemoError::Config(ConfigError::ParseError(_)))
        ));
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let config = Config::from_toml(include_str!("../../config.toml")).unwrap();
        let defaults = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.demo, defaults.demo);
        assert_eq!(config.mvp.binding, defaults.mvp.binding);
        assert_eq!(config.window.width, defaults.window.width);
        assert_eq!(config.camera.eye, defaults.camera.eye);
        assert_eq!(config.assets.texture, defaults.assets.texture);
    }
}
