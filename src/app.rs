//! 应用程序入口
//!
//! 所有二进制程序共用的启动流程：
//!
//! 1. 加载配置文件（config.toml）
//! 2. 应用命令行参数覆盖
//! 3. 验证配置
//! 4. 初始化日志系统
//! 5. 创建事件循环、DX12 上下文和示例
//! 6. 启动主循环
//!
//! # 事件处理
//!
//! - `WindowEvent::CloseRequested`：退出程序
//! - `WindowEvent::Resized`：窗口可调整大小时重建交换链和尺寸相关资源
//! - `WindowEvent::RedrawRequested`：绘制一帧
//! - `Event::AboutToWait`：请求下一次重绘

use std::path::Path;

use tracing::info;

use crate::core::error::Result;
use crate::core::{log, Config, DemoKind};

/// 配置文件路径（相对工作目录）
pub const CONFIG_FILE: &str = "config.toml";

/// 加载配置并运行示例
///
/// `forced` 为 `Some` 时忽略配置文件和 `--demo` 参数中的示例选择。
pub fn launch(forced: Option<DemoKind>) -> Result<()> {
    let config = load_config(CONFIG_FILE, forced, std::env::args().skip(1))?;

    let log_file = config
        .logging
        .file_output
        .then_some(config.logging.log_file.as_str());
    log::init_logger(config.logging.level, config.logging.file_output, log_file);

    info!(version = env!("CARGO_PKG_VERSION"), demo = config.demo.name(), "Starting");
    info!(
        width = config.window.width,
        height = config.window.height,
        vsync = config.graphics.vsync,
        debug_layer = config.graphics.debug_layer,
        "Graphics configuration"
    );

    let result = run(config);
    if let Err(e) = &result {
        tracing::error!("{}", e);
    }
    result
}

/// 配置文件 + 命令行参数 + 强制的示例类型
///
/// 配置文件不存在时使用默认配置，无法解析时返回错误。
pub fn load_config<P, I>(path: P, forced: Option<DemoKind>, args: I) -> Result<Config>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = String>,
{
    let mut config = Config::from_file_or_default(path)?;
    config.apply_args(args)?;
    if let Some(kind) = forced {
        config.demo = kind;
    }
    config.validate()?;
    Ok(config)
}

#[cfg(target_os = "windows")]
fn run(config: Config) -> Result<()> {
    use winit::event::{Event, WindowEvent};
    use winit::event_loop::{ControlFlow, EventLoop};

    use crate::core::error::DemoError;
    use crate::demos::create_demo;
    use crate::gfx::Dx12Context;
    use crate::renderer::FrameClock;

    let event_loop = EventLoop::new()
        .map_err(|e| DemoError::Initialization(format!("Failed to create event loop: {}", e)))?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut ctx = Dx12Context::new(&event_loop, &config)?;
    let mut demo = create_demo(config.demo, &mut ctx, &config)?;
    let mut clock = FrameClock::new();
    let mut failure: Option<DemoError> = None;

    info!("Entering main loop...");

    event_loop
        .run(|event, elwt| match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    info!("Close requested");
                    elwt.exit();
                }
                WindowEvent::Resized(size) if config.window.resizable => {
                    let resized = ctx
                        .resize_swap_chain(size.width, size.height)
                        .and_then(|changed| if changed { demo.resize(&mut ctx) } else { Ok(()) });
                    if let Err(e) = resized {
                        failure = Some(e);
                        elwt.exit();
                    }
                }
                WindowEvent::RedrawRequested => {
                    // 最小化时不渲染
                    let size = ctx.window().inner_size();
                    if size.width == 0 || size.height == 0 {
                        return;
                    }

                    if let Err(e) = demo.render(&mut ctx, clock.elapsed()) {
                        failure = Some(e);
                        elwt.exit();
                        return;
                    }
                    clock.tick();
                }
                _ => {}
            },
            Event::AboutToWait => ctx.window().request_redraw(),
            _ => {}
        })
        .map_err(|e| DemoError::Runtime(format!("Event loop error: {}", e)))?;

    // 示例的资源必须在 GPU 空闲后释放
    ctx.wait_for_gpu()?;
    drop(demo);

    info!(
        frames = clock.frame_count(),
        seconds = clock.elapsed(),
        gpu_waits = ctx.fence_manager().wait_count(),
        "Exiting"
    );

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(not(target_os = "windows"))]
fn run(config: Config) -> Result<()> {
    Err(crate::core::error::DemoError::Initialization(format!(
        "{} requires Direct3D 12, which is only available on Windows",
        config.demo.name()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_FILE: &str = "definitely/not/here/config.toml";

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn temp_config(tag: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir()
            .join(format!("d3d12_demos_app_{}_{}.toml", tag, std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_forced_demo_overrides_args() {
        let config = load_config(NO_FILE, Some(DemoKind::UavCompute), args(&["--demo", "mvp-matrix"])).unwrap();
        assert_eq!(config.demo, DemoKind::UavCompute);
    }

    #[test]
    fn test_args_select_demo() {
        let config = load_config(NO_FILE, None, args(&["--demo", "mvp-matrix", "--width", "640"])).unwrap();
        assert_eq!(config.demo, DemoKind::MvpMatrix);
        assert_eq!(config.window.width, 640);
    }

    #[test]
    fn test_invalid_args_rejected() {
        assert!(load_config(NO_FILE, None, args(&["--width", "0"])).is_err());
        assert!(load_config(NO_FILE, None, args(&["--demo", "teapot"])).is_err());
    }

    #[test]
    fn test_file_then_args() {
        let path = temp_config("layered", "demo = \"uav-compute\"\n[window]\nheight = 480\n");
        let config = load_config(&path, None, args(&["--width", "640"])).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.demo, DemoKind::UavCompute);
        assert_eq!(config.window.width, 640);
        assert_eq!(config.window.height, 480);
    }

    #[test]
    fn test_malformed_config_stops_startup() {
        let path = temp_config("malformed", "[window]\nwidth = \"huge\"\n");
        let result = load_config(&path, None, args(&[]));
        std::fs::remove_file(&path).ok();

        let err = result.unwrap_err();
        assert!(matches!(
            err,
            crate::core::error::DemoError::Config(crate::core::error::ConfigError::ParseError(_))
        ));
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn test_launch_requires_windows() {
        let err = run(Config::default()).unwrap_err();
        assert!(err.to_string().contains("Windows"));
    }
}
