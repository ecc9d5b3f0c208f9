//! d3d12_demos
//!
//! 示例由 config.toml 中的 `demo` 或命令行参数选择。
//!
//! # 使用方法
//!
//! ```bash
//! # 使用配置文件
//! cargo run
//!
//! # 命令行覆盖
//! cargo run -- --demo mvp-matrix --binding root-constants
//! cargo run -- --demo uav-compute --width 1280 --height 720
//! ```

use anyhow::Context;

fn main() -> anyhow::Result<()> {
    d3d12_demos::app::launch(None).context("d3d12_demos failed")
}
