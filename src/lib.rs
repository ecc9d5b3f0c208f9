//! d3d12_demos - Direct3D 12 示例程序
//!
//! 三个独立的示例，各自演示一种资源绑定方式：
//!
//! - `descriptor_table`：常量缓冲区与纹理通过同一个描述符表绑定
//! - `mvp_matrix`：MVP 矩阵的三种绑定方式（根常量、根 CBV、描述符表）
//! - `uav_compute`：计算着色器写入 UAV 纹理后拷贝到后缓冲
//!
//! # 模块结构
//!
//! - `core`: 配置、错误处理、日志、数学
//! - `geometry`: 顶点格式与立方体网格
//! - `renderer`: 与图形 API 无关的渲染数据（根签名布局、描述符布局、同步、纹理）
//! - `gfx`: Direct3D 12 后端（仅 Windows）
//! - `demos`: 三个示例（仅 Windows）
//! - `app`: 启动流程与事件循环
//!
//! # 使用示例
//!
//! ```
//! use d3d12_demos::renderer::binding::{MvpBinding, RootSignatureLayout};
//!
//! let layout = RootSignatureLayout::mvp_matrix();
//! assert!(layout.validate().is_ok());
//! assert_eq!(MvpBinding::ROOT_CBV.root_index, 1);
//! ```

pub mod app;
pub mod core;
#[cfg(target_os = "windows")]
pub mod demos;
pub mod geometry;
pub mod gfx;
pub mod renderer;
