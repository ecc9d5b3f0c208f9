//! 渲染器模块
//!
//! 与图形 API 无关的渲染数据：根签名布局、描述符堆布局、Fence 值跟踪、
//! 资源尺寸与对齐、纹理数据、着色器源码、MVP 矩阵以及计算派发尺寸。
//!
//! 这些模块不依赖 Direct3D 12，可以在任何平台上编译和测试；
//! `gfx::dx12` 把它们转换为实际的 API 调用。

pub mod binding;
pub mod descriptor;
pub mod dispatch;
pub mod resource;
pub mod scene;
pub mod shader;
pub mod sync;
pub mod texture;

pub use binding::{MvpBinding, RootSignatureLayout};
pub use scene::FrameClock;
pub use shader::{ShaderProgram, ShaderStage};
pub use texture::TextureData;
