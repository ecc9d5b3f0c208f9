//! 图形后端模块
//!
//! 只有 Direct3D 12 一个后端，仅在 Windows 上编译。
//! 与图形 API 无关的数据（根签名布局、描述符布局、Fence 值等）在 `renderer` 模块中。

#[cfg(target_os = "windows")]
pub mod dx12;

#[cfg(target_os = "windows")]
pub use dx12::Dx12Context;
