//! DirectX 12 图形 API 实现模块
//!
//! - `context`: 设备、命令队列、交换链、Fence 等基础设施
//! - `descriptor`: 描述符堆
//! - `pipeline`: 着色器编译、根签名与 PSO
//! - `resource`: 缓冲区、纹理与资源屏障

pub mod context;
pub mod descriptor;
pub mod pipeline;
pub mod resource;

// 重新导出常用类型
pub use context::Dx12Context;
pub use descriptor::Dx12DescriptorHeap;
