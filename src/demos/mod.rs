//! 示例程序
//!
//! 每个示例持有自己的根签名、PSO 和资源，共用 [`Dx12Context`]。
//! 录制的命令提交后都会阻塞等待 GPU 完成（每帧一次 Fence 等待）。

mod descriptor_table;
mod mvp_matrix;
mod uav_compute;

pub use descriptor_table::DescriptorTableDemo;
pub use mvp_matrix::MvpMatrixDemo;
pub use uav_compute::UavComputeDemo;

use std::borrow::Cow;
use std::path::Path;

use windows::Win32::Graphics::Direct3D::Fxc::ID3DBlob;

use crate::core::error::Result;
use crate::core::{Config, DemoKind};
use crate::gfx::dx12::pipeline::compile_shader;
use crate::gfx::Dx12Context;
use crate::renderer::shader::{ShaderProgram, ShaderStage};

/// 示例程序接口
pub trait Demo {
    /// 录制、提交并呈现一帧
    ///
    /// `elapsed` 为程序启动以来的秒数。
    fn render(&mut self, ctx: &mut Dx12Context, elapsed: f32) -> Result<()>;

    /// 交换链大小改变后重建与窗口尺寸相关的资源
    fn resize(&mut self, ctx: &mut Dx12Context) -> Result<()>;
}

/// 按配置创建示例
pub fn create_demo(kind: DemoKind, ctx: &mut Dx12Context, config: &Config) -> Result<Box<dyn Demo>> {
    tracing::info!(demo = kind.name(), "Creating demo");
    Ok(match kind {
        DemoKind::DescriptorTable => Box::new(DescriptorTableDemo::new(ctx, config)?),
        DemoKind::MvpMatrix => Box::new(MvpMatrixDemo::new(ctx, config)?),
        DemoKind::UavCompute => Box::new(UavComputeDemo::new(ctx, config)?),
    })
}

/// 读取并编译程序的一个阶段
fn compile_stage(
    program: ShaderProgram,
    source: &Cow<'static, str>,
    stage: ShaderStage,
    defines: &[(&str, &str)],
) -> Result<ID3DBlob> {
    compile_shader(source, program.file_name(), stage, defines)
}

/// 着色器源码：配置了目录时从磁盘读取
fn shader_source(program: ShaderProgram, config: &Config) -> Result<Cow<'static, str>> {
    program.load(config.assets.shader_dir.as_deref().map(Path::new))
}
