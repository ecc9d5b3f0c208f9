//! MVP 矩阵示例
//!
//! 每帧把同一个 MVP 矩阵以三种方式绑定：
//!
//! - 根常量：16 个 32 位值直接写入根签名（b0）
//! - 根描述符：常量缓冲区的 GPU 虚拟地址（b1）
//! - 描述符表：着色器可见堆中的 CBV（b2）
//!
//! 顶点着色器通过 `MVP_SOURCE` 宏选择读取哪一份，由 `mvp.binding` 配置。

use std::ffi::c_void;

use windows::Win32::Graphics::Direct3D12::*;

use super::{compile_stage, shader_source, Demo};
use crate::core::config::CameraConfig;
use crate::core::error::Result;
use crate::core::Config;
use crate::geometry::{colored_cube, ColorVertex, VertexLayout};
use crate::gfx::dx12::descriptor::{to_cpu_handle, Dx12DescriptorHeap};
use crate::gfx::dx12::pipeline::{
    create_graphics_pipeline, create_root_signature, GraphicsPipelineDesc,
};
use crate::gfx::dx12::resource::{DepthTarget, GpuMesh, MappedConstantBuffer};
use crate::gfx::Dx12Context;
use crate::renderer::binding::{MvpBinding, RootSignatureLayout};
use crate::renderer::descriptor::{DescriptorHeapDescriptor, DescriptorType};
use crate::renderer::resource::constant_buffer_size;
use crate::renderer::scene::{aspect_ratio, spinning_cube_mvp};
use crate::renderer::shader::{ShaderProgram, ShaderStage};

pub struct MvpMatrixDemo {
    root_signature: ID3D12RootSignature,
    pso: ID3D12PipelineState,
    mesh: GpuMesh,
    heap: Dx12DescriptorHeap,
    /// 同时作为根 CBV（b1）和表中 CBV（b2）的数据源
    constants: MappedConstantBuffer,
    depth: DepthTarget,
    camera: CameraConfig,
}

impl MvpMatrixDemo {
    pub fn new(ctx: &mut Dx12Context, config: &Config) -> Result<Self> {
        let program = ShaderProgram::MvpMatrix;
        let selected = MvpBinding::of(config.mvp.binding);
        let layout = RootSignatureLayout::mvp_matrix();
        let root_signature = create_root_signature(&ctx.device, &layout)?;

        let source = shader_source(program, config)?;
        let defines = [("MVP_SOURCE", selected.shader_define())];
        let vs = compile_stage(program, &source, ShaderStage::Vertex, &defines)?;
        let ps = compile_stage(program, &source, ShaderStage::Pixel, &defines)?;
        let pso = create_graphics_pipeline(
            &ctx.device,
            &GraphicsPipelineDesc {
                root_signature: &root_signature,
                vertex_shader: &vs,
                pixel_shader: &ps,
                attributes: ColorVertex::ATTRIBUTES,
                depth: true,
            },
        )?;

        let mesh = GpuMesh::new(&ctx.device, &colored_cube())?;

        let mut heap = Dx12DescriptorHeap::new(
            &ctx.device,
            DescriptorHeapDescriptor::cbv_srv_uav(1).with_name("MVP Descriptor Heap"),
        )?;
        let cbv_slot = heap.allocate("mvp_table_cbv", DescriptorType::ConstantBufferView)?;

        let constants = MappedConstantBuffer::new(
            &ctx.device,
            constant_buffer_size::<[f32; 16]>(),
            "MVP Constant Buffer",
        )?;
        constants.create_view(&ctx.device, to_cpu_handle(&cbv_slot));

        let depth = DepthTarget::new(&ctx.device, ctx.width(), ctx.height())?;

        tracing::info!(
            binding = ?selected.kind,
            root_index = selected.root_index,
            register = selected.register,
            "MVP demo ready"
        );

        Ok(Self {
            root_signature,
            pso,
            mesh,
            heap,
            constants,
            depth,
            camera: config.camera.clone(),
        })
    }
}

impl Demo for MvpMatrixDemo {
    fn render(&mut self, ctx: &mut Dx12Context, elapsed: f32) -> Result<()> {
        let mvp = spinning_cube_mvp(elapsed, aspect_ratio(ctx.width(), ctx.height()), &self.camera);
        self.constants.write(bytemuck::bytes_of(&mvp))?;

        ctx.begin_commands(Some(&self.pso))?;
        ctx.begin_render_pass(Some(self.depth.dsv_handle()?))?;

        let list = &ctx.command_list;
        unsafe {
            list.SetGraphicsRootSignature(&self.root_signature);

            // 根常量：矩阵内容直接进入命令列表
            list.SetGraphicsRoot32BitConstants(
                MvpBinding::ROOT_CONSTANTS.root_index,
                mvp.len() as u32,
                mvp.as_ptr() as *const c_void,
                0,
            );

            // 根描述符：只记录 GPU 地址，不经过描述符堆
            list.SetGraphicsRootConstantBufferView(
                MvpBinding::ROOT_CBV.root_index,
                self.constants.gpu_address(),
            );

            // 描述符表：指向堆中的 CBV
            list.SetDescriptorHeaps(&[Some(self.heap.heap().clone())]);
            list.SetGraphicsRootDescriptorTable(
                MvpBinding::DESCRIPTOR_TABLE.root_index,
                self.heap.table_start()?,
            );
        }
        self.mesh.draw(list);

        ctx.end_render_pass()?;
        ctx.execute()?;
        ctx.present()
    }

    fn resize(&mut self, ctx: &mut Dx12Context) -> Result<()> {
        self.depth.resize(&ctx.device, ctx.width(), ctx.height())
    }
}
