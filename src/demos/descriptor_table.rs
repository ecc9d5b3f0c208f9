//! 描述符表示例
//!
//! 常量缓冲区（MVP）和纹理的视图放在同一个着色器可见堆的连续槽位中，
//! 通过一个描述符表绑定：
//!
//! ```text
//! heap slot 0: CBV -> b0
//! heap slot 1: SRV -> t0
//! ```

use windows::Win32::Graphics::Direct3D12::*;

use super::{compile_stage, shader_source, Demo};
use crate::core::config::CameraConfig;
use crate::core::error::Result;
use crate::core::Config;
use crate::geometry::{textured_cube, TexturedVertex, VertexLayout};
use crate::gfx::dx12::descriptor::{to_cpu_handle, Dx12DescriptorHeap};
use crate::gfx::dx12::pipeline::{
    create_graphics_pipeline, create_root_signature, GraphicsPipelineDesc,
};
use crate::gfx::dx12::resource::{
    create_srv_view, upload_texture, DepthTarget, GpuMesh, MappedConstantBuffer,
};
use crate::gfx::Dx12Context;
use crate::renderer::binding::RootSignatureLayout;
use crate::renderer::descriptor::{DescriptorHeapDescriptor, DescriptorType};
use crate::renderer::resource::constant_buffer_size;
use crate::renderer::scene::{aspect_ratio, spinning_cube_mvp};
use crate::renderer::shader::{ShaderProgram, ShaderStage};
use crate::renderer::texture::TextureData;

/// 着色器可见堆的容量，只用到前两个槽位
const HEAP_CAPACITY: u32 = 100;

/// 描述符表所在的根参数
const TABLE_ROOT_INDEX: u32 = 0;

pub struct DescriptorTableDemo {
    root_signature: ID3D12RootSignature,
    pso: ID3D12PipelineState,
    mesh: GpuMesh,
    heap: Dx12DescriptorHeap,
    constants: MappedConstantBuffer,
    #[allow(dead_code)] // SRV 引用该纹理
    texture: ID3D12Resource,
    depth: DepthTarget,
    camera: CameraConfig,
}

impl DescriptorTableDemo {
    pub fn new(ctx: &mut Dx12Context, config: &Config) -> Result<Self> {
        let program = ShaderProgram::DescriptorTable;
        let layout = RootSignatureLayout::descriptor_table();
        let root_signature = create_root_signature(&ctx.device, &layout)?;

        let source = shader_source(program, config)?;
        let vs = compile_stage(program, &source, ShaderStage::Vertex, &[])?;
        let ps = compile_stage(program, &source, ShaderStage::Pixel, &[])?;
        let pso = create_graphics_pipeline(
            &ctx.device,
            &GraphicsPipelineDesc {
                root_signature: &root_signature,
                vertex_shader: &vs,
                pixel_shader: &ps,
                attributes: TexturedVertex::ATTRIBUTES,
                depth: true,
            },
        )?;

        let mesh = GpuMesh::new(&ctx.device, &textured_cube())?;

        // 表中的顺序即分配顺序：CBV 在前，SRV 在后
        let mut heap = Dx12DescriptorHeap::new(
            &ctx.device,
            DescriptorHeapDescriptor::cbv_srv_uav(HEAP_CAPACITY).with_name("Scene Descriptor Heap"),
        )?;
        let cbv_slot = heap.allocate("mvp_cbv", DescriptorType::ConstantBufferView)?;
        let srv_slot = heap.allocate("texture_srv", DescriptorType::ShaderResourceView)?;

        let constants = MappedConstantBuffer::new(
            &ctx.device,
            constant_buffer_size::<[f32; 16]>(),
            "MVP Constant Buffer",
        )?;
        constants.create_view(&ctx.device, to_cpu_handle(&cbv_slot));

        let texture_data = TextureData::load_or_checkerboard(&config.assets.texture);
        let texture = upload_texture(ctx, &texture_data)?;
        create_srv_view(&ctx.device, &texture, to_cpu_handle(&srv_slot));

        let depth = DepthTarget::new(&ctx.device, ctx.width(), ctx.height())?;

        let stats = heap.stats();
        tracing::info!(
            used = stats.used,
            capacity = stats.capacity,
            "Descriptor table demo ready"
        );

        Ok(Self {
            root_signature,
            pso,
            mesh,
            heap,
            constants,
            texture,
            depth,
            camera: config.camera.clone(),
        })
    }
}

impl Demo for DescriptorTableDemo {
    fn render(&mut self, ctx: &mut Dx12Context, elapsed: f32) -> Result<()> {
        // 上一帧已经等待 GPU 完成，可以直接覆盖常量缓冲区
        let mvp = spinning_cube_mvp(elapsed, aspect_ratio(ctx.width(), ctx.height()), &self.camera);
        self.constants.write(bytemuck::bytes_of(&mvp))?;

        ctx.begin_commands(Some(&self.pso))?;
        ctx.begin_render_pass(Some(self.depth.dsv_handle()?))?;

        let list = &ctx.command_list;
        unsafe {
            list.SetGraphicsRootSignature(&self.root_signature);
            list.SetDescriptorHeaps(&[Some(self.heap.heap().clone())]);
            list.SetGraphicsRootDescriptorTable(TABLE_ROOT_INDEX, self.heap.table_start()?);
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
