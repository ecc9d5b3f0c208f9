//! UAV 计算着色器示例
//!
//! 计算着色器把图案写入与后缓冲同尺寸的 UAV 纹理，然后整体拷贝到后缓冲：
//!
//! ```text
//! Dispatch (UAV 纹理: UNORDERED_ACCESS)
//!   UAV 纹理 UNORDERED_ACCESS -> COPY_SOURCE, 后缓冲 PRESENT -> COPY_DEST
//! CopyResource
//!   后缓冲 COPY_DEST -> PRESENT, UAV 纹理 COPY_SOURCE -> UNORDERED_ACCESS
//! ```

use windows::Win32::Graphics::Direct3D12::*;

use super::{compile_stage, shader_source, Demo};
use crate::core::error::Result;
use crate::core::Config;
use crate::gfx::dx12::descriptor::Dx12DescriptorHeap;
use crate::gfx::dx12::pipeline::{create_compute_pipeline, create_root_signature};
use crate::gfx::dx12::resource::{create_uav_texture, create_uav_view, transition_barrier};
use crate::gfx::Dx12Context;
use crate::renderer::binding::RootSignatureLayout;
use crate::renderer::descriptor::{DescriptorHeapDescriptor, DescriptorType};
use crate::renderer::dispatch::{dispatch_groups, COMPUTE_GROUP_SIZE};
use crate::renderer::shader::{ShaderProgram, ShaderStage};

/// 时间常量所在的根参数
const TIME_ROOT_INDEX: u32 = 0;
/// UAV 描述符表所在的根参数
const OUTPUT_ROOT_INDEX: u32 = 1;

pub struct UavComputeDemo {
    root_signature: ID3D12RootSignature,
    pso: ID3D12PipelineState,
    heap: Dx12DescriptorHeap,
    output: ID3D12Resource,
}

impl UavComputeDemo {
    pub fn new(ctx: &mut Dx12Context, config: &Config) -> Result<Self> {
        let program = ShaderProgram::UavCompute;
        let layout = RootSignatureLayout::compute();
        let root_signature = create_root_signature(&ctx.device, &layout)?;

        let source = shader_source(program, config)?;
        let cs = compile_stage(program, &source, ShaderStage::Compute, &[])?;
        let pso = create_compute_pipeline(&ctx.device, &root_signature, &cs)?;

        let mut heap = Dx12DescriptorHeap::new(
            &ctx.device,
            DescriptorHeapDescriptor::cbv_srv_uav(1).with_name("Compute Descriptor Heap"),
        )?;
        heap.allocate("output_uav", DescriptorType::UnorderedAccessView)?;

        let output = create_uav_texture(&ctx.device, ctx.width(), ctx.height())?;
        create_uav_view(&ctx.device, &output, heap.cpu_handle(0)?);

        tracing::info!(
            width = ctx.width(),
            height = ctx.height(),
            "UAV compute demo ready"
        );

        Ok(Self {
            root_signature,
            pso,
            heap,
            output,
        })
    }
}

impl Demo for UavComputeDemo {
    fn render(&mut self, ctx: &mut Dx12Context, elapsed: f32) -> Result<()> {
        let (x, y, z) = dispatch_groups(ctx.width(), ctx.height(), COMPUTE_GROUP_SIZE);

        ctx.begin_commands(Some(&self.pso))?;

        let list = &ctx.command_list;
        let back_buffer = ctx.current_back_buffer()?;
        unsafe {
            list.SetComputeRootSignature(&self.root_signature);
            list.SetDescriptorHeaps(&[Some(self.heap.heap().clone())]);
            list.SetComputeRoot32BitConstant(TIME_ROOT_INDEX, elapsed.to_bits(), 0);
            list.SetComputeRootDescriptorTable(OUTPUT_ROOT_INDEX, self.heap.table_start()?);
            list.Dispatch(x, y, z);

            list.ResourceBarrier(&[
                transition_barrier(
                    &self.output,
                    D3D12_RESOURCE_STATE_UNORDERED_ACCESS,
                    D3D12_RESOURCE_STATE_COPY_SOURCE,
                ),
                transition_barrier(
                    back_buffer,
                    D3D12_RESOURCE_STATE_PRESENT,
                    D3D12_RESOURCE_STATE_COPY_DEST,
                ),
            ]);

            list.CopyResource(back_buffer, &self.output);

            list.ResourceBarrier(&[
                transition_barrier(
                    back_buffer,
                    D3D12_RESOURCE_STATE_COPY_DEST,
                    D3D12_RESOURCE_STATE_PRESENT,
                ),
                transition_barrier(
                    &self.output,
                    D3D12_RESOURCE_STATE_COPY_SOURCE,
                    D3D12_RESOURCE_STATE_UNORDERED_ACCESS,
                ),
            ]);
        }

        ctx.execute()?;
        ctx.present()
    }

    fn resize(&mut self, ctx: &mut Dx12Context) -> Result<()> {
        // 拷贝要求 UAV 纹理与后缓冲尺寸一致
        self.output = create_uav_texture(&ctx.device, ctx.width(), ctx.height())?;
        create_uav_view(&ctx.device, &self.output, self.heap.cpu_handle(0)?);
        tracing::debug!(width = ctx.width(), height = ctx.height(), "UAV texture recreated");
        Ok(())
    }
}
