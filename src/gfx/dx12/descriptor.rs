//! DirectX 12 描述符堆实现
//!
//! 封装 `ID3D12DescriptorHeap`，槽位的分配和句柄计算交给
//! [`DescriptorAllocator`]。

use windows::core::HSTRING;
use windows::Win32::Graphics::Direct3D12::*;

use crate::core::error::{GraphicsError, Result};
use crate::renderer::descriptor::{
    DescriptorAllocator, DescriptorHandle, DescriptorHeapDescriptor, DescriptorHeapStats,
    DescriptorType, HeapKind,
};

/// DX12 描述符堆
pub struct Dx12DescriptorHeap {
    /// 底层 DX12 描述符堆
    heap: ID3D12DescriptorHeap,
    /// 槽位分配
    allocator: DescriptorAllocator,
}

impl Dx12DescriptorHeap {
    /// 创建新的 DX12 描述符堆
    ///
    /// # 参数
    ///
    /// * `device` - DX12 设备
    /// * `desc` - 描述符堆描述信息
    pub fn new(device: &ID3D12Device, desc: DescriptorHeapDescriptor) -> Result<Self> {
        let heap_type = heap_type(desc.kind);
        let shader_visible = desc.shader_visible && desc.kind.can_be_shader_visible();

        let heap_desc = D3D12_DESCRIPTOR_HEAP_DESC {
            Type: heap_type,
            NumDescriptors: desc.num_descriptors,
            Flags: if shader_visible {
                D3D12_DESCRIPTOR_HEAP_FLAG_SHADER_VISIBLE
            } else {
                D3D12_DESCRIPTOR_HEAP_FLAG_NONE
            },
            NodeMask: 0,
        };

        unsafe {
            let heap: ID3D12DescriptorHeap = device.CreateDescriptorHeap(&heap_desc).map_err(|e| {
                GraphicsError::ResourceCreation(format!(
                    "Failed to create {} ({} descriptors): {}",
                    desc.name,
                    desc.num_descriptors,
                    e.message()
                ))
            })?;

            // 调试名称，失败不影响运行
            if let Err(e) = heap.SetName(&HSTRING::from(desc.name)) {
                tracing::debug!(heap = desc.name, "SetName failed: {}", e);
            }

            let increment_size = device.GetDescriptorHandleIncrementSize(heap_type);
            let cpu_start = heap.GetCPUDescriptorHandleForHeapStart().ptr;
            let gpu_start = if shader_visible {
                Some(heap.GetGPUDescriptorHandleForHeapStart().ptr)
            } else {
                None
            };

            tracing::debug!(
                heap = desc.name,
                descriptors = desc.num_descriptors,
                increment_size,
                shader_visible,
                "Descriptor heap created"
            );

            Ok(Self {
                heap,
                allocator: DescriptorAllocator::new(desc, increment_size, cpu_start, gpu_start),
            })
        }
    }

    /// 分配一个命名槽位
    pub fn allocate(
        &mut self,
        name: &'static str,
        descriptor_type: DescriptorType,
    ) -> Result<DescriptorHandle> {
        self.allocator.allocate(name, descriptor_type)
    }

    /// 第 `index` 个描述符的 CPU 句柄
    pub fn cpu_handle(&self, index: u32) -> Result<D3D12_CPU_DESCRIPTOR_HANDLE> {
        Ok(to_cpu_handle(&self.allocator.handle_at(index)?))
    }

    /// 描述符表起点的 GPU 句柄
    pub fn table_start(&self) -> Result<D3D12_GPU_DESCRIPTOR_HANDLE> {
        to_gpu_handle(&self.allocator.table_start())
    }

    /// 获取底层 DX12 描述符堆
    pub fn heap(&self) -> &ID3D12DescriptorHeap {
        &self.heap
    }

    pub fn stats(&self) -> DescriptorHeapStats {
        self.allocator.stats()
    }
}

/// 堆类型转换
pub fn heap_type(kind: HeapKind) -> D3D12_DESCRIPTOR_HEAP_TYPE {
    match kind {
        HeapKind::Rtv => D3D12_DESCRIPTOR_HEAP_TYPE_RTV,
        HeapKind::Dsv => D3D12_DESCRIPTOR_HEAP_TYPE_DSV,
        HeapKind::CbvSrvUav => D3D12_DESCRIPTOR_HEAP_TYPE_CBV_SRV_UAV,
    }
}

/// 转换为 DX12 CPU 描述符句柄
pub fn to_cpu_handle(handle: &DescriptorHandle) -> D3D12_CPU_DESCRIPTOR_HANDLE {
    D3D12_CPU_DESCRIPTOR_HANDLE {
        ptr: handle.cpu.ptr,
    }
}

/// 转换为 DX12 GPU 描述符句柄
///
/// 只有着色器可见堆中的句柄有 GPU 地址。
pub fn to_gpu_handle(handle: &DescriptorHandle) -> Result<D3D12_GPU_DESCRIPTOR_HANDLE> {
    handle
        .gpu
        .map(|gpu| D3D12_GPU_DESCRIPTOR_HANDLE { ptr: gpu.ptr })
        .ok_or_else(|| {
            GraphicsError::ResourceCreation(
                "Descriptor is not in a shader-visible heap".to_string(),
            )
            .into()
        })
}
