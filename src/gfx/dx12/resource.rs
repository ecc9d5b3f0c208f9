//! DirectX 12 资源
//!
//! 示例程序的资源创建后一直使用到退出，不做池化或回收。

use std::mem::ManuallyDrop;

use windows::core::HSTRING;
use windows::Win32::Graphics::Direct3D::D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;

use crate::core::error::{DemoError, GraphicsError, Result};
use crate::geometry::{Mesh, VertexLayout};
use crate::gfx::dx12::context::Dx12Context;
use crate::gfx::dx12::descriptor::{to_cpu_handle, Dx12DescriptorHeap};
use crate::gfx::dx12::pipeline::DEPTH_FORMAT;
use crate::renderer::descriptor::{DescriptorHeapDescriptor, DescriptorType};
use crate::renderer::resource::{copy_rows_pitched, BufferDescriptor, BufferUsage, UploadFootprint};
use crate::renderer::texture::TextureData;

/// 纹理和 UAV 的像素格式
pub const TEXTURE_FORMAT: DXGI_FORMAT = DXGI_FORMAT_R8G8B8A8_UNORM;

/// 资源状态转换屏障
///
/// 屏障不持有 `resource` 的引用，只能在 `resource` 存活期间使用。
pub fn transition_barrier(
    resource: &ID3D12Resource,
    before: D3D12_RESOURCE_STATES,
    after: D3D12_RESOURCE_STATES,
) -> D3D12_RESOURCE_BARRIER {
    D3D12_RESOURCE_BARRIER {
        Type: D3D12_RESOURCE_BARRIER_TYPE_TRANSITION,
        Flags: D3D12_RESOURCE_BARRIER_FLAG_NONE,
        Anonymous: D3D12_RESOURCE_BARRIER_0 {
            Transition: ManuallyDrop::new(D3D12_RESOURCE_TRANSITION_BARRIER {
                pResource: unsafe { std::mem::transmute_copy(resource) },
                Subresource: D3D12_RESOURCE_BARRIER_ALL_SUBRESOURCES,
                StateBefore: before,
                StateAfter: after,
            }),
        },
    }
}

fn buffer_desc(size: u64) -> D3D12_RESOURCE_DESC {
    D3D12_RESOURCE_DESC {
        Dimension: D3D12_RESOURCE_DIMENSION_BUFFER,
        Alignment: 0,
        Width: size,
        Height: 1,
        DepthOrArraySize: 1,
        MipLevels: 1,
        Format: DXGI_FORMAT_UNKNOWN,
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: 1,
            Quality: 0,
        },
        Layout: D3D12_TEXTURE_LAYOUT_ROW_MAJOR,
        Flags: D3D12_RESOURCE_FLAG_NONE,
    }
}

fn texture_desc(
    width: u32,
    height: u32,
    format: DXGI_FORMAT,
    flags: D3D12_RESOURCE_FLAGS,
) -> D3D12_RESOURCE_DESC {
    D3D12_RESOURCE_DESC {
        Dimension: D3D12_RESOURCE_DIMENSION_TEXTURE2D,
        Alignment: 0,
        Width: width as u64,
        Height: height,
        DepthOrArraySize: 1,
        MipLevels: 1,
        Format: format,
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: 1,
            Quality: 0,
        },
        Layout: D3D12_TEXTURE_LAYOUT_UNKNOWN,
        Flags: flags,
    }
}

/// 创建提交资源（隐式堆）
pub fn create_committed_resource(
    device: &ID3D12Device,
    heap_type: D3D12_HEAP_TYPE,
    desc: &D3D12_RESOURCE_DESC,
    initial_state: D3D12_RESOURCE_STATES,
    clear_value: Option<&D3D12_CLEAR_VALUE>,
    name: &str,
) -> Result<ID3D12Resource> {
    let heap_props = D3D12_HEAP_PROPERTIES {
        Type: heap_type,
        ..Default::default()
    };

    let mut resource: Option<ID3D12Resource> = None;
    unsafe {
        device
            .CreateCommittedResource(
                &heap_props,
                D3D12_HEAP_FLAG_NONE,
                desc,
                initial_state,
                clear_value.map(|c| c as *const _),
                &mut resource,
            )
            .map_err(|e| {
                GraphicsError::ResourceCreation(format!(
                    "Failed to create '{}': {}",
                    name,
                    e.message()
                ))
            })?;
    }

    let resource = resource.ok_or_else(|| {
        GraphicsError::ResourceCreation(format!("'{}' was not created", name))
    })?;
    unsafe {
        if let Err(e) = resource.SetName(&HSTRING::from(name)) {
            tracing::debug!(resource = name, "SetName failed: {}", e);
        }
    }
    Ok(resource)
}

/// 映射资源的子资源 0
fn map(resource: &ID3D12Resource) -> Result<*mut u8> {
    let mut data = std::ptr::null_mut();
    unsafe {
        resource.Map(0, None, Some(&mut data)).map_err(|e| {
            GraphicsError::ResourceCreation(format!("Failed to map resource: {}", e.message()))
        })?;
    }
    if data.is_null() {
        return Err(GraphicsError::ResourceCreation("Map returned a null pointer".to_string()).into());
    }
    Ok(data as *mut u8)
}

/// 在上传堆中创建缓冲区并写入初始数据
///
/// 顶点、索引缓冲直接放在上传堆，GPU 每次读取都经过 PCIe。
/// 对只有几十个顶点的立方体来说足够。
pub fn create_upload_buffer(
    device: &ID3D12Device,
    desc: &BufferDescriptor,
    data: &[u8],
) -> Result<ID3D12Resource> {
    let size = desc.aligned_size().max(data.len() as u64);
    let buffer = create_committed_resource(
        device,
        D3D12_HEAP_TYPE_UPLOAD,
        &buffer_desc(size),
        D3D12_RESOURCE_STATE_GENERIC_READ,
        None,
        desc.name,
    )?;

    if !data.is_empty() {
        let dst = map(&buffer)?;
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), dst, data.len());
            buffer.Unmap(0, None);
        }
    }

    Ok(buffer)
}

/// GPU 侧的网格：顶点缓冲 + 16 位索引缓冲
pub struct GpuMesh {
    #[allow(dead_code)] // 视图引用其 GPU 地址
    vertex_buffer: ID3D12Resource,
    #[allow(dead_code)]
    index_buffer: ID3D12Resource,
    pub vertex_buffer_view: D3D12_VERTEX_BUFFER_VIEW,
    pub index_buffer_view: D3D12_INDEX_BUFFER_VIEW,
    pub index_count: u32,
}

impl GpuMesh {
    pub fn new<V: VertexLayout>(device: &ID3D12Device, mesh: &Mesh<V>) -> Result<Self> {
        if !mesh.validate() {
            return Err(DemoError::Runtime("Mesh has out-of-range indices".to_string()));
        }

        let vertex_bytes = mesh.vertex_bytes();
        let index_bytes = mesh.index_bytes();

        let vertex_buffer = create_upload_buffer(
            device,
            &BufferDescriptor::new(vertex_bytes.len() as u64, BufferUsage::Vertex, "Vertex Buffer"),
            vertex_bytes,
        )?;
        let index_buffer = create_upload_buffer(
            device,
            &BufferDescriptor::new(index_bytes.len() as u64, BufferUsage::Index, "Index Buffer"),
            index_bytes,
        )?;

        let (vertex_buffer_view, index_buffer_view) = unsafe {
            (
                D3D12_VERTEX_BUFFER_VIEW {
                    BufferLocation: vertex_buffer.GetGPUVirtualAddress(),
                    SizeInBytes: vertex_bytes.len() as u32,
                    StrideInBytes: V::stride(),
                },
                D3D12_INDEX_BUFFER_VIEW {
                    BufferLocation: index_buffer.GetGPUVirtualAddress(),
                    SizeInBytes: index_bytes.len() as u32,
                    Format: DXGI_FORMAT_R16_UINT,
                },
            )
        };

        tracing::debug!(
            vertices = mesh.vertex_count(),
            indices = mesh.index_count(),
            "Mesh uploaded"
        );

        Ok(Self {
            vertex_buffer,
            index_buffer,
            vertex_buffer_view,
            index_buffer_view,
            index_count: mesh.index_count(),
        })
    }

    /// 绑定顶点 / 索引缓冲并绘制
    pub fn draw(&self, list: &ID3D12GraphicsCommandList) {
        unsafe {
            list.IASetPrimitiveTopology(D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST);
            list.IASetVertexBuffers(0, Some(&[self.vertex_buffer_view]));
            list.IASetIndexBuffer(Some(&self.index_buffer_view));
            list.DrawIndexedInstanced(self.index_count, 1, 0, 0, 0);
        }
    }
}

/// 持久映射的常量缓冲区
///
/// 创建后一直保持映射，每帧直接写入。因为每帧都等待 GPU 完成，
/// 写入时 GPU 不会读取同一块内存。
pub struct MappedConstantBuffer {
    resource: ID3D12Resource,
    mapped: *mut u8,
    size: u64,
}

impl MappedConstantBuffer {
    /// `size` 会对齐到 256 字节
    pub fn new(device: &ID3D12Device, size: u64, name: &'static str) -> Result<Self> {
        let desc = BufferDescriptor::new(size, BufferUsage::Constant, name);
        let size = desc.aligned_size();
        let resource = create_upload_buffer(device, &desc, &[])?;
        let mapped = map(&resource)?;

        tracing::debug!(name, size, "Constant buffer created and mapped");
        Ok(Self {
            resource,
            mapped,
            size,
        })
    }

    /// 写入数据（从偏移 0 开始）
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        if data.len() as u64 > self.size {
            return Err(DemoError::Runtime(format!(
                "Constant buffer write of {} bytes exceeds {} bytes",
                data.len(),
                self.size
            )));
        }
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), self.mapped, data.len());
        }
        Ok(())
    }

    pub fn gpu_address(&self) -> u64 {
        unsafe { self.resource.GetGPUVirtualAddress() }
    }

    /// 对齐后的大小
    pub fn size(&self) -> u64 {
        self.size
    }

    /// 覆盖整个缓冲区的 CBV
    pub fn create_view(&self, device: &ID3D12Device, handle: D3D12_CPU_DESCRIPTOR_HANDLE) {
        let desc = D3D12_CONSTANT_BUFFER_VIEW_DESC {
            BufferLocation: self.gpu_address(),
            SizeInBytes: self.size as u32,
        };
        unsafe {
            device.CreateConstantBufferView(Some(&desc), handle);
        }
    }
}

impl Drop for MappedConstantBuffer {
    fn drop(&mut self) {
        unsafe {
            self.resource.Unmap(0, None);
        }
    }
}

/// 深度缓冲 + 自己的 DSV 堆
pub struct DepthTarget {
    heap: Dx12DescriptorHeap,
    #[allow(dead_code)] // DSV 引用该资源
    buffer: ID3D12Resource,
}

impl DepthTarget {
    pub fn new(device: &ID3D12Device, width: u32, height: u32) -> Result<Self> {
        let mut heap = Dx12DescriptorHeap::new(
            device,
            DescriptorHeapDescriptor::dsv(1).with_name("Depth Stencil Heap"),
        )?;
        let handle = heap.allocate("depth", DescriptorType::DepthStencilView)?;
        let buffer = Self::create_buffer(device, width, height)?;

        unsafe {
            device.CreateDepthStencilView(
                &buffer,
                None,
                to_cpu_handle(&handle),
            );
        }

        tracing::debug!(width, height, "Depth buffer created");
        Ok(Self { heap, buffer })
    }

    fn create_buffer(device: &ID3D12Device, width: u32, height: u32) -> Result<ID3D12Resource> {
        let clear_value = D3D12_CLEAR_VALUE {
            Format: DEPTH_FORMAT,
            Anonymous: D3D12_CLEAR_VALUE_0 {
                DepthStencil: D3D12_DEPTH_STENCIL_VALUE {
                    Depth: 1.0,
                    Stencil: 0,
                },
            },
        };

        create_committed_resource(
            device,
            D3D12_HEAP_TYPE_DEFAULT,
            &texture_desc(
                width,
                height,
                DEPTH_FORMAT,
                D3D12_RESOURCE_FLAG_ALLOW_DEPTH_STENCIL,
            ),
            D3D12_RESOURCE_STATE_DEPTH_WRITE,
            Some(&clear_value),
            "Depth Buffer",
        )
    }

    /// 窗口尺寸变化后重建深度缓冲，DSV 槽位不变
    pub fn resize(&mut self, device: &ID3D12Device, width: u32, height: u32) -> Result<()> {
        self.buffer = Self::create_buffer(device, width, height)?;
        unsafe {
            device.CreateDepthStencilView(&self.buffer, None, self.dsv_handle()?);
        }
        tracing::debug!(width, height, "Depth buffer resized");
        Ok(())
    }

    pub fn dsv_handle(&self) -> Result<D3D12_CPU_DESCRIPTOR_HANDLE> {
        self.heap.cpu_handle(0)
    }
}

/// 创建计算着色器写入的 UAV 纹理
///
/// 初始状态为 `UNORDERED_ACCESS`。
pub fn create_uav_texture(device: &ID3D12Device, width: u32, height: u32) -> Result<ID3D12Resource> {
    create_committed_resource(
        device,
        D3D12_HEAP_TYPE_DEFAULT,
        &texture_desc(
            width,
            height,
            TEXTURE_FORMAT,
            D3D12_RESOURCE_FLAG_ALLOW_UNORDERED_ACCESS,
        ),
        D3D12_RESOURCE_STATE_UNORDERED_ACCESS,
        None,
        "UAV Output Texture",
    )
}

/// UAV 纹理的视图
pub fn create_uav_view(
    device: &ID3D12Device,
    texture: &ID3D12Resource,
    handle: D3D12_CPU_DESCRIPTOR_HANDLE,
) {
    let desc = D3D12_UNORDERED_ACCESS_VIEW_DESC {
        Format: TEXTURE_FORMAT,
        ViewDimension: D3D12_UAV_DIMENSION_TEXTURE2D,
        Anonymous: D3D12_UNORDERED_ACCESS_VIEW_DESC_0 {
            Texture2D: D3D12_TEX2D_UAV {
                MipSlice: 0,
                PlaneSlice: 0,
            },
        },
    };
    unsafe {
        device.CreateUnorderedAccessView(texture, None::<&ID3D12Resource>, Some(&desc), handle);
    }
}

/// 纹理的 SRV
pub fn create_srv_view(
    device: &ID3D12Device,
    texture: &ID3D12Resource,
    handle: D3D12_CPU_DESCRIPTOR_HANDLE,
) {
    let desc = D3D12_SHADER_RESOURCE_VIEW_DESC {
        Format: TEXTURE_FORMAT,
        ViewDimension: D3D12_SRV_DIMENSION_TEXTURE2D,
        Shader4ComponentMapping: D3D12_DEFAULT_SHADER_4_COMPONENT_MAPPING,
        Anonymous: D3D12_SHADER_RESOURCE_VIEW_DESC_0 {
            Texture2D: D3D12_TEX2D_SRV {
                MostDetailedMip: 0,
                MipLevels: 1,
                PlaneSlice: 0,
                ResourceMinLODClamp: 0.0,
            },
        },
    };
    unsafe {
        device.CreateShaderResourceView(texture, Some(&desc), handle);
    }
}

/// 上传纹理到默认堆
///
/// 像素按 256 字节行跨度写入上传堆中的暂存缓冲，
/// 用一次性命令列表拷贝到纹理并转为 `PIXEL_SHADER_RESOURCE`，等待完成后返回。
pub fn upload_texture(ctx: &mut Dx12Context, texture: &TextureData) -> Result<ID3D12Resource> {
    let footprint = UploadFootprint::new(texture.width, texture.height, TextureData::BYTES_PER_PIXEL);

    let gpu_texture = create_committed_resource(
        &ctx.device,
        D3D12_HEAP_TYPE_DEFAULT,
        &texture_desc(
            texture.width,
            texture.height,
            TEXTURE_FORMAT,
            D3D12_RESOURCE_FLAG_NONE,
        ),
        D3D12_RESOURCE_STATE_COPY_DEST,
        None,
        "Texture",
    )?;

    let staging = create_upload_buffer(
        &ctx.device,
        &BufferDescriptor::new(footprint.total_size, BufferUsage::Staging, "Texture Staging Buffer"),
        &[],
    )?;

    let dst = map(&staging)?;
    let copy_result = unsafe {
        let dst = std::slice::from_raw_parts_mut(dst, footprint.total_size as usize);
        copy_rows_pitched(&texture.pixels, dst, &footprint)
    };
    unsafe {
        staging.Unmap(0, None);
    }
    copy_result?;

    ctx.execute_and_wait(|list| {
        let dst_location = D3D12_TEXTURE_COPY_LOCATION {
            pResource: unsafe { std::mem::transmute_copy(&gpu_texture) },
            Type: D3D12_TEXTURE_COPY_TYPE_SUBRESOURCE_INDEX,
            Anonymous: D3D12_TEXTURE_COPY_LOCATION_0 {
                SubresourceIndex: 0,
            },
        };
        let src_location = D3D12_TEXTURE_COPY_LOCATION {
            pResource: unsafe { std::mem::transmute_copy(&staging) },
            Type: D3D12_TEXTURE_COPY_TYPE_PLACED_FOOTPRINT,
            Anonymous: D3D12_TEXTURE_COPY_LOCATION_0 {
                PlacedFootprint: D3D12_PLACED_SUBRESOURCE_FOOTPRINT {
                    Offset: 0,
                    Footprint: D3D12_SUBRESOURCE_FOOTPRINT {
                        Format: TEXTURE_FORMAT,
                        Width: footprint.width,
                        Height: footprint.height,
                        Depth: 1,
                        RowPitch: footprint.row_pitch as u32,
                    },
                },
            },
        };

        unsafe {
            list.CopyTextureRegion(&dst_location, 0, 0, 0, &src_location, None);
            list.ResourceBarrier(&[transition_barrier(
                &gpu_texture,
                D3D12_RESOURCE_STATE_COPY_DEST,
                D3D12_RESOURCE_STATE_PIXEL_SHADER_RESOURCE,
            )]);
        }
        Ok(())
    })?;

    tracing::info!(
        width = texture.width,
        height = texture.height,
        row_pitch = footprint.row_pitch,
        "Texture uploaded"
    );
    Ok(gpu_texture)
}
