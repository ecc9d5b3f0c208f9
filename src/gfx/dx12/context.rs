//! DirectX 12 设备上下文
//!
//! 三个示例共用的基础设施：窗口、设备、命令队列、交换链、RTV 堆、
//! 一个命令分配器 + 命令列表，以及唯一的 Fence。
//!
//! # 初始化流程
//!
//! 1. 启用调试层（可配置）
//! 2. 创建 DXGI 工厂并选择硬件适配器
//! 3. 创建 D3D12 设备
//! 4. 创建命令队列
//! 5. 创建交换链
//! 6. 创建 RTV 堆和渲染目标视图
//! 7. 创建命令分配器、命令列表和同步对象（Fence）
//!
//! # 帧同步
//!
//! 每帧提交后 signal 下一个 Fence 值并阻塞等待 GPU 完成，
//! 所以只需要一个命令分配器，也不需要按帧复制资源。

use std::sync::Arc;

use tracing::{debug, info, trace, warn};
use windows::core::Interface;
use windows::Win32::Foundation::{CloseHandle, HANDLE, HWND, RECT};
use windows::Win32::Graphics::Direct3D::*;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;
use windows::Win32::Graphics::Dxgi::*;
use windows::Win32::System::Threading::{CreateEventA, WaitForSingleObject, INFINITE};
use winit::dpi::LogicalSize;
use winit::event_loop::EventLoop;
use winit::raw_window_handle::{HasWindowHandle, RawWindowHandle};
use winit::window::{Window, WindowBuilder};

use crate::core::error::{DemoError, GraphicsError, Result};
use crate::core::Config;
use crate::gfx::dx12::descriptor::Dx12DescriptorHeap;
use crate::gfx::dx12::pipeline::RENDER_TARGET_FORMAT;
use crate::gfx::dx12::resource::transition_barrier;
use crate::renderer::descriptor::DescriptorHeapDescriptor;
use crate::renderer::sync::{FenceManager, FenceValue};

/// DirectX 12 上下文
pub struct Dx12Context {
    /// D3D12 设备
    pub device: ID3D12Device,
    /// 命令队列
    pub command_queue: ID3D12CommandQueue,
    /// 交换链
    pub swap_chain: IDXGISwapChain3,
    /// 命令分配器（每帧重置）
    pub command_allocator: ID3D12CommandAllocator,
    /// 命令列表
    pub command_list: ID3D12GraphicsCommandList,
    /// 渲染目标视图堆
    rtv_heap: Dx12DescriptorHeap,
    /// 交换链缓冲
    render_targets: Vec<ID3D12Resource>,
    /// 当前后缓冲索引
    frame_index: usize,
    /// 交换链缓冲数量
    frame_count: u32,
    /// 同步 Fence
    fence: ID3D12Fence,
    /// Fence 事件句柄
    fence_event: HANDLE,
    /// Fence 值跟踪
    fences: FenceManager,
    /// 窗口引用
    window: Arc<Window>,
    width: u32,
    height: u32,
    vsync: bool,
    clear_color: [f32; 4],
}

impl Dx12Context {
    /// 创建窗口并初始化 DirectX 12
    ///
    /// # 参数
    ///
    /// * `event_loop` - Winit 事件循环，用于创建窗口
    /// * `config` - 窗口尺寸、标题和图形选项
    pub fn new(event_loop: &EventLoop<()>, config: &Config) -> Result<Self> {
        let width = config.window.width;
        let height = config.window.height;

        let window = Arc::new(
            WindowBuilder::new()
                .with_title(config.window_title())
                .with_inner_size(LogicalSize::new(width, height))
                .with_resizable(config.window.resizable)
                .build(event_loop)
                .map_err(|e| DemoError::Initialization(format!("Failed to create window: {}", e)))?,
        );

        // 高 DPI 下物理尺寸可能与逻辑尺寸不同
        let size = window.inner_size();
        let (width, height) = (size.width.max(1), size.height.max(1));

        unsafe {
            // 1. 调试层
            if config.graphics.debug_layer {
                let mut debug: Option<ID3D12Debug> = None;
                match D3D12GetDebugInterface(&mut debug) {
                    Ok(()) => {
                        if let Some(debug) = debug {
                            debug.EnableDebugLayer();
                            debug!("D3D12 debug layer enabled");
                        }
                    }
                    Err(e) => warn!("Failed to enable D3D12 debug layer: {}", e.message()),
                }
            }

            // 2. DXGI 工厂
            let factory_flags = if config.graphics.debug_layer {
                DXGI_CREATE_FACTORY_DEBUG
            } else {
                DXGI_CREATE_FACTORY_FLAGS(0)
            };
            let factory: IDXGIFactory4 = CreateDXGIFactory2(factory_flags).map_err(|e| {
                GraphicsError::DeviceCreation(format!("Failed to create DXGI factory: {}", e.message()))
            })?;

            // 3. 适配器 + 设备
            let adapter = select_adapter(&factory, config.graphics.high_performance_adapter)?;
            let mut device: Option<ID3D12Device> = None;
            D3D12CreateDevice(&adapter, D3D_FEATURE_LEVEL_11_0, &mut device).map_err(|e| {
                GraphicsError::DeviceCreation(format!("D3D12CreateDevice failed: {}", e.message()))
            })?;
            let device = device.ok_or_else(|| {
                GraphicsError::DeviceCreation("D3D12CreateDevice returned no device".to_string())
            })?;

            // 4. 命令队列
            let queue_desc = D3D12_COMMAND_QUEUE_DESC {
                Type: D3D12_COMMAND_LIST_TYPE_DIRECT,
                Flags: D3D12_COMMAND_QUEUE_FLAG_NONE,
                ..Default::default()
            };
            let command_queue: ID3D12CommandQueue =
                device.CreateCommandQueue(&queue_desc).map_err(|e| {
                    GraphicsError::DeviceCreation(format!(
                        "Failed to create command queue: {}",
                        e.message()
                    ))
                })?;

            // 5. 交换链
            let hwnd = window_hwnd(&window)?;
            let frame_count = config.graphics.frame_count;
            let swap_chain_desc = DXGI_SWAP_CHAIN_DESC1 {
                Width: width,
                Height: height,
                Format: RENDER_TARGET_FORMAT,
                SampleDesc: DXGI_SAMPLE_DESC {
                    Count: 1,
                    Quality: 0,
                },
                BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
                BufferCount: frame_count,
                SwapEffect: DXGI_SWAP_EFFECT_FLIP_DISCARD,
                ..Default::default()
            };

            let swap_chain: IDXGISwapChain1 = factory
                .CreateSwapChainForHwnd(&command_queue, hwnd, &swap_chain_desc, None, None)
                .map_err(|e| {
                    GraphicsError::SwapchainError(format!(
                        "Failed to create swap chain: {}",
                        e.message()
                    ))
                })?;
            let swap_chain: IDXGISwapChain3 = swap_chain.cast().map_err(|e| {
                GraphicsError::SwapchainError(format!(
                    "IDXGISwapChain3 not supported: {}",
                    e.message()
                ))
            })?;

            info!(width, height, buffers = frame_count, "Swap chain created");

            // 6. RTV 堆
            // 按后缓冲索引访问，不分配命名槽位
            let rtv_heap = Dx12DescriptorHeap::new(
                &device,
                DescriptorHeapDescriptor::rtv(frame_count).with_name("Swap Chain RTV Heap"),
            )?;
            let render_targets = create_render_targets(&device, &swap_chain, &rtv_heap, frame_count)?;

            // 7. 命令对象与同步对象
            let command_allocator: ID3D12CommandAllocator = device
                .CreateCommandAllocator(D3D12_COMMAND_LIST_TYPE_DIRECT)
                .map_err(|e| {
                    GraphicsError::DeviceCreation(format!(
                        "Failed to create command allocator: {}",
                        e.message()
                    ))
                })?;
            let command_list: ID3D12GraphicsCommandList = device
                .CreateCommandList(
                    0,
                    D3D12_COMMAND_LIST_TYPE_DIRECT,
                    &command_allocator,
                    None::<&ID3D12PipelineState>,
                )
                .map_err(|e| {
                    GraphicsError::DeviceCreation(format!(
                        "Failed to create command list: {}",
                        e.message()
                    ))
                })?;
            // 命令列表创建时处于录制状态
            command_list.Close()?;

            let fence: ID3D12Fence = device
                .CreateFence(FenceValue::INITIAL.value(), D3D12_FENCE_FLAG_NONE)
                .map_err(|e| {
                    GraphicsError::DeviceCreation(format!("Failed to create fence: {}", e.message()))
                })?;
            let fence_event = CreateEventA(None, false, false, None).map_err(|e| {
                GraphicsError::DeviceCreation(format!(
                    "Failed to create fence event: {}",
                    e.message()
                ))
            })?;

            let frame_index = swap_chain.GetCurrentBackBufferIndex() as usize;

            info!("DX12 context initialization complete");

            Ok(Self {
                device,
                command_queue,
                swap_chain,
                command_allocator,
                command_list,
                rtv_heap,
                render_targets,
                frame_index,
                frame_count,
                fence,
                fence_event,
                fences: FenceManager::new(),
                window,
                width,
                height,
                vsync: config.graphics.vsync,
                clear_color: config.graphics.clear_color,
            })
        }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn clear_color(&self) -> &[f32; 4] {
        &self.clear_color
    }

    /// 当前后缓冲
    pub fn current_back_buffer(&self) -> Result<&ID3D12Resource> {
        self.render_targets.get(self.frame_index).ok_or_else(|| {
            DemoError::Runtime(format!("Invalid back buffer index {}", self.frame_index))
        })
    }

    /// 当前后缓冲的 RTV
    pub fn rtv_handle(&self) -> Result<D3D12_CPU_DESCRIPTOR_HANDLE> {
        self.rtv_heap.cpu_handle(self.frame_index as u32)
    }

    /// 覆盖整个窗口的视口
    pub fn viewport(&self) -> D3D12_VIEWPORT {
        D3D12_VIEWPORT {
            TopLeftX: 0.0,
            TopLeftY: 0.0,
            Width: self.width as f32,
            Height: self.height as f32,
            MinDepth: 0.0,
            MaxDepth: 1.0,
        }
    }

    pub fn scissor_rect(&self) -> RECT {
        RECT {
            left: 0,
            top: 0,
            right: self.width as i32,
            bottom: self.height as i32,
        }
    }

    /// 重置命令分配器与命令列表，开始录制
    pub fn begin_commands(&self, pso: Option<&ID3D12PipelineState>) -> Result<()> {
        unsafe {
            self.command_allocator.Reset()?;
            self.command_list.Reset(&self.command_allocator, pso)?;
        }
        Ok(())
    }

    /// 后缓冲状态转换
    pub fn transition_back_buffer(
        &self,
        before: D3D12_RESOURCE_STATES,
        after: D3D12_RESOURCE_STATES,
    ) -> Result<()> {
        let barrier = transition_barrier(self.current_back_buffer()?, before, after);
        unsafe {
            self.command_list.ResourceBarrier(&[barrier]);
        }
        Ok(())
    }

    /// 后缓冲转为渲染目标，绑定并清屏，设置视口
    ///
    /// `dsv` 为 `Some` 时同时绑定并清除深度缓冲。
    pub fn begin_render_pass(&self, dsv: Option<D3D12_CPU_DESCRIPTOR_HANDLE>) -> Result<()> {
        self.transition_back_buffer(D3D12_RESOURCE_STATE_PRESENT, D3D12_RESOURCE_STATE_RENDER_TARGET)?;

        let rtv = self.rtv_handle()?;
        let list = &self.command_list;
        unsafe {
            match dsv {
                Some(dsv) => {
                    list.OMSetRenderTargets(1, Some(&rtv), false, Some(&dsv));
                    list.ClearDepthStencilView(dsv, D3D12_CLEAR_FLAG_DEPTH, 1.0, 0, None);
                }
                None => list.OMSetRenderTargets(1, Some(&rtv), false, None),
            }
            list.ClearRenderTargetView(rtv, &self.clear_color, None);
            list.RSSetViewports(&[self.viewport()]);
            list.RSSetScissorRects(&[self.scissor_rect()]);
        }
        Ok(())
    }

    /// 后缓冲转回呈现状态
    pub fn end_render_pass(&self) -> Result<()> {
        self.transition_back_buffer(D3D12_RESOURCE_STATE_RENDER_TARGET, D3D12_RESOURCE_STATE_PRESENT)
    }

    /// 关闭并提交命令列表
    pub fn execute(&self) -> Result<()> {
        unsafe {
            self.command_list.Close().map_err(|e| {
                GraphicsError::CommandExecution(format!(
                    "Failed to close command list: {}",
                    e.message()
                ))
            })?;
            let lists = [Some(self.command_list.cast::<ID3D12CommandList>()?)];
            self.command_queue.ExecuteCommandLists(&lists);
        }
        Ok(())
    }

    /// 呈现并等待这一帧完成
    pub fn present(&mut self) -> Result<()> {
        let sync_interval = if self.vsync { 1 } else { 0 };
        unsafe {
            self.swap_chain
                .Present(sync_interval, DXGI_PRESENT(0))
                .ok()
                .map_err(|e| {
                    GraphicsError::SwapchainError(format!("Present failed: {}", e.message()))
                })?;
        }

        self.wait_for_gpu()?;
        self.frame_index = unsafe { self.swap_chain.GetCurrentBackBufferIndex() } as usize;
        trace!(frame_index = self.frame_index, "Frame presented");
        Ok(())
    }

    /// 录制一次性命令（例如纹理上传），提交并等待完成
    pub fn execute_and_wait<F>(&mut self, record: F) -> Result<()>
    where
        F: FnOnce(&ID3D12GraphicsCommandList) -> Result<()>,
    {
        self.begin_commands(None)?;
        record(&self.command_list)?;
        self.execute()?;
        self.wait_for_gpu()
    }

    /// Signal 下一个 Fence 值，阻塞直到 GPU 执行到该值
    pub fn wait_for_gpu(&mut self) -> Result<()> {
        let value = self.fences.signal();
        unsafe {
            self.command_queue.Signal(&self.fence, value.value()).map_err(|e| {
                GraphicsError::CommandExecution(format!("Failed to signal fence: {}", e.message()))
            })?;

            self.fences
                .observe_completed(FenceValue::new(self.fence.GetCompletedValue()));
            if self.fences.must_wait(value) {
                self.fence
                    .SetEventOnCompletion(value.value(), self.fence_event)
                    .map_err(|e| {
                        GraphicsError::CommandExecution(format!(
                            "Failed to set fence event: {}",
                            e.message()
                        ))
                    })?;
                WaitForSingleObject(self.fence_event, INFINITE);
                self.fences.record_wait();
            }
            self.fences
                .observe_completed(FenceValue::new(self.fence.GetCompletedValue()));
        }

        trace!(fence = %value, "GPU idle");
        Ok(())
    }

    /// 调整交换链大小并重建 RTV
    ///
    /// 宽或高为 0（窗口最小化）时不做任何事，返回 `false`。
    pub fn resize_swap_chain(&mut self, width: u32, height: u32) -> Result<bool> {
        if width == 0 || height == 0 || (width == self.width && height == self.height) {
            return Ok(false);
        }

        self.wait_for_gpu()?;

        // 交换链缓冲的所有引用都要先释放
        self.render_targets.clear();

        unsafe {
            self.swap_chain
                .ResizeBuffers(
                    self.frame_count,
                    width,
                    height,
                    RENDER_TARGET_FORMAT,
                    DXGI_SWAP_CHAIN_FLAG(0),
                )
                .map_err(|e| {
                    GraphicsError::SwapchainError(format!(
                        "Failed to resize swap chain: {}",
                        e.message()
                    ))
                })?;
        }

        self.render_targets =
            create_render_targets(&self.device, &self.swap_chain, &self.rtv_heap, self.frame_count)?;
        self.frame_index = unsafe { self.swap_chain.GetCurrentBackBufferIndex() } as usize;
        self.width = width;
        self.height = height;

        debug!(width, height, "Swap chain resized");
        Ok(true)
    }

    /// 等待次数等同步统计
    pub fn fence_manager(&self) -> &FenceManager {
        &self.fences
    }
}

impl Drop for Dx12Context {
    fn drop(&mut self) {
        // GPU 可能仍在使用资源
        if let Err(e) = self.wait_for_gpu() {
            warn!("Failed to flush GPU before shutdown: {}", e);
        }
        unsafe {
            if let Err(e) = CloseHandle(self.fence_event) {
                warn!("Failed to close fence event: {}", e);
            }
        }
        debug!(
            fence = %self.fences.last_signaled(),
            waits = self.fences.wait_count(),
            "DX12 context destroyed"
        );
    }
}

/// 从 winit 窗口获取 HWND
fn window_hwnd(window: &Window) -> Result<HWND> {
    let handle = window
        .window_handle()
        .map_err(|e| DemoError::Initialization(format!("Failed to get window handle: {}", e)))?;
    match handle.as_raw() {
        RawWindowHandle::Win32(win32) => Ok(HWND(win32.hwnd.get() as *mut core::ffi::c_void)),
        _ => Err(DemoError::Initialization(
            "Expected a Win32 window handle".to_string(),
        )),
    }
}

/// 选择硬件适配器
///
/// 先通过 `IDXGIFactory6` 按配置的 GPU 偏好枚举，找不到时再用 `EnumAdapters1`。
/// 跳过软件适配器，并用 `D3D12CreateDevice` 探测是否支持 11_0 特性级别。
fn select_adapter(factory: &IDXGIFactory4, high_performance: bool) -> Result<IDXGIAdapter1> {
    let factory6 = factory.cast::<IDXGIFactory6>().ok();

    for pass in adapter_passes(factory6.is_some(), high_performance) {
        let found = match (pass, &factory6) {
            (AdapterPass::ByPreference(preference), Some(f6)) => {
                first_hardware_adapter(pass, |index| unsafe {
                    f6.EnumAdapterByGpuPreference(index, preference)
                })?
            }
            _ => first_hardware_adapter(pass, |index| unsafe { factory.EnumAdapters1(index) })?,
        };
        if let Some(adapter) = found {
            return Ok(adapter);
        }
    }

    Err(GraphicsError::NoAdapter.into())
}

/// 适配器枚举方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AdapterPass {
    /// `IDXGIFactory6::EnumAdapterByGpuPreference`
    ByPreference(DXGI_GPU_PREFERENCE),
    /// `IDXGIFactory1::EnumAdapters1`
    Enumeration,
}

/// 依次尝试的枚举方式：先按 GPU 偏好，再按枚举顺序
fn adapter_passes(has_factory6: bool, high_performance: bool) -> Vec<AdapterPass> {
    let mut passes = Vec::with_capacity(2);
    if has_factory6 {
        let preference = if high_performance {
            DXGI_GPU_PREFERENCE_HIGH_PERFORMANCE
        } else {
            DXGI_GPU_PREFERENCE_UNSPECIFIED
        };
        passes.push(AdapterPass::ByPreference(preference));
    }
    passes.push(AdapterPass::Enumeration);
    passes
}

/// 返回第一个支持 11_0 的硬件适配器
fn first_hardware_adapter<F>(pass: AdapterPass, enumerate: F) -> Result<Option<IDXGIAdapter1>>
where
    F: Fn(u32) -> windows::core::Result<IDXGIAdapter1>,
{
    for index in 0.. {
        let adapter = match enumerate(index) {
            Ok(adapter) => adapter,
            // DXGI_ERROR_NOT_FOUND：枚举结束
            Err(_) => break,
        };

        let desc = unsafe { adapter.GetDesc1()? };
        let name = adapter_name(&desc.Description);

        if (desc.Flags & DXGI_ADAPTER_FLAG_SOFTWARE.0 as u32) != 0 {
            debug!(adapter = %name, "Skipping software adapter");
            continue;
        }

        let supported = unsafe {
            D3D12CreateDevice(
                &adapter,
                D3D_FEATURE_LEVEL_11_0,
                std::ptr::null_mut::<Option<ID3D12Device>>(),
            )
            .is_ok()
        };
        if supported {
            info!(
                adapter = %name,
                ?pass,
                video_memory_mb = desc.DedicatedVideoMemory / (1024 * 1024),
                "Selected adapter"
            );
            return Ok(Some(adapter));
        }

        debug!(adapter = %name, "Adapter does not support feature level 11_0");
    }

    debug!(?pass, "No hardware adapter found");
    Ok(None)
}

fn adapter_name(description: &[u16]) -> String {
    let len = description.iter().position(|&c| c == 0).unwrap_or(description.len());
    String::from_utf16_lossy(&description[..len])
}

/// 为每个交换链缓冲创建 RTV
fn create_render_targets(
    device: &ID3D12Device,
    swap_chain: &IDXGISwapChain3,
    rtv_heap: &Dx12DescriptorHeap,
    frame_count: u32,
) -> Result<Vec<ID3D12Resource>> {
    (0..frame_count)
        .map(|i| unsafe {
            let buffer: ID3D12Resource = swap_chain.GetBuffer(i).map_err(|e| {
                GraphicsError::SwapchainError(format!(
                    "Failed to get swap chain buffer {}: {}",
                    i,
                    e.message()
                ))
            })?;
            device.CreateRenderTargetView(&buffer, None, rtv_heap.cpu_handle(i)?);
            Ok(buffer)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_preference_follows_config() {
        assert_eq!(
            adapter_passes(true, true),
            vec![
                AdapterPass::ByPreference(DXGI_GPU_PREFERENCE_HIGH_PERFORMANCE),
                AdapterPass::Enumeration
            ]
        );
        assert_eq!(
            adapter_passes(true, false),
            vec![
                AdapterPass::ByPreference(DXGI_GPU_PREFERENCE_UNSPECIFIED),
                AdapterPass::Enumeration
            ]
        );
    }

    #[test]
    fn test_enumeration_is_always_the_last_pass() {
        assert_eq!(adapter_passes(false, true), vec![AdapterPass::Enumeration]);
        for passes in [adapter_passes(true, true), adapter_passes(true, false)] {
            assert_eq!(passes.last(), Some(&AdapterPass::Enumeration));
        }
    }
}
