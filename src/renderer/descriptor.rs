//! 描述符管理模块
//!
//! 与图形 API 无关的描述符堆布局：堆的类型与容量、句柄偏移计算，
//! 以及按名称分配槽位的线性分配器。DX12 后端用它计算每个视图在堆中的位置。
//!
//! # 描述符类型
//!
//! - **RTV** (Render Target View)：交换链后缓冲
//! - **DSV** (Depth Stencil View)：深度缓冲
//! - **CBV/SRV/UAV**：着色器可见的常量缓冲、纹理和可读写纹理视图，
//!   三者共用同一种堆

use crate::core::error::{DemoError, Result};

/// 描述符类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorType {
    /// 渲染目标视图 (RTV)
    RenderTargetView,
    /// 深度模板视图 (DSV)
    DepthStencilView,
    /// 常量缓冲视图 (CBV)
    ConstantBufferView,
    /// 着色资源视图 (SRV)
    ShaderResourceView,
    /// 无序访问视图 (UAV)
    UnorderedAccessView,
}

/// 描述符堆类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeapKind {
    Rtv,
    Dsv,
    CbvSrvUav,
}

impl DescriptorType {
    /// 该描述符所在的堆类型
    pub fn heap_kind(&self) -> HeapKind {
        match self {
            DescriptorType::RenderTargetView => HeapKind::Rtv,
            DescriptorType::DepthStencilView => HeapKind::Dsv,
            DescriptorType::ConstantBufferView
            | DescriptorType::ShaderResourceView
            | DescriptorType::UnorderedAccessView => HeapKind::CbvSrvUav,
        }
    }

    /// 获取描述符类型名称
    pub fn name(&self) -> &'static str {
        match self {
            DescriptorType::RenderTargetView => "RTV",
            DescriptorType::DepthStencilView => "DSV",
            DescriptorType::ConstantBufferView => "CBV",
            DescriptorType::ShaderResourceView => "SRV",
            DescriptorType::UnorderedAccessView => "UAV",
        }
    }
}

impl HeapKind {
    /// 只有 CBV/SRV/UAV 堆可以着色器可见
    pub fn can_be_shader_visible(&self) -> bool {
        matches!(self, HeapKind::CbvSrvUav)
    }

    pub fn name(&self) -> &'static str {
        match self {
            HeapKind::Rtv => "RTV",
            HeapKind::Dsv => "DSV",
            HeapKind::CbvSrvUav => "CBV/SRV/UAV",
        }
    }
}

/// 描述符堆描述信息
#[derive(Debug, Clone)]
pub struct DescriptorHeapDescriptor {
    /// 堆类型
    pub kind: HeapKind,
    /// 描述符数量
    pub num_descriptors: u32,
    /// 是否着色器可见
    pub shader_visible: bool,
    /// 调试名称
    pub name: &'static str,
}

impl DescriptorHeapDescriptor {
    /// 创建 RTV 堆描述符（每个后缓冲一个）
    pub fn rtv(num_descriptors: u32) -> Self {
        Self {
            kind: HeapKind::Rtv,
            num_descriptors,
            shader_visible: false,
            name: "RTV Heap",
        }
    }

    /// 创建 DSV 堆描述符
    pub fn dsv(num_descriptors: u32) -> Self {
        Self {
            kind: HeapKind::Dsv,
            num_descriptors,
            shader_visible: false,
            name: "DSV Heap",
        }
    }

    /// 创建着色器可见的 CBV/SRV/UAV 堆描述符
    pub fn cbv_srv_uav(num_descriptors: u32) -> Self {
        Self {
            kind: HeapKind::CbvSrvUav,
            num_descriptors,
            shader_visible: true,
            name: "CBV/SRV/UAV Heap",
        }
    }

    /// 设置调试名称
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

/// 描述符句柄（CPU 可见）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuDescriptorHandle {
    /// 句柄指针值
    pub ptr: usize,
    /// 描述符索引
    pub index: u32,
}

impl CpuDescriptorHandle {
    pub fn new(ptr: usize, index: u32) -> Self {
        Self { ptr, index }
    }

    /// 偏移句柄
    pub fn offset(&self, count: u32, increment_size: u32) -> Self {
        Self {
            ptr: self.ptr + count as usize * increment_size as usize,
            index: self.index + count,
        }
    }
}

/// 描述符句柄（GPU 可见）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuDescriptorHandle {
    /// 句柄指针值
    pub ptr: u64,
    /// 描述符索引
    pub index: u32,
}

impl GpuDescriptorHandle {
    pub fn new(ptr: u64, index: u32) -> Self {
        Self { ptr, index }
    }

    /// 偏移句柄
    pub fn offset(&self, count: u32, increment_size: u32) -> Self {
        Self {
            ptr: self.ptr + count as u64 * increment_size as u64,
            index: self.index + count,
        }
    }
}

/// 描述符句柄对（CPU + GPU）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorHandle {
    /// CPU 可见句柄
    pub cpu: CpuDescriptorHandle,
    /// GPU 可见句柄（仅对着色器可见的堆有效）
    pub gpu: Option<GpuDescriptorHandle>,
}

impl DescriptorHandle {
    pub fn new(cpu: CpuDescriptorHandle, gpu: Option<GpuDescriptorHandle>) -> Self {
        Self { cpu, gpu }
    }

    /// 偏移句柄对
    pub fn offset(&self, count: u32, increment_size: u32) -> Self {
        Self {
            cpu: self.cpu.offset(count, increment_size),
            gpu: self.gpu.map(|g| g.offset(count, increment_size)),
        }
    }
}

/// 已分配的槽位
#[derive(Debug, Clone, Copy)]
pub struct DescriptorSlot {
    /// 槽位名称
    pub name: &'static str,
    /// 存放的视图类型
    pub descriptor_type: DescriptorType,
    /// 句柄
    pub handle: DescriptorHandle,
}

/// 描述符分配器
///
/// 线性分配，创建后不释放（示例程序的资源与程序同寿命）。
/// 描述符表要求槽位连续，按分配顺序即得到表中的顺序。
pub struct DescriptorAllocator {
    /// 堆描述信息
    desc: DescriptorHeapDescriptor,
    /// 描述符增量大小
    increment_size: u32,
    /// 堆起始句柄
    base: DescriptorHandle,
    /// 已分配槽位，下标即槽位索引
    slots: Vec<DescriptorSlot>,
}

impl DescriptorAllocator {
    /// 创建新的描述符分配器
    ///
    /// # 参数
    ///
    /// * `desc` - 堆描述信息
    /// * `increment_size` - 设备报告的描述符增量大小
    /// * `cpu_base` - 堆起始 CPU 句柄
    /// * `gpu_base` - 堆起始 GPU 句柄（仅着色器可见堆）
    pub fn new(
        desc: DescriptorHeapDescriptor,
        increment_size: u32,
        cpu_base: usize,
        gpu_base: Option<u64>,
    ) -> Self {
        let gpu_base = gpu_base.filter(|_| desc.shader_visible);
        Self {
            base: DescriptorHandle::new(
                CpuDescriptorHandle::new(cpu_base, 0),
                gpu_base.map(|ptr| GpuDescriptorHandle::new(ptr, 0)),
            ),
            desc,
            increment_size,
            slots: Vec::new(),
        }
    }

    /// 分配下一个槽位
    pub fn allocate(
        &mut self,
        name: &'static str,
        descriptor_type: DescriptorType,
    ) -> Result<DescriptorHandle> {
        if descriptor_type.heap_kind() != self.desc.kind {
            return Err(DemoError::Runtime(format!(
                "Cannot place {} '{}' in {} heap",
                descriptor_type.name(),
                name,
                self.desc.kind.name()
            )));
        }

        // 检查预算
        if self.is_full() {
            return Err(DemoError::Runtime(format!(
                "{} out of budget: {}/{} (while allocating '{}')",
                self.desc.name,
                self.slots.len(),
                self.desc.num_descriptors,
                name
            )));
        }

        if self.slots.iter().any(|s| s.name == name) {
            return Err(DemoError::Runtime(format!(
                "Descriptor slot '{}' already allocated in {}",
                name, self.desc.name
            )));
        }

        let handle = self.base.offset(self.slots.len() as u32, self.increment_size);
        self.slots.push(DescriptorSlot {
            name,
            descriptor_type,
            handle,
        });

        Ok(handle)
    }

    /// 按名称查找槽位
    pub fn get(&self, name: &str) -> Option<&DescriptorSlot> {
        self.slots.iter().find(|s| s.name == name)
    }

    /// 第 `index` 个槽位的句柄（不要求已分配，用于 RTV 这类按下标访问的堆）
    pub fn handle_at(&self, index: u32) -> Result<DescriptorHandle> {
        if index >= self.desc.num_descriptors {
            return Err(DemoError::Runtime(format!(
                "Descriptor index {} out of range for {} ({} descriptors)",
                index, self.desc.name, self.desc.num_descriptors
            )));
        }
        Ok(self.base.offset(index, self.increment_size))
    }

    /// 堆起始句柄，即描述符表的起点
    pub fn table_start(&self) -> DescriptorHandle {
        self.base
    }

    pub fn allocated_count(&self) -> u32 {
        self.slots.len() as u32
    }

    pub fn capacity(&self) -> u32 {
        self.desc.num_descriptors
    }

    pub fn is_full(&self) -> bool {
        self.allocated_count() >= self.capacity()
    }

    pub fn descriptor(&self) -> &DescriptorHeapDescriptor {
        &self.desc
    }

    /// 获取统计信息
    pub fn stats(&self) -> DescriptorHeapStats {
        DescriptorHeapStats::new(self.desc.kind, self.capacity(), self.allocated_count())
    }
}

/// 描述符堆统计信息
#[derive(Debug, Clone)]
pub struct DescriptorHeapStats {
    /// 堆类型
    pub kind: HeapKind,
    /// 总容量
    pub capacity: u32,
    /// 已使用数量
    pub used: u32,
    /// 可用数量
    pub available: u32,
    /// 使用率 (0.0 - 1.0)
    pub usage_ratio: f32,
}

impl DescriptorHeapStats {
    pub fn new(kind: HeapKind, capacity: u32, used: u32) -> Self {
        let available = capacity.saturating_sub(used);
        let usage_ratio = if capacity > 0 {
            used as f32 / capacity as f32
        } else {
            0.0
        };

        Self {
            kind,
            capacity,
            used,
            available,
            usage_ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_type() {
        assert_eq!(DescriptorType::ShaderResourceView.heap_kind(), HeapKind::CbvSrvUav);
        assert_eq!(DescriptorType::RenderTargetView.heap_kind(), HeapKind::Rtv);
        assert!(!HeapKind::Dsv.can_be_shader_visible());
        assert_eq!(DescriptorType::UnorderedAccessView.name(), "UAV");
    }

    #[test]
    fn test_descriptor_heap_descriptor() {
        let desc = DescriptorHeapDescriptor::rtv(2);
        assert_eq!(desc.kind, HeapKind::Rtv);
        assert_eq!(desc.num_descriptors, 2);
        assert!(!desc.shader_visible);

        let desc = DescriptorHeapDescriptor::cbv_srv_uav(100).with_name("Scene Heap");
        assert!(desc.shader_visible);
        assert_eq!(desc.name, "Scene Heap");
    }

    #[test]
    fn test_handle_offset() {
        let cpu = CpuDescriptorHandle::new(1000, 0).offset(5, 32);
        assert_eq!(cpu.ptr, 1160); // 1000 + 5 * 32
        assert_eq!(cpu.index, 5);

        let gpu = GpuDescriptorHandle::new(2000, 0).offset(10, 32);
        assert_eq!(gpu.ptr, 2320); // 2000 + 10 * 32
        assert_eq!(gpu.index, 10);
    }

    #[test]
    fn test_table_layout_cbv_then_srv() {
        let mut heap = DescriptorAllocator::new(
            DescriptorHeapDescriptor::cbv_srv_uav(100),
            32,
            1000,
            Some(5000),
        );

        let cbv = heap.allocate("mvp", DescriptorType::ConstantBufferView).unwrap();
        let srv = heap.allocate("texture", DescriptorType::ShaderResourceView).unwrap();

        assert_eq!(cbv, heap.table_start());
        assert_eq!(srv.cpu.ptr, 1032);
        assert_eq!(srv.gpu.map(|g| g.ptr), Some(5032));
        assert_eq!(heap.get("texture").map(|s| s.handle.cpu.index), Some(1));

        let stats = heap.stats();
        assert_eq!(stats.used, 2);
        assert_eq!(stats.available, 98);
    }

    #[test]
    fn test_allocator_rejects_misuse() {
        let mut heap = DescriptorAllocator::new(DescriptorHeapDescriptor::cbv_srv_uav(1), 32, 0, Some(0));

        // 类型不匹配
        assert!(heap.allocate("rt", DescriptorType::RenderTargetView).is_err());

        heap.allocate("output", DescriptorType::UnorderedAccessView).unwrap();
        assert!(heap.is_full());

        // 超出预算
        assert!(heap.allocate("extra", DescriptorType::ShaderResourceView).is_err());
    }

    #[test]
    fn test_duplicate_name() {
        let mut heap = DescriptorAllocator::new(DescriptorHeapDescriptor::cbv_srv_uav(4), 32, 0, Some(0));
        heap.allocate("mvp", DescriptorType::ConstantBufferView).unwrap();
        assert!(heap.allocate("mvp", DescriptorType::ConstantBufferView).is_err());
    }

    #[test]
    fn test_rtv_heap_by_index() {
        let heap = DescriptorAllocator::new(DescriptorHeapDescriptor::rtv(2), 64, 4096, Some(99));

        // 非着色器可见堆没有 GPU 句柄
        assert!(heap.table_start().gpu.is_none());
        assert_eq!(heap.handle_at(1).unwrap().cpu.ptr, 4160);
        assert!(heap.handle_at(2).is_err());
    }

    #[test]
    fn test_descriptor_heap_stats() {
        let stats = DescriptorHeapStats::new(HeapKind::Rtv, 100, 50);
        assert_eq!(stats.available, 50);
        assert_eq!(stats.usage_ratio, 0.5);
    }
}
