//! 资源布局模块
//!
//! GPU 资源的尺寸与对齐计算。DX12 对常量缓冲区和纹理上传有固定的对齐要求：
//!
//! - 常量缓冲区视图的大小必须是 256 字节的倍数
//! - 缓冲区到纹理拷贝时，每行的字节跨度必须是 256 字节的倍数

use crate::core::error::{AssetError, Result};

/// 常量缓冲区对齐（`D3D12_CONSTANT_BUFFER_DATA_PLACEMENT_ALIGNMENT`）
pub const CONSTANT_BUFFER_ALIGNMENT: u64 = 256;

/// 纹理行跨度对齐（`D3D12_TEXTURE_DATA_PITCH_ALIGNMENT`）
pub const TEXTURE_PITCH_ALIGNMENT: u64 = 256;

/// 向上对齐到 `alignment`（必须是 2 的幂）
#[inline]
pub const fn align_up(size: u64, alignment: u64) -> u64 {
    (size + alignment - 1) & !(alignment - 1)
}

/// 常量缓冲区大小
///
/// 把 `T` 的大小对齐到 256 字节。
#[inline]
pub const fn constant_buffer_size<T>() -> u64 {
    align_up(std::mem::size_of::<T>() as u64, CONSTANT_BUFFER_ALIGNMENT)
}

/// 缓冲区使用类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// 顶点缓冲区
    Vertex,
    /// 索引缓冲区
    Index,
    /// 常量缓冲区
    Constant,
    /// 纹理上传用的暂存缓冲区
    Staging,
}

/// 缓冲区描述信息
#[derive(Debug, Clone)]
pub struct BufferDescriptor {
    /// 数据大小（字节）
    pub size: u64,
    /// 使用类型
    pub usage: BufferUsage,
    /// 调试名称
    pub name: &'static str,
}

impl BufferDescriptor {
    pub fn new(size: u64, usage: BufferUsage, name: &'static str) -> Self {
        Self { size, usage, name }
    }

    /// 实际分配的大小
    ///
    /// 常量缓冲区对齐到 256 字节，其他缓冲区保持原大小。
    pub fn aligned_size(&self) -> u64 {
        match self.usage {
            BufferUsage::Constant => align_up(self.size, CONSTANT_BUFFER_ALIGNMENT),
            _ => self.size,
        }
    }
}

/// 纹理在上传缓冲区中的布局（单个子资源）
///
/// 等价于 `GetCopyableFootprints` 对单个 mip 的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadFootprint {
    pub width: u32,
    pub height: u32,
    /// 每像素字节数
    pub bytes_per_pixel: u32,
    /// 紧密排列时每行字节数
    pub row_size: u64,
    /// 对齐后的行跨度
    pub row_pitch: u64,
    /// 上传缓冲区需要的总大小
    pub total_size: u64,
}

impl UploadFootprint {
    /// 计算 `width x height` 纹理的上传布局
    pub fn new(width: u32, height: u32, bytes_per_pixel: u32) -> Self {
        let row_size = width as u64 * bytes_per_pixel as u64;
        let row_pitch = align_up(row_size, TEXTURE_PITCH_ALIGNMENT);
        // 最后一行只需要 row_size
        let total_size = if height == 0 {
            0
        } else {
            row_pitch * (height as u64 - 1) + row_size
        };

        Self {
            width,
            height,
            bytes_per_pixel,
            row_size,
            row_pitch,
            total_size,
        }
    }
}

/// 把紧密排列的像素行拷贝到按 `row_pitch` 排列的暂存内存
///
/// `dst` 至少要有 `footprint.total_size` 字节。
pub fn copy_rows_pitched(src: &[u8], dst: &mut [u8], footprint: &UploadFootprint) -> Result<()> {
    let row_size = footprint.row_size as usize;
    let row_pitch = footprint.row_pitch as usize;
    let height = footprint.height as usize;

    if row_size == 0 || src.len() != row_size * height {
        return Err(AssetError::InvalidData(format!(
            "Pixel data is {} bytes, expected {} ({}x{}x{})",
            src.len(),
            row_size * height,
            footprint.width,
            footprint.height,
            footprint.bytes_per_pixel
        ))
        .into());
    }

    if (dst.len() as u64) < footprint.total_size {
        return Err(AssetError::InvalidData(format!(
            "Staging buffer is {} bytes, need {}",
            dst.len(),
            footprint.total_size
        ))
        .into());
    }

    for (row, src_row) in src.chunks_exact(row_size).enumerate() {
        let offset = row * row_pitch;
        dst[offset..offset + row_size].copy_from_slice(src_row);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 256), 0);
        assert_eq!(align_up(1, 256), 256);
        assert_eq!(align_up(256, 256), 256);
        assert_eq!(align_up(257, 256), 512);
    }

    #[test]
    fn test_constant_buffer_size() {
        // 一个 4x4 浮点矩阵 64 字节
        assert_eq!(constant_buffer_size::<[f32; 16]>(), 256);
        assert_eq!(constant_buffer_size::<[u8; 300]>(), 512);
    }

    #[test]
    fn test_buffer_descriptor_alignment() {
        let desc = BufferDescriptor::new(64, BufferUsage::Constant, "MVP");
        assert_eq!(desc.aligned_size(), 256);

        let desc = BufferDescriptor::new(100, BufferUsage::Vertex, "Vertices");
        assert_eq!(desc.aligned_size(), 100);
    }

    #[test]
    fn test_footprint_pitch() {
        // 100 像素 * 4 字节 = 400 字节，对齐到 512
        let fp = UploadFootprint::new(100, 3, 4);
        assert_eq!(fp.row_size, 400);
        assert_eq!(fp.row_pitch, 512);
        assert_eq!(fp.total_size, 512 * 2 + 400);

        // 已对齐的宽度不需要额外填充
        let fp = UploadFootprint::new(64, 64, 4);
        assert_eq!(fp.row_pitch, 256);
        assert_eq!(fp.total_size, 256 * 64);
    }

    #[test]
    fn test_copy_rows_pitched() {
        let fp = UploadFootprint::new(3, 2, 4);
        let src: Vec<u8> = (0..24).collect();
        let mut dst = vec![0xFFu8; fp.total_size as usize];

        copy_rows_pitched(&src, &mut dst, &fp).unwrap();

        assert_eq!(&dst[0..12], &src[0..12]);
        // 行尾填充保持不变
        assert_eq!(dst[12], 0xFF);
        assert_eq!(&dst[256..268], &src[12..24]);
    }

    #[test]
    fn test_copy_rows_rejects_bad_sizes() {
        let fp = UploadFootprint::new(3, 2, 4);
        let mut dst = vec![0u8; fp.total_size as usize];
        assert!(copy_rows_pitched(&[0u8; 10], &mut dst, &fp).is_err());

        let mut small = vec![0u8; 16];
        assert!(copy_rows_pitched(&[0u8; 24], &mut small, &fp).is_err());
    }
}
