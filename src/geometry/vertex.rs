//! 顶点定义模块
//!
//! 两个示例立方体使用的顶点格式。内存布局与 GPU 输入布局一致，
//! 使用 `#[repr(C)]` 保证顺序和对齐。

use bytemuck::{Pod, Zeroable};

/// 顶点输入元素描述
///
/// 与图形 API 无关的输入布局条目，由 DX12 后端转换为
/// `D3D12_INPUT_ELEMENT_DESC`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// HLSL 语义名称
    pub semantic: &'static str,
    /// 分量个数（float2 / float3）
    pub components: u32,
    /// 在顶点内的字节偏移
    pub offset: u32,
}

/// 顶点格式 trait
pub trait VertexLayout: Pod {
    /// 输入布局
    const ATTRIBUTES: &'static [VertexAttribute];

    /// 顶点步长（字节）
    fn stride() -> u32 {
        std::mem::size_of::<Self>() as u32
    }
}

/// 带颜色的顶点
///
/// # 内存布局
///
/// - position: 12 bytes (3 * f32)
/// - color: 12 bytes (3 * f32)
/// - **总计**: 24 bytes
#[repr(C)]
#[derive(Default, Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ColorVertex {
    /// 顶点位置 (x, y, z)
    pub position: [f32; 3],

    /// 顶点颜色 (r, g, b)
    pub color: [f32; 3],
}

/// 带纹理坐标的顶点
///
/// # 内存布局
///
/// - position: 12 bytes (3 * f32)
/// - texcoord: 8 bytes (2 * f32)
/// - **总计**: 20 bytes
#[repr(C)]
#[derive(Default, Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct TexturedVertex {
    /// 顶点位置 (x, y, z)
    pub position: [f32; 3],

    /// 纹理坐标 (u, v)，左上角为原点
    pub texcoord: [f32; 2],
}

impl ColorVertex {
    #[inline]
    pub const fn new(position: [f32; 3], color: [f32; 3]) -> Self {
        Self { position, color }
    }
}

impl TexturedVertex {
    #[inline]
    pub const fn new(position: [f32; 3], texcoord: [f32; 2]) -> Self {
        Self { position, texcoord }
    }
}

impl VertexLayout for ColorVertex {
    const ATTRIBUTES: &'static [VertexAttribute] = &[
        VertexAttribute { semantic: "POSITION", components: 3, offset: 0 },
        VertexAttribute { semantic: "COLOR", components: 3, offset: 12 },
    ];
}

impl VertexLayout for TexturedVertex {
    const ATTRIBUTES: &'static [VertexAttribute] = &[
        VertexAttribute { semantic: "POSITION", components: 3, offset: 0 },
        VertexAttribute { semantic: "TEXCOORD", components: 2, offset: 12 },
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_layout_matches<V: VertexLayout>() {
        let mut end = 0;
        for attr in V::ATTRIBUTES {
            assert_eq!(attr.offset, end, "{} is not packed", attr.semantic);
            end += attr.components * 4;
        }
        assert_eq!(end, V::stride());
    }

    #[test]
    fn test_vertex_sizes() {
        assert_eq!(ColorVertex::stride(), 24);
        assert_eq!(TexturedVertex::stride(), 20);
    }

    #[test]
    fn test_attributes_cover_vertex() {
        assert_layout_matches::<ColorVertex>();
        assert_layout_matches::<TexturedVertex>();
    }
}
