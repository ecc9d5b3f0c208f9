//! 网格数据结构模块
//!
//! CPU 侧的顶点 + 索引数据，创建后一次性上传到 GPU。

use super::vertex::VertexLayout;

/// 索引网格
///
/// 索引使用 16 位（`DXGI_FORMAT_R16_UINT`）。
#[derive(Debug, Clone)]
pub struct Mesh<V> {
    /// 顶点数组
    pub vertices: Vec<V>,

    /// 索引数组，每三个索引组成一个三角形
    pub indices: Vec<u16>,
}

impl<V: VertexLayout> Mesh<V> {
    /// 创建网格
    pub fn new(vertices: Vec<V>, indices: Vec<u16>) -> Self {
        Self { vertices, indices }
    }

    /// 顶点缓冲区内容
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// 索引缓冲区内容
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    #[inline]
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    #[inline]
    pub fn triangle_count(&self) -> u32 {
        self.index_count() / 3
    }

    /// 检查索引是否都在顶点范围内
    pub fn validate(&self) -> bool {
        self.indices.len() % 3 == 0
            && self
                .indices
                .iter()
                .all(|&i| (i as usize) < self.vertices.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::vertex::ColorVertex;

    #[test]
    fn test_byte_views() {
        let mesh = Mesh::new(
            vec![ColorVertex::default(); 3],
            vec![0, 1, 2],
        );
        assert_eq!(mesh.vertex_bytes().len(), 72);
        assert_eq!(mesh.index_bytes().len(), 6);
        assert_eq!(mesh.triangle_count(), 1);
        assert!(mesh.validate());
    }

    #[test]
    fn test_validate_out_of_range() {
        let mesh = Mesh::new(vec![ColorVertex::default(); 2], vec![0, 1, 2]);
        assert!(!mesh.validate());
    }
}
