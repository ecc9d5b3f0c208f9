//! 立方体几何
//!
//! 边长为 2、中心在原点的立方体。三角形按顺时针方向绕序（D3D 默认正面）。

use super::mesh::Mesh;
use super::vertex::{ColorVertex, TexturedVertex};

/// 8 个共享角点的彩色立方体
///
/// 每个角点有自己的颜色，光栅化时在面内插值。
pub fn colored_cube() -> Mesh<ColorVertex> {
    let vertices = vec![
        ColorVertex::new([-1.0, -1.0, -1.0], [1.0, 0.0, 0.0]),
        ColorVertex::new([-1.0, 1.0, -1.0], [0.0, 1.0, 0.0]),
        ColorVertex::new([1.0, 1.0, -1.0], [0.0, 0.0, 1.0]),
        ColorVertex::new([1.0, -1.0, -1.0], [1.0, 1.0, 0.0]),
        ColorVertex::new([-1.0, -1.0, 1.0], [1.0, 0.0, 1.0]),
        ColorVertex::new([-1.0, 1.0, 1.0], [0.0, 1.0, 1.0]),
        ColorVertex::new([1.0, 1.0, 1.0], [1.0, 1.0, 1.0]),
        ColorVertex::new([1.0, -1.0, 1.0], [0.0, 0.0, 0.0]),
    ];

    #[rustfmt::skip]
    let indices = vec![
        // -Z
        0, 1, 2, 0, 2, 3,
        // +Z
        4, 6, 5, 4, 7, 6,
        // -X
        4, 5, 1, 4, 1, 0,
        // +X
        3, 2, 6, 3, 6, 7,
        // +Y
        1, 5, 6, 1, 6, 2,
        // -Y
        4, 0, 3, 4, 3, 7,
    ];

    Mesh::new(vertices, indices)
}

/// 24 个顶点（每面 4 个）的纹理立方体
///
/// 每个面都映射完整的纹理，面的顺序为 +X, -X, +Y, -Y, +Z, -Z。
pub fn textured_cube() -> Mesh<TexturedVertex> {
    // 每个面按 左下、左上、右上、右下 的顺序给出（从面外侧看）
    const FACES: [[[f32; 3]; 4]; 6] = [
        // +X
        [[1.0, -1.0, -1.0], [1.0, 1.0, -1.0], [1.0, 1.0, 1.0], [1.0, -1.0, 1.0]],
        // -X
        [[-1.0, -1.0, 1.0], [-1.0, 1.0, 1.0], [-1.0, 1.0, -1.0], [-1.0, -1.0, -1.0]],
        // +Y
        [[-1.0, 1.0, -1.0], [-1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, -1.0]],
        // -Y
        [[-1.0, -1.0, 1.0], [-1.0, -1.0, -1.0], [1.0, -1.0, -1.0], [1.0, -1.0, 1.0]],
        // +Z
        [[1.0, -1.0, 1.0], [1.0, 1.0, 1.0], [-1.0, 1.0, 1.0], [-1.0, -1.0, 1.0]],
        // -Z
        [[-1.0, -1.0, -1.0], [-1.0, 1.0, -1.0], [1.0, 1.0, -1.0], [1.0, -1.0, -1.0]],
    ];
    const UVS: [[f32; 2]; 4] = [[0.0, 1.0], [0.0, 0.0], [1.0, 0.0], [1.0, 1.0]];

    let vertices = FACES
        .iter()
        .flat_map(|face| {
            face.iter()
                .zip(UVS.iter())
                .map(|(&p, &uv)| TexturedVertex::new(p, uv))
        })
        .collect();

    let indices = (0..FACES.len() as u16)
        .flat_map(|face| {
            let base = face * 4;
            [base, base + 1, base + 2, base, base + 2, base + 3]
        })
        .collect();

    Mesh::new(vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn position(p: [f32; 3]) -> Vector3<f32> {
        Vector3::new(p[0], p[1], p[2])
    }

    // 从外侧看为顺时针时，(b-a)x(c-a) 指向立方体外侧
    fn assert_outward<F: Fn(u16) -> [f32; 3]>(indices: &[u16], pos: F) {
        for tri in indices.chunks(3) {
            let a = position(pos(tri[0]));
            let b = position(pos(tri[1]));
            let c = position(pos(tri[2]));
            let normal = (b - a).cross(&(c - a));
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(&centroid) > 0.0, "triangle {:?} faces inward", tri);
        }
    }

    #[test]
    fn test_colored_cube() {
        let cube = colored_cube();
        assert_eq!(cube.vertex_count(), 8);
        assert_eq!(cube.index_count(), 36);
        assert!(cube.validate());
        assert_eq!(cube.vertices[0].color, [1.0, 0.0, 0.0]);
        assert_eq!(cube.vertices[7].color, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_textured_cube() {
        let cube = textured_cube();
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.index_count(), 36);
        assert!(cube.validate());
        assert_eq!(&cube.indices[6..12], &[4, 5, 6, 4, 6, 7]);
        assert_eq!(cube.vertices[1].texcoord, [0.0, 0.0]);
        assert_eq!(cube.vertices[23].position, [1.0, -1.0, -1.0]);
    }

    #[test]
    fn test_winding_is_consistent() {
        let colored = colored_cube();
        assert_outward(&colored.indices, |i| colored.vertices[i as usize].position);

        let textured = textured_cube();
        assert_outward(&textured.indices, |i| textured.vertices[i as usize].position);
    }
}
