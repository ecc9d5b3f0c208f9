//! 数学库模块
//!
//! 基于 `nalgebra`，提供示例程序需要的左手坐标系变换。
//!
//! 所有矩阵都采用列向量约定（`v' = M * v`），按 `nalgebra` 的列主序存储，
//! 可以直接拷贝到 HLSL 默认（column_major）打包的常量缓冲区中，
//! 着色器端使用 `mul(m, v)`。

pub use nalgebra::{Matrix4 as Mat4, Point3 as Pt3, Vector3 as Vec3};

pub type Vector3 = Vec3<f32>;
pub type Point3 = Pt3<f32>;
pub type Matrix4 = Mat4<f32>;

/// 角度转弧度
pub fn deg_to_rad(degrees: f32) -> f32 {
    degrees * std::f32::consts::PI / 180.0
}

/// 绕 X 轴旋转
pub fn rotation_x(angle: f32) -> Matrix4 {
    Matrix4::from_axis_angle(&Vector3::x_axis(), angle)
}

/// 绕 Y 轴旋转
pub fn rotation_y(angle: f32) -> Matrix4 {
    Matrix4::from_axis_angle(&Vector3::y_axis(), angle)
}

/// 左手坐标系观察矩阵
///
/// 观察空间中摄像机位于原点，朝向 +Z，`up` 映射到 +Y 方向。
pub fn look_at_lh(eye: &Point3, target: &Point3, up: &Vector3) -> Matrix4 {
    Matrix4::look_at_lh(eye, target, up)
}

/// 左手坐标系透视投影矩阵
///
/// 深度映射到 Direct3D 的 [0, 1] 区间：`near` 映射到 0，`far` 映射到 1。
///
/// # 参数
///
/// * `fov_y` - 垂直视场角（弧度）
/// * `aspect` - 宽高比
/// * `near` / `far` - 近、远裁剪面
pub fn perspective_fov_lh(fov_y: f32, aspect: f32, near: f32, far: f32) -> Matrix4 {
    let h = 1.0 / (fov_y * 0.5).tan();
    let w = h / aspect;
    let range = far / (far - near);

    #[rustfmt::skip]
    let m = Matrix4::new(
        w,   0.0, 0.0,   0.0,
        0.0, h,   0.0,   0.0,
        0.0, 0.0, range, -range * near,
        0.0, 0.0, 1.0,   0.0,
    );
    m
}

/// 将点变换到齐次裁剪空间后做透视除法
pub fn project_point(m: &Matrix4, p: &Point3) -> Point3 {
    let clip = m * p.to_homogeneous();
    Point3::new(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_deg_to_rad() {
        assert!((deg_to_rad(180.0) - std::f32::consts::PI).abs() < EPS);
        assert!((deg_to_rad(90.0) - std::f32::consts::FRAC_PI_2).abs() < EPS);
    }

    #[test]
    fn test_rotation_y_matches_left_handed_convention() {
        // 绕 Y 轴旋转 90 度：+Z 转到 +X
        let r = rotation_y(std::f32::consts::FRAC_PI_2);
        let p = project_point(&r, &Point3::new(0.0, 0.0, 1.0));
        assert!((p.x - 1.0).abs() < EPS);
        assert!(p.z.abs() < EPS);
    }

    #[test]
    fn test_rotation_x() {
        // 绕 X 轴旋转 90 度：+Y 转到 +Z
        let r = rotation_x(std::f32::consts::FRAC_PI_2);
        let p = project_point(&r, &Point3::new(0.0, 1.0, 0.0));
        assert!((p.z - 1.0).abs() < EPS);
        assert!(p.y.abs() < EPS);
    }

    #[test]
    fn test_look_at_lh() {
        let eye = Point3::new(0.0, 0.0, -5.0);
        let view = look_at_lh(&eye, &Point3::origin(), &Vector3::y());

        let e = project_point(&view, &eye);
        assert!(e.coords.norm() < EPS);

        // 目标点在摄像机前方 +Z
        let t = project_point(&view, &Point3::origin());
        assert!((t.z - 5.0).abs() < EPS);
        assert!(t.x.abs() < EPS && t.y.abs() < EPS);
    }

    #[test]
    fn test_perspective_depth_range() {
        let proj = perspective_fov_lh(deg_to_rad(90.0), 4.0 / 3.0, 0.1, 100.0);

        let near = project_point(&proj, &Point3::new(0.0, 0.0, 0.1));
        let far = project_point(&proj, &Point3::new(0.0, 0.0, 100.0));
        assert!(near.z.abs() < EPS);
        assert!((far.z - 1.0).abs() < 1e-4);

        // 90 度视场角时，z=1 平面上的 y=1 恰好位于视锥上边界
        let edge = project_point(&proj, &Point3::new(0.0, 1.0, 1.0));
        assert!((edge.y - 1.0).abs() < EPS);
    }
}
