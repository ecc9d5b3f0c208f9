//! 场景模块
//!
//! 帧计时与旋转立方体的 MVP 矩阵。

use std::time::{Duration, Instant};

use crate::core::config::CameraConfig;
use crate::core::math::{self, Matrix4, Point3, Vector3};

/// 帧计时器
///
/// 记录程序启动以来的时间和帧数，每隔一段时间输出一次帧率。
pub struct FrameClock {
    start: Instant,
    frame_count: u64,
    report_start: Instant,
    report_frames: u64,
    report_interval: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_report_interval(Duration::from_secs(5))
    }

    pub fn with_report_interval(report_interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            start: now,
            frame_count: 0,
            report_start: now,
            report_frames: 0,
            report_interval,
        }
    }

    /// 程序启动以来的秒数
    pub fn elapsed(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// 记录一帧完成
    ///
    /// 距上次报告超过间隔时返回这段时间的平均帧率。
    pub fn tick(&mut self) -> Option<f64> {
        self.frame_count += 1;
        self.report_frames += 1;

        let window = self.report_start.elapsed();
        if window < self.report_interval {
            return None;
        }

        let fps = self.report_frames as f64 / window.as_secs_f64();
        tracing::debug!(frames = self.frame_count, fps = %format!("{:.1}", fps), "Frame rate");

        self.report_start = Instant::now();
        self.report_frames = 0;
        Some(fps)
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// 旋转立方体的模型矩阵
///
/// 先绕 Y 轴旋转 `t` 弧度，再绕 X 轴旋转 `t / 2` 弧度。
pub fn spinning_cube_model(t: f32) -> Matrix4 {
    math::rotation_x(t * 0.5) * math::rotation_y(t)
}

/// 观察矩阵
pub fn view_matrix(camera: &CameraConfig) -> Matrix4 {
    let eye = Point3::from(camera.eye);
    let target = Point3::from(camera.target);
    let up = Vector3::from(camera.up);
    math::look_at_lh(&eye, &target, &up)
}

/// 投影矩阵
pub fn projection_matrix(camera: &CameraConfig, aspect: f32) -> Matrix4 {
    math::perspective_fov_lh(
        math::deg_to_rad(camera.fov_degrees),
        aspect,
        camera.near,
        camera.far,
    )
}

/// 旋转立方体的 MVP 矩阵
///
/// 返回列主序的 16 个浮点数，可以直接写入常量缓冲区或根常量。
pub fn spinning_cube_mvp(elapsed: f32, aspect: f32, camera: &CameraConfig) -> [f32; 16] {
    let mvp = projection_matrix(camera, aspect) * view_matrix(camera) * spinning_cube_model(elapsed);

    let mut packed = [0.0f32; 16];
    packed.copy_from_slice(mvp.as_slice());
    packed
}

/// 宽高比，高度为 0（窗口最小化）时返回 1
pub fn aspect_ratio(width: u32, height: u32) -> f32 {
    if height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn unpack(m: &[f32; 16]) -> Matrix4 {
        Matrix4::from_column_slice(m)
    }

    #[test]
    fn test_model_at_zero_is_identity() {
        assert!((spinning_cube_model(0.0) - Matrix4::identity()).abs().max() < EPS);
    }

    #[test]
    fn test_model_rotation_order() {
        // +Z 先绕 Y 转 90 度到 +X，绕 X 轴再转不影响 +X
        let m = spinning_cube_model(std::f32::consts::FRAC_PI_2);
        let p = math::project_point(&m, &Point3::new(0.0, 0.0, 1.0));
        assert!((p.x - 1.0).abs() < EPS);
        assert!(p.y.abs() < EPS && p.z.abs() < EPS);
    }

    #[test]
    fn test_cube_center_projects_inside_depth_range() {
        let camera = CameraConfig::default();
        let mvp = unpack(&spinning_cube_mvp(1.3, 800.0 / 600.0, &camera));
        let center = math::project_point(&mvp, &Point3::origin());

        assert!(center.x.abs() < EPS && center.y.abs() < EPS);
        assert!(center.z > 0.0 && center.z < 1.0);
    }

    #[test]
    fn test_cube_is_fully_visible() {
        let camera = CameraConfig::default();
        for step in 0..16 {
            let t = step as f32 * 0.4;
            let mvp = unpack(&spinning_cube_mvp(t, 800.0 / 600.0, &camera));
            for corner in [
                [-1.0, -1.0, -1.0], [1.0, 1.0, 1.0], [1.0, -1.0, 1.0], [-1.0, 1.0, -1.0],
            ] {
                let p = math::project_point(&mvp, &Point3::from(corner));
                assert!(p.x.abs() <= 1.0 && p.y.abs() <= 1.0, "corner {:?} clipped at t={}", corner, t);
                assert!(p.z > 0.0 && p.z < 1.0);
            }
        }
    }

    #[test]
    fn test_packing_is_column_major() {
        let camera = CameraConfig::default();
        let packed = spinning_cube_mvp(0.0, 1.0, &camera);
        // 在 t=0、宽高比为 1 时，第 4 列（平移）的 w 分量等于摄像机到原点的距离
        assert!((packed[15] - 5.0).abs() < EPS);
        // 第 3 列的 w 分量来自投影矩阵的 [3][2] = 1
        assert!((packed[11] - 1.0).abs() < EPS);
    }

    #[test]
    fn test_aspect_ratio() {
        assert!((aspect_ratio(800, 600) - 4.0 / 3.0).abs() < EPS);
        assert_eq!(aspect_ratio(800, 0), 1.0);
    }

    #[test]
    fn test_frame_clock_reports() {
        let mut clock = FrameClock::with_report_interval(Duration::ZERO);
        assert!(clock.tick().is_some());
        assert_eq!(clock.frame_count(), 1);

        let mut clock = FrameClock::with_report_interval(Duration::from_secs(3600));
        assert!(clock.tick().is_none());
        assert!(clock.elapsed() >= 0.0);
    }
}
