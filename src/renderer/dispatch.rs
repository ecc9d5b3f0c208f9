//! 计算着色器派发
//!
//! 线程组数量向上取整，保证宽高不是 8 的倍数时也能覆盖整个输出纹理。
//! 着色器内部需要丢弃越界的线程。

/// `uav_compute.hlsl` 中 `[numthreads(8, 8, 1)]` 的线程组尺寸
pub const COMPUTE_GROUP_SIZE: [u32; 2] = [8, 8];

/// 覆盖 `width x height` 所需的线程组数 `(x, y, z)`
pub fn dispatch_groups(width: u32, height: u32, group_size: [u32; 2]) -> (u32, u32, u32) {
    (
        width.div_ceil(group_size[0].max(1)),
        height.div_ceil(group_size[1].max(1)),
        1,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_multiple() {
        assert_eq!(dispatch_groups(800, 600, COMPUTE_GROUP_SIZE), (100, 75, 1));
    }

    #[test]
    fn test_partial_groups_round_up() {
        // 1 像素也需要一个线程组
        assert_eq!(dispatch_groups(1, 1, COMPUTE_GROUP_SIZE), (1, 1, 1));
        assert_eq!(dispatch_groups(801, 599, COMPUTE_GROUP_SIZE), (101, 75, 1));
    }

    #[test]
    fn test_zero_extent() {
        assert_eq!(dispatch_groups(0, 600, COMPUTE_GROUP_SIZE), (0, 75, 1));
    }
}
