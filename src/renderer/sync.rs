//! GPU 同步模块
//!
//! 每个示例只有一个 Fence：提交命令后 signal 下一个值，CPU 阻塞等待该值完成，
//! 之后才开始录制下一帧。本模块跟踪 CPU 侧的 Fence 值，
//! 实际的 signal / wait 调用由 DX12 后端完成。

use std::fmt;

/// Fence 值
///
/// 单调递增。0 表示 Fence 的初始值，从未被 signal 过。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FenceValue(u64);

impl FenceValue {
    pub const INITIAL: FenceValue = FenceValue(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// 下一个Fence值
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for FenceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fence 管理器
///
/// ```rust
/// use d3d12_demos::renderer::sync::FenceManager;
///
/// let mut fences = FenceManager::new();
/// let value = fences.signal();          // 对应 queue.Signal(fence, value)
/// assert!(fences.must_wait(value));     // GetCompletedValue() 还没到
/// fences.observe_completed(value);      // 等待事件返回后
/// assert!(fences.is_idle());
/// ```
#[derive(Debug, Default)]
pub struct FenceManager {
    /// 最近一次 signal 的值（CPU 侧）
    signaled: FenceValue,
    /// 已知 GPU 完成的值
    completed: FenceValue,
    /// 总共等待的次数
    waits: u64,
}

impl FenceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 最近一次 signal 的值
    pub fn last_signaled(&self) -> FenceValue {
        self.signaled
    }

    /// 已知完成的值
    pub fn completed(&self) -> FenceValue {
        self.completed
    }

    /// 分配下一个要 signal 的值
    pub fn signal(&mut self) -> FenceValue {
        self.signaled = self.signaled.next();
        self.signaled
    }

    /// 记录 GPU 报告的完成值
    ///
    /// Fence 值只会前进，较旧的观测值被忽略。
    pub fn observe_completed(&mut self, value: FenceValue) {
        if value > self.completed {
            self.completed = value;
        }
    }

    /// 是否需要阻塞等待 `value`
    pub fn must_wait(&self, value: FenceValue) -> bool {
        self.completed < value
    }

    /// 记录一次阻塞等待
    pub fn record_wait(&mut self) {
        self.waits += 1;
    }

    pub fn wait_count(&self) -> u64 {
        self.waits
    }

    /// 所有已提交的工作是否都已完成
    pub fn is_idle(&self) -> bool {
        self.completed >= self.signaled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fence_value() {
        let fence = FenceValue::new(1);
        assert_eq!(fence.next().value(), 2);
        assert_eq!(fence.value(), 1);
        assert_eq!(FenceValue::default(), FenceValue::INITIAL);
        assert_eq!(fence.to_string(), "1");
    }

    #[test]
    fn test_one_wait_per_frame() {
        let mut fences = FenceManager::new();
        assert!(fences.is_idle());

        for frame in 1..=3u64 {
            let value = fences.signal();
            assert_eq!(value.value(), frame);
            assert!(!fences.is_idle());
            assert!(fences.must_wait(value));

            fences.record_wait();
            fences.observe_completed(value);
            assert!(fences.is_idle());
        }

        assert_eq!(fences.wait_count(), 3);
    }

    #[test]
    fn test_completed_never_goes_backwards() {
        let mut fences = FenceManager::new();
        let first = fences.signal();
        let second = fences.signal();

        fences.observe_completed(second);
        fences.observe_completed(first);

        assert_eq!(fences.completed(), second);
        assert!(!fences.must_wait(first));
    }
}
