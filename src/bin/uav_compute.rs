//! UAV 示例：计算着色器写入纹理并拷贝到后缓冲

use anyhow::Context;
use d3d12_demos::core::DemoKind;

fn main() -> anyhow::Result<()> {
    d3d12_demos::app::launch(Some(DemoKind::UavCompute)).context("uav_compute demo failed")
}
