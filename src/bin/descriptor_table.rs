//! 描述符表示例：纹理立方体，MVP 常量缓冲区与纹理 SRV 共用一个描述符表

use anyhow::Context;
use d3d12_demos::core::DemoKind;

fn main() -> anyhow::Result<()> {
    d3d12_demos::app::launch(Some(DemoKind::DescriptorTable)).context("descriptor_table demo failed")
}
