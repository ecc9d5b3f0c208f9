//! MVP 示例：彩色立方体，同一个矩阵以根常量、根 CBV 和描述符表三种方式绑定

use anyhow::Context;
use d3d12_demos::core::DemoKind;

fn main() -> anyhow::Result<()> {
    d3d12_demos::app::launch(Some(DemoKind::MvpMatrix)).context("mvp_matrix demo failed")
}
