//! 着色器源码模块
//!
//! HLSL 源码在编译期嵌入程序，配置了 `assets.shader_dir` 时优先从该目录读取，
//! 便于不重新编译程序就修改着色器。编译由 DX12 后端在运行时完成。

use std::borrow::Cow;
use std::path::Path;

use crate::core::error::{AssetError, Result};

/// 着色器阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Pixel,
    Compute,
}

impl ShaderStage {
    /// 入口函数名
    pub fn entry_point(&self) -> &'static str {
        match self {
            ShaderStage::Vertex => "VSMain",
            ShaderStage::Pixel => "PSMain",
            ShaderStage::Compute => "CSMain",
        }
    }

    /// 着色器模型 5.1（根签名中的寄存器空间需要 5.1）
    pub fn target(&self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vs_5_1",
            ShaderStage::Pixel => "ps_5_1",
            ShaderStage::Compute => "cs_5_1",
        }
    }
}

/// 示例使用的着色器程序
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderProgram {
    DescriptorTable,
    MvpMatrix,
    UavCompute,
}

impl ShaderProgram {
    pub fn file_name(&self) -> &'static str {
        match self {
            ShaderProgram::DescriptorTable => "descriptor_table.hlsl",
            ShaderProgram::MvpMatrix => "mvp_matrix.hlsl",
            ShaderProgram::UavCompute => "uav_compute.hlsl",
        }
    }

    /// 编译进程序的源码
    pub fn embedded_source(&self) -> &'static str {
        match self {
            ShaderProgram::DescriptorTable => include_str!("../../shaders/descriptor_table.hlsl"),
            ShaderProgram::MvpMatrix => include_str!("../../shaders/mvp_matrix.hlsl"),
            ShaderProgram::UavCompute => include_str!("../../shaders/uav_compute.hlsl"),
        }
    }

    /// 程序包含的阶段
    pub fn stages(&self) -> &'static [ShaderStage] {
        match self {
            ShaderProgram::DescriptorTable | ShaderProgram::MvpMatrix => {
                &[ShaderStage::Vertex, ShaderStage::Pixel]
            }
            ShaderProgram::UavCompute => &[ShaderStage::Compute],
        }
    }

    /// 读取源码
    ///
    /// `shader_dir` 为 `None` 时返回嵌入的源码；否则从目录读取，文件不存在视为错误。
    pub fn load(&self, shader_dir: Option<&Path>) -> Result<Cow<'static, str>> {
        let Some(dir) = shader_dir else {
            return Ok(Cow::Borrowed(self.embedded_source()));
        };

        let path = dir.join(self.file_name());
        if !path.exists() {
            return Err(AssetError::FileNotFound(path).into());
        }

        let source = std::fs::read_to_string(&path)?;
        tracing::debug!(path = %path.display(), "Shader source loaded from disk");
        Ok(Cow::Owned(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_sources_have_entry_points() {
        for program in [
            ShaderProgram::DescriptorTable,
            ShaderProgram::MvpMatrix,
            ShaderProgram::UavCompute,
        ] {
            let source = program.embedded_source();
            for stage in program.stages() {
                assert!(
                    source.contains(stage.entry_point()),
                    "{} lacks {}",
                    program.file_name(),
                    stage.entry_point()
                );
            }
        }
    }

    #[test]
    fn test_compute_thread_group_matches_dispatch() {
        let [x, y] = crate::renderer::dispatch::COMPUTE_GROUP_SIZE;
        let expected = format!("[numthreads({}, {}, 1)]", x, y);
        assert!(ShaderProgram::UavCompute.embedded_source().contains(&expected));
    }

    #[test]
    fn test_mvp_shader_declares_all_bindings() {
        let source = ShaderProgram::MvpMatrix.embedded_source();
        for register in ["register(b0)", "register(b1)", "register(b2)", "MVP_SOURCE"] {
            assert!(source.contains(register));
        }
    }

    #[test]
    fn test_load_embedded_and_from_dir() {
        let program = ShaderProgram::UavCompute;
        assert!(matches!(program.load(None).unwrap(), Cow::Borrowed(_)));

        let dir = std::env::temp_dir().join(format!("d3d12_demos_shaders_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(program.file_name()), "// custom").unwrap();

        let loaded = program.load(Some(&dir)).unwrap();
        assert_eq!(loaded, "// custom");

        // 目录中缺少的文件报错
        assert!(ShaderProgram::MvpMatrix.load(Some(&dir)).is_err());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_stage_targets() {
        assert_eq!(ShaderStage::Vertex.target(), "vs_5_1");
        assert_eq!(ShaderStage::Compute.entry_point(), "CSMain");
    }
}
