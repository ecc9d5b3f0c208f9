//! 根签名布局模块
//!
//! 用纯数据描述每个示例的根签名，DX12 后端据此序列化 `D3D12_ROOT_SIGNATURE_DESC`。
//! 这样根参数的顺序和寄存器分配可以在没有 GPU 的环境下测试。
//!
//! # 三个示例的根签名
//!
//! ```text
//! descriptor_table:  [0] Table { CBV b0, SRV t0 }      (ALL)      + s0 静态采样器
//! mvp_matrix:        [0] 16 x 32bit 常量 b0             (VERTEX)
//!                    [1] 根 CBV b1                      (VERTEX)
//!                    [2] Table { CBV b2 }               (VERTEX)
//! uav_compute:       [0] 1 x 32bit 常量 b0 (time)       (ALL)
//!                    [1] Table { UAV u0 }               (ALL)
//! ```

use crate::core::config::MvpBindingKind;

/// 着色器可见性
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderVisibility {
    All,
    Vertex,
    Pixel,
}

/// 描述符范围类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeType {
    Cbv,
    Srv,
    Uav,
}

/// 描述符表中的一段连续范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorRange {
    pub range_type: RangeType,
    /// 描述符个数
    pub count: u32,
    /// 起始寄存器（b/t/u 的编号）
    pub base_register: u32,
    /// 相对表起点的偏移（描述符个数）
    pub offset_in_table: u32,
}

impl DescriptorRange {
    pub const fn new(range_type: RangeType, base_register: u32, offset_in_table: u32) -> Self {
        Self {
            range_type,
            count: 1,
            base_register,
            offset_in_table,
        }
    }
}

/// 根参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootParameter {
    /// 直接存放在根签名中的 32 位常量
    Constants {
        register: u32,
        num_values: u32,
        visibility: ShaderVisibility,
    },
    /// 根描述符（常量缓冲区的 GPU 虚拟地址）
    Cbv {
        register: u32,
        visibility: ShaderVisibility,
    },
    /// 描述符表
    DescriptorTable {
        ranges: Vec<DescriptorRange>,
        visibility: ShaderVisibility,
    },
}

impl RootParameter {
    /// 在根签名中占用的 DWORD 数（上限 64）
    pub fn cost(&self) -> u32 {
        match self {
            RootParameter::Constants { num_values, .. } => *num_values,
            RootParameter::Cbv { .. } => 2,
            RootParameter::DescriptorTable { .. } => 1,
        }
    }

    pub fn visibility(&self) -> ShaderVisibility {
        match self {
            RootParameter::Constants { visibility, .. }
            | RootParameter::Cbv { visibility, .. }
            | RootParameter::DescriptorTable { visibility, .. } => *visibility,
        }
    }
}

/// 静态采样器：线性过滤 + 重复寻址
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticSampler {
    pub register: u32,
    pub visibility: ShaderVisibility,
}

/// 根签名布局
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootSignatureLayout {
    pub parameters: Vec<RootParameter>,
    pub static_samplers: Vec<StaticSampler>,
    /// 是否使用输入装配器（图形管线为 true，计算管线为 false）
    pub input_assembler: bool,
}

/// 根签名最多 64 个 DWORD
pub const MAX_ROOT_SIGNATURE_COST: u32 = 64;

impl RootSignatureLayout {
    /// 所有根参数的 DWORD 总数
    pub fn cost(&self) -> u32 {
        self.parameters.iter().map(RootParameter::cost).sum()
    }

    /// 检查布局是否合法
    ///
    /// 大小不超过 64 DWORD，且同一类寄存器不重复使用。
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.cost() > MAX_ROOT_SIGNATURE_COST {
            return Err(format!(
                "Root signature uses {} DWORDs (max {})",
                self.cost(),
                MAX_ROOT_SIGNATURE_COST
            ));
        }

        let mut used: Vec<(char, u32)> = Vec::new();
        for param in &self.parameters {
            let registers: Vec<(char, u32)> = match param {
                RootParameter::Constants { register, .. } | RootParameter::Cbv { register, .. } => {
                    vec![('b', *register)]
                }
                RootParameter::DescriptorTable { ranges, .. } => ranges
                    .iter()
                    .flat_map(|r| {
                        let class = match r.range_type {
                            RangeType::Cbv => 'b',
                            RangeType::Srv => 't',
                            RangeType::Uav => 'u',
                        };
                        (r.base_register..r.base_register + r.count).map(move |reg| (class, reg))
                    })
                    .collect(),
            };

            for reg in registers {
                if used.contains(&reg) {
                    return Err(format!("Register {}{} bound twice", reg.0, reg.1));
                }
                used.push(reg);
            }
        }

        Ok(())
    }

    /// 描述符表示例：一个表同时包含 CBV 和 SRV
    pub fn descriptor_table() -> Self {
        Self {
            parameters: vec![RootParameter::DescriptorTable {
                ranges: vec![
                    DescriptorRange::new(RangeType::Cbv, 0, 0),
                    DescriptorRange::new(RangeType::Srv, 0, 1),
                ],
                visibility: ShaderVisibility::All,
            }],
            static_samplers: vec![StaticSampler {
                register: 0,
                visibility: ShaderVisibility::Pixel,
            }],
            input_assembler: true,
        }
    }

    /// MVP 示例：同一个矩阵的三种绑定方式
    pub fn mvp_matrix() -> Self {
        Self {
            parameters: vec![
                RootParameter::Constants {
                    register: 0,
                    num_values: 16,
                    visibility: ShaderVisibility::Vertex,
                },
                RootParameter::Cbv {
                    register: 1,
                    visibility: ShaderVisibility::Vertex,
                },
                RootParameter::DescriptorTable {
                    ranges: vec![DescriptorRange::new(RangeType::Cbv, 2, 0)],
                    visibility: ShaderVisibility::Vertex,
                },
            ],
            static_samplers: Vec::new(),
            input_assembler: true,
        }
    }

    /// 计算示例：时间常量 + UAV 表
    pub fn compute() -> Self {
        Self {
            parameters: vec![
                RootParameter::Constants {
                    register: 0,
                    num_values: 1,
                    visibility: ShaderVisibility::All,
                },
                RootParameter::DescriptorTable {
                    ranges: vec![DescriptorRange::new(RangeType::Uav, 0, 0)],
                    visibility: ShaderVisibility::All,
                },
            ],
            static_samplers: Vec::new(),
            input_assembler: false,
        }
    }
}

/// MVP 示例中每种绑定方式的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MvpBinding {
    pub kind: MvpBindingKind,
    /// 根参数索引
    pub root_index: u32,
    /// HLSL 常量缓冲区寄存器 (b#)
    pub register: u32,
}

impl MvpBinding {
    pub const ROOT_CONSTANTS: MvpBinding = MvpBinding {
        kind: MvpBindingKind::RootConstants,
        root_index: 0,
        register: 0,
    };
    pub const ROOT_CBV: MvpBinding = MvpBinding {
        kind: MvpBindingKind::RootCbv,
        root_index: 1,
        register: 1,
    };
    pub const DESCRIPTOR_TABLE: MvpBinding = MvpBinding {
        kind: MvpBindingKind::DescriptorTable,
        root_index: 2,
        register: 2,
    };

    /// 三种方式，按根参数顺序
    pub const ALL: [MvpBinding; 3] = [Self::ROOT_CONSTANTS, Self::ROOT_CBV, Self::DESCRIPTOR_TABLE];

    pub fn of(kind: MvpBindingKind) -> Self {
        match kind {
            MvpBindingKind::RootConstants => Self::ROOT_CONSTANTS,
            MvpBindingKind::RootCbv => Self::ROOT_CBV,
            MvpBindingKind::DescriptorTable => Self::DESCRIPTOR_TABLE,
        }
    }

    /// 传给着色器编译器的 `MVP_SOURCE` 宏的值
    pub fn shader_define(&self) -> &'static str {
        match self.kind {
            MvpBindingKind::RootConstants => "0",
            MvpBindingKind::RootCbv => "1",
            MvpBindingKind::DescriptorTable => "2",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layouts_are_valid() {
        for layout in [
            RootSignatureLayout::descriptor_table(),
            RootSignatureLayout::mvp_matrix(),
            RootSignatureLayout::compute(),
        ] {
            assert!(layout.validate().is_ok(), "{:?}", layout);
        }
    }

    #[test]
    fn test_descriptor_table_layout() {
        let layout = RootSignatureLayout::descriptor_table();
        assert_eq!(layout.parameters.len(), 1);
        assert_eq!(layout.static_samplers.len(), 1);
        match &layout.parameters[0] {
            RootParameter::DescriptorTable { ranges, visibility } => {
                assert_eq!(*visibility, ShaderVisibility::All);
                assert_eq!(ranges[0].range_type, RangeType::Cbv);
                assert_eq!(ranges[1].range_type, RangeType::Srv);
                assert_eq!(ranges[1].offset_in_table, 1);
            }
            other => panic!("unexpected parameter {:?}", other),
        }
    }

    #[test]
    fn test_mvp_layout_cost() {
        // 16 常量 + 2 (根 CBV) + 1 (表)
        let layout = RootSignatureLayout::mvp_matrix();
        assert_eq!(layout.cost(), 19);
        assert!(layout
            .parameters
            .iter()
            .all(|p| p.visibility() == ShaderVisibility::Vertex));
    }

    #[test]
    fn test_compute_layout_has_no_input_assembler() {
        let layout = RootSignatureLayout::compute();
        assert!(!layout.input_assembler);
        assert_eq!(layout.cost(), 2);
    }

    #[test]
    fn test_validate_rejects_duplicate_register() {
        let layout = RootSignatureLayout {
            parameters: vec![
                RootParameter::Cbv { register: 0, visibility: ShaderVisibility::All },
                RootParameter::Constants { register: 0, num_values: 1, visibility: ShaderVisibility::All },
            ],
            static_samplers: Vec::new(),
            input_assembler: true,
        };
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_oversized() {
        let layout = RootSignatureLayout {
            parameters: vec![RootParameter::Constants {
                register: 0,
                num_values: 65,
                visibility: ShaderVisibility::All,
            }],
            static_samplers: Vec::new(),
            input_assembler: false,
        };
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_mvp_binding_matches_layout() {
        let layout = RootSignatureLayout::mvp_matrix();
        for binding in MvpBinding::ALL {
            let param = &layout.parameters[binding.root_index as usize];
            let register = match param {
                RootParameter::Constants { register, .. } | RootParameter::Cbv { register, .. } => *register,
                RootParameter::DescriptorTable { ranges, .. } => ranges[0].base_register,
            };
            assert_eq!(register, binding.register);
        }
        assert_eq!(MvpBinding::of(MvpBindingKind::RootCbv).shader_define(), "1");
    }
}
