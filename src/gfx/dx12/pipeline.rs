//! DirectX 12 管线创建
//!
//! 着色器运行时编译（D3DCompile）、根签名序列化，以及图形 / 计算 PSO。

use std::ffi::CString;

use windows::core::PCSTR;
use windows::Win32::Graphics::Direct3D::Fxc::*;
use windows::Win32::Graphics::Direct3D::*;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;

use crate::core::error::{DemoError, GraphicsError, Result};
use crate::geometry::VertexAttribute;
use crate::renderer::binding::{
    RangeType, RootParameter, RootSignatureLayout, ShaderVisibility, StaticSampler,
};
use crate::renderer::shader::ShaderStage;

/// 渲染目标格式，与交换链一致
pub const RENDER_TARGET_FORMAT: DXGI_FORMAT = DXGI_FORMAT_R8G8B8A8_UNORM;

/// 深度缓冲格式
pub const DEPTH_FORMAT: DXGI_FORMAT = DXGI_FORMAT_D32_FLOAT;

/// Blob 内容
fn blob_bytes(blob: &ID3DBlob) -> &[u8] {
    unsafe { std::slice::from_raw_parts(blob.GetBufferPointer() as *const u8, blob.GetBufferSize()) }
}

fn blob_message(blob: &ID3DBlob) -> String {
    String::from_utf8_lossy(blob_bytes(blob))
        .trim_end_matches('\0')
        .trim()
        .to_string()
}

fn c_string(value: &str) -> Result<CString> {
    CString::new(value)
        .map_err(|_| DemoError::Runtime(format!("String contains a NUL byte: {:?}", value)))
}

/// 编译 HLSL 着色器
///
/// # 参数
///
/// * `source` - HLSL 源码
/// * `source_name` - 出现在编译错误中的文件名
/// * `stage` - 决定入口函数和着色器模型
/// * `defines` - 预处理宏（名称, 值）
///
/// Debug 构建关闭优化并附带调试信息，便于在 PIX 中查看。
pub fn compile_shader(
    source: &str,
    source_name: &str,
    stage: ShaderStage,
    defines: &[(&str, &str)],
) -> Result<ID3DBlob> {
    let entry = c_string(stage.entry_point())?;
    let target = c_string(stage.target())?;
    let name = c_string(source_name)?;

    // 宏数组以 {NULL, NULL} 结尾
    let define_strings = defines
        .iter()
        .map(|(k, v)| Ok((c_string(k)?, c_string(v)?)))
        .collect::<Result<Vec<_>>>()?;
    let mut macros: Vec<D3D_SHADER_MACRO> = define_strings
        .iter()
        .map(|(k, v)| D3D_SHADER_MACRO {
            Name: PCSTR(k.as_ptr() as *const u8),
            Definition: PCSTR(v.as_ptr() as *const u8),
        })
        .collect();
    macros.push(D3D_SHADER_MACRO::default());

    let flags = if cfg!(debug_assertions) {
        D3DCOMPILE_DEBUG | D3DCOMPILE_SKIP_OPTIMIZATION
    } else {
        0
    };

    let mut code: Option<ID3DBlob> = None;
    let mut errors: Option<ID3DBlob> = None;

    let result = unsafe {
        D3DCompile(
            source.as_ptr() as _,
            source.len(),
            PCSTR(name.as_ptr() as *const u8),
            Some(macros.as_ptr()),
            None,
            PCSTR(entry.as_ptr() as *const u8),
            PCSTR(target.as_ptr() as *const u8),
            flags,
            0,
            &mut code,
            Some(&mut errors),
        )
    };

    if let Err(e) = result {
        let message = errors
            .as_ref()
            .map(blob_message)
            .unwrap_or_else(|| e.message().to_string());
        return Err(GraphicsError::ShaderCompilation {
            entry: format!("{}:{}", source_name, stage.entry_point()),
            message,
        }
        .into());
    }

    // 警告也写入错误 blob
    if let Some(warnings) = errors.as_ref() {
        let text = blob_message(warnings);
        if !text.is_empty() {
            tracing::warn!(shader = source_name, "{}", text);
        }
    }

    let code = code.ok_or_else(|| GraphicsError::ShaderCompilation {
        entry: format!("{}:{}", source_name, stage.entry_point()),
        message: "Compiler returned no bytecode".to_string(),
    })?;

    tracing::debug!(
        shader = source_name,
        entry = stage.entry_point(),
        target = stage.target(),
        bytes = code_size(&code),
        "Shader compiled"
    );
    Ok(code)
}

fn code_size(blob: &ID3DBlob) -> usize {
    unsafe { blob.GetBufferSize() }
}

fn shader_bytecode(blob: &ID3DBlob) -> D3D12_SHADER_BYTECODE {
    unsafe {
        D3D12_SHADER_BYTECODE {
            pShaderBytecode: blob.GetBufferPointer(),
            BytecodeLength: blob.GetBufferSize(),
        }
    }
}

fn visibility(v: ShaderVisibility) -> D3D12_SHADER_VISIBILITY {
    match v {
        ShaderVisibility::All => D3D12_SHADER_VISIBILITY_ALL,
        ShaderVisibility::Vertex => D3D12_SHADER_VISIBILITY_VERTEX,
        ShaderVisibility::Pixel => D3D12_SHADER_VISIBILITY_PIXEL,
    }
}

fn range_type(t: RangeType) -> D3D12_DESCRIPTOR_RANGE_TYPE {
    match t {
        RangeType::Cbv => D3D12_DESCRIPTOR_RANGE_TYPE_CBV,
        RangeType::Srv => D3D12_DESCRIPTOR_RANGE_TYPE_SRV,
        RangeType::Uav => D3D12_DESCRIPTOR_RANGE_TYPE_UAV,
    }
}

/// 线性过滤、重复寻址的静态采样器
fn static_sampler(sampler: &StaticSampler) -> D3D12_STATIC_SAMPLER_DESC {
    D3D12_STATIC_SAMPLER_DESC {
        Filter: D3D12_FILTER_MIN_MAG_MIP_LINEAR,
        AddressU: D3D12_TEXTURE_ADDRESS_MODE_WRAP,
        AddressV: D3D12_TEXTURE_ADDRESS_MODE_WRAP,
        AddressW: D3D12_TEXTURE_ADDRESS_MODE_WRAP,
        MipLODBias: 0.0,
        MaxAnisotropy: 1,
        ComparisonFunc: D3D12_COMPARISON_FUNC_ALWAYS,
        BorderColor: D3D12_STATIC_BORDER_COLOR_OPAQUE_WHITE,
        MinLOD: 0.0,
        MaxLOD: f32::MAX,
        ShaderRegister: sampler.register,
        RegisterSpace: 0,
        ShaderVisibility: visibility(sampler.visibility),
    }
}

/// 根据布局创建根签名
pub fn create_root_signature(
    device: &ID3D12Device,
    layout: &RootSignatureLayout,
) -> Result<ID3D12RootSignature> {
    layout.validate().map_err(GraphicsError::RootSignature)?;

    // 描述符范围数组要在序列化期间保持有效
    let ranges: Vec<Vec<D3D12_DESCRIPTOR_RANGE>> = layout
        .parameters
        .iter()
        .map(|param| match param {
            RootParameter::DescriptorTable { ranges, .. } => ranges
                .iter()
                .map(|r| D3D12_DESCRIPTOR_RANGE {
                    RangeType: range_type(r.range_type),
                    NumDescriptors: r.count,
                    BaseShaderRegister: r.base_register,
                    RegisterSpace: 0,
                    OffsetInDescriptorsFromTableStart: r.offset_in_table,
                })
                .collect(),
            _ => Vec::new(),
        })
        .collect();

    let parameters: Vec<D3D12_ROOT_PARAMETER> = layout
        .parameters
        .iter()
        .zip(&ranges)
        .map(|(param, table_ranges)| match param {
            RootParameter::Constants {
                register,
                num_values,
                visibility: v,
            } => D3D12_ROOT_PARAMETER {
                ParameterType: D3D12_ROOT_PARAMETER_TYPE_32BIT_CONSTANTS,
                Anonymous: D3D12_ROOT_PARAMETER_0 {
                    Constants: D3D12_ROOT_CONSTANTS {
                        ShaderRegister: *register,
                        RegisterSpace: 0,
                        Num32BitValues: *num_values,
                    },
                },
                ShaderVisibility: visibility(*v),
            },
            RootParameter::Cbv {
                register,
                visibility: v,
            } => D3D12_ROOT_PARAMETER {
                ParameterType: D3D12_ROOT_PARAMETER_TYPE_CBV,
                Anonymous: D3D12_ROOT_PARAMETER_0 {
                    Descriptor: D3D12_ROOT_DESCRIPTOR {
                        ShaderRegister: *register,
                        RegisterSpace: 0,
                    },
                },
                ShaderVisibility: visibility(*v),
            },
            RootParameter::DescriptorTable { visibility: v, .. } => D3D12_ROOT_PARAMETER {
                ParameterType: D3D12_ROOT_PARAMETER_TYPE_DESCRIPTOR_TABLE,
                Anonymous: D3D12_ROOT_PARAMETER_0 {
                    DescriptorTable: D3D12_ROOT_DESCRIPTOR_TABLE {
                        NumDescriptorRanges: table_ranges.len() as u32,
                        pDescriptorRanges: table_ranges.as_ptr(),
                    },
                },
                ShaderVisibility: visibility(*v),
            },
        })
        .collect();

    let samplers: Vec<D3D12_STATIC_SAMPLER_DESC> =
        layout.static_samplers.iter().map(static_sampler).collect();

    let desc = D3D12_ROOT_SIGNATURE_DESC {
        NumParameters: parameters.len() as u32,
        pParameters: parameters.as_ptr(),
        NumStaticSamplers: samplers.len() as u32,
        pStaticSamplers: samplers.as_ptr(),
        Flags: if layout.input_assembler {
            D3D12_ROOT_SIGNATURE_FLAG_ALLOW_INPUT_ASSEMBLER_INPUT_LAYOUT
        } else {
            D3D12_ROOT_SIGNATURE_FLAG_NONE
        },
    };

    unsafe {
        let mut signature: Option<ID3DBlob> = None;
        let mut errors: Option<ID3DBlob> = None;
        if let Err(e) = D3D12SerializeRootSignature(
            &desc,
            D3D_ROOT_SIGNATURE_VERSION_1,
            &mut signature,
            Some(&mut errors),
        ) {
            let message = errors
                .as_ref()
                .map(blob_message)
                .unwrap_or_else(|| e.message().to_string());
            return Err(GraphicsError::RootSignature(format!(
                "Failed to serialize root signature: {}",
                message
            ))
            .into());
        }

        let signature = signature.ok_or_else(|| {
            GraphicsError::RootSignature("Serializer returned no blob".to_string())
        })?;

        let root_signature: ID3D12RootSignature = device
            .CreateRootSignature(0, blob_bytes(&signature))
            .map_err(|e| {
                GraphicsError::RootSignature(format!(
                    "Failed to create root signature: {}",
                    e.message()
                ))
            })?;

        tracing::debug!(
            parameters = layout.parameters.len(),
            samplers = layout.static_samplers.len(),
            cost = layout.cost(),
            "Root signature created"
        );
        Ok(root_signature)
    }
}

fn attribute_format(components: u32) -> Result<DXGI_FORMAT> {
    match components {
        1 => Ok(DXGI_FORMAT_R32_FLOAT),
        2 => Ok(DXGI_FORMAT_R32G32_FLOAT),
        3 => Ok(DXGI_FORMAT_R32G32B32_FLOAT),
        4 => Ok(DXGI_FORMAT_R32G32B32A32_FLOAT),
        n => Err(GraphicsError::Pipeline(format!(
            "Unsupported vertex attribute with {} components",
            n
        ))
        .into()),
    }
}

/// 图形管线参数
pub struct GraphicsPipelineDesc<'a> {
    pub root_signature: &'a ID3D12RootSignature,
    pub vertex_shader: &'a ID3DBlob,
    pub pixel_shader: &'a ID3DBlob,
    pub attributes: &'static [VertexAttribute],
    /// 开启深度测试（LESS）并写入 D32 深度缓冲
    pub depth: bool,
}

/// 创建图形 PSO
///
/// 背面剔除，三角形列表，单个 R8G8B8A8 渲染目标。
pub fn create_graphics_pipeline(
    device: &ID3D12Device,
    desc: &GraphicsPipelineDesc<'_>,
) -> Result<ID3D12PipelineState> {
    // 语义名字符串要在创建 PSO 期间保持有效
    let semantics = desc
        .attributes
        .iter()
        .map(|a| c_string(a.semantic))
        .collect::<Result<Vec<_>>>()?;

    let input_elements = desc
        .attributes
        .iter()
        .zip(&semantics)
        .map(|(attribute, semantic)| {
            Ok(D3D12_INPUT_ELEMENT_DESC {
                SemanticName: PCSTR(semantic.as_ptr() as *const u8),
                SemanticIndex: 0,
                Format: attribute_format(attribute.components)?,
                InputSlot: 0,
                AlignedByteOffset: attribute.offset,
                InputSlotClass: D3D12_INPUT_CLASSIFICATION_PER_VERTEX_DATA,
                InstanceDataStepRate: 0,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut pso_desc = D3D12_GRAPHICS_PIPELINE_STATE_DESC::default();
    // 不增加引用计数，根签名由调用方持有
    pso_desc.pRootSignature = unsafe { std::mem::transmute_copy(desc.root_signature) };
    pso_desc.VS = shader_bytecode(desc.vertex_shader);
    pso_desc.PS = shader_bytecode(desc.pixel_shader);
    pso_desc.BlendState = D3D12_BLEND_DESC {
        AlphaToCoverageEnable: false.into(),
        IndependentBlendEnable: false.into(),
        RenderTarget: [D3D12_RENDER_TARGET_BLEND_DESC {
            BlendEnable: false.into(),
            LogicOpEnable: false.into(),
            SrcBlend: D3D12_BLEND_ONE,
            DestBlend: D3D12_BLEND_ZERO,
            BlendOp: D3D12_BLEND_OP_ADD,
            SrcBlendAlpha: D3D12_BLEND_ONE,
            DestBlendAlpha: D3D12_BLEND_ZERO,
            BlendOpAlpha: D3D12_BLEND_OP_ADD,
            LogicOp: D3D12_LOGIC_OP_NOOP,
            RenderTargetWriteMask: D3D12_COLOR_WRITE_ENABLE_ALL.0 as u8,
        }; 8],
    };
    pso_desc.RasterizerState = D3D12_RASTERIZER_DESC {
        FillMode: D3D12_FILL_MODE_SOLID,
        CullMode: D3D12_CULL_MODE_BACK,
        FrontCounterClockwise: false.into(),
        DepthBias: 0,
        DepthBiasClamp: 0.0,
        SlopeScaledDepthBias: 0.0,
        DepthClipEnable: true.into(),
        MultisampleEnable: false.into(),
        AntialiasedLineEnable: false.into(),
        ForcedSampleCount: 0,
        ConservativeRaster: D3D12_CONSERVATIVE_RASTERIZATION_MODE_OFF,
    };
    pso_desc.DepthStencilState = D3D12_DEPTH_STENCIL_DESC {
        DepthEnable: desc.depth.into(),
        DepthWriteMask: if desc.depth {
            D3D12_DEPTH_WRITE_MASK_ALL
        } else {
            D3D12_DEPTH_WRITE_MASK_ZERO
        },
        DepthFunc: D3D12_COMPARISON_FUNC_LESS,
        StencilEnable: false.into(),
        StencilReadMask: 0xFF,
        StencilWriteMask: 0xFF,
        FrontFace: D3D12_DEPTH_STENCILOP_DESC::default(),
        BackFace: D3D12_DEPTH_STENCILOP_DESC::default(),
    };
    pso_desc.SampleMask = u32::MAX;
    pso_desc.DSVFormat = if desc.depth {
        DEPTH_FORMAT
    } else {
        DXGI_FORMAT_UNKNOWN
    };
    pso_desc.InputLayout = D3D12_INPUT_LAYOUT_DESC {
        pInputElementDescs: input_elements.as_ptr(),
        NumElements: input_elements.len() as u32,
    };
    pso_desc.PrimitiveTopologyType = D3D12_PRIMITIVE_TOPOLOGY_TYPE_TRIANGLE;
    pso_desc.NumRenderTargets = 1;
    pso_desc.RTVFormats[0] = RENDER_TARGET_FORMAT;
    pso_desc.SampleDesc.Count = 1;

    let pso: ID3D12PipelineState = unsafe {
        device.CreateGraphicsPipelineState(&pso_desc).map_err(|e| {
            GraphicsError::Pipeline(format!(
                "Failed to create graphics pipeline: {}",
                e.message()
            ))
        })?
    };

    tracing::debug!(
        inputs = input_elements.len(),
        depth = desc.depth,
        "Graphics pipeline created"
    );
    Ok(pso)
}

/// 创建计算 PSO
pub fn create_compute_pipeline(
    device: &ID3D12Device,
    root_signature: &ID3D12RootSignature,
    compute_shader: &ID3DBlob,
) -> Result<ID3D12PipelineState> {
    let pso_desc = D3D12_COMPUTE_PIPELINE_STATE_DESC {
        pRootSignature: unsafe { std::mem::transmute_copy(root_signature) },
        CS: shader_bytecode(compute_shader),
        NodeMask: 0,
        CachedPSO: D3D12_CACHED_PIPELINE_STATE::default(),
        Flags: D3D12_PIPELINE_STATE_FLAG_NONE,
    };

    let pso: ID3D12PipelineState = unsafe {
        device.CreateComputePipelineState(&pso_desc).map_err(|e| {
            GraphicsError::Pipeline(format!(
                "Failed to create compute pipeline: {}",
                e.message()
            ))
        })?
    };

    tracing::debug!("Compute pipeline created");
    Ok(pso)
}
