/// Build script for d3d12_demos
///
/// # Shader Compilation Strategy:
/// - HLSL sources are embedded with `include_str!` and compiled at runtime via D3DCompile
/// - `assets.shader_dir` in config.toml overrides the embedded sources
fn main() {
    // Trigger rebuild if shader files change
    println!("cargo:rerun-if-changed=shaders/descriptor_table.hlsl");
    println!("cargo:rerun-if-changed=shaders/mvp_matrix.hlsl");
    println!("cargo:rerun-if-changed=shaders/uav_compute.hlsl");
}
