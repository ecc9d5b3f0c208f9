//! 几何体模块
//!
//! 示例程序使用的顶点格式、网格容器和两种立方体。
//!
//! # 模块结构
//!
//! - `vertex`: 顶点数据结构与输入布局
//! - `mesh`: 顶点 + 索引网格
//! - `cube`: 彩色立方体与纹理立方体

pub mod cube;
pub mod mesh;
pub mod vertex;

pub use cube::{colored_cube, textured_cube};
pub use mesh::Mesh;
pub use vertex::{ColorVertex, TexturedVertex, VertexAttribute, VertexLayout};
