//! 纹理数据模块
//!
//! 使用 `image` crate 把图片解码为 RGBA8 像素，供 DX12 后端上传。
//! 配置的纹理文件不存在时，示例程序使用程序生成的棋盘格纹理。

use std::path::Path;

use crate::core::error::{AssetError, Result};

/// CPU 侧的 RGBA8 纹理数据
///
/// 像素按行紧密排列，左上角为第一个像素。
#[derive(Debug, Clone)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl TextureData {
    /// 每像素字节数（`DXGI_FORMAT_R8G8B8A8_UNORM`）
    pub const BYTES_PER_PIXEL: u32 = 4;

    /// 从文件加载并转换为 RGBA8
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AssetError::FileNotFound(path.to_path_buf()).into());
        }

        let image = image::open(path).map_err(|e| AssetError::ImageDecode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba(width, height, rgba.into_raw())
    }

    /// 从内存中的 RGBA8 像素创建
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(AssetError::InvalidData(format!(
                "Texture has zero size: {}x{}",
                width, height
            ))
            .into());
        }

        let expected = Self::byte_len(width, height);
        if pixels.len() != expected {
            return Err(AssetError::InvalidData(format!(
                "Texture {}x{} needs {} bytes, got {}",
                width,
                height,
                expected,
                pixels.len()
            ))
            .into());
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// 生成棋盘格纹理
    ///
    /// `cells` 为每行（每列）的格子数，两种颜色交替。
    pub fn checkerboard(size: u32, cells: u32, a: [u8; 4], b: [u8; 4]) -> Self {
        let size = size.max(1);
        let cell = (size / cells.max(1)).max(1);

        let mut pixels = Vec::with_capacity(Self::byte_len(size, size));
        for y in 0..size {
            for x in 0..size {
                let color = if ((x / cell) + (y / cell)) % 2 == 0 { a } else { b };
                pixels.extend_from_slice(&color);
            }
        }

        Self {
            width: size,
            height: size,
            pixels,
        }
    }

    /// 加载纹理，失败时退回棋盘格
    pub fn load_or_checkerboard<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(texture) => {
                tracing::info!(
                    path = %path.display(),
                    width = texture.width,
                    height = texture.height,
                    "Texture loaded"
                );
                texture
            }
            Err(e) => {
                tracing::warn!("{}; using generated checkerboard", e);
                Self::checkerboard(256, 8, [0xE0, 0x8A, 0x3C, 0xFF], [0x40, 0x40, 0x48, 0xFF])
            }
        }
    }

    /// 某个像素的 RGBA 值
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = Self::pixel_offset(self.width, x, y);
        let mut rgba = [0u8; 4];
        rgba.copy_from_slice(&self.pixels[offset..offset + 4]);
        Some(rgba)
    }

    /// `width x height` 纹理的像素字节数
    fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * Self::BYTES_PER_PIXEL as usize
    }

    /// 像素 (x, y) 在紧密排列数据中的字节偏移
    fn pixel_offset(width: u32, x: u32, y: u32) -> usize {
        (y as usize * width as usize + x as usize) * Self::BYTES_PER_PIXEL as usize
    }

    /// 紧密排列时每行字节数
    pub fn row_size(&self) -> u64 {
        self.width as u64 * Self::BYTES_PER_PIXEL as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: [u8; 4] = [255, 255, 255, 255];
    const BLACK: [u8; 4] = [0, 0, 0, 255];

    #[test]
    fn test_checkerboard() {
        let tex = TextureData::checkerboard(8, 2, WHITE, BLACK);
        assert_eq!(tex.width, 8);
        assert_eq!(tex.pixels.len(), 8 * 8 * 4);
        assert_eq!(tex.pixel(0, 0), Some(WHITE));
        assert_eq!(tex.pixel(4, 0), Some(BLACK));
        assert_eq!(tex.pixel(4, 4), Some(WHITE));
        assert_eq!(tex.pixel(8, 0), None);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_large_texture_offsets() {
        // 40000 x 30000 x 4 超出 u32 范围
        assert_eq!(TextureData::byte_len(40_000, 30_000), 4_800_000_000);
        assert_eq!(
            TextureData::pixel_offset(40_000, 39_999, 29_999),
            4_800_000_000 - 4
        );
        assert_eq!(TextureData::byte_len(65_536, 65_536), 1 << 34);
    }

    #[test]
    fn test_from_rgba_validates() {
        assert!(TextureData::from_rgba(2, 2, vec![0; 16]).is_ok());
        assert!(TextureData::from_rgba(2, 2, vec![0; 15]).is_err());
        assert!(TextureData::from_rgba(0, 2, vec![]).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = TextureData::load("no/such/texture.png").unwrap_err();
        assert!(err.to_string().contains("texture.png"));

        let fallback = TextureData::load_or_checkerboard("no/such/texture.png");
        assert_eq!(fallback.width, 256);
        assert_eq!(fallback.row_size(), 1024);
    }

    #[test]
    fn test_load_png_round_trip() {
        let path = std::env::temp_dir().join(format!("d3d12_demos_tex_{}.png", std::process::id()));
        let mut img = image::RgbaImage::new(3, 2);
        img.put_pixel(2, 1, image::Rgba([10, 20, 30, 255]));
        img.save(&path).unwrap();

        let tex = TextureData::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!((tex.width, tex.height), (3, 2));
        assert_eq!(tex.pixel(2, 1), Some([10, 20, 30, 255]));
    }
}
