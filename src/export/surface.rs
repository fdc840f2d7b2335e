//! # 光栅表面模块
//!
//! ## 设计思路
//!
//! 对应浏览器中的离屏 `canvas`：
//! - `RasterSurfaceFactory` 按像素尺寸创建表面
//! - `RasterSurface::context_2d` 获取 2D 绘图上下文，可能不可用
//! - `DrawingContext2d::draw_image` 以 1:1 方式绘制解码结果
//! - `RasterSurface::to_data_url` 按 MIME 类型编码为 Data URI
//!
//! ## 实现思路
//!
//! 默认实现 `PixmapSurface` 基于 `tiny_skia::Pixmap`，编码交给 `image`：
//! - PNG / WebP（无损）：反预乘后按 RGBA 编码
//! - JPEG：直接取预乘后的 RGB，相当于合成到黑色背景上，与 canvas 行为一致
//! - 其他类型回退为 PNG，返回的 Data URI 也标记为 `image/png`

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use resvg::tiny_skia;

use super::ExportError;
use super::options::RasterFormat;
use super::source::DecodedImage;
use crate::data_uri::DataUri;

/// 2D 绘图上下文。
pub trait DrawingContext2d {
    /// 在 `(dx, dy)` 处按原尺寸绘制图像。
    fn draw_image(&mut self, image: &DecodedImage, dx: i32, dy: i32);
}

/// 离屏光栅表面。
pub trait RasterSurface: Send {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// 获取 2D 绘图上下文；不可用时返回 `None`。
    fn context_2d(&mut self) -> Option<&mut dyn DrawingContext2d>;

    /// 将表面内容编码为 Data URI。
    fn to_data_url(&self, mime_type: &str, jpeg_quality: u8) -> Result<String, ExportError>;
}

/// 光栅表面工厂。
pub trait RasterSurfaceFactory: Send + Sync {
    fn create_surface(&self, width: u32, height: u32) -> Result<Box<dyn RasterSurface>, ExportError>;
}

/// 默认工厂，创建基于 `tiny_skia` 的表面。
#[derive(Debug, Default, Clone, Copy)]
pub struct PixmapSurfaceFactory;

impl RasterSurfaceFactory for PixmapSurfaceFactory {
    fn create_surface(&self, width: u32, height: u32) -> Result<Box<dyn RasterSurface>, ExportError> {
        Ok(Box::new(PixmapSurface::new(width, height)?))
    }
}

/// 基于 `tiny_skia::Pixmap` 的表面，初始为全透明。
pub struct PixmapSurface {
    pixmap: tiny_skia::Pixmap,
}

impl PixmapSurface {
    pub fn new(width: u32, height: u32) -> Result<Self, ExportError> {
        let pixmap = tiny_skia::Pixmap::new(width, height).ok_or_else(|| {
            ExportError::SurfaceUnavailable(format!("无法创建 {}x{} 的光栅表面", width, height))
        })?;
        Ok(Self { pixmap })
    }

    pub fn encode(&self, format: RasterFormat, jpeg_quality: u8) -> Result<Vec<u8>, ExportError> {
        let mut cursor = Cursor::new(Vec::new());

        match format {
            RasterFormat::Png | RasterFormat::WebP => {
                let image_format = match format {
                    RasterFormat::WebP => ImageFormat::WebP,
                    _ => ImageFormat::Png,
                };
                DynamicImage::ImageRgba8(self.to_straight_rgba()?)
                    .write_to(&mut cursor, image_format)
                    .map_err(|e| ExportError::Encode(format!("{} 编码失败：{}", format.mime_type(), e)))?;
            }
            RasterFormat::Jpeg => {
                let rgb = self.to_rgb_over_black()?;
                JpegEncoder::new_with_quality(&mut cursor, jpeg_quality)
                    .encode_image(&rgb)
                    .map_err(|e| ExportError::Encode(format!("image/jpeg 编码失败：{}", e)))?;
            }
        }

        Ok(cursor.into_inner())
    }

    fn to_straight_rgba(&self) -> Result<RgbaImage, ExportError> {
        let mut raw = Vec::with_capacity(self.pixmap.data().len());
        for pixel in self.pixmap.pixels() {
            let color = pixel.demultiply();
            raw.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
        }

        RgbaImage::from_raw(self.pixmap.width(), self.pixmap.height(), raw)
            .ok_or_else(|| ExportError::Encode("位图缓冲长度异常".to_string()))
    }

    fn to_rgb_over_black(&self) -> Result<RgbImage, ExportError> {
        let mut raw = Vec::with_capacity(self.pixmap.pixels().len() * 3);
        for pixel in self.pixmap.pixels() {
            raw.extend_from_slice(&[pixel.red(), pixel.green(), pixel.blue()]);
        }

        RgbImage::from_raw(self.pixmap.width(), self.pixmap.height(), raw)
            .ok_or_else(|| ExportError::Encode("位图缓冲长度异常".to_string()))
    }
}

impl DrawingContext2d for PixmapSurface {
    fn draw_image(&mut self, image: &DecodedImage, dx: i32, dy: i32) {
        self.pixmap.draw_pixmap(
            dx,
            dy,
            image.pixmap(),
            &tiny_skia::PixmapPaint::default(),
            tiny_skia::Transform::identity(),
            None,
        );
    }
}

impl RasterSurface for PixmapSurface {
    fn width(&self) -> u32 {
        self.pixmap.width()
    }

    fn height(&self) -> u32 {
        self.pixmap.height()
    }

    fn context_2d(&mut self) -> Option<&mut dyn DrawingContext2d> {
        Some(self)
    }

    fn to_data_url(&self, mime_type: &str, jpeg_quality: u8) -> Result<String, ExportError> {
        let format = match RasterFormat::from_mime(mime_type) {
            Some(format) => format,
            None => {
                log::warn!("⚠️ 不支持的输出类型 {}，回退为 image/png", mime_type);
                RasterFormat::Png
            }
        };

        let bytes = self.encode(format, jpeg_quality)?;
        Ok(DataUri::encode(format.mime_type(), &bytes))
    }
}
