//! # 解码模块
//!
//! ## 设计思路
//!
//! 解码是整条流水线中唯一真正的挂起点。只监听成功回调的解码在输入损坏时会永远挂起，
//! 因此每个解码任务在挂起前同时接好成功与失败两条出口：
//!
//! - 工作线程通过 `oneshot` 发送 `Result<DecodedImage, ExportError>`
//! - 工作线程 panic 或被丢弃时，发送端随之释放，接收端得到 `RecvError`，映射为 `Decode` 错误
//!
//! 因此任何输入都恰好产生一次终态结果。
//!
//! ## 实现思路
//!
//! 1. 通过注册表解引用句柄，未知/已撤销句柄直接失败
//! 2. `image/svg+xml`：`usvg` 解析 + `resvg` 按固有尺寸渲染
//! 3. SVG 内嵌的 `<image>` 在渲染前逐个解码校验。`usvg` 会静默丢弃无法解码的图片，
//!    损坏的 Logo 会变成一个空洞，因此这里直接返回 `Decode` 错误
//! 4. 其他类型：交给 `image` 解码后转换为预乘 RGBA
//! 5. 像素上限由调用方按 `ExportConfig::max_decoded_pixels` 传入
//! 6. CPU 密集部分放在 `spawn_blocking` 中执行

use std::future::Future;
use std::pin::Pin;

use image::ImageFormat;
use resvg::{tiny_skia, usvg};
use tokio::sync::oneshot;

use super::ExportError;
use super::object_url::ObjectUrlRegistry;
use super::source::{Blob, DecodedImage, ObjectUrl, SVG_MIME_TYPE};
use crate::data_uri::DataUri;

const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";

/// 解码任务的返回类型。
pub type DecodeFuture<'a> = Pin<Box<dyn Future<Output = Result<DecodedImage, ExportError>> + Send + 'a>>;

/// 图像解码能力。
pub trait ImageDecoder: Send + Sync {
    /// 解码句柄所指向的数据，结果像素数不得超过 `max_pixels`。
    /// 返回的 future 必须恰好完成一次（成功或失败）。
    fn decode<'a>(
        &'a self,
        url: &'a ObjectUrl,
        registry: &'a dyn ObjectUrlRegistry,
        max_pixels: u64,
    ) -> DecodeFuture<'a>;
}

/// 基于 `resvg` 的默认解码器。
#[derive(Debug, Default, Clone, Copy)]
pub struct ResvgDecoder;

impl ResvgDecoder {
    fn decode_blob(blob: &Blob, max_pixels: u64) -> Result<DecodedImage, ExportError> {
        if blob.mime_type().eq_ignore_ascii_case(SVG_MIME_TYPE) {
            Self::render_svg(blob.bytes(), max_pixels)
        } else {
            Self::decode_raster(blob.bytes(), max_pixels)
        }
    }

    fn render_svg(bytes: &[u8], max_pixels: u64) -> Result<DecodedImage, ExportError> {
        let markup = std::str::from_utf8(bytes)
            .map_err(|e| ExportError::Decode(format!("SVG 文本不是合法 UTF-8：{}", e)))?;

        let options = usvg::Options::default();
        let tree = usvg::Tree::from_str(markup, &options)
            .map_err(|e| ExportError::Decode(format!("SVG 解析失败：{}", e)))?;
        Self::validate_embedded_images(markup, max_pixels)?;

        let size = tree.size();
        let width = size.width().round() as u32;
        let height = size.height().round() as u32;
        Self::validate_pixel_limits(width, height, max_pixels)?;

        let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or_else(|| {
            ExportError::Decode(format!("无法为 {}x{} 的图像分配位图", width, height))
        })?;
        resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());

        log::debug!("🖼️ SVG 解码完成 - 固有尺寸: {}x{}", width, height);

        Ok(DecodedImage::new(pixmap))
    }

    fn decode_raster(bytes: &[u8], max_pixels: u64) -> Result<DecodedImage, ExportError> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| ExportError::Decode(format!("图片解码失败：{}", e)))?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::validate_pixel_limits(width, height, max_pixels)?;

        let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or_else(|| {
            ExportError::Decode(format!("无法为 {}x{} 的图像分配位图", width, height))
        })?;

        for (dst, src) in pixmap.pixels_mut().iter_mut().zip(rgba.pixels()) {
            let [r, g, b, a] = src.0;
            *dst = tiny_skia::ColorU8::from_rgba(r, g, b, a).premultiply();
        }

        log::debug!("🖼️ 位图解码完成 - 尺寸: {}x{}", width, height);

        Ok(DecodedImage::new(pixmap))
    }

    /// 校验所有内嵌 `<image>`：只接受 base64 Data URI，
    /// 内容必须是可完整解码的 PNG / JPEG / GIF / WebP 或合法 SVG。
    fn validate_embedded_images(markup: &str, max_pixels: u64) -> Result<(), ExportError> {
        let options = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..roxmltree::ParsingOptions::default()
        };
        let document = roxmltree::Document::parse_with_options(markup, options)
            .map_err(|e| ExportError::Decode(format!("SVG 解析失败：{}", e)))?;

        for node in document.descendants().filter(|node| node.has_tag_name("image")) {
            let href = node
                .attribute("href")
                .or_else(|| node.attribute((XLINK_NAMESPACE, "href")))
                .ok_or_else(|| ExportError::Decode("内嵌图片缺少 href".to_string()))?;

            let resource = DataUri::parse(href).map_err(|_| {
                ExportError::Decode(format!("不支持的内嵌资源：{}", Self::preview(href)))
            })?;

            if resource.mime_type == SVG_MIME_TYPE {
                let nested = std::str::from_utf8(&resource.data)
                    .map_err(|e| ExportError::Decode(format!("内嵌 SVG 不是合法 UTF-8：{}", e)))?;
                usvg::Tree::from_str(nested, &usvg::Options::default())
                    .map_err(|e| ExportError::Decode(format!("内嵌 SVG 解析失败：{}", e)))?;
                Self::validate_embedded_images(nested, max_pixels)?;
                continue;
            }

            let format = image::guess_format(&resource.data).map_err(|_| {
                ExportError::Decode(format!("无法识别内嵌图片格式：{}", Self::preview(href)))
            })?;
            if !matches!(
                format,
                ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Gif | ImageFormat::WebP
            ) {
                return Err(ExportError::Decode(format!("不支持的内嵌图片格式：{:?}", format)));
            }

            let decoded = image::load_from_memory_with_format(&resource.data, format)
                .map_err(|e| ExportError::Decode(format!("内嵌图片解码失败：{}", e)))?;
            Self::validate_pixel_limits(decoded.width(), decoded.height(), max_pixels)?;
        }

        Ok(())
    }

    fn preview(href: &str) -> String {
        let mut preview: String = href.chars().take(48).collect();
        if preview.len() < href.len() {
            preview.push('…');
        }
        preview
    }

    fn validate_pixel_limits(width: u32, height: u32, max_pixels: u64) -> Result<(), ExportError> {
        if width == 0 || height == 0 {
            return Err(ExportError::Decode(format!("图像尺寸无效：{}x{}", width, height)));
        }

        let pixels = (width as u64)
            .checked_mul(height as u64)
            .ok_or_else(|| ExportError::ResourceLimit("图像像素数溢出".to_string()))?;

        if pixels > max_pixels {
            return Err(ExportError::ResourceLimit(format!(
                "图像像素过大：{} 像素（限制：{} 像素）",
                pixels, max_pixels
            )));
        }

        Ok(())
    }
}

impl ImageDecoder for ResvgDecoder {
    fn decode<'a>(
        &'a self,
        url: &'a ObjectUrl,
        registry: &'a dyn ObjectUrlRegistry,
        max_pixels: u64,
    ) -> DecodeFuture<'a> {
        Box::pin(async move {
            let blob = registry
                .resolve(url)
                .ok_or_else(|| ExportError::Decode(format!("句柄不存在或已撤销：{}", url)))?;

            let (tx, rx) = oneshot::channel();

            tokio::task::spawn_blocking(move || {
                let _ = tx.send(Self::decode_blob(&blob, max_pixels));
            });

            match rx.await {
                Ok(result) => result,
                Err(_) => Err(ExportError::Decode("解码任务异常终止".to_string())),
            }
        })
    }
}
