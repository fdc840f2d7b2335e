//! # 中间数据模型
//!
//! ## 设计思路
//!
//! 将流水线各阶段的产物拆成独立类型，阶段之间只按值传递：
//! - `Blob` 表示带 MIME 类型的二进制数据（序列化后的 SVG 文本）
//! - `ObjectUrl` 表示注册表签发的临时句柄
//! - `DecodedImage` 表示解码后的位图，只会被绘制一次

use std::fmt;
use std::sync::Arc;

use resvg::tiny_skia;

pub const SVG_MIME_TYPE: &str = "image/svg+xml";

/// 带类型标记的二进制对象。克隆只增加引用计数。
#[derive(Debug, Clone)]
pub struct Blob {
    bytes: Arc<[u8]>,
    mime_type: String,
}

impl Blob {
    pub fn new(bytes: impl Into<Arc<[u8]>>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// 可解引用的临时句柄（`blob:` URL）。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 解码结果：预乘 Alpha 的 RGBA 位图。
pub struct DecodedImage {
    pixmap: tiny_skia::Pixmap,
}

impl DecodedImage {
    pub fn new(pixmap: tiny_skia::Pixmap) -> Self {
        Self { pixmap }
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> tiny_skia::PixmapRef<'_> {
        self.pixmap.as_ref()
    }
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}
