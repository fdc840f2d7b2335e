//! 单次导出选项与输出格式。

use serde::{Deserialize, Serialize};

pub const DEFAULT_IMAGE_DIMENSION: u32 = 360;
pub const DEFAULT_MIME_TYPE: &str = "image/png";

/// 单次导出选项，对应 `{ dimension?, mimeType? }`。
///
/// 缺省或为 0 的尺寸、缺省或为空的 MIME 类型都会在进入流水线时回退到默认值。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOptions {
    pub dimension: u32,
    pub mime_type: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_IMAGE_DIMENSION,
            mime_type: DEFAULT_MIME_TYPE.to_string(),
        }
    }
}

impl RenderOptions {
    pub fn new(dimension: u32) -> Self {
        Self {
            dimension,
            ..Self::default()
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub(crate) fn normalized(mut self, default_dimension: u32) -> Self {
        if self.dimension == 0 {
            self.dimension = default_dimension;
        }
        let trimmed = self.mime_type.trim();
        self.mime_type = if trimmed.is_empty() {
            DEFAULT_MIME_TYPE.to_string()
        } else {
            trimmed.to_ascii_lowercase()
        };
        self
    }
}

/// 光栅表面支持的编码格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    Png,
    Jpeg,
    WebP,
}

impl RasterFormat {
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        match mime_type.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_dimension_and_blank_mime_fall_back_to_defaults() {
        let options = RenderOptions {
            dimension: 0,
            mime_type: "  ".to_string(),
        }
        .normalized(DEFAULT_IMAGE_DIMENSION);

        assert_eq!(options, RenderOptions::default());
    }

    #[test]
    fn deserializes_camel_case_with_missing_fields() {
        let options: RenderOptions =
            serde_json::from_str(r#"{"dimension": 1000}"#).expect("parse options failed");
        assert_eq!(options.dimension, 1000);
        assert_eq!(options.mime_type, "image/png");

        let options: RenderOptions =
            serde_json::from_str(r#"{"mimeType": "image/jpeg"}"#).expect("parse options failed");
        assert_eq!(options.dimension, 360);
        assert_eq!(options.mime_type, "image/jpeg");
    }

    #[test]
    fn raster_format_parses_known_mime_types_only() {
        assert_eq!(RasterFormat::from_mime("IMAGE/PNG"), Some(RasterFormat::Png));
        assert_eq!(RasterFormat::from_mime("image/jpg"), Some(RasterFormat::Jpeg));
        assert_eq!(RasterFormat::from_mime("image/webp"), Some(RasterFormat::WebP));
        assert_eq!(RasterFormat::from_mime("image/gif"), None);
    }
}
