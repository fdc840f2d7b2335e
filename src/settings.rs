//! 二维码设置状态模块
//!
//! # 设计思路
//!
//! 保存界面表单对应的内存状态：内容、前景色/背景色、纠错等级、Logo 开关与数据、
//! Logo 尺寸、导出尺寸。界面层只做展示与事件转发，状态规则集中在这里。
//!
//! # 实现思路
//!
//! - 颜色在写入时校验（`#rgb` / `#rrggbb`），非法值不会进入渲染器。
//! - 导出尺寸来自滑块，限制在 `360..=1000`。
//! - `is_reset_enabled` 判断除导出尺寸与 Logo 文件名外是否有字段偏离默认值。
//! - `reset` 恢复这些字段，导出尺寸保持不变。
//! - 通过 `serde` 与宿主界面交换 JSON 快照。

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::export::RenderOptions;
use crate::qr::{DEFAULT_QR_SIZE, ErrorCorrectionLevel, LogoOverlay, QrStyle};

pub const DEFAULT_BACKGROUND: &str = "#ffffff";
pub const DEFAULT_FOREGROUND: &str = "#000000";
pub const DEFAULT_LOGO_SIZE: u32 = 24;
pub const MIN_IMAGE_DIMENSION: u32 = 360;
pub const MAX_IMAGE_DIMENSION: u32 = 1000;

static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").unwrap());

/// 二维码表单状态。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QrSettings {
    pub url: String,
    pub background_color: String,
    pub foreground_color: String,
    pub level: ErrorCorrectionLevel,
    pub include_logo: bool,
    pub logo: Option<String>,
    pub logo_name: String,
    pub logo_width: u32,
    pub logo_height: u32,
    pub image_dimension: u32,
}

impl Default for QrSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            background_color: DEFAULT_BACKGROUND.to_string(),
            foreground_color: DEFAULT_FOREGROUND.to_string(),
            level: ErrorCorrectionLevel::L,
            include_logo: false,
            logo: None,
            logo_name: String::new(),
            logo_width: DEFAULT_LOGO_SIZE,
            logo_height: DEFAULT_LOGO_SIZE,
            image_dimension: MIN_IMAGE_DIMENSION,
        }
    }
}

impl QrSettings {
    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    pub fn set_background_color(&mut self, color: &str) -> Result<(), AppError> {
        self.background_color = Self::validate_color(color)?;
        Ok(())
    }

    pub fn set_foreground_color(&mut self, color: &str) -> Result<(), AppError> {
        self.foreground_color = Self::validate_color(color)?;
        Ok(())
    }

    pub fn set_level(&mut self, level: ErrorCorrectionLevel) {
        self.level = level;
    }

    pub fn set_include_logo(&mut self, include_logo: bool) {
        self.include_logo = include_logo;
    }

    /// 记录上传的 Logo（文件名 + Data URI）。
    pub fn set_logo(&mut self, name: impl Into<String>, data_url: impl Into<String>) {
        self.logo_name = name.into();
        self.logo = Some(data_url.into());
    }

    pub fn set_logo_size(&mut self, width: u32, height: u32) -> Result<(), AppError> {
        if width == 0 || height == 0 {
            return Err(AppError::Settings(format!(
                "Logo 尺寸必须大于 0：{}x{}",
                width, height
            )));
        }
        self.logo_width = width;
        self.logo_height = height;
        Ok(())
    }

    /// 设置导出尺寸，超出滑块范围时就近取值。
    pub fn set_image_dimension(&mut self, dimension: u32) {
        self.image_dimension = dimension.clamp(MIN_IMAGE_DIMENSION, MAX_IMAGE_DIMENSION);
    }

    pub fn is_reset_enabled(&self) -> bool {
        let defaults = Self::default();

        self.url != defaults.url
            || !self.background_color.eq_ignore_ascii_case(&defaults.background_color)
            || !self.foreground_color.eq_ignore_ascii_case(&defaults.foreground_color)
            || self.level != defaults.level
            || self.include_logo != defaults.include_logo
            || self.logo.is_some()
            || self.logo_width != defaults.logo_width
            || self.logo_height != defaults.logo_height
    }

    /// 恢复默认值，保留导出尺寸。
    pub fn reset(&mut self) {
        let image_dimension = self.image_dimension;
        *self = Self {
            image_dimension,
            ..Self::default()
        };
        log::debug!("↩️ 二维码设置已重置");
    }

    /// 转换为渲染参数；只有开启 Logo 且已上传时才叠加。
    pub fn style(&self) -> QrStyle {
        let logo = match (&self.logo, self.include_logo) {
            (Some(href), true) => Some(LogoOverlay {
                href: href.clone(),
                width: self.logo_width,
                height: self.logo_height,
                excavate: true,
            }),
            _ => None,
        };

        QrStyle {
            text: self.url.clone(),
            level: self.level,
            foreground: self.foreground_color.clone(),
            background: self.background_color.clone(),
            size: DEFAULT_QR_SIZE,
            logo,
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions::new(self.image_dimension)
    }

    fn validate_color(color: &str) -> Result<String, AppError> {
        let color = color.trim();
        if HEX_COLOR.is_match(color) {
            Ok(color.to_ascii_lowercase())
        } else {
            Err(AppError::Settings(format!("颜色格式错误：{}（应为 #rgb 或 #rrggbb）", color)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_settings_cannot_be_reset() {
        assert!(!QrSettings::default().is_reset_enabled());
    }

    #[test]
    fn changing_dimension_alone_does_not_enable_reset() {
        let mut settings = QrSettings::default();
        settings.set_image_dimension(800);

        assert!(!settings.is_reset_enabled());
    }

    #[test]
    fn reset_restores_defaults_but_keeps_dimension() {
        let mut settings = QrSettings::default();
        settings.set_url("https://example.com");
        settings.set_background_color("#FF0000").expect("valid color");
        settings.set_level(ErrorCorrectionLevel::H);
        settings.set_include_logo(true);
        settings.set_logo("logo.png", "data:image/png;base64,AA==");
        settings.set_logo_size(48, 32).expect("valid size");
        settings.set_image_dimension(720);
        assert!(settings.is_reset_enabled());

        settings.reset();

        assert_eq!(
            settings,
            QrSettings {
                image_dimension: 720,
                ..QrSettings::default()
            }
        );
        assert!(!settings.is_reset_enabled());
    }

    #[test]
    fn image_dimension_is_clamped_to_slider_range() {
        let mut settings = QrSettings::default();

        settings.set_image_dimension(10);
        assert_eq!(settings.image_dimension, 360);

        settings.set_image_dimension(5000);
        assert_eq!(settings.image_dimension, 1000);
    }

    #[test]
    fn invalid_colors_are_rejected_and_previous_kept() {
        let mut settings = QrSettings::default();

        assert!(matches!(settings.set_foreground_color("red"), Err(AppError::Settings(_))));
        assert!(matches!(settings.set_foreground_color("#12345"), Err(AppError::Settings(_))));
        assert_eq!(settings.foreground_color, "#000000");

        settings.set_foreground_color("#ABC").expect("short hex is valid");
        assert_eq!(settings.foreground_color, "#abc");
    }

    #[test]
    fn style_includes_logo_only_when_enabled_and_uploaded() {
        let mut settings = QrSettings::default();
        settings.set_include_logo(true);
        assert!(settings.style().logo.is_none());

        settings.set_logo("logo.png", "data:image/png;base64,AA==");
        let logo = settings.style().logo.expect("logo expected");
        assert_eq!((logo.width, logo.height), (24, 24));
        assert!(logo.excavate);

        settings.set_include_logo(false);
        assert!(settings.style().logo.is_none());
    }

    #[test]
    fn json_snapshot_uses_camel_case() {
        let json = serde_json::to_value(QrSettings::default()).expect("serialize failed");

        assert_eq!(json["backgroundColor"], "#ffffff");
        assert_eq!(json["imageDimension"], 360);
        assert_eq!(json["level"], "L");

        let parsed: QrSettings =
            serde_json::from_str(r#"{"url":"abc","level":"Q"}"#).expect("deserialize failed");
        assert_eq!(parsed.url, "abc");
        assert_eq!(parsed.level, ErrorCorrectionLevel::Q);
        assert_eq!(parsed.logo_width, 24);
    }
}
