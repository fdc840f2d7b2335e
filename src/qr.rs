//! 二维码矢量渲染模块
//!
//! # 设计思路
//!
//! 二维码符号编码本身交给 `qrcode` crate，本模块只负责把模块矩阵画成 SVG 元素树，
//! 作为导出流水线的输入。输出结构与前端常见的 `<QRCodeSVG>` 组件一致：
//! - 根 `<svg>` 使用 `viewBox="0 0 N N"`，`width` / `height` 为屏幕尺寸
//! - 一条背景路径铺满整个符号
//! - 一条前景路径，每段横向连续的深色模块写成 `M x y h w v1 H x z`
//! - 可选的 Logo 以 `<image>` 叠加在中心，`excavate` 时清空其下方的模块
//!
//! # 实现思路
//!
//! - Logo 尺寸以屏幕像素给出，按 `N / size` 换算为模块单位。
//! - 挖空区域向外取整到整模块，保证 Logo 下不残留半个模块。
//! - 前景路径使用 `crispEdges`，放大后模块边缘保持锐利。

use qrcode::{Color, EcLevel, QrCode};
use serde::{Deserialize, Serialize};

use crate::export::ExportError;
use crate::svg::SvgElement;

/// 屏幕上二维码的默认边长（像素）。
pub const DEFAULT_QR_SIZE: u32 = 256;

/// 纠错等级。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorCorrectionLevel {
    #[default]
    L,
    M,
    Q,
    H,
}

impl ErrorCorrectionLevel {
    pub fn from_str(level: &str) -> Result<Self, ExportError> {
        match level.trim().to_ascii_uppercase().as_str() {
            "L" => Ok(Self::L),
            "M" => Ok(Self::M),
            "Q" => Ok(Self::Q),
            "H" => Ok(Self::H),
            other => Err(ExportError::InvalidFormat(format!(
                "未知纠错等级：{}（可选：L / M / Q / H）",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::L => "L",
            Self::M => "M",
            Self::Q => "Q",
            Self::H => "H",
        }
    }

    fn to_ec_level(self) -> EcLevel {
        match self {
            Self::L => EcLevel::L,
            Self::M => EcLevel::M,
            Self::Q => EcLevel::Q,
            Self::H => EcLevel::H,
        }
    }
}

/// 叠加在二维码中心的 Logo。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogoOverlay {
    /// 图片地址，通常是上传文件得到的 Data URI。
    pub href: String,
    /// 屏幕像素宽度。
    pub width: u32,
    /// 屏幕像素高度。
    pub height: u32,
    /// 是否清空 Logo 下方的模块。
    pub excavate: bool,
}

/// 渲染参数。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrStyle {
    pub text: String,
    pub level: ErrorCorrectionLevel,
    pub foreground: String,
    pub background: String,
    pub size: u32,
    pub logo: Option<LogoOverlay>,
}

impl Default for QrStyle {
    fn default() -> Self {
        Self {
            text: String::new(),
            level: ErrorCorrectionLevel::L,
            foreground: "#000000".to_string(),
            background: "#ffffff".to_string(),
            size: DEFAULT_QR_SIZE,
            logo: None,
        }
    }
}

/// Logo 在模块坐标系中的位置。
#[derive(Debug, Clone, Copy, PartialEq)]
struct LogoPlacement {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl LogoPlacement {
    fn centered(logo: &LogoOverlay, cells: usize, size: u32) -> Self {
        let scale = cells as f64 / size.max(1) as f64;
        let width = logo.width as f64 * scale;
        let height = logo.height as f64 * scale;
        Self {
            x: cells as f64 / 2.0 - width / 2.0,
            y: cells as f64 / 2.0 - height / 2.0,
            width,
            height,
        }
    }

    /// 需要清空的整模块区域 `(x, y, w, h)`。
    fn excavation(&self) -> (i64, i64, i64, i64) {
        let floor_x = self.x.floor();
        let floor_y = self.y.floor();
        (
            floor_x as i64,
            floor_y as i64,
            (self.width + self.x - floor_x).ceil() as i64,
            (self.height + self.y - floor_y).ceil() as i64,
        )
    }
}

/// 二维码矢量渲染器。
#[derive(Debug, Default, Clone, Copy)]
pub struct QrRenderer;

impl QrRenderer {
    /// 生成二维码的 SVG 元素树。
    ///
    /// # 示例
    /// ```rust
    /// use qrcode_export::qr::{QrRenderer, QrStyle};
    ///
    /// let style = QrStyle { text: "https://example.com".into(), ..QrStyle::default() };
    /// let svg = QrRenderer.render(&style)?;
    /// assert_eq!(svg.attribute("width"), Some("256"));
    /// # Ok::<(), qrcode_export::export::ExportError>(())
    /// ```
    pub fn render(&self, style: &QrStyle) -> Result<SvgElement, ExportError> {
        let code = QrCode::with_error_correction_level(style.text.as_bytes(), style.level.to_ec_level())
            .map_err(|e| ExportError::QrEncode(e.to_string()))?;

        let cells = code.width();
        let mut modules: Vec<Vec<bool>> = code
            .to_colors()
            .chunks(cells)
            .map(|row| row.iter().map(|c| *c == Color::Dark).collect())
            .collect();

        let placement = style
            .logo
            .as_ref()
            .map(|logo| (logo, LogoPlacement::centered(logo, cells, style.size)));

        if let Some((logo, placement)) = &placement {
            if logo.excavate {
                Self::excavate(&mut modules, placement.excavation());
            }
        }

        let size = style.size.to_string();
        let mut svg = SvgElement::new("svg")
            .with_attribute("height", size.clone())
            .with_attribute("width", size)
            .with_attribute("viewBox", format!("0 0 {} {}", cells, cells))
            .with_child(
                SvgElement::new("path")
                    .with_attribute("fill", style.background.as_str())
                    .with_attribute("d", format!("M0,0 h{}v{}H0z", cells, cells))
                    .with_attribute("shape-rendering", "crispEdges"),
            )
            .with_child(
                SvgElement::new("path")
                    .with_attribute("fill", style.foreground.as_str())
                    .with_attribute("d", Self::module_path(&modules))
                    .with_attribute("shape-rendering", "crispEdges"),
            );

        if let Some((logo, placement)) = placement {
            svg = svg.with_child(
                SvgElement::new("image")
                    .with_attribute("href", logo.href.as_str())
                    .with_attribute("height", placement.height.to_string())
                    .with_attribute("width", placement.width.to_string())
                    .with_attribute("x", placement.x.to_string())
                    .with_attribute("y", placement.y.to_string())
                    .with_attribute("preserveAspectRatio", "none"),
            );
        }

        log::debug!(
            "🔳 二维码渲染完成 - 版本宽度: {} 模块, 纠错等级: {}",
            cells,
            style.level.as_str()
        );

        Ok(svg)
    }

    fn excavate(modules: &mut [Vec<bool>], (x, y, w, h): (i64, i64, i64, i64)) {
        for (row_index, row) in modules.iter_mut().enumerate() {
            let row_index = row_index as i64;
            if row_index < y || row_index >= y + h {
                continue;
            }
            for (col_index, cell) in row.iter_mut().enumerate() {
                let col_index = col_index as i64;
                if col_index >= x && col_index < x + w {
                    *cell = false;
                }
            }
        }
    }

    fn module_path(modules: &[Vec<bool>]) -> String {
        let mut ops = String::new();

        for (y, row) in modules.iter().enumerate() {
            let mut start: Option<usize> = None;
            for x in 0..=row.len() {
                let dark = row.get(x).copied().unwrap_or(false);
                match (dark, start) {
                    (true, None) => start = Some(x),
                    (false, Some(begin)) => {
                        ops.push_str(&format!("M{} {}h{}v1H{}z", begin, y, x - begin, begin));
                        start = None;
                    }
                    _ => {}
                }
            }
        }

        ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svg::SvgNode;

    fn child_elements(svg: &SvgElement) -> Vec<&SvgElement> {
        svg.children()
            .iter()
            .filter_map(|node| match node {
                SvgNode::Element(element) => Some(element),
                SvgNode::Text(_) => None,
            })
            .collect()
    }

    #[test]
    fn module_path_merges_horizontal_runs() {
        let modules = vec![vec![true, true, false, true], vec![false, false, false, false]];

        assert_eq!(QrRenderer::module_path(&modules), "M0 0h2v1H0zM3 0h1v1H3z");
    }

    #[test]
    fn render_builds_background_and_foreground_paths() {
        let style = QrStyle {
            text: "hello".to_string(),
            foreground: "#112233".to_string(),
            ..QrStyle::default()
        };

        let svg = QrRenderer.render(&style).expect("render should succeed");
        let children = child_elements(&svg);

        assert_eq!(svg.attribute("viewBox"), Some("0 0 21 21"));
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].attribute("d"), Some("M0,0 h21v21H0z"));
        assert_eq!(children[1].attribute("fill"), Some("#112233"));
        assert!(children[1].attribute("d").is_some_and(|d| d.starts_with("M0 0h7v1H0z")));
    }

    #[test]
    fn higher_level_needs_more_modules_for_same_text() {
        let text = "https://example.com/some/longer/path?with=query";
        let low = QrRenderer
            .render(&QrStyle { text: text.to_string(), level: ErrorCorrectionLevel::L, ..QrStyle::default() })
            .expect("render L");
        let high = QrRenderer
            .render(&QrStyle { text: text.to_string(), level: ErrorCorrectionLevel::H, ..QrStyle::default() })
            .expect("render H");

        let cells = |svg: &SvgElement| -> usize {
            svg.attribute("viewBox")
                .and_then(|v| v.split(' ').nth(2))
                .and_then(|n| n.parse().ok())
                .expect("viewBox should carry size")
        };
        assert!(cells(&high) > cells(&low));
    }

    #[test]
    fn logo_is_centered_and_excavated() {
        let style = QrStyle {
            text: "hello".to_string(),
            level: ErrorCorrectionLevel::H,
            size: 210,
            logo: Some(LogoOverlay {
                href: "data:image/png;base64,AA==".to_string(),
                width: 50,
                height: 50,
                excavate: true,
            }),
            ..QrStyle::default()
        };

        let svg = QrRenderer.render(&style).expect("render should succeed");
        let children = child_elements(&svg);
        let image = children.last().expect("image element expected");

        assert_eq!(image.name(), "image");
        assert_eq!(image.attribute("width"), Some("5"));
        assert_eq!(image.attribute("x"), Some("8"));
        assert_eq!(image.attribute("href"), Some("data:image/png;base64,AA=="));

        let path = children[1].attribute("d").expect("foreground path");
        let runs = dark_runs(path);
        assert!(!runs.is_empty());
        for (x, y, w) in runs {
            if (8..13).contains(&y) {
                assert!(x + w <= 8 || x >= 13, "run M{} {}h{} overlaps the logo", x, y, w);
            }
        }
    }

    /// 把 `M{x} {y}h{w}v1H{x}z` 序列拆成 `(x, y, w)`。
    fn dark_runs(path: &str) -> Vec<(u32, u32, u32)> {
        path.split('M')
            .filter(|run| !run.is_empty())
            .map(|run| {
                let (start, rest) = run.split_once('h').expect("run has width");
                let (x, y) = start.split_once(' ').expect("run has origin");
                let (w, _) = rest.split_once('v').expect("run has height");
                (
                    x.parse().expect("x is numeric"),
                    y.parse().expect("y is numeric"),
                    w.parse().expect("w is numeric"),
                )
            })
            .collect()
    }

    #[test]
    fn dark_runs_reads_run_extents() {
        assert_eq!(
            dark_runs(&QrRenderer::module_path(&[vec![true, true, false, true]])),
            vec![(0, 0, 2), (3, 0, 1)]
        );
    }

    #[test]
    fn oversized_payload_is_a_qr_encode_error() {
        let style = QrStyle {
            text: "x".repeat(8000),
            level: ErrorCorrectionLevel::H,
            ..QrStyle::default()
        };

        assert!(matches!(QrRenderer.render(&style), Err(ExportError::QrEncode(_))));
    }

    #[test]
    fn level_parsing_is_case_insensitive() {
        assert_eq!(ErrorCorrectionLevel::from_str("q").expect("parse q"), ErrorCorrectionLevel::Q);
        assert!(ErrorCorrectionLevel::from_str("X").is_err());
    }
}
