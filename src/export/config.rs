//! # 配置模块
//!
//! ## 设计思路
//!
//! 将导出链路中所有“可调策略”集中到 `ExportConfig`，保证运行时行为可观测、可调整、可测试。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的配置。
//! - `validate` 在写入前校验取值范围，拒绝会让流水线无法终止或无意义的组合。
//! - 中间图按输出边长解码，`max_dimension` 的平方不得超过 `max_decoded_pixels`，
//!   否则合法尺寸的导出会在解码阶段被拒绝。
//! - 单次请求使用配置快照，见 `ExportPipeline::config_snapshot`。

use serde::{Deserialize, Serialize};

use super::ExportError;
use super::options::DEFAULT_IMAGE_DIMENSION;

/// 导出配置。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// 调用方未给出尺寸（或给出 0）时使用的输出边长（像素）。
    pub default_dimension: u32,
    /// 允许的最大输出边长，超出即拒绝，防止分配过大的位图。
    pub max_dimension: u32,
    /// 解码结果允许的最大像素数（含内嵌图片）。
    pub max_decoded_pixels: u64,
    /// `image/jpeg` 编码质量（1~100）。
    pub jpeg_quality: u8,
    /// 解码阶段超时时间（毫秒）。`None` 表示不设超时。
    pub decode_timeout_ms: Option<u64>,
    /// 文件读取为 Data URI 时允许的最大体积（字节）。
    pub max_file_size: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_dimension: DEFAULT_IMAGE_DIMENSION,
            max_dimension: 8192,
            max_decoded_pixels: 8192 * 8192,
            jpeg_quality: 92,
            decode_timeout_ms: None,
            max_file_size: 50 * 1024 * 1024,
        }
    }
}

impl ExportConfig {
    pub fn validate(&self) -> Result<(), ExportError> {
        if self.max_dimension == 0 {
            return Err(ExportError::InvalidFormat("max_dimension 必须大于 0".to_string()));
        }
        if self.max_decoded_pixels == 0 {
            return Err(ExportError::InvalidFormat("max_decoded_pixels 必须大于 0".to_string()));
        }
        let max_output_pixels = u64::from(self.max_dimension) * u64::from(self.max_dimension);
        if max_output_pixels > self.max_decoded_pixels {
            return Err(ExportError::InvalidFormat(format!(
                "max_dimension={} 对应 {} 像素，超过 max_decoded_pixels={}",
                self.max_dimension, max_output_pixels, self.max_decoded_pixels
            )));
        }
        if self.default_dimension == 0 || self.default_dimension > self.max_dimension {
            return Err(ExportError::InvalidFormat(format!(
                "default_dimension 必须在 1~{} 之间",
                self.max_dimension
            )));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ExportError::InvalidFormat("jpeg_quality 必须在 1~100 之间".to_string()));
        }
        if self.decode_timeout_ms == Some(0) {
            return Err(ExportError::InvalidFormat("decode_timeout_ms 不能为 0".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ExportConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_default_dimension_above_max() {
        let config = ExportConfig {
            default_dimension: 4096,
            max_dimension: 1024,
            ..ExportConfig::default()
        };

        assert!(matches!(config.validate(), Err(ExportError::InvalidFormat(_))));
    }

    #[test]
    fn rejects_max_dimension_beyond_decoded_pixel_limit() {
        let config = ExportConfig {
            max_dimension: 9000,
            ..ExportConfig::default()
        };
        assert!(matches!(config.validate(), Err(ExportError::InvalidFormat(_))));

        let config = ExportConfig {
            max_dimension: 9000,
            max_decoded_pixels: 9000 * 9000,
            ..ExportConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_decoded_pixel_limit() {
        let config = ExportConfig {
            max_decoded_pixels: 0,
            ..ExportConfig::default()
        };

        assert!(matches!(config.validate(), Err(ExportError::InvalidFormat(_))));
    }

    #[test]
    fn small_limits_are_consistent() {
        let config = ExportConfig {
            default_dimension: 64,
            max_dimension: 64,
            max_decoded_pixels: 64 * 64,
            ..ExportConfig::default()
        };

        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_quality_and_zero_timeout() {
        let config = ExportConfig {
            jpeg_quality: 0,
            ..ExportConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ExportConfig {
            decode_timeout_ms: Some(0),
            ..ExportConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn deserializes_partial_json_with_defaults() {
        let config: ExportConfig =
            serde_json::from_str(r#"{"decode_timeout_ms": 1500}"#).expect("parse config failed");

        assert_eq!(config.decode_timeout_ms, Some(1500));
        assert_eq!(config.default_dimension, 360);
        assert_eq!(config.max_decoded_pixels, 8192 * 8192);
    }
}
