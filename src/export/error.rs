//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载导出链路中的所有错误来源，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! 每个分支都对应一个稳定的 `code()` 与所属阶段 `stage()`，
//! 宿主界面据此决定提示文案（例如 toast），无需解析错误字符串。

/// 导出链路统一错误类型。
///
/// 该类型会在应用层被上转为 `AppError`。
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("序列化错误：{0}")]
    Serialization(String),

    #[error("解码错误：{0}")]
    Decode(String),

    #[error("绘图表面不可用：{0}")]
    SurfaceUnavailable(String),

    #[error("文件读取错误：{0}")]
    FileRead(String),

    #[error("编码错误：{0}")]
    Encode(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("超时错误：{0}")]
    Timeout(String),

    #[error("二维码生成错误：{0}")]
    QrEncode(String),
}

impl ExportError {
    /// 稳定错误码，供宿主侧分支处理。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Serialization(_) => "E_SERIALIZATION",
            Self::Decode(_) => "E_DECODE",
            Self::SurfaceUnavailable(_) => "E_SURFACE_UNAVAILABLE",
            Self::FileRead(_) => "E_FILE_READ",
            Self::Encode(_) => "E_ENCODE",
            Self::InvalidFormat(_) => "E_INVALID_FORMAT",
            Self::ResourceLimit(_) => "E_RESOURCE_LIMIT",
            Self::Timeout(_) => "E_TIMEOUT",
            Self::QrEncode(_) => "E_QR_ENCODE",
        }
    }

    /// 出错所在阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Serialization(_) => "serialize",
            Self::Decode(_) | Self::Timeout(_) => "decode",
            Self::SurfaceUnavailable(_) => "rasterize",
            Self::Encode(_) => "encode",
            Self::FileRead(_) => "ingest",
            Self::InvalidFormat(_) | Self::ResourceLimit(_) => "validate",
            Self::QrEncode(_) => "render",
        }
    }
}

impl From<ExportError> for String {
    fn from(error: ExportError) -> Self {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_reported_as_decode_stage() {
        let err = ExportError::Timeout("stalled".to_string());
        assert_eq!(err.stage(), "decode");
        assert_eq!(err.code(), "E_TIMEOUT");
    }

    #[test]
    fn display_keeps_inner_message() {
        let err = ExportError::SurfaceUnavailable("no 2d context".to_string());
        assert!(err.to_string().contains("no 2d context"));
    }
}
