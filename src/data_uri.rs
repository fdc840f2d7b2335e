//! Data URI 编解码
//!
//! # 设计思路
//!
//! 导出结果与 Logo 上传都以 `data:<mime>;base64,<payload>` 形式在各层之间传递。
//! 本模块只负责该格式本身：编码、解析与 base64 解码，不关心数据来源。
//!
//! # 实现思路
//!
//! - 编码固定使用 base64 形式，与 `canvas.toDataURL` / `FileReader.readAsDataURL` 输出一致。
//! - 解析仅接受 base64 形式；MIME 缺省时按 RFC 2397 视为 `text/plain`。
//! - MIME 参数（如 `charset`）保留在 `parameters` 中。

use base64::{Engine as _, engine::general_purpose};

use crate::export::ExportError;

const DATA_SCHEME: &str = "data:";
const BASE64_MARKER: &str = "base64";

/// 解析后的 Data URI。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime_type: String,
    pub parameters: Vec<String>,
    pub data: Vec<u8>,
}

impl DataUri {
    /// 将字节编码为 base64 形式的 Data URI。
    ///
    /// # 示例
    /// ```rust
    /// use qrcode_export::data_uri::DataUri;
    ///
    /// assert_eq!(DataUri::encode("text/plain", b"hi"), "data:text/plain;base64,aGk=");
    /// assert_eq!(DataUri::encode("image/png", b""), "data:image/png;base64,");
    /// ```
    pub fn encode(mime_type: &str, bytes: &[u8]) -> String {
        format!(
            "{}{};{},{}",
            DATA_SCHEME,
            mime_type,
            BASE64_MARKER,
            general_purpose::STANDARD.encode(bytes)
        )
    }

    pub fn parse(data_uri: &str) -> Result<Self, ExportError> {
        let rest = data_uri
            .strip_prefix(DATA_SCHEME)
            .ok_or_else(|| ExportError::InvalidFormat("缺少 data: 前缀".to_string()))?;

        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| ExportError::InvalidFormat("缺少数据分隔符 ','".to_string()))?;

        let mut segments: Vec<&str> = header.split(';').collect();
        if segments.last().map(|s| s.trim()) != Some(BASE64_MARKER) {
            return Err(ExportError::InvalidFormat("仅支持 base64 形式的 Data URI".to_string()));
        }
        segments.pop();

        let mime_type = match segments.first().map(|s| s.trim()) {
            Some(mime) if !mime.is_empty() => mime.to_ascii_lowercase(),
            _ => "text/plain".to_string(),
        };
        let parameters = segments
            .iter()
            .skip(1)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let data = general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| ExportError::InvalidFormat(format!("Base64 解码失败：{}", e)))?;

        Ok(Self {
            mime_type,
            parameters,
            data,
        })
    }
}
