//! # 文件读取模块
//!
//! ## 设计思路
//!
//! 对应 `FileReader.readAsDataURL`：把整份文件读成 Data URI，供 Logo 上传使用。
//! 每次调用恰好产生一次结果：成功返回完整内容，失败返回 `FileRead`，不存在部分读取。
//!
//! ## 实现思路
//!
//! - 读取前先查 metadata：不存在 / 不是文件 / 超出体积上限都尽早失败。
//! - MIME 类型优先按内容嗅探（`infer`），其次按扩展名，最后回退为 `application/octet-stream`。
//! - 空文件得到负载为空的合法 Data URI，而不是错误。

use std::path::Path;

use super::{ExportConfig, ExportError};
use crate::data_uri::DataUri;

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// 使用默认体积上限读取文件。
///
/// # 示例
/// ```rust,no_run
/// # async fn demo() -> Result<(), qrcode_export::export::ExportError> {
/// let data_url = qrcode_export::export::read_as_data_url("logo.png").await?;
/// assert!(data_url.starts_with("data:image/png;base64,"));
/// # Ok(())
/// # }
/// ```
pub async fn read_as_data_url(path: impl AsRef<Path>) -> Result<String, ExportError> {
    read_as_data_url_with_limit(path, ExportConfig::default().max_file_size).await
}

pub async fn read_as_data_url_with_limit(
    path: impl AsRef<Path>,
    max_file_size: u64,
) -> Result<String, ExportError> {
    let path = path.as_ref();
    log::info!("📁 开始读取文件 - 路径: {}", path.display());

    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| ExportError::FileRead(format!("无法读取文件信息 {}：{}", path.display(), e)))?;

    if !metadata.is_file() {
        return Err(ExportError::FileRead(format!("不是普通文件：{}", path.display())));
    }

    if metadata.len() > max_file_size {
        return Err(ExportError::ResourceLimit(format!(
            "文件过大：{:.2} MB（限制：{:.2} MB）",
            metadata.len() as f64 / 1024.0 / 1024.0,
            max_file_size as f64 / 1024.0 / 1024.0
        )));
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ExportError::FileRead(format!("无法读取文件 {}：{}", path.display(), e)))?;

    let mime_type = detect_mime_type(path, &bytes);
    log::debug!("✅ 文件读取完成 - {} bytes, {}", bytes.len(), mime_type);

    Ok(read_bytes_as_data_url(&bytes, mime_type))
}

/// 将内存中的字节编码为 Data URI。
pub fn read_bytes_as_data_url(bytes: &[u8], mime_type: &str) -> String {
    DataUri::encode(mime_type, bytes)
}

fn detect_mime_type(path: &Path, bytes: &[u8]) -> &'static str {
    if let Some(kind) = infer::get(bytes) {
        return kind.mime_type();
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain",
        _ => FALLBACK_MIME_TYPE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    fn temp_file(name: &str, contents: &[u8]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "qrcode-export-ingest-{}-{}",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::SeqCst)
        ));
        std::fs::create_dir_all(&dir).expect("create temp dir failed");
        let path = dir.join(name);
        std::fs::write(&path, contents).expect("write temp file failed");
        path
    }

    #[tokio::test]
    async fn empty_file_yields_empty_payload_data_url() {
        let path = temp_file("empty.bin", b"");

        let data_url = read_as_data_url(&path).await.expect("read should succeed");

        assert_eq!(data_url, "data:application/octet-stream;base64,");
    }

    #[tokio::test]
    async fn png_content_is_sniffed_regardless_of_extension() {
        let png_signature = [137_u8, 80, 78, 71, 13, 10, 26, 10, 0, 0, 0, 13, 73, 72, 68, 82];
        let path = temp_file("logo.dat", &png_signature);

        let data_url = read_as_data_url(&path).await.expect("read should succeed");
        let parsed = DataUri::parse(&data_url).expect("data url should parse");

        assert_eq!(parsed.mime_type, "image/png");
        assert_eq!(parsed.data, png_signature);
    }

    #[tokio::test]
    async fn svg_falls_back_to_extension() {
        let path = temp_file("logo.svg", br#"<svg xmlns="http://www.w3.org/2000/svg"/>"#);

        let data_url = read_as_data_url(&path).await.expect("read should succeed");

        assert!(data_url.starts_with("data:image/svg+xml;base64,"));
    }

    #[tokio::test]
    async fn missing_file_rejects_with_file_read_error() {
        let path = std::env::temp_dir().join("qrcode-export-definitely-missing.png");

        let result = read_as_data_url(&path).await;

        assert!(matches!(result, Err(ExportError::FileRead(_))));
    }

    #[tokio::test]
    async fn directory_is_not_readable_as_file() {
        let result = read_as_data_url(std::env::temp_dir()).await;

        assert!(matches!(result, Err(ExportError::FileRead(_))));
    }

    #[tokio::test]
    async fn oversized_file_hits_limit() {
        let path = temp_file("big.bin", &[0_u8; 64]);

        let result = read_as_data_url_with_limit(&path, 16).await;

        assert!(matches!(result, Err(ExportError::ResourceLimit(_))));
    }
}
