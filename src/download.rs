//! 导出文件保存模块
//!
//! # 设计思路
//!
//! 把导出得到的 Data URI 解码后写入用户指定目录，对应浏览器里
//! “创建 `<a download>` 并点击”的下载动作。
//!
//! # 实现思路
//!
//! - 目录不存在时自动 `create_dir_all`，避免上层判断。
//! - 文件名只允许单个路径分量，拒绝 `..` 与分隔符，防止写到目录之外。
//! - 同名文件直接覆盖，与浏览器下载到固定文件名的行为一致。
//! - 所有可能失败的操作均返回 `Result`，不使用 `expect()` / `unwrap()`。

use std::path::{Component, Path, PathBuf};

use crate::data_uri::DataUri;
use crate::error::AppError;
use crate::export::RasterFormat;

/// 默认下载文件名
pub const DEFAULT_FILE_NAME: &str = "QRCode.png";

const FILE_STEM: &str = "QRCode";

/// 按输出格式生成文件名：PNG 为 `QRCode.png`，其他格式替换扩展名。
pub fn file_name_for(format: RasterFormat) -> String {
    match format {
        RasterFormat::Png => DEFAULT_FILE_NAME.to_string(),
        other => format!("{}.{}", FILE_STEM, other.extension()),
    }
}

/// 保存 Data URI 到 `dir/file_name`。
///
/// # 返回
/// - `Ok(PathBuf)` — 写入后的完整路径
/// - `Err(AppError::Storage)` — 文件名非法或目录无法创建
/// - `Err(AppError::Export)` — Data URI 无法解析
pub async fn save_data_uri(
    data_uri: &str,
    dir: impl AsRef<Path>,
    file_name: &str,
) -> Result<PathBuf, AppError> {
    validate_file_name(file_name)?;
    let dir = dir.as_ref();

    let parsed = DataUri::parse(data_uri)?;

    if !dir.exists() {
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            AppError::Storage(format!("创建下载目录 '{}' 失败: {}", dir.display(), e))
        })?;
    }

    let path = dir.join(file_name);
    tokio::fs::write(&path, &parsed.data).await?;

    log::info!(
        "💾 已保存导出文件 - {} ({} bytes, {})",
        path.display(),
        parsed.data.len(),
        parsed.mime_type
    );

    Ok(path)
}

fn validate_file_name(file_name: &str) -> Result<(), AppError> {
    let mut components = Path::new(file_name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(AppError::Storage(format!("非法文件名: '{}'", file_name))),
    }
}
