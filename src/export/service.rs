//! # 服务层
//!
//! ## 设计思路
//!
//! `QrExportService` 是界面层唯一需要持有的对象，替代全局单例：
//! 1. 生命周期由宿主统一管理
//! 2. 测试可创建独立实例，互不共享注册表与配置
//!
//! ## 实现思路
//!
//! 对外仅暴露少量稳定 API：
//! - `render_svg`：按当前设置生成屏幕上的二维码节点
//! - `export_data_uri`：按设置导出光栅 Data URI
//! - `download`：导出并写入 `QRCode.png`
//! - `upload_logo`：读取 Logo 文件并写回设置
//! - `config` / `set_config`：读取与调整导出配置

use std::path::{Path, PathBuf};
use std::time::Instant;

use super::{ExportConfig, ExportError, ExportPipeline, RasterFormat, read_as_data_url_with_limit};
use crate::download::{file_name_for, save_data_uri};
use crate::error::AppError;
use crate::qr::QrRenderer;
use crate::settings::QrSettings;
use crate::svg::SvgElement;

/// 二维码导出服务。
pub struct QrExportService {
    pipeline: ExportPipeline,
    renderer: QrRenderer,
}

impl QrExportService {
    /// 使用默认配置创建服务。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use qrcode_export::export::QrExportService;
    ///
    /// let service = QrExportService::new()?;
    /// # Ok::<(), qrcode_export::export::ExportError>(())
    /// ```
    pub fn new() -> Result<Self, ExportError> {
        Self::with_config(ExportConfig::default())
    }

    pub fn with_config(config: ExportConfig) -> Result<Self, ExportError> {
        Ok(Self::with_pipeline(ExportPipeline::new(config)?))
    }

    /// 使用自定义流水线（例如替换了解码器的测试实例）创建服务。
    pub fn with_pipeline(pipeline: ExportPipeline) -> Self {
        Self {
            pipeline,
            renderer: QrRenderer,
        }
    }

    pub fn pipeline(&self) -> &ExportPipeline {
        &self.pipeline
    }

    pub fn config(&self) -> Result<ExportConfig, ExportError> {
        self.pipeline.config_snapshot()
    }

    pub fn set_config(&self, config: ExportConfig) -> Result<(), ExportError> {
        self.pipeline.set_config(config)
    }

    pub fn render_svg(&self, settings: &QrSettings) -> Result<SvgElement, AppError> {
        Ok(self.renderer.render(&settings.style())?)
    }

    /// 按设置导出光栅 Data URI。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use qrcode_export::export::QrExportService;
    /// use qrcode_export::settings::QrSettings;
    ///
    /// # async fn demo() -> Result<(), qrcode_export::error::AppError> {
    /// let service = QrExportService::new()?;
    /// let mut settings = QrSettings::default();
    /// settings.set_url("https://example.com");
    /// let data_url = service.export_data_uri(&settings).await?;
    /// assert!(data_url.starts_with("data:image/png;base64,"));
    /// # Ok(())
    /// # }
    /// ```
    pub async fn export_data_uri(&self, settings: &QrSettings) -> Result<String, AppError> {
        let svg = self.render_svg(settings)?;
        let data_url = self.pipeline.convert(&svg, settings.render_options()).await?;
        Ok(data_url)
    }

    /// 导出并保存到 `dir` 下，返回写入的文件路径。
    pub async fn download(&self, settings: &QrSettings, dir: impl AsRef<Path>) -> Result<PathBuf, AppError> {
        let start = Instant::now();
        let options = settings.render_options();
        let format = RasterFormat::from_mime(&options.mime_type).unwrap_or(RasterFormat::Png);

        let data_url = self.export_data_uri(settings).await?;
        let path = save_data_uri(&data_url, dir, &file_name_for(format)).await?;

        log::info!(
            "⬇️ 二维码下载完成 - {}px, 耗时 {}ms",
            options.dimension,
            start.elapsed().as_millis()
        );

        Ok(path)
    }

    /// 读取 Logo 文件为 Data URI，并记录到设置中。
    ///
    /// 读取失败时设置保持不变。
    pub async fn upload_logo(&self, settings: &mut QrSettings, path: impl AsRef<Path>) -> Result<(), AppError> {
        let path = path.as_ref();
        let max_file_size = self.config()?.max_file_size;
        let data_url = read_as_data_url_with_limit(path, max_file_size).await?;

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        log::info!("🖼️ 已载入 Logo - {}", name);
        settings.set_logo(name, data_url);

        Ok(())
    }
}
