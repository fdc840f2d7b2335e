//! # 导出流水线
//!
//! ## 设计思路
//!
//! `ExportPipeline` 只负责流程编排与配置管理，具体能力全部通过 trait 注入：
//! `DomSerializer`、`ObjectUrlRegistry`、`ImageDecoder`、`RasterSurfaceFactory`。
//! 处理链路固定为：
//! 1. 克隆：深拷贝源节点，源节点不被修改
//! 2. 规范化：写入 `width` / `height` / `xmlns`
//! 3. 序列化：节点树 → XML 文本
//! 4. 打包：文本 → `image/svg+xml` Blob → 临时句柄
//! 5. 解码：唯一挂起点，成功 / 失败 / 超时都会终止
//! 6. 光栅化：`dimension × dimension` 表面，原点 1:1 绘制
//! 7. 编码：按 MIME 类型输出 Data URI
//!
//! ## 实现思路
//!
//! - 配置通过 `Arc<RwLock<ExportConfig>>` 支持运行时调整，单次请求使用同一快照。
//! - 临时句柄由 `ObjectUrlGuard` 持有，解码阶段结束（无论成败）立即撤销。
//! - 绘图上下文缺失返回 `SurfaceUnavailable`，不存在“既不成功也不失败”的路径。
//! - 记录 `serialize/decode/raster/total` 阶段耗时，便于性能诊断。

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use super::decoder::{ImageDecoder, ResvgDecoder};
use super::object_url::{InMemoryObjectUrlRegistry, ObjectUrlGuard, ObjectUrlRegistry};
use super::source::{Blob, DecodedImage, SVG_MIME_TYPE};
use super::surface::{PixmapSurfaceFactory, RasterSurfaceFactory};
use super::{ExportConfig, ExportError, RenderOptions};
use crate::svg::{DomSerializer, SVG_NAMESPACE, SvgElement, XmlSerializer};

/// 流水线依赖的外部能力。
///
/// 测试中可以只替换其中一项：
/// ```rust
/// use std::sync::Arc;
/// use qrcode_export::export::{ExportCapabilities, InMemoryObjectUrlRegistry};
///
/// let capabilities = ExportCapabilities {
///     registry: Arc::new(InMemoryObjectUrlRegistry::new()),
///     ..ExportCapabilities::default()
/// };
/// # let _ = capabilities;
/// ```
#[derive(Clone)]
pub struct ExportCapabilities {
    pub serializer: Arc<dyn DomSerializer>,
    pub registry: Arc<dyn ObjectUrlRegistry>,
    pub decoder: Arc<dyn ImageDecoder>,
    pub surfaces: Arc<dyn RasterSurfaceFactory>,
}

impl Default for ExportCapabilities {
    fn default() -> Self {
        Self {
            serializer: Arc::new(XmlSerializer),
            registry: Arc::new(InMemoryObjectUrlRegistry::new()),
            decoder: Arc::new(ResvgDecoder),
            surfaces: Arc::new(PixmapSurfaceFactory),
        }
    }
}

/// SVG → 光栅 Data URI 导出流水线。
pub struct ExportPipeline {
    config: Arc<RwLock<ExportConfig>>,
    capabilities: ExportCapabilities,
}

impl ExportPipeline {
    /// 使用默认能力创建流水线。
    pub fn new(config: ExportConfig) -> Result<Self, ExportError> {
        Self::with_capabilities(config, ExportCapabilities::default())
    }

    pub fn with_capabilities(
        config: ExportConfig,
        capabilities: ExportCapabilities,
    ) -> Result<Self, ExportError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            capabilities,
        })
    }

    /// 获取配置快照，保证单次请求链路使用一致参数。
    pub fn config_snapshot(&self) -> Result<ExportConfig, ExportError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| ExportError::ResourceLimit("配置读取锁已中毒".to_string()))
    }

    /// 校验并替换配置，对之后开始的导出生效。
    pub fn set_config(&self, config: ExportConfig) -> Result<(), ExportError> {
        config.validate()?;

        let mut current = self
            .config
            .write()
            .map_err(|_| ExportError::ResourceLimit("配置写入锁已中毒".to_string()))?;
        *current = config;

        log::info!(
            "⚙️ 已更新导出配置（default_dimension={}, max_dimension={}, max_decoded_pixels={}, jpeg_quality={}, decode_timeout_ms={:?}）",
            current.default_dimension,
            current.max_dimension,
            current.max_decoded_pixels,
            current.jpeg_quality,
            current.decode_timeout_ms
        );

        Ok(())
    }

    pub fn registry(&self) -> &Arc<dyn ObjectUrlRegistry> {
        &self.capabilities.registry
    }

    /// 将矢量节点导出为光栅图 Data URI。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use qrcode_export::export::{ExportConfig, ExportPipeline, RenderOptions};
    /// use qrcode_export::svg::SvgElement;
    ///
    /// # async fn demo() -> Result<(), qrcode_export::export::ExportError> {
    /// let pipeline = ExportPipeline::new(ExportConfig::default())?;
    /// let node = SvgElement::parse(r#"<svg viewBox="0 0 1 1"><rect width="1" height="1"/></svg>"#)?;
    /// let data_url = pipeline.convert(&node, RenderOptions::new(1000)).await?;
    /// assert!(data_url.starts_with("data:image/png;base64,"));
    /// # Ok(())
    /// # }
    /// ```
    pub async fn convert(
        &self,
        source: &SvgElement,
        options: RenderOptions,
    ) -> Result<String, ExportError> {
        let config = self.config_snapshot()?;
        let options = options.normalized(config.default_dimension);
        Self::validate_dimension(options.dimension, &config)?;
        let dimension = options.dimension;
        let total_start = Instant::now();

        let serialize_start = Instant::now();
        let cloned = Self::clone_and_normalize(source, dimension);
        let markup = self.capabilities.serializer.serialize_to_string(&cloned)?;
        drop(cloned);
        let serialize_elapsed = serialize_start.elapsed();

        log::debug!("📝 已序列化矢量节点 - {} bytes", markup.len());

        let blob = Blob::new(markup.into_bytes(), SVG_MIME_TYPE);
        let handle = ObjectUrlGuard::acquire(Arc::clone(&self.capabilities.registry), blob)?;

        let decode_start = Instant::now();
        let decoded = self.decode(&handle, &config).await;
        drop(handle);
        let decoded = decoded?;
        let decode_elapsed = decode_start.elapsed();

        let raster_start = Instant::now();
        let data_url = self.rasterize(decoded, &options, &config)?;
        let raster_elapsed = raster_start.elapsed();

        log::info!(
            "✅ 导出完成 - {}x{} {} serialize={}ms decode={}ms raster={}ms total={}ms",
            dimension,
            dimension,
            options.mime_type,
            serialize_elapsed.as_millis(),
            decode_elapsed.as_millis(),
            raster_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(data_url)
    }

    fn validate_dimension(dimension: u32, config: &ExportConfig) -> Result<(), ExportError> {
        if dimension > config.max_dimension {
            return Err(ExportError::ResourceLimit(format!(
                "输出尺寸过大：{}px（限制：{}px）",
                dimension, config.max_dimension
            )));
        }
        Ok(())
    }

    /// 深拷贝源节点并写入输出尺寸与命名空间。
    fn clone_and_normalize(source: &SvgElement, dimension: u32) -> SvgElement {
        let mut cloned = source.clone();
        let dimension = dimension.to_string();
        cloned.set_attribute("width", dimension.clone());
        cloned.set_attribute("height", dimension);
        cloned.set_attribute("xmlns", SVG_NAMESPACE);
        cloned
    }

    async fn decode(
        &self,
        handle: &ObjectUrlGuard,
        config: &ExportConfig,
    ) -> Result<DecodedImage, ExportError> {
        let task = self
            .capabilities
            .decoder
            .decode(handle.url(), handle.registry(), config.max_decoded_pixels);

        match config.decode_timeout_ms {
            Some(timeout_ms) => tokio::time::timeout(Duration::from_millis(timeout_ms), task)
                .await
                .map_err(|_| ExportError::Timeout(format!("解码超时（{}毫秒）", timeout_ms)))?,
            None => task.await,
        }
    }

    fn rasterize(
        &self,
        decoded: DecodedImage,
        options: &RenderOptions,
        config: &ExportConfig,
    ) -> Result<String, ExportError> {
        let dimension = options.dimension;
        let mut surface = self.capabilities.surfaces.create_surface(dimension, dimension)?;

        let context = surface
            .context_2d()
            .ok_or_else(|| ExportError::SurfaceUnavailable("无法获取 2D 绘图上下文".to_string()))?;
        context.draw_image(&decoded, 0, 0);
        drop(decoded);

        surface.to_data_url(&options.mime_type, config.jpeg_quality)
    }
}
