//! # 导出模块（export）
//!
//! ## 设计思路
//!
//! 该模块把“矢量节点 → 序列化 → 临时句柄 → 解码 → 光栅化 → 编码”
//! 按职责拆分为多个子模块，每种外部能力都是可替换的 trait。
//!
//! - `service`：面向界面的入口（渲染二维码、导出、下载、上传 Logo）
//! - `pipeline`：编排整条导出链路并记录阶段耗时
//! - `object_url`：临时句柄的登记、解析与撤销（RAII 守卫）
//! - `decoder`：异步解码 SVG / 位图
//! - `surface`：光栅表面、2D 绘图上下文与编码
//! - `ingest`：文件读成 Data URI
//! - `config/error/options/source`：配置、错误、请求参数、中间数据模型
//!
//! ## 实现思路
//!
//! 对外只暴露稳定类型与入口函数，具体实现细节保持 `mod` 私有。
//!
//! ## 调用链
//!
//! ```text
//! 界面事件（点击“下载”）
//!    ↓
//! service.rs（QrSettings → QrStyle → SvgElement）
//!    ↓
//! pipeline.rs（统一编排 + 阶段耗时日志）
//!    ├─ svg::XmlSerializer（节点 → 文本）
//!    ├─ object_url.rs（Blob → 临时句柄，结束即撤销）
//!    ├─ decoder.rs（句柄 → 像素）
//!    └─ surface.rs（绘制 + PNG/JPEG/WebP 编码）
//!    ↓
//! Data URI → download.rs 写入 QRCode.png
//! ```

mod config;
mod decoder;
mod error;
mod ingest;
mod object_url;
mod options;
mod pipeline;
mod service;
mod source;
mod surface;

pub use config::ExportConfig;
pub use decoder::{DecodeFuture, ImageDecoder, ResvgDecoder};
pub use error::ExportError;
pub use ingest::{read_as_data_url, read_as_data_url_with_limit, read_bytes_as_data_url};
pub use object_url::{InMemoryObjectUrlRegistry, ObjectUrlGuard, ObjectUrlRegistry};
pub use options::{DEFAULT_IMAGE_DIMENSION, DEFAULT_MIME_TYPE, RasterFormat, RenderOptions};
pub use pipeline::{ExportCapabilities, ExportPipeline};
pub use service::QrExportService;
pub use source::{Blob, DecodedImage, ObjectUrl, SVG_MIME_TYPE};
pub use surface::{DrawingContext2d, PixmapSurface, PixmapSurfaceFactory, RasterSurface, RasterSurfaceFactory};
