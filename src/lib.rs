//! # 二维码生成与导出 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  界面层 (表单 + 预览 + 下载按钮)           │
//! │                                                          │
//! │   QrSettings ──(style)──▶ QrRenderer ──▶ SvgElement 预览  │
//! │        │                                                 │
//! │        └──(render_options)──┐                            │
//! └─────────────────────────────┼────────────────────────────┘
//!                               ↕ Result<T, AppError>
//! ┌─────────────────────────────┼────────────────────────────┐
//! │                             ↓                            │
//! │  ┌─ error ────── AppError (统一错误类型)                  │
//! │  │                                                       │
//! │  ├─ settings ─── 表单状态 · 颜色校验 · 重置               │
//! │  ├─ qr ───────── 模块矩阵 → SVG 元素树 (Logo 挖空)        │
//! │  ├─ svg ──────── 元素树 · 解析 · DomSerializer            │
//! │  ├─ export ───── 序列化 → 句柄 → 解码 → 光栅化 → 编码     │
//! │  │   └─ ObjectUrlGuard (RAII 撤销临时句柄)               │
//! │  ├─ data_uri ─── Data URI 编解码                          │
//! │  └─ download ─── 写入 QRCode.png (返回 Result)            │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，所有对外入口的返回类型 |
//! | [`settings`] | 二维码表单状态、校验与重置 |
//! | [`qr`] | 把二维码符号绘制为 SVG 元素树，叠加 Logo |
//! | [`svg`] | 拥有所有权的 SVG 节点模型与序列化能力 |
//! | [`export`] | 矢量节点导出为 PNG/JPEG/WebP Data URI，读取文件为 Data URI |
//! | [`data_uri`] | `data:` URI 的生成与解析 |
//! | [`download`] | 把导出结果写入磁盘 |

pub mod data_uri;
pub mod download;
pub mod error;
pub mod export;
pub mod qr;
pub mod settings;
pub mod svg;

/// 初始化日志。
///
/// 默认级别为 `info`，可通过 `RUST_LOG` 覆盖。重复调用不会报错。
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init();
}
