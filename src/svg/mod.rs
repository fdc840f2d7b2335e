//! # 矢量图形模块（svg）
//!
//! - `node`：拥有所有权的 SVG 元素树，支持深拷贝、属性读写与文本解析
//! - `serializer`：`DomSerializer` 能力 trait 与默认 `XmlSerializer`

mod node;
mod serializer;

pub use node::{SvgElement, SvgNode};
pub use serializer::{DomSerializer, XmlSerializer};

/// SVG 命名空间 URI。
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
