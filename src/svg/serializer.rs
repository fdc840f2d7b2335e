//! # XML 序列化
//!
//! ## 设计思路
//!
//! `DomSerializer` 抽象了“节点树 → 文本”的能力，流水线只依赖该 trait，
//! 测试可以注入失败或返回任意文本的实现。
//!
//! 默认实现 `XmlSerializer` 输出标准 XML：
//! - 元素名与属性名必须是合法 XML 名称，否则返回 `Serialization` 错误
//! - 属性值转义 `& < > "` 以及 `\t \n \r`（写成字符引用，避免解析端把它们规范化为空格），
//!   文本转义 `& < >` 与 `\r`
//! - 属性值与文本中不允许出现 XML 1.0 禁止的字符：`\t \n \r` 以外的 C0 控制字符、U+FFFE、U+FFFF
//! - 无子节点的元素输出自闭合标签

use once_cell::sync::Lazy;
use regex::Regex;

use super::node::{SvgElement, SvgNode};
use crate::export::ExportError;

/// 合法 XML 名称（允许单个命名空间前缀）。
static XML_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9._\-]*(:[A-Za-z_][A-Za-z0-9._\-]*)?$").unwrap()
});

/// 节点树序列化能力。
pub trait DomSerializer: Send + Sync {
    fn serialize_to_string(&self, element: &SvgElement) -> Result<String, ExportError>;
}

/// 默认 XML 序列化器。
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlSerializer;

impl DomSerializer for XmlSerializer {
    fn serialize_to_string(&self, element: &SvgElement) -> Result<String, ExportError> {
        let mut out = String::with_capacity(1024);
        Self::write_element(element, &mut out)?;
        Ok(out)
    }
}

impl XmlSerializer {
    fn write_element(element: &SvgElement, out: &mut String) -> Result<(), ExportError> {
        Self::validate_name(element.name(), "元素")?;

        out.push('<');
        out.push_str(element.name());

        for (name, value) in element.attributes() {
            Self::validate_name(name, "属性")?;
            Self::validate_chars(value)?;
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            Self::escape_into(value, true, out);
            out.push('"');
        }

        if element.children().is_empty() {
            out.push_str("/>");
            return Ok(());
        }

        out.push('>');
        for child in element.children() {
            match child {
                SvgNode::Element(child) => Self::write_element(child, out)?,
                SvgNode::Text(text) => {
                    Self::validate_chars(text)?;
                    Self::escape_into(text, false, out);
                }
            }
        }
        out.push_str("</");
        out.push_str(element.name());
        out.push('>');

        Ok(())
    }

    fn validate_name(name: &str, kind: &str) -> Result<(), ExportError> {
        if XML_NAME.is_match(name) {
            Ok(())
        } else {
            Err(ExportError::Serialization(format!("非法{}名称：{:?}", kind, name)))
        }
    }

    fn validate_chars(value: &str) -> Result<(), ExportError> {
        match value
            .chars()
            .find(|&c| {
                (c < '\u{20}' && !matches!(c, '\t' | '\n' | '\r'))
                    || matches!(c, '\u{FFFE}' | '\u{FFFF}')
            })
        {
            Some(c) => Err(ExportError::Serialization(format!(
                "包含非法字符：U+{:04X}",
                c as u32
            ))),
            None => Ok(()),
        }
    }

    fn escape_into(value: &str, attribute: bool, out: &mut String) {
        for c in value.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' if attribute => out.push_str("&quot;"),
                '\n' if attribute => out.push_str("&#10;"),
                '\t' if attribute => out.push_str("&#9;"),
                '\r' => out.push_str("&#13;"),
                _ => out.push(c),
            }
        }
    }
}
