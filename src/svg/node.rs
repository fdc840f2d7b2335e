//! # 矢量节点树
//!
//! ## 设计思路
//!
//! 以拥有所有权的元素树表示已渲染的 SVG 图形：元素名、按插入顺序保存的属性、子节点。
//! 深拷贝直接由 `Clone` 完成，拷贝与原树之间不共享任何可变状态，
//! 导出流水线因此可以放心修改副本而不影响界面层持有的原节点。
//!
//! ## 实现思路
//!
//! - 属性使用 `Vec<(String, String)>`，保持序列化输出顺序稳定。
//! - `set_attribute` 覆盖同名属性，否则追加到末尾，与 DOM 行为一致。
//! - `parse` 基于 `roxmltree`，根元素上的命名空间声明还原为 `xmlns*` 属性。

use crate::export::ExportError;

const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";
const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// 元素树中的节点。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SvgNode {
    Element(SvgElement),
    Text(String),
}

/// 矢量图形元素。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvgElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<SvgNode>,
}

impl SvgElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// 链式设置属性，便于构造节点树。
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_child(mut self, child: SvgElement) -> Self {
        self.children.push(SvgNode::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(SvgNode::Text(text.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn children(&self) -> &[SvgNode] {
        &self.children
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|(key, _)| key == name)?;
        Some(self.attributes.remove(index).1)
    }

    pub fn push_child(&mut self, child: SvgNode) {
        self.children.push(child);
    }

    /// 按文档顺序遍历所有后代元素（含自身）。
    pub fn descendants(&self) -> Vec<&SvgElement> {
        let mut out = vec![self];
        let mut index = 0;
        while index < out.len() {
            let current = out[index];
            for child in &current.children {
                if let SvgNode::Element(element) = child {
                    out.push(element);
                }
            }
            index += 1;
        }
        out
    }

    /// 从 SVG/XML 文本解析元素树。
    ///
    /// # 示例
    /// ```rust
    /// use qrcode_export::svg::SvgElement;
    ///
    /// let svg = SvgElement::parse(r#"<svg width="10"><rect width="1" height="1"/></svg>"#)?;
    /// assert_eq!(svg.attribute("width"), Some("10"));
    /// # Ok::<(), qrcode_export::export::ExportError>(())
    /// ```
    pub fn parse(markup: &str) -> Result<Self, ExportError> {
        let document = roxmltree::Document::parse(markup)
            .map_err(|e| ExportError::InvalidFormat(format!("无法解析矢量图形：{}", e)))?;

        let root = document.root_element();
        let mut element = Self::from_xml_node(root);

        for namespace in root.namespaces() {
            if namespace.uri() == XML_NAMESPACE {
                continue;
            }
            let attribute_name = match namespace.name() {
                Some(prefix) => format!("xmlns:{}", prefix),
                None => "xmlns".to_string(),
            };
            if element.attribute(&attribute_name).is_none() {
                element.set_attribute(attribute_name, namespace.uri());
            }
        }

        Ok(element)
    }

    fn from_xml_node(node: roxmltree::Node<'_, '_>) -> Self {
        let mut element = Self::new(node.tag_name().name());

        for attribute in node.attributes() {
            let name = match attribute.namespace() {
                Some(XLINK_NAMESPACE) => format!("xlink:{}", attribute.name()),
                Some(XML_NAMESPACE) => format!("xml:{}", attribute.name()),
                _ => attribute.name().to_string(),
            };
            element.set_attribute(name, attribute.value());
        }

        for child in node.children() {
            if child.is_element() {
                element.push_child(SvgNode::Element(Self::from_xml_node(child)));
            } else if child.is_text() {
                if let Some(text) = child.text() {
                    if !text.trim().is_empty() {
                        element.push_child(SvgNode::Text(text.to_string()));
                    }
                }
            }
        }

        element
    }
}
