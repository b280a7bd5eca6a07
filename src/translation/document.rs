//! 活动文档
//!
//! 对 `RcDom` 的封装。文档结构的所有修改（插入、移除节点）都经过这里，
//! 每次修改产生一条变更记录，供变更观察器消费。

use std::rc::{Rc, Weak};

use markup5ever_rcdom::{Handle, Node, RcDom};

use crate::parsers::html::{
    self, find_nodes, get_node_attr, get_parent_node, html_to_dom, parse_fragment,
    serialize_document, set_node_attr,
};
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::languages::TextDirection;

/// 结构变更记录
#[derive(Debug, Clone)]
pub enum MutationRecord {
    ChildAdded { parent: Weak<Node>, node: Weak<Node> },
    ChildRemoved { parent: Weak<Node>, node: Weak<Node> },
}

impl MutationRecord {
    pub fn is_addition(&self) -> bool {
        matches!(self, MutationRecord::ChildAdded { .. })
    }

    /// 被插入或移除的节点（仍存活时）
    pub fn node(&self) -> Option<Handle> {
        match self {
            MutationRecord::ChildAdded { node, .. } | MutationRecord::ChildRemoved { node, .. } => {
                node.upgrade()
            }
        }
    }
}

/// 活动文档
pub struct LiveDocument {
    dom: RcDom,
    encoding: String,
    records: Vec<MutationRecord>,
}

impl LiveDocument {
    /// 解析 UTF-8 HTML 文本
    pub fn parse(html: &str) -> TranslationResult<Self> {
        Self::from_bytes(html.as_bytes(), "utf-8")
    }

    /// 按指定字符集解析 HTML 字节
    pub fn from_bytes(data: &[u8], encoding: &str) -> TranslationResult<Self> {
        let dom = html_to_dom(data, encoding)
            .map_err(|e| TranslationError::ParseError(format!("HTML 解析失败: {}", e)))?;

        Ok(Self {
            dom,
            encoding: encoding.to_string(),
            records: Vec::new(),
        })
    }

    pub fn document(&self) -> &Handle {
        &self.dom.document
    }

    /// `<html>` 元素
    pub fn root_element(&self) -> Option<Handle> {
        find_nodes(&self.dom.document, &["html"]).into_iter().next()
    }

    pub fn body(&self) -> Option<Handle> {
        find_nodes(&self.dom.document, &["html", "body"])
            .into_iter()
            .next()
    }

    /// 发现的起点：有 `<body>` 时为 body，否则为整个文档
    pub fn scan_root(&self) -> Handle {
        self.body().unwrap_or_else(|| self.dom.document.clone())
    }

    pub fn find_by_id(&self, id: &str) -> Option<Handle> {
        html::find_by_id(&self.dom.document, id)
    }

    /// 解析 HTML 片段并追加到 `parent` 末尾，返回插入的顶层节点
    pub fn append_html(&mut self, parent: &Handle, fragment: &str) -> TranslationResult<Vec<Handle>> {
        let nodes = parse_fragment(fragment)
            .map_err(|e| TranslationError::ParseError(format!("HTML 片段解析失败: {}", e)))?;

        for node in &nodes {
            self.append_child(parent, node);
        }
        Ok(nodes)
    }

    /// 追加节点（原来挂在别处时会先移除并记录）
    pub fn append_child(&mut self, parent: &Handle, child: &Handle) {
        if let Some(previous) = get_parent_node(child) {
            self.records.push(MutationRecord::ChildRemoved {
                parent: Rc::downgrade(&previous),
                node: Rc::downgrade(child),
            });
        }

        html::append_child(parent, child);
        self.records.push(MutationRecord::ChildAdded {
            parent: Rc::downgrade(parent),
            node: Rc::downgrade(child),
        });
    }

    /// 移除节点，返回是否真的移除
    pub fn remove_node(&mut self, node: &Handle) -> bool {
        let Some(parent) = get_parent_node(node) else {
            return false;
        };

        let removed = html::detach(node);
        if removed {
            self.records.push(MutationRecord::ChildRemoved {
                parent: Rc::downgrade(&parent),
                node: Rc::downgrade(node),
            });
        }
        removed
    }

    /// 取走积压的变更记录
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.records)
    }

    /// 设置 `<html dir>`
    pub fn set_direction(&self, direction: TextDirection) {
        if let Some(root) = self.root_element() {
            set_node_attr(&root, "dir", Some(direction.as_str().to_string()));
        }
    }

    pub fn direction(&self) -> TextDirection {
        match self.root_element().and_then(|root| get_node_attr(&root, "dir")) {
            Some(dir) if dir.eq_ignore_ascii_case("rtl") => TextDirection::Rtl,
            _ => TextDirection::Ltr,
        }
    }

    /// 按文档原字符集序列化
    pub fn serialize(&self) -> TranslationResult<Vec<u8>> {
        serialize_document(&self.dom.document, &self.encoding)
            .map_err(|e| TranslationError::SerializationError(format!("HTML 序列化失败: {}", e)))
    }

    /// 序列化为 UTF-8 字符串
    pub fn to_html(&self) -> TranslationResult<String> {
        let bytes = serialize_document(&self.dom.document, "utf-8")
            .map_err(|e| TranslationError::SerializationError(format!("HTML 序列化失败: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| TranslationError::SerializationError(format!("非 UTF-8 输出: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::text_content;

    #[test]
    fn test_append_html_records_additions() {
        let mut doc = LiveDocument::parse("<html><body><p>One</p></body></html>").unwrap();
        let body = doc.body().unwrap();

        let added = doc.append_html(&body, "<p>Two</p><p>Three</p>").unwrap();
        assert_eq!(added.len(), 2);

        let records = doc.take_records();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(MutationRecord::is_addition));
        assert!(doc.take_records().is_empty());
        assert_eq!(text_content(&body), "OneTwoThree");
    }

    #[test]
    fn test_remove_node_records_removal() {
        let mut doc = LiveDocument::parse("<p id=\"a\">A</p><p id=\"b\">B</p>").unwrap();
        let a = doc.find_by_id("a").unwrap();

        assert!(doc.remove_node(&a));
        assert!(!doc.remove_node(&a));

        let records = doc.take_records();
        assert_eq!(records.len(), 1);
        assert!(!records[0].is_addition());
        assert!(doc.find_by_id("a").is_none());
    }

    #[test]
    fn test_moving_node_records_both() {
        let mut doc =
            LiveDocument::parse("<div id=\"from\"><p id=\"p\">x</p></div><div id=\"to\"></div>")
                .unwrap();
        let p = doc.find_by_id("p").unwrap();
        let to = doc.find_by_id("to").unwrap();

        doc.append_child(&to, &p);
        let records = doc.take_records();
        assert_eq!(records.len(), 2);
        assert!(!records[0].is_addition());
        assert!(records[1].is_addition());
    }

    #[test]
    fn test_direction_roundtrip() {
        let doc = LiveDocument::parse("<html><body></body></html>").unwrap();
        assert_eq!(doc.direction(), TextDirection::Ltr);

        doc.set_direction(TextDirection::Rtl);
        assert_eq!(doc.direction(), TextDirection::Rtl);
        assert!(doc.to_html().unwrap().contains("<html dir=\"rtl\">"));

        doc.set_direction(TextDirection::Ltr);
        assert_eq!(doc.direction(), TextDirection::Ltr);
    }
}
