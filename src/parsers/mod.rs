//! # 解析器模块
//!
//! HTML文档解析、DOM操作与序列化。翻译管道只通过这里接触 html5ever。

pub mod html;

pub use html::{html_to_dom, serialize_document};
