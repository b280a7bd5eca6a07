//! HTML解析和处理模块
//!
//! - `dom`: 基础DOM操作（解析、属性、文本、节点挂载）
//! - `serializer`: 序列化功能

pub mod dom;
pub mod serializer;

pub use dom::{
    append_child, detach, find_by_id, find_nodes, get_node_attr, get_node_name, get_parent_node,
    get_text, has_live_parent, html_to_dom, parse_fragment, set_node_attr, set_text, text_content,
};
pub use serializer::serialize_document;
