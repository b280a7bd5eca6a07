use std::rc::Rc;

use encoding_rs::Encoding;
use html5ever::parse_document;
use html5ever::tendril::{StrTendril, TendrilSink};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// 将 HTML 字节转换为 DOM
///
/// 无法识别的字符集标签按 UTF-8（有损）解码。
pub fn html_to_dom(data: &[u8], document_encoding: &str) -> std::io::Result<RcDom> {
    let s: String = match Encoding::for_label(document_encoding.as_bytes()) {
        Some(encoding) => {
            let (string, _, _) = encoding.decode(data);
            string.to_string()
        }
        None => String::from_utf8_lossy(data).to_string(),
    };

    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut s.as_bytes())
}

/// 查找指定路径的DOM节点
pub fn find_nodes(node: &Handle, node_names: &[&str]) -> Vec<Handle> {
    let mut found_nodes = Vec::new();
    let Some((&node_name, rest)) = node_names.split_first() else {
        return found_nodes;
    };

    if let NodeData::Element { ref name, .. } = node.data {
        if &*name.local == node_name {
            if rest.is_empty() {
                found_nodes.push(node.clone());
            } else {
                for child_node in node.children.borrow().iter() {
                    found_nodes.append(&mut find_nodes(child_node, rest));
                }
                return found_nodes;
            }
        }
    }

    for child_node in node.children.borrow().iter() {
        found_nodes.append(&mut find_nodes(child_node, node_names));
    }

    found_nodes
}

/// 获取节点属性值
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => {
            for attr in attrs.borrow().iter() {
                if &*attr.name.local == attr_name {
                    return Some(attr.value.to_string());
                }
            }
            None
        }
        _ => None,
    }
}

/// 获取节点名称
pub fn get_node_name(node: &Handle) -> Option<&'_ str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// 获取父节点
///
/// `parent` 是 `Cell<Option<Weak>>`，读取时必须取出再放回。
pub fn get_parent_node(child: &Handle) -> Option<Handle> {
    let parent = child.parent.take();
    let upgraded = parent.as_ref().and_then(|weak| weak.upgrade());
    child.parent.set(parent);
    upgraded
}

/// 节点是否仍挂在一个存活的父节点下
pub fn has_live_parent(node: &Handle) -> bool {
    get_parent_node(node).is_some()
}

/// 设置节点属性
pub fn set_node_attr(node: &Handle, attr_name: &str, attr_value: Option<String>) {
    use html5ever::interface::{Attribute, QualName};
    use html5ever::tendril::format_tendril;
    use html5ever::{namespace_url, ns, LocalName};

    if let NodeData::Element { attrs, .. } = &node.data {
        let attrs_mut = &mut attrs.borrow_mut();
        let mut i = 0;
        let mut found_existing_attr: bool = false;

        while i < attrs_mut.len() {
            if &attrs_mut[i].name.local == attr_name {
                found_existing_attr = true;

                if let Some(attr_value) = attr_value.as_deref() {
                    attrs_mut[i].value.clear();
                    attrs_mut[i].value.push_slice(attr_value);
                } else {
                    // Remove attr completely if attr_value is not defined
                    attrs_mut.remove(i);
                    continue;
                }
            }

            i += 1;
        }

        if !found_existing_attr {
            if let Some(attr_value) = attr_value {
                let name = LocalName::from(attr_name);

                attrs_mut.push(Attribute {
                    name: QualName::new(None, ns!(), name),
                    value: format_tendril!("{}", attr_value),
                });
            }
        }
    };
}

/// 读取文本节点内容，非文本节点返回 `None`
pub fn get_text(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Text { contents } => Some(contents.borrow().to_string()),
        _ => None,
    }
}

/// 覆写文本节点内容，返回是否写入
pub fn set_text(node: &Handle, value: &str) -> bool {
    match &node.data {
        NodeData::Text { contents } => {
            *contents.borrow_mut() = StrTendril::from_slice(value);
            true
        }
        _ => false,
    }
}

/// 拼接节点下所有文本
pub fn text_content(node: &Handle) -> String {
    let mut buf = String::new();
    let mut stack = vec![node.clone()];

    while let Some(current) = stack.pop() {
        if let NodeData::Text { contents } = &current.data {
            buf.push_str(&contents.borrow());
        }
        for child in current.children.borrow().iter().rev() {
            stack.push(child.clone());
        }
    }

    buf
}

/// 把 `child` 挂到 `parent` 末尾，必要时先从原父节点摘下
pub fn append_child(parent: &Handle, child: &Handle) {
    detach(child);
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child.clone());
}

/// 把节点从父节点摘下，返回是否真的摘除
pub fn detach(node: &Handle) -> bool {
    let Some(parent) = get_parent_node(node) else {
        return false;
    };
    node.parent.set(None);

    let mut children = parent.children.borrow_mut();
    let before = children.len();
    children.retain(|child| !Rc::ptr_eq(child, node));
    children.len() != before
}

/// 将 HTML 片段解析为一组独立节点（父指针已清空）
pub fn parse_fragment(fragment: &str) -> std::io::Result<Vec<Handle>> {
    let wrapped = format!("<html><head></head><body>{fragment}</body></html>");
    let dom = html_to_dom(wrapped.as_bytes(), "utf-8")?;

    let Some(body) = find_nodes(&dom.document, &["html", "body"]).into_iter().next() else {
        return Ok(Vec::new());
    };

    let nodes: Vec<Handle> = std::mem::take(&mut *body.children.borrow_mut());
    for node in &nodes {
        node.parent.set(None);
    }

    Ok(nodes)
}

/// 按 `id` 属性查找元素
pub fn find_by_id(node: &Handle, id: &str) -> Option<Handle> {
    let mut stack = vec![node.clone()];

    while let Some(current) = stack.pop() {
        if get_node_attr(&current, "id").as_deref() == Some(id) {
            return Some(current);
        }
        for child in current.children.borrow().iter().rev() {
            stack.push(child.clone());
        }
    }

    None
}
