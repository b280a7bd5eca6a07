//! 原文登记表
//!
//! 记录每个可翻译文本节点与属性第一次被发现时的原文。登记表只持有节点的弱引用，
//! 节点从文档中移除并释放后对应记录自然失效，由 `prune` 清理并回收空间。
//! 记录编号单调递增且不复用，过期编号查不到记录。
//! 身份以节点地址识别，同一节点（同一属性）最多登记一次，原文登记后不再改变。

use std::collections::HashMap;
use std::rc::{Rc, Weak};

use markup5ever_rcdom::{Handle, Node};

/// 参与翻译的元素属性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TranslatableAttr {
    Placeholder,
    Title,
    AriaLabel,
}

impl TranslatableAttr {
    pub const ALL: [TranslatableAttr; 3] = [
        TranslatableAttr::Placeholder,
        TranslatableAttr::Title,
        TranslatableAttr::AriaLabel,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TranslatableAttr::Placeholder => "placeholder",
            TranslatableAttr::Title => "title",
            TranslatableAttr::AriaLabel => "aria-label",
        }
    }
}

/// 文本节点记录编号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextId(usize);

/// 属性记录编号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttrId(usize);

/// 文本节点原文
#[derive(Debug)]
pub struct TextRecord {
    node: Weak<Node>,
    original: String,
}

impl TextRecord {
    /// 节点仍存活时返回强引用
    pub fn node(&self) -> Option<Handle> {
        self.node.upgrade()
    }

    pub fn original(&self) -> &str {
        &self.original
    }
}

/// 属性原文
#[derive(Debug)]
pub struct AttrRecord {
    element: Weak<Node>,
    attr: TranslatableAttr,
    original: String,
}

impl AttrRecord {
    pub fn element(&self) -> Option<Handle> {
        self.element.upgrade()
    }

    pub fn attr(&self) -> TranslatableAttr {
        self.attr
    }

    pub fn original(&self) -> &str {
        &self.original
    }
}

fn node_key(node: &Handle) -> usize {
    Rc::as_ptr(node) as usize
}

fn points_to(weak: &Weak<Node>, node: &Handle) -> bool {
    std::ptr::eq(weak.as_ptr(), Rc::as_ptr(node)) && weak.strong_count() > 0
}

/// 按编号升序排列的记录；编号只增不减，清理时整体保序压缩
fn find_slot<I: Ord + Copy, R>(records: &[(I, R)], id: I) -> Option<usize> {
    records.binary_search_by_key(&id, |(record_id, _)| *record_id).ok()
}

/// 原文登记表
#[derive(Debug, Default)]
pub struct OriginalTextRegistry {
    texts: Vec<(TextId, TextRecord)>,
    attrs: Vec<(AttrId, AttrRecord)>,
    text_index: HashMap<usize, TextId>,
    attr_index: HashMap<(usize, TranslatableAttr), AttrId>,
    next_text: usize,
    next_attr: usize,
}

impl OriginalTextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 文本节点是否已登记
    pub fn is_text_registered(&self, node: &Handle) -> bool {
        self.text_index
            .get(&node_key(node))
            .and_then(|&id| self.text(id))
            .is_some_and(|record| points_to(&record.node, node))
    }

    /// 属性是否已登记
    pub fn is_attr_registered(&self, element: &Handle, attr: TranslatableAttr) -> bool {
        self.attr_index
            .get(&(node_key(element), attr))
            .and_then(|&id| self.attr(id))
            .is_some_and(|record| points_to(&record.element, element))
    }

    /// 登记文本节点；已登记时返回 `None`，原文保持第一次登记的值
    pub fn register_text(&mut self, node: &Handle, original: impl Into<String>) -> Option<TextId> {
        if self.is_text_registered(node) {
            return None;
        }

        let key = node_key(node);
        // 地址被已释放节点占用过，旧记录作废
        if let Some(stale) = self.text_index.remove(&key) {
            if let Some(slot) = find_slot(&self.texts, stale) {
                self.texts.remove(slot);
            }
        }

        let id = TextId(self.next_text);
        self.next_text += 1;
        self.texts.push((
            id,
            TextRecord {
                node: Rc::downgrade(node),
                original: original.into(),
            },
        ));
        self.text_index.insert(key, id);
        Some(id)
    }

    /// 登记元素属性；已登记时返回 `None`
    pub fn register_attr(
        &mut self,
        element: &Handle,
        attr: TranslatableAttr,
        original: impl Into<String>,
    ) -> Option<AttrId> {
        if self.is_attr_registered(element, attr) {
            return None;
        }

        let key = (node_key(element), attr);
        if let Some(stale) = self.attr_index.remove(&key) {
            if let Some(slot) = find_slot(&self.attrs, stale) {
                self.attrs.remove(slot);
            }
        }

        let id = AttrId(self.next_attr);
        self.next_attr += 1;
        self.attrs.push((
            id,
            AttrRecord {
                element: Rc::downgrade(element),
                attr,
                original: original.into(),
            },
        ));
        self.attr_index.insert(key, id);
        Some(id)
    }

    pub fn text(&self, id: TextId) -> Option<&TextRecord> {
        find_slot(&self.texts, id).map(|slot| &self.texts[slot].1)
    }

    pub fn attr(&self, id: AttrId) -> Option<&AttrRecord> {
        find_slot(&self.attrs, id).map(|slot| &self.attrs[slot].1)
    }

    /// 按登记顺序遍历文本记录
    pub fn text_records(&self) -> impl Iterator<Item = (TextId, &TextRecord)> + '_ {
        self.texts.iter().map(|(id, record)| (*id, record))
    }

    /// 按登记顺序遍历属性记录
    pub fn attr_records(&self) -> impl Iterator<Item = (AttrId, &AttrRecord)> + '_ {
        self.attrs.iter().map(|(id, record)| (*id, record))
    }

    /// 清除节点已被释放的记录并回收空间，返回清除数量
    pub fn prune(&mut self) -> usize {
        let before = self.texts.len() + self.attrs.len();

        self.texts.retain(|(_, r)| r.node.strong_count() > 0);
        let texts = &self.texts;
        self.text_index.retain(|_, id| find_slot(texts, *id).is_some());

        self.attrs.retain(|(_, r)| r.element.strong_count() > 0);
        let attrs = &self.attrs;
        self.attr_index.retain(|_, id| find_slot(attrs, *id).is_some());

        let removed = before - self.texts.len() - self.attrs.len();
        if removed > 0 {
            tracing::debug!("清理失效登记 {} 条", removed);
        }
        removed
    }

    pub fn text_count(&self) -> usize {
        self.text_index.len()
    }

    pub fn attr_count(&self) -> usize {
        self.attr_index.len()
    }

    pub fn len(&self) -> usize {
        self.text_count() + self.attr_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
