//! DOM 同步器
//!
//! 负责三件事：遍历文档发现尚未登记的文本节点与属性（`collect`），
//! 把译文写回节点（`apply`），以及把所有节点恢复成原文（`restore_all`）。
//! 写回之前都会确认节点仍挂在文档上，已摘除的节点直接跳过。

use markup5ever_rcdom::{Handle, NodeData};

use crate::parsers::html::{
    get_node_attr, get_node_name, get_parent_node, has_live_parent, set_node_attr, set_text,
};
use crate::translation::config::{constants, TranslationConfig};
use crate::translation::pipeline::filters::TextFilter;
use crate::translation::pipeline::registry::{
    AttrId, OriginalTextRegistry, TextId, TranslatableAttr,
};

/// 一次发现得到的新登记
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Discovery {
    pub texts: Vec<TextId>,
    pub attrs: Vec<AttrId>,
}

impl Discovery {
    pub fn len(&self) -> usize {
        self.texts.len() + self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty() && self.attrs.is_empty()
    }
}

/// 译文写回目标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobTarget {
    Text(TextId),
    Attr(AttrId),
}

/// 待翻译任务：写回目标与对应原文一一对应，文本节点在前、属性在后
#[derive(Debug, Default, Clone)]
pub struct TranslationJob {
    pub targets: Vec<JobTarget>,
    pub texts: Vec<String>,
}

impl TranslationJob {
    fn push(&mut self, target: JobTarget, original: &str) {
        self.targets.push(target);
        self.texts.push(original.to_string());
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// 写回结果
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ApplyReport {
    pub applied: usize,
    pub skipped: usize,
}

/// DOM 同步器
pub struct DomSynchronizer {
    filter: TextFilter,
    excluded_marker: String,
}

impl DomSynchronizer {
    pub fn new(config: &TranslationConfig) -> Self {
        Self {
            filter: TextFilter::new(),
            excluded_marker: config.excluded_marker.clone(),
        }
    }

    /// 是否为排除区域的根元素
    fn is_excluded(&self, element: &Handle) -> bool {
        get_node_attr(element, &self.excluded_marker).is_some()
            || get_node_attr(element, "translate").is_some_and(|v| v.eq_ignore_ascii_case("no"))
    }

    /// 文本节点的父元素是否为不翻译的容器
    fn in_skipped_container(text: &Handle) -> bool {
        get_parent_node(text)
            .as_ref()
            .and_then(|parent| get_node_name(parent).map(|name| name.to_ascii_lowercase()))
            .is_some_and(|name| constants::SKIP_ELEMENTS.contains(&name.as_str()))
    }

    /// `root` 的某个祖先是否为排除区域
    fn has_excluded_ancestor(&self, root: &Handle) -> bool {
        let mut current = get_parent_node(root);
        while let Some(ancestor) = current {
            if self.is_excluded(&ancestor) {
                return true;
            }
            current = get_parent_node(&ancestor);
        }
        false
    }

    /// 发现 `root` 下尚未登记的可翻译内容并登记
    pub fn collect(&self, root: &Handle, registry: &mut OriginalTextRegistry) -> Discovery {
        let mut discovery = Discovery::default();
        if self.has_excluded_ancestor(root) {
            return discovery;
        }
        let mut stack = vec![root.clone()];

        while let Some(node) = stack.pop() {
            match &node.data {
                NodeData::Element { .. } => {
                    if self.is_excluded(&node) {
                        continue;
                    }
                    self.collect_attrs(&node, registry, &mut discovery);
                }
                NodeData::Text { contents } => {
                    if Self::in_skipped_container(&node) || registry.is_text_registered(&node) {
                        continue;
                    }
                    let original = contents.borrow().to_string();
                    if !self.filter.should_translate(&original) {
                        continue;
                    }
                    if let Some(id) = registry.register_text(&node, original) {
                        discovery.texts.push(id);
                    }
                    continue;
                }
                NodeData::Document => {}
                _ => continue,
            }

            for child in node.children.borrow().iter().rev() {
                stack.push(child.clone());
            }
        }

        if !discovery.is_empty() {
            tracing::debug!(
                "发现 {} 个文本节点、{} 个属性",
                discovery.texts.len(),
                discovery.attrs.len()
            );
        }
        discovery
    }

    fn collect_attrs(
        &self,
        element: &Handle,
        registry: &mut OriginalTextRegistry,
        discovery: &mut Discovery,
    ) {
        for attr in TranslatableAttr::ALL {
            if registry.is_attr_registered(element, attr) {
                continue;
            }
            let Some(value) = get_node_attr(element, attr.name()) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            if let Some(id) = registry.register_attr(element, attr, value) {
                discovery.attrs.push(id);
            }
        }
    }

    /// 登记表中所有仍挂在文档上的内容
    pub fn snapshot_all(&self, registry: &OriginalTextRegistry) -> TranslationJob {
        let mut job = TranslationJob::default();

        for (id, record) in registry.text_records() {
            if record.node().is_some_and(|node| has_live_parent(&node)) {
                job.push(JobTarget::Text(id), record.original());
            }
        }
        for (id, record) in registry.attr_records() {
            if record.element().is_some_and(|element| has_live_parent(&element)) {
                job.push(JobTarget::Attr(id), record.original());
            }
        }

        job
    }

    /// 仅包含本次新发现的内容
    pub fn snapshot(&self, registry: &OriginalTextRegistry, discovery: &Discovery) -> TranslationJob {
        let mut job = TranslationJob::default();

        for &id in &discovery.texts {
            if let Some(record) = registry.text(id) {
                job.push(JobTarget::Text(id), record.original());
            }
        }
        for &id in &discovery.attrs {
            if let Some(record) = registry.attr(id) {
                job.push(JobTarget::Attr(id), record.original());
            }
        }

        job
    }

    /// 把译文写回对应节点
    pub fn apply(
        &self,
        registry: &OriginalTextRegistry,
        job: &TranslationJob,
        translations: &[String],
    ) -> ApplyReport {
        if translations.len() != job.len() {
            tracing::warn!(
                "译文数量 {} 与任务数量 {} 不一致，多余部分忽略",
                translations.len(),
                job.len()
            );
        }

        let mut report = ApplyReport::default();
        for (target, value) in job.targets.iter().zip(translations) {
            if Self::write(registry, *target, value) {
                report.applied += 1;
            } else {
                report.skipped += 1;
            }
        }
        report
    }

    /// 把所有登记内容恢复为原文
    pub fn restore_all(&self, registry: &OriginalTextRegistry) -> ApplyReport {
        let mut report = ApplyReport::default();

        for (id, record) in registry.text_records() {
            if Self::write(registry, JobTarget::Text(id), record.original()) {
                report.applied += 1;
            } else {
                report.skipped += 1;
            }
        }
        for (id, record) in registry.attr_records() {
            if Self::write(registry, JobTarget::Attr(id), record.original()) {
                report.applied += 1;
            } else {
                report.skipped += 1;
            }
        }

        report
    }

    fn write(registry: &OriginalTextRegistry, target: JobTarget, value: &str) -> bool {
        match target {
            JobTarget::Text(id) => registry
                .text(id)
                .and_then(|record| record.node())
                .filter(has_live_parent)
                .is_some_and(|node| set_text(&node, value)),
            JobTarget::Attr(id) => {
                let Some(record) = registry.attr(id) else {
                    return false;
                };
                let Some(element) = record.element().filter(has_live_parent) else {
                    return false;
                };
                set_node_attr(&element, record.attr().name(), Some(value.to_string()));
                true
            }
        }
    }
}
