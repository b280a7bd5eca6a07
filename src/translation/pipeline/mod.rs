//! 发现与同步流水线
//!
//! 过滤规则、原文登记表以及负责遍历和写回的 DOM 同步器。

pub mod filters;
pub mod registry;
pub mod synchronizer;

pub use filters::TextFilter;
pub use registry::{AttrId, AttrRecord, OriginalTextRegistry, TextId, TextRecord, TranslatableAttr};
pub use synchronizer::{ApplyReport, Discovery, DomSynchronizer, JobTarget, TranslationJob};
