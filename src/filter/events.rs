//! 触发事件
//!
//! 外部事件源发出的"内容已变化"通知。页面就绪与内容更新两种通知都映射到
//! 同一个入队操作。

use markup5ever_rcdom::Handle;

/// 一次触发，携带可选的扫描根
///
/// `scan_roots` 为空表示整个文档。创建后不可变。
#[derive(Debug, Clone, Default)]
pub struct TriggerEvent {
    scan_roots: Vec<Handle>,
}

impl TriggerEvent {
    /// 扫描整个文档
    pub fn whole_document() -> Self {
        Self::default()
    }

    pub fn with_roots(scan_roots: Vec<Handle>) -> Self {
        Self { scan_roots }
    }

    pub fn scan_roots(&self) -> &[Handle] {
        &self.scan_roots
    }

    pub fn is_whole_document(&self) -> bool {
        self.scan_roots.is_empty()
    }
}

/// 宿主页面的通知
#[derive(Debug, Clone)]
pub enum ContentEvent {
    /// 页面就绪，扫描整个文档
    PageReady,
    /// 过滤内容已更新，`nodes` 为变化区域的根
    ContentUpdated { nodes: Vec<Handle> },
}

impl ContentEvent {
    pub fn into_trigger(self) -> TriggerEvent {
        match self {
            ContentEvent::PageReady => TriggerEvent::whole_document(),
            ContentEvent::ContentUpdated { nodes } => TriggerEvent::with_roots(nodes),
        }
    }
}

impl From<ContentEvent> for TriggerEvent {
    fn from(event: ContentEvent) -> Self {
        event.into_trigger()
    }
}
