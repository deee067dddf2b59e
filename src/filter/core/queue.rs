//! 待处理队列
//!
//! 每次触发都先入队。已完成的条目不会立即删除，而是在下一次扫描时惰性清除；
//! 事件为空的条目视为已耗尽，同样在扫描时清除。

use std::collections::HashSet;
use std::rc::Rc;

use markup5ever_rcdom::{Handle, Node};

use crate::filter::events::TriggerEvent;

/// 队列条目
#[derive(Debug, Clone)]
pub struct QueueItem {
    pub id: u64,
    pub event: Option<TriggerEvent>,
    pub done: bool,
}

impl QueueItem {
    fn is_live(&self) -> bool {
        !self.done && self.event.is_some()
    }
}

/// 一次扫描选出的触发集合，由同一个处理周期消费
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub ids: Vec<u64>,
    pub events: Vec<TriggerEvent>,
}

impl Selection {
    /// 不对应任何队列条目的单个触发
    pub fn detached(event: TriggerEvent) -> Self {
        Self {
            ids: Vec::new(),
            events: vec![event],
        }
    }

    /// 合并后的扫描根
    ///
    /// 任一触发覆盖整个文档时返回空序列（即整个文档）；否则按首次出现顺序
    /// 去重合并。
    pub fn scan_roots(&self) -> Vec<Handle> {
        if self.events.iter().any(TriggerEvent::is_whole_document) {
            return Vec::new();
        }

        let mut seen: HashSet<*const Node> = HashSet::new();
        self.events
            .iter()
            .flat_map(|event| event.scan_roots().iter())
            .filter(|root| seen.insert(Rc::as_ptr(*root)))
            .cloned()
            .collect()
    }
}

/// FIFO 待处理队列
#[derive(Debug, Default)]
pub struct PendingQueue {
    items: Vec<QueueItem>,
    next_id: u64,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加条目，返回其编号
    pub fn push(&mut self, event: Option<TriggerEvent>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.items.push(QueueItem {
            id,
            event,
            done: false,
        });
        id
    }

    /// 条目总数（含尚未清除的已完成条目）
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 尚未消费的条目数
    pub fn live_len(&self) -> usize {
        self.items.iter().filter(|item| item.is_live()).count()
    }

    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    /// 清除已完成或事件为空的条目
    pub fn purge(&mut self) -> usize {
        let before = self.items.len();
        self.items.retain(QueueItem::is_live);
        before - self.items.len()
    }

    /// 从前往后扫描并选出下一批触发
    ///
    /// 先清除耗尽的条目，再以第一个未完成条目为首，把其后所有未完成条目一并
    /// 并入同一个周期。被选中的条目保留在队列中，直到周期结束时标记完成。
    pub fn select(&mut self) -> Option<Selection> {
        self.purge();

        let mut selection = Selection::default();
        for item in &self.items {
            if let Some(event) = &item.event {
                selection.ids.push(item.id);
                selection.events.push(event.clone());
            }
        }

        if selection.ids.is_empty() {
            None
        } else {
            Some(selection)
        }
    }

    /// 标记条目已完成
    pub fn mark_done(&mut self, ids: &[u64]) {
        for item in self.items.iter_mut() {
            if ids.contains(&item.id) {
                item.done = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::{find_nodes, html_to_dom, same_node};

    #[test]
    fn test_select_folds_all_live_items() {
        let mut queue = PendingQueue::new();
        let a = queue.push(Some(TriggerEvent::whole_document()));
        let b = queue.push(Some(TriggerEvent::whole_document()));

        let selection = queue.select().unwrap();
        assert_eq!(selection.ids, vec![a, b]);
        // 选中不等于完成
        assert_eq!(queue.live_len(), 2);

        queue.mark_done(&selection.ids);
        assert_eq!(queue.live_len(), 0);
        assert_eq!(queue.len(), 2);
        assert!(queue.select().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_null_events_are_purged_on_sight() {
        let mut queue = PendingQueue::new();
        queue.push(None);
        let live = queue.push(Some(TriggerEvent::whole_document()));
        queue.push(None);

        let selection = queue.select().unwrap();
        assert_eq!(selection.ids, vec![live]);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_items_pushed_after_selection_stay_pending() {
        let mut queue = PendingQueue::new();
        let first = queue.push(Some(TriggerEvent::whole_document()));
        let selection = queue.select().unwrap();
        let late = queue.push(Some(TriggerEvent::whole_document()));

        queue.mark_done(&selection.ids);
        let next = queue.select().unwrap();
        assert_eq!(next.ids, vec![late]);
        assert!(!next.ids.contains(&first));
    }

    #[test]
    fn test_scan_roots_union() {
        let dom = html_to_dom(b"<div>a</div><p>b</p>", "utf-8");
        let div = find_nodes(&dom.document, &["div"]);
        let p = find_nodes(&dom.document, &["p"]);

        let selection = Selection {
            ids: vec![0, 1, 2],
            events: vec![
                TriggerEvent::with_roots(div.clone()),
                TriggerEvent::with_roots(p.clone()),
                TriggerEvent::with_roots(div.clone()),
            ],
        };
        let roots = selection.scan_roots();
        assert_eq!(roots.len(), 2);
        assert!(same_node(&roots[0], &div[0]));

        let widened = Selection {
            ids: vec![0, 1],
            events: vec![TriggerEvent::with_roots(p), TriggerEvent::whole_document()],
        };
        assert!(widened.scan_roots().is_empty());
    }
}
