//! 批次收集
//!
//! 一个处理周期内收集到的节点与其文本，两个序列按下标一一对应。

use std::collections::HashSet;
use std::rc::Rc;

use markup5ever_rcdom::{Handle, Node};

/// 周期批次
///
/// 不变式：`nodes.len() == payloads.len()`，且同一节点最多出现一次。
/// 批次归当前活动周期独占，周期结束即被丢弃。
#[derive(Debug, Default)]
pub struct Batch {
    nodes: Vec<Handle>,
    payloads: Vec<String>,
    seen: HashSet<*const Node>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一项，节点已存在时忽略并返回 `false`
    pub fn push(&mut self, node: Handle, payload: String) -> bool {
        if !self.seen.insert(Rc::as_ptr(&node)) {
            return false;
        }
        self.nodes.push(node);
        self.payloads.push(payload);
        true
    }

    /// 按引用判断节点是否已在批次中
    pub fn contains(&self, node: &Handle) -> bool {
        self.seen.contains(&Rc::as_ptr(node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Handle] {
        &self.nodes
    }

    pub fn payloads(&self) -> &[String] {
        &self.payloads
    }

    /// 拆分为节点与文本两个序列
    pub fn into_parts(self) -> (Vec<Handle>, Vec<String>) {
        (self.nodes, self.payloads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::{find_nodes, html_to_dom, same_node};

    #[test]
    fn test_push_deduplicates_by_identity() {
        let dom = html_to_dom(b"<p>same</p><p>same</p>", "utf-8");
        let paragraphs = find_nodes(&dom.document, &["p"]);
        let mut batch = Batch::new();

        assert!(batch.push(paragraphs[0].clone(), "same".into()));
        assert!(!batch.push(paragraphs[0].clone(), "same".into()));
        // 内容相同但不是同一节点
        assert!(batch.push(paragraphs[1].clone(), "same".into()));

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.nodes().len(), batch.payloads().len());
        assert!(batch.contains(&paragraphs[1]));
    }

    #[test]
    fn test_into_parts_keeps_order() {
        let dom = html_to_dom(b"<p>a</p><p>b</p>", "utf-8");
        let paragraphs = find_nodes(&dom.document, &["p"]);
        let mut batch = Batch::new();
        assert!(batch.is_empty());
        assert!(!batch.contains(&paragraphs[0]));

        batch.push(paragraphs[1].clone(), "b".into());
        batch.push(paragraphs[0].clone(), "a".into());
        let (nodes, payloads) = batch.into_parts();
        assert!(same_node(&nodes[0], &paragraphs[1]));
        assert_eq!(payloads, vec!["b".to_string(), "a".to_string()]);
    }
}
