//! 节点收集器
//!
//! 从一个或多个根节点出发，找出包含标记词的叶级文本片段。
//!
//! ## 遍历规则
//!
//! 对每个根节点，搜索范围先上扩一级：取根节点的父节点，遍历父节点的每个
//! 元素子节点的全部后代元素。变更通知给出的根往往只是容器本身，而与之
//! 相关的兄弟区域（例如弹窗的页眉页脚）并不在通知里。
//!
//! 对每个后代元素 `E`，检查它的直接子节点：
//!
//! - 文本节点：内容（不区分大小写）包含标记词即入选
//! - 元素节点：必须没有元素子节点（真正的叶子）、未被排除、文本包含标记词
//!   且本轮尚未入选
//!
//! 复合元素不会入选，因此每个标记只在最深的叶子处被捕获一次。

use markup5ever_rcdom::{Handle, NodeData};

use super::batch::Batch;
use super::selector::ExclusionRules;
use crate::parsers::html::{
    element_children, find_nodes, get_parent_node, has_element_children, is_element, node_text,
};

/// DOM 节点收集器
#[derive(Debug, Clone)]
pub struct Harvester {
    /// 小写的标记词
    marker: String,
    exclusions: ExclusionRules,
}

impl Harvester {
    pub fn new(marker_token: &str, exclusions: ExclusionRules) -> Self {
        Self {
            marker: marker_token.to_lowercase(),
            exclusions,
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn exclusions(&self) -> &ExclusionRules {
        &self.exclusions
    }

    /// 文本是否包含标记词（不区分大小写）
    pub fn contains_marker(&self, text: &str) -> bool {
        !self.marker.is_empty() && text.to_lowercase().contains(&self.marker)
    }

    /// 收集到新的批次中
    pub fn collect(&self, document: &Handle, roots: &[Handle]) -> Batch {
        let mut batch = Batch::new();
        self.harvest(document, roots, &mut batch);
        batch
    }

    /// 将候选节点追加到批次中，返回新增数量
    ///
    /// `roots` 为空表示整个文档。收集过程不修改文档。
    pub fn harvest(&self, document: &Handle, roots: &[Handle], batch: &mut Batch) -> usize {
        let before = batch.len();

        if roots.is_empty() {
            let root = document_root(document);
            self.harvest_root(&root, batch);
        } else {
            for root in roots {
                self.harvest_root(root, batch);
            }
        }

        let added = batch.len() - before;
        tracing::trace!("收集完成: {} 个根节点，新增 {} 项", roots.len().max(1), added);
        added
    }

    /// 没有父节点的根（已从文档中移除）不产生任何候选
    fn harvest_root(&self, root: &Handle, batch: &mut Batch) {
        let Some(scope) = get_parent_node(root) else {
            return;
        };

        if self.exclusions.is_excluded(&scope) {
            return;
        }

        for child in element_children(&scope) {
            if self.exclusions.matches(&child) {
                continue;
            }
            self.visit_descendants(&child, batch);
        }
    }

    /// 文档顺序遍历后代元素；被排除的元素连同其子树一起跳过
    fn visit_descendants(&self, element: &Handle, batch: &mut Batch) {
        for child in element_children(element) {
            if self.exclusions.matches(&child) {
                continue;
            }
            self.inspect_contents(&child, batch);
            self.visit_descendants(&child, batch);
        }
    }

    fn inspect_contents(&self, element: &Handle, batch: &mut Batch) {
        let contents: Vec<Handle> = element.children.borrow().clone();

        for node in contents {
            match &node.data {
                NodeData::Text { contents } => {
                    if batch.contains(&node) || parent_selected(&node, batch) {
                        continue;
                    }
                    let text = contents.borrow().to_string();
                    if self.contains_marker(&text) {
                        batch.push(node.clone(), text);
                    }
                }
                NodeData::Element { .. } => {
                    if self.exclusions.matches(&node)
                        || has_element_children(&node)
                        || batch.contains(&node)
                    {
                        continue;
                    }
                    let text = node_text(&node);
                    if self.contains_marker(&text) {
                        batch.push(node.clone(), text);
                    }
                }
                _ => {}
            }
        }
    }
}

/// 文本节点的父元素已作为叶子入选时，该文本已被覆盖
fn parent_selected(text_node: &Handle, batch: &Batch) -> bool {
    get_parent_node(text_node)
        .filter(is_element)
        .is_some_and(|parent| batch.contains(&parent))
}

/// 整个文档对应的根：优先 `<body>`，否则为文档节点本身
pub fn document_root(document: &Handle) -> Handle {
    find_nodes(document, &["body"])
        .into_iter()
        .next()
        .unwrap_or_else(|| document.clone())
}
