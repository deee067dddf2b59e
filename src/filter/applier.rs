//! 结果写回
//!
//! 将响应第 `i` 项写回请求第 `i` 项的来源节点：文本节点整体替换内容，
//! 元素节点整体替换渲染文本（不是 innerHTML，叶子本来就没有元素子节点）。

use markup5ever_rcdom::Handle;

use crate::filter::error::{FilterError, FilterResult};
use crate::parsers::html::{is_text, set_node_text, set_text_content};

/// 按下标写回结果，返回写入的节点数
///
/// 长度不一致时不做任何写入。
pub fn apply_results(nodes: &[Handle], results: &[String]) -> FilterResult<usize> {
    if nodes.len() != results.len() {
        return Err(FilterError::ResponseMismatch {
            expected: nodes.len(),
            actual: results.len(),
        });
    }

    for (node, text) in nodes.iter().zip(results) {
        apply_one(node, text);
    }

    Ok(nodes.len())
}

fn apply_one(node: &Handle, text: &str) {
    if is_text(node) {
        set_text_content(node, text);
    } else {
        set_node_text(node, text);
    }
}
