use std::rc::Rc;

use encoding_rs::Encoding;
use html5ever::parse_document;
use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::tendril::{StrTendril, TendrilSink};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};

/// 将 HTML 字节转换为 DOM
pub fn html_to_dom(data: &[u8], document_encoding: &str) -> RcDom {
    let s: String = if let Some(encoding) = Encoding::for_label(document_encoding.as_bytes()) {
        let (string, _, _) = encoding.decode(data);
        string.to_string()
    } else {
        String::from_utf8_lossy(data).to_string()
    };

    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut s.as_bytes())
        .unwrap_or_default()
}

/// 序列化节点
///
/// 文档节点只输出其子节点，其余节点连同自身一起输出
pub fn serialize_node(node: &Handle) -> String {
    let traversal_scope = match node.data {
        NodeData::Document => TraversalScope::ChildrenOnly(None),
        _ => TraversalScope::IncludeNode,
    };
    let opts = SerializeOpts {
        traversal_scope,
        ..Default::default()
    };

    let mut buf: Vec<u8> = Vec::new();
    let serializable: SerializableHandle = node.clone().into();
    if let Err(e) = serialize(&mut buf, &serializable, opts) {
        tracing::warn!("序列化节点失败: {}", e);
        return String::new();
    }

    String::from_utf8_lossy(&buf).into_owned()
}

/// 查找指定路径的DOM节点
pub fn find_nodes(node: &Handle, node_names: &[&str]) -> Vec<Handle> {
    let mut found_nodes = Vec::new();
    let Some((&node_name, rest)) = node_names.split_first() else {
        return found_nodes;
    };

    let name_matches = get_node_name(node).is_some_and(|name| name == node_name);

    if name_matches && rest.is_empty() {
        found_nodes.push(node.clone());
    }

    if name_matches && !rest.is_empty() {
        found_nodes.append(&mut find_nodes(node, rest));
    } else {
        for child_node in node.children.borrow().iter() {
            found_nodes.append(&mut find_nodes(child_node, node_names));
        }
    }

    found_nodes
}

/// 获取节点属性值
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| &*attr.name.local == attr_name)
            .map(|attr| attr.value.to_string()),
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
/// 不会破坏节点上的父引用
pub fn get_parent_node(child: &Handle) -> Option<Handle> {
    let weak = child.parent.take();
    let parent = weak.as_ref().and_then(|node| node.upgrade());
    child.parent.set(weak);
    parent
}

/// 自下而上的祖先节点（不含自身）
pub fn ancestors(node: &Handle) -> Vec<Handle> {
    let mut result = Vec::new();
    let mut current = get_parent_node(node);
    while let Some(parent) = current {
        current = get_parent_node(&parent);
        result.push(parent);
    }
    result
}

pub fn is_element(node: &Handle) -> bool {
    matches!(node.data, NodeData::Element { .. })
}

pub fn is_text(node: &Handle) -> bool {
    matches!(node.data, NodeData::Text { .. })
}

/// 按引用判断是否为同一节点
pub fn same_node(a: &Handle, b: &Handle) -> bool {
    Rc::ptr_eq(a, b)
}

/// 元素子节点
pub fn element_children(node: &Handle) -> Vec<Handle> {
    node.children
        .borrow()
        .iter()
        .filter(|child| is_element(child))
        .cloned()
        .collect()
}

pub fn has_element_children(node: &Handle) -> bool {
    node.children.borrow().iter().any(is_element)
}

/// 节点的文本内容，等价于所有后代文本节点的拼接
pub fn node_text(node: &Handle) -> String {
    let mut text = String::new();
    collect_text(node, &mut text);
    text
}

fn collect_text(node: &Handle, out: &mut String) {
    match &node.data {
        NodeData::Text { contents } => out.push_str(&contents.borrow()),
        NodeData::Comment { .. } | NodeData::ProcessingInstruction { .. } => {}
        _ => {
            for child in node.children.borrow().iter() {
                collect_text(child, out);
            }
        }
    }
}

/// 整体替换文本节点的内容
///
/// 对非文本节点无效，返回是否写入
pub fn set_text_content(node: &Handle, text: &str) -> bool {
    match &node.data {
        NodeData::Text { contents } => {
            *contents.borrow_mut() = StrTendril::from_slice(text);
            true
        }
        _ => false,
    }
}

/// 用单个文本节点替换元素的全部子节点
pub fn set_node_text(node: &Handle, text: &str) {
    if set_text_content(node, text) {
        return;
    }

    let mut children = node.children.borrow_mut();
    for child in children.drain(..) {
        child.parent.set(None);
    }

    if text.is_empty() {
        return;
    }

    let text_node = Node::new(NodeData::Text {
        contents: std::cell::RefCell::new(StrTendril::from_slice(text)),
    });
    text_node.parent.set(Some(Rc::downgrade(node)));
    children.push(text_node);
}
