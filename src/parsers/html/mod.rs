//! HTML解析和处理模块
//!
//! - `dom`: 基础DOM操作（解析、查找、文本读写、序列化）

pub mod dom;

pub use dom::{
    ancestors, element_children, find_nodes, get_node_attr, get_node_name, get_parent_node,
    has_element_children, html_to_dom, is_element, is_text, node_text, same_node,
    serialize_node, set_node_text, set_text_content,
};
