//! # 解析器模块
//!
//! 过滤器所需的 HTML 文档解析与 DOM 操作
//!
//! # 模块组织
//!
//! - `html` - HTML文档解析、DOM遍历与文本读写

pub mod html;

pub use html::{html_to_dom, serialize_node};
