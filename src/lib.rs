//! # Multilang Filter
//!
//! 客户端多语言过滤库：在已渲染的文档中收集带有多语言标记的文本，合并为
//! 单次飞行的批量远程调用，并把服务端返回的结果写回原节点。
//!
//! ## 模块组织
//!
//! - `filter` - 收集、合并调度、远程交换与写回
//! - `parsers` - HTML 解析与 DOM 操作
//! - `env` - 环境变量访问
//! - `logging` - 日志初始化

pub mod env;
pub mod filter;
pub mod logging;
pub mod parsers;

// Re-export commonly used items for convenience
pub use filter::{
    ContentEvent, ContextId, Exchange, FilterConfig, FilterError, FilterResult, MultilangFilter,
    RenderNotifier, TriggerEvent,
};
pub use parsers::{html_to_dom, serialize_node};
