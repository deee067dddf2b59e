//! 多语言过滤模块
//!
//! 在已加载的文档中找出带有多语言标记的文本片段，合并成一次远程调用交给
//! 服务端解析，再把结果按下标写回原节点。
//!
//! ## 模块组织
//!
//! - `core` - 合并调度与单飞协调（队列、重试定时器、服务）
//! - `pipeline` - 节点收集、排除规则与批次
//! - `exchange` - 远程交换特性与 AJAX 客户端
//! - `applier` - 结果写回
//! - `notifier` - 渲染完成通知
//! - `events` - 触发事件与宿主通知
//! - `config` - 配置管理
//! - `error` - 错误类型
//! - `stats` - 运行统计
//!
//! ## 使用示例
//!
//! ```no_run
//! use mlang_filter::filter::{ContentEvent, ContextId, FilterError, MultilangFilter};
//! use mlang_filter::parsers::html_to_dom;
//!
//! # async fn demo() -> mlang_filter::filter::FilterResult<()> {
//! let dom = html_to_dom(b"<p>Hello {mlang en}Hi{mlang}</p>", "utf-8");
//! let local = tokio::task::LocalSet::new();
//! local
//!     .run_until(async move {
//!         let filter = MultilangFilter::builder(dom.document.clone(), ContextId(5))
//!             .exchange(|_ctx: ContextId, data: Vec<String>| async move {
//!                 Ok::<_, FilterError>(data)
//!             })
//!             .build()?;
//!         filter.notify(ContentEvent::PageReady);
//!         Ok::<_, FilterError>(())
//!     })
//!     .await
//! # }
//! ```

pub mod applier;
pub mod config;
pub mod core;
pub mod error;
pub mod events;
pub mod exchange;
pub mod notifier;
pub mod pipeline;
pub mod stats;

pub use applier::apply_results;
pub use config::{ConfigManager, FilterConfig};
pub use self::core::{MultilangFilter, MultilangFilterBuilder, PendingQueue, RetryTimer, Selection};
pub use error::{FilterError, FilterResult};
pub use events::{ContentEvent, TriggerEvent};
#[cfg(feature = "ajax")]
pub use exchange::AjaxExchange;
pub use exchange::{exchange_batch, ContextId, Exchange};
pub use notifier::{ChannelNotifier, LogNotifier, RenderNotifier};
pub use pipeline::{Batch, ExclusionRules, Harvester};
pub use stats::{FilterStats, FilterStatsSnapshot};
