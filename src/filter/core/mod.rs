//! 过滤器核心模块
//!
//! ## 架构设计
//!
//! - **队列层** (`queue.rs`): 待处理触发的惰性清除队列与合并选择
//! - **定时层** (`timer.rs`): 可取消、可重设的单次重试定时器
//! - **服务层** (`service.rs`): 单飞协调器，串起收集、交换、写回与通知
//!
//! ## 模块依赖关系
//!
//! ```text
//! MultilangFilter (service.rs)
//!     ├── PendingQueue (queue.rs)
//!     ├── RetryTimer (timer.rs)
//!     ├── Harvester (pipeline/harvester.rs)
//!     ├── Exchange (exchange/mod.rs)
//!     ├── apply_results (applier.rs)
//!     └── RenderNotifier (notifier.rs)
//! ```

pub mod queue;
pub mod service;
pub mod timer;

pub use queue::{PendingQueue, QueueItem, Selection};
pub use service::{MultilangFilter, MultilangFilterBuilder};
pub use timer::RetryTimer;
