//! 文本处理管道
//!
//! - `selector`: 可配置的排除规则
//! - `harvester`: 从DOM子树中收集带标记词的叶级节点
//! - `batch`: 周期内的节点/文本平行序列

pub mod batch;
pub mod harvester;
pub mod selector;

pub use batch::Batch;
pub use harvester::{document_root, Harvester};
pub use selector::{AttrCondition, ExclusionRules, Selector};
