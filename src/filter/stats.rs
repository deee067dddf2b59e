//! 运行统计

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// 过滤器统计信息
///
/// 使用原子计数器，读取时通过 [`FilterStats::snapshot`] 获取一致的副本。
#[derive(Debug, Default)]
pub struct FilterStats {
    /// 入队的触发次数
    pub triggers_queued: AtomicU64,
    /// 因周期进行中而重新入队的触发次数
    pub triggers_requeued: AtomicU64,
    /// 开始的处理周期数
    pub cycles_started: AtomicU64,
    /// 收集结果为空而直接结束的周期数
    pub cycles_empty: AtomicU64,
    /// 发出的远程调用数
    pub exchanges_sent: AtomicU64,
    /// 失败的远程调用数
    pub exchanges_failed: AtomicU64,
    /// 写回的节点数
    pub nodes_updated: AtomicU64,
}

impl FilterStats {
    pub fn inc_triggers_queued(&self) {
        self.triggers_queued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_triggers_requeued(&self) {
        self.triggers_requeued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cycles_started(&self) {
        self.cycles_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cycles_empty(&self) {
        self.cycles_empty.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_exchanges_sent(&self) {
        self.exchanges_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_exchanges_failed(&self) {
        self.exchanges_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_nodes_updated(&self, count: usize) {
        self.nodes_updated.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> FilterStatsSnapshot {
        FilterStatsSnapshot {
            triggers_queued: self.triggers_queued.load(Ordering::Relaxed),
            triggers_requeued: self.triggers_requeued.load(Ordering::Relaxed),
            cycles_started: self.cycles_started.load(Ordering::Relaxed),
            cycles_empty: self.cycles_empty.load(Ordering::Relaxed),
            exchanges_sent: self.exchanges_sent.load(Ordering::Relaxed),
            exchanges_failed: self.exchanges_failed.load(Ordering::Relaxed),
            nodes_updated: self.nodes_updated.load(Ordering::Relaxed),
        }
    }
}

/// 统计快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterStatsSnapshot {
    pub triggers_queued: u64,
    pub triggers_requeued: u64,
    pub cycles_started: u64,
    pub cycles_empty: u64,
    pub exchanges_sent: u64,
    pub exchanges_failed: u64,
    pub nodes_updated: u64,
}

impl FilterStatsSnapshot {
    /// 平均每次远程调用服务的触发数
    pub fn triggers_per_exchange(&self) -> f64 {
        if self.exchanges_sent == 0 {
            0.0
        } else {
            self.triggers_queued as f64 / self.exchanges_sent as f64
        }
    }
}
