//! 合并调度的过滤服务
//!
//! `MultilangFilter` 是单飞协调器：它独占请求标志、待处理队列和重试定时器，
//! 保证任何时刻最多只有一个处理周期（收集 → 远程调用 → 写回 → 通知）在进行。
//!
//! ## 状态机
//!
//! - **触发到达** (`queue_filter`)：总是先入队并重设定时器，从不同步执行。
//! - **定时器触发** (`process_queue`)：
//!   - 队列为空：什么都不做
//!   - 周期进行中：重设定时器后返回，不扫描队列
//!   - 空闲：清除耗尽条目，选出下一批触发，重设定时器并立即开始新周期
//! - **周期开始**：若已有周期在进行，触发被重新入队而不是丢弃
//! - **周期结束**（空批次、成功或失败）：回到空闲；队列不会被主动通知，
//!   由下一次定时器触发负责排空
//!
//! 收集是同步完成的，请求标志在收集之前置位，因此两次定时器触发之间不会
//! 出现两个周期同时读写批次。唯一的挂起点是远程调用。
//!
//! ## 运行环境
//!
//! DOM 句柄不是 `Send`，整个服务运行在单线程的 `tokio::task::LocalSet` 中，
//! 所有入口方法都必须在该任务集内调用。

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use markup5ever_rcdom::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::queue::{PendingQueue, Selection};
use super::timer::RetryTimer;
use crate::filter::applier::apply_results;
use crate::filter::config::FilterConfig;
use crate::filter::error::{helpers, FilterResult};
use crate::filter::events::{ContentEvent, TriggerEvent};
use crate::filter::exchange::{exchange_batch, ContextId, Exchange};
use crate::filter::notifier::{LogNotifier, RenderNotifier};
use crate::filter::pipeline::{Batch, Harvester};
use crate::filter::stats::{FilterStats, FilterStatsSnapshot};

/// 调度状态
#[derive(Debug, Default)]
struct SchedulerState {
    /// 请求标志：仅在一个周期从"收集到非空批次"到"写回或放弃"之间为真
    on_request: bool,
    queue: PendingQueue,
}

struct FilterInner {
    config: FilterConfig,
    document: Handle,
    context_id: ContextId,
    harvester: Harvester,
    exchange: Box<dyn Exchange>,
    notifier: Box<dyn RenderNotifier>,
    state: RefCell<SchedulerState>,
    timer: RefCell<RetryTimer>,
    stats: FilterStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleOutcome {
    Empty,
    Applied,
    Failed,
}

/// 客户端多语言过滤器
///
/// 克隆开销很小，所有克隆共享同一个协调器。
#[derive(Clone)]
pub struct MultilangFilter {
    inner: Rc<FilterInner>,
}

/// [`MultilangFilter`] 构建器
pub struct MultilangFilterBuilder {
    config: FilterConfig,
    document: Handle,
    context_id: ContextId,
    exchange: Option<Box<dyn Exchange>>,
    notifier: Box<dyn RenderNotifier>,
}

impl MultilangFilterBuilder {
    pub fn config(mut self, config: FilterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn exchange<E: Exchange + 'static>(mut self, exchange: E) -> Self {
        self.exchange = Some(Box::new(exchange));
        self
    }

    pub fn notifier<N: RenderNotifier + 'static>(mut self, notifier: N) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    /// 校验配置并创建过滤器
    ///
    /// 未指定交换客户端时，若启用了 `ajax` 特性则根据配置创建 AJAX 客户端。
    pub fn build(self) -> FilterResult<MultilangFilter> {
        self.config.validate()?;

        let exchange = match self.exchange {
            Some(exchange) => exchange,
            None => Self::default_exchange(&self.config)?,
        };

        let harvester = Harvester::new(&self.config.marker_token, self.config.exclusion_rules()?);

        tracing::debug!(
            "创建过滤器: 上下文 {}，标记词 '{}'，{} 条排除规则，重试间隔 {:?}",
            self.context_id,
            harvester.marker(),
            harvester.exclusions().len(),
            self.config.retry_delay()
        );

        Ok(MultilangFilter {
            inner: Rc::new(FilterInner {
                config: self.config,
                document: self.document,
                context_id: self.context_id,
                harvester,
                exchange,
                notifier: self.notifier,
                state: RefCell::new(SchedulerState::default()),
                timer: RefCell::new(RetryTimer::new()),
                stats: FilterStats::default(),
            }),
        })
    }

    #[cfg(feature = "ajax")]
    fn default_exchange(config: &FilterConfig) -> FilterResult<Box<dyn Exchange>> {
        Ok(Box::new(crate::filter::exchange::AjaxExchange::from_config(config)?))
    }

    #[cfg(not(feature = "ajax"))]
    fn default_exchange(_config: &FilterConfig) -> FilterResult<Box<dyn Exchange>> {
        Err(crate::filter::error::FilterError::ConfigError(
            "未指定交换客户端".to_string(),
        ))
    }
}

impl MultilangFilter {
    pub fn builder(document: Handle, context_id: impl Into<ContextId>) -> MultilangFilterBuilder {
        MultilangFilterBuilder {
            config: FilterConfig::default(),
            document,
            context_id: context_id.into(),
            exchange: None,
            notifier: Box::new(LogNotifier),
        }
    }

    /// 入队一个触发并重设定时器
    ///
    /// `None` 不会产生周期，只会推动一次排空。
    pub fn queue_filter(&self, event: Option<TriggerEvent>) {
        queue_filter(&self.inner, event);
    }

    /// 入队一个宿主通知
    pub fn notify(&self, event: ContentEvent) {
        queue_filter(&self.inner, Some(event.into_trigger()));
    }

    /// 跳过队列直接开始周期；已有周期在进行时重新入队
    pub fn filter_now(&self, event: TriggerEvent) {
        start_cycle(&self.inner, Selection::detached(event));
    }

    /// 订阅宿主通知通道，每个通知都映射为一次入队
    ///
    /// 过滤器被释放或发送端全部关闭后任务结束。
    pub fn listen(&self, mut events: mpsc::UnboundedReceiver<ContentEvent>) -> JoinHandle<()> {
        let weak: Weak<FilterInner> = Rc::downgrade(&self.inner);
        tokio::task::spawn_local(async move {
            while let Some(event) = events.recv().await {
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                queue_filter(&inner, Some(event.into_trigger()));
            }
            tracing::debug!("通知通道已关闭，停止监听");
        })
    }

    /// 停止重试定时器；队列中的条目保留，下一次入队会重新启动定时器
    pub fn stop(&self) {
        self.inner.timer.borrow_mut().stop();
    }

    /// 是否有周期在进行
    pub fn is_active(&self) -> bool {
        self.inner.state.borrow().on_request
    }

    /// 尚未消费的触发数
    pub fn pending_len(&self) -> usize {
        self.inner.state.borrow().queue.live_len()
    }

    pub fn stats(&self) -> FilterStatsSnapshot {
        self.inner.stats.snapshot()
    }

    pub fn config(&self) -> &FilterConfig {
        &self.inner.config
    }

    pub fn context_id(&self) -> &ContextId {
        &self.inner.context_id
    }

    pub fn document(&self) -> &Handle {
        &self.inner.document
    }
}

fn queue_filter(inner: &Rc<FilterInner>, event: Option<TriggerEvent>) {
    inner.state.borrow_mut().queue.push(event);
    inner.stats.inc_triggers_queued();
    run_interval(inner);
}

fn run_interval(inner: &Rc<FilterInner>) {
    let weak = Rc::downgrade(inner);
    inner
        .timer
        .borrow_mut()
        .arm(inner.config.retry_delay(), move || {
            if let Some(inner) = weak.upgrade() {
                process_queue(&inner);
            }
        });
}

fn process_queue(inner: &Rc<FilterInner>) {
    inner.timer.borrow_mut().disarm();

    let selection = {
        let mut state = inner.state.borrow_mut();
        if state.queue.is_empty() {
            return;
        }

        if state.on_request {
            drop(state);
            tracing::trace!("周期进行中，稍后重试");
            run_interval(inner);
            return;
        }

        state.queue.select()
    };

    if let Some(selection) = selection {
        run_interval(inner);
        start_cycle(inner, selection);
    }
}

fn start_cycle(inner: &Rc<FilterInner>, selection: Selection) {
    {
        let mut state = inner.state.borrow_mut();
        if state.on_request {
            // 不并发执行两个周期：交回队列
            state.queue.mark_done(&selection.ids);
            for event in selection.events {
                state.queue.push(Some(event));
                inner.stats.inc_triggers_requeued();
            }
            drop(state);
            run_interval(inner);
            return;
        }
        state.on_request = true;
    }

    inner.stats.inc_cycles_started();

    let roots = selection.scan_roots();
    let batch = inner.harvester.collect(&inner.document, &roots);

    if batch.is_empty() {
        inner.stats.inc_cycles_empty();
        tracing::debug!("没有待过滤的内容，跳过远程调用");
        finish_cycle(inner, selection, CycleOutcome::Empty);
        return;
    }

    tracing::debug!(
        "开始周期: {} 个触发，{} 个扫描根，{} 项",
        selection.events.len(),
        roots.len(),
        batch.len()
    );

    let inner = Rc::clone(inner);
    tokio::task::spawn_local(async move {
        let outcome = run_exchange(&inner, batch).await;
        finish_cycle(&inner, selection, outcome);
    });
}

async fn run_exchange(inner: &FilterInner, batch: Batch) -> CycleOutcome {
    let (nodes, payloads) = batch.into_parts();
    inner.stats.inc_exchanges_sent();

    let result = exchange_batch(
        inner.exchange.as_ref(),
        &inner.context_id,
        payloads,
        inner.config.exchange_timeout(),
    )
    .await
    .and_then(|response| apply_results(&nodes, &response));

    match result {
        Ok(count) => {
            inner.stats.add_nodes_updated(count);
            inner.notifier.content_rendering_complete(&nodes);
            tracing::info!("过滤完成: {} 个节点已更新", count);
            CycleOutcome::Applied
        }
        Err(error) => {
            inner.stats.inc_exchanges_failed();
            helpers::log_error(&error.with_context(format!("{} 项未更新", nodes.len())));
            CycleOutcome::Failed
        }
    }
}

fn finish_cycle(inner: &Rc<FilterInner>, selection: Selection, outcome: CycleOutcome) {
    let mut state = inner.state.borrow_mut();
    state.on_request = false;
    state.queue.mark_done(&selection.ids);

    if outcome == CycleOutcome::Failed && inner.config.requeue_on_failure {
        for event in selection.events {
            state.queue.push(Some(event));
            inner.stats.inc_triggers_requeued();
        }
        drop(state);
        run_interval(inner);
    }
}

impl std::fmt::Debug for MultilangFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("MultilangFilter")
            .field("context_id", &self.inner.context_id)
            .field("active", &state.on_request)
            .field("pending", &state.queue.live_len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::error::FilterError;
    use crate::parsers::html::html_to_dom;
    use std::time::Duration;
    use tokio::task::LocalSet;

    fn echo(_: ContextId, data: Vec<String>) -> futures::future::Ready<FilterResult<Vec<String>>> {
        futures::future::ready(Ok(data))
    }

    #[test]
    fn test_builder_validates_config() {
        let dom = html_to_dom(b"<p>x</p>", "utf-8");
        let mut config = FilterConfig::default();
        config.marker_token = String::new();

        let result = MultilangFilter::builder(dom.document.clone(), ContextId(1))
            .config(config)
            .exchange(echo)
            .build();
        assert!(matches!(result, Err(FilterError::ConfigError(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_enqueue_is_deferred_to_timer() {
        LocalSet::new()
            .run_until(async {
                let dom = html_to_dom(b"<p>{mlang en}x{mlang}</p>", "utf-8");
                let filter = MultilangFilter::builder(dom.document.clone(), ContextId(1))
                    .exchange(echo)
                    .build()
                    .unwrap();

                filter.queue_filter(Some(TriggerEvent::whole_document()));
                assert!(!filter.is_active());
                assert_eq!(filter.stats().cycles_started, 0);
                assert!(format!("{:?}", filter).contains("pending: 1"));

                tokio::time::sleep(Duration::from_millis(501)).await;
                assert_eq!(filter.stats().cycles_started, 1);
                assert_eq!(filter.stats().exchanges_sent, 1);
            })
            .await;
    }
}
