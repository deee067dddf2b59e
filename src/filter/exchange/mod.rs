//! 远程交换客户端
//!
//! 每个处理周期恰好发出一次批量调用：`call(context_id, payloads)` 返回与
//! 请求等长、按下标对应的结果序列。调用方只依赖 [`Exchange`] 特性，具体
//! 传输（AJAX、测试替身、闭包）可以随意替换。

#[cfg(feature = "ajax")]
pub mod ajax;

use std::fmt;
use std::future::Future;
use std::time::Duration;

use futures::future::{FutureExt, LocalBoxFuture};
use serde::{Deserialize, Serialize};

use crate::filter::error::{FilterError, FilterResult};

#[cfg(feature = "ajax")]
pub use ajax::AjaxExchange;

/// 文档上下文标识，由宿主页面提供
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextId(pub i64);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ContextId {
    fn from(id: i64) -> Self {
        ContextId(id)
    }
}

/// 批量远程调用
///
/// 返回的 future 不要求 `Send`：整个过滤器运行在单线程的本地任务集中。
pub trait Exchange {
    fn call<'a>(
        &'a self,
        context_id: &'a ContextId,
        payloads: Vec<String>,
    ) -> LocalBoxFuture<'a, FilterResult<Vec<String>>>;
}

impl<F, Fut> Exchange for F
where
    F: Fn(ContextId, Vec<String>) -> Fut,
    Fut: Future<Output = FilterResult<Vec<String>>> + 'static,
{
    fn call<'a>(
        &'a self,
        context_id: &'a ContextId,
        payloads: Vec<String>,
    ) -> LocalBoxFuture<'a, FilterResult<Vec<String>>> {
        self(context_id.clone(), payloads).boxed_local()
    }
}

/// 发出一次调用并校验响应长度
///
/// 设置了 `timeout` 时超时视为失败；长度不一致时返回
/// [`FilterError::ResponseMismatch`]，调用方不得写回任何结果。
pub async fn exchange_batch(
    exchange: &dyn Exchange,
    context_id: &ContextId,
    payloads: Vec<String>,
    timeout: Option<Duration>,
) -> FilterResult<Vec<String>> {
    let expected = payloads.len();
    let call = exchange.call(context_id, payloads);

    let response = match timeout {
        Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
            FilterError::TimeoutError(format!("远程调用超过 {:?} 未返回", limit))
        })??,
        None => call.await?,
    };

    if response.len() != expected {
        return Err(FilterError::ResponseMismatch {
            expected,
            actual: response.len(),
        });
    }

    Ok(response)
}
