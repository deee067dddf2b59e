//! 可取消的重试定时器
//!
//! 单次定时器，重新设置时先取消尚未触发的那一次。必须在
//! `tokio::task::LocalSet` 中使用。

use std::time::Duration;

use tokio::task::JoinHandle;

#[derive(Debug, Default)]
pub struct RetryTimer {
    handle: Option<JoinHandle<()>>,
}

impl RetryTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 在 `delay` 之后执行 `on_fire`，取代任何尚未触发的定时
    pub fn arm<F>(&mut self, delay: Duration, on_fire: F)
    where
        F: FnOnce() + 'static,
    {
        self.stop();
        self.handle = Some(tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            on_fire();
        }));
    }

    /// 取消尚未触发的定时
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// 放弃句柄但不取消任务；由正在触发的回调自身调用
    pub fn disarm(&mut self) {
        self.handle = None;
    }

    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for RetryTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
