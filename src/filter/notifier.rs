//! 渲染完成通知
//!
//! 每个成功的周期在写回全部结果后调用一次，参数为按请求顺序排列的被修改节点。

use markup5ever_rcdom::Handle;
use tokio::sync::mpsc;

/// 渲染完成通知接收方
pub trait RenderNotifier {
    fn content_rendering_complete(&self, nodes: &[Handle]);
}

impl<F> RenderNotifier for F
where
    F: Fn(&[Handle]),
{
    fn content_rendering_complete(&self, nodes: &[Handle]) {
        self(nodes)
    }
}

/// 只记录日志的默认通知器
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl RenderNotifier for LogNotifier {
    fn content_rendering_complete(&self, nodes: &[Handle]) {
        tracing::debug!("内容渲染完成: {} 个节点已更新", nodes.len());
    }
}

/// 将被修改的节点集合转发到通道
///
/// 接收端已关闭时静默丢弃。
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<Vec<Handle>>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Vec<Handle>>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl RenderNotifier for ChannelNotifier {
    fn content_rendering_complete(&self, nodes: &[Handle]) {
        if self.sender.send(nodes.to_vec()).is_err() {
            tracing::trace!("渲染通知接收端已关闭");
        }
    }
}
