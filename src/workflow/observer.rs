//! 运行观察者
//!
//! 编排器只通过这个接口对外报告进度 / 状态 / 结束，不依赖具体的界面类型。

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// 观察者接口
pub trait RunObserver: Send + Sync {
    /// 当前渠道阶段的进度
    fn on_progress(&self, done: usize, total: usize);
    /// 给操作员看的状态文本
    fn on_status(&self, message: &str);
    /// 每次运行恰好调用一次
    fn on_finish(&self, cancelled: bool, started: bool);
}

/// 观察者事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    Progress { done: usize, total: usize },
    Status(String),
    Finished { cancelled: bool, started: bool },
}

/// 把事件发送到通道，由界面在自己的任务里消费
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: UnboundedSender<RunEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, UnboundedReceiver<RunEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: RunEvent) {
        // 接收端已关闭时直接丢弃
        let _ = self.tx.send(event);
    }
}

impl RunObserver for ChannelObserver {
    fn on_progress(&self, done: usize, total: usize) {
        self.send(RunEvent::Progress { done, total });
    }

    fn on_status(&self, message: &str) {
        self.send(RunEvent::Status(message.to_string()));
    }

    fn on_finish(&self, cancelled: bool, started: bool) {
        self.send(RunEvent::Finished { cancelled, started });
    }
}
