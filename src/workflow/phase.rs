//! 渠道阶段的公共约定：处理一个单元 → 推进进度 → 检查取消

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::observer::RunObserver;
use crate::models::{Channel, ReportSheet, RunProgress};

/// 阶段结束方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseResult {
    Completed,
    Cancelled,
}

/// 一个渠道阶段的上下文
pub struct PhaseCtx<'a> {
    channel: Channel,
    progress: RunProgress,
    cancel: &'a CancellationToken,
    observer: &'a dyn RunObserver,
}

impl<'a> PhaseCtx<'a> {
    /// 开始阶段：进度重置为 (0, total) 并立即通知
    pub fn start(
        channel: Channel,
        total: usize,
        cancel: &'a CancellationToken,
        observer: &'a dyn RunObserver,
    ) -> Self {
        observer.on_progress(0, total);
        Self {
            channel,
            progress: RunProgress::new(total),
            cancel,
            observer,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// 完成一个单元
    pub fn advance(&mut self) {
        self.progress.processed += 1;
        debug!("{} 进度: {}", self.channel, self.progress);
        self.observer
            .on_progress(self.progress.processed, self.progress.total);
    }

    pub fn progress(&self) -> RunProgress {
        self.progress
    }
}

/// 渠道处理策略
#[async_trait(?Send)]
pub trait ChannelProcessor {
    fn channel(&self) -> Channel;

    /// 本阶段的单元总数（行数）
    fn total(&self) -> usize;

    /// 逐单元处理，单元之间检查取消；不会在单元中途被打断
    async fn run(&self, sheet: &mut dyn ReportSheet, ctx: &mut PhaseCtx<'_>) -> PhaseResult;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::observer::{ChannelObserver, RunEvent};

    #[test]
    fn test_ctx_reports_start_and_each_unit() {
        let (observer, mut rx) = ChannelObserver::new();
        let cancel = CancellationToken::new();
        let mut ctx = PhaseCtx::start(Channel::Grouped, 2, &cancel, &observer);
        ctx.advance();
        cancel.cancel();

        assert!(ctx.is_cancelled());
        assert_eq!(ctx.progress(), RunProgress { processed: 1, total: 2 });
        assert_eq!(rx.try_recv().unwrap(), RunEvent::Progress { done: 0, total: 2 });
        assert_eq!(rx.try_recv().unwrap(), RunEvent::Progress { done: 1, total: 2 });
        assert!(rx.try_recv().is_err());
    }
}
