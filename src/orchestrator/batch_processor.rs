//! 批量报表处理器 - 编排层
//!
//! ## 职责
//!
//! 一次运行 = 一个 xlsx 文件：
//!
//! 1. **打开文件**：读取工作簿，定位 `Reporte` 工作表
//! 2. **分类**：推导三列位置，按渠道分桶
//! 3. **连接浏览器**：整次运行只建立一个连接
//! 4. **逐渠道处理**：先 MercadoLibre（逐行抓取），再 Walmart（分组分摊）
//! 5. **保存**：另存为 `<原名>_con_envios.xlsx`，取消时同样保存
//!
//! 浏览器连接和工作簿都只属于本次运行，任何退出路径都会释放。
//! 致命错误（没有会话、文件打不开、缺少工作表、连不上浏览器）
//! 都发生在修改工作表之前，不会写出文件。

use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::browser::{BrowserConnector, BrowserSession};
use crate::config::Config;
use crate::error::{AppError, AppResult, BrowserError};
use crate::infrastructure::{output_path_for, XlsxWorkbook};
use crate::models::{Channel, ReportSheet, RunOutcome, RunProgress, RunState};
use crate::services::RowClassifier;
use crate::workflow::{
    ChannelProcessor, DirectFlow, GroupedFlow, PhaseCtx, PhaseResult, RunObserver,
};

/// 状态跟踪
struct StateTracker {
    state: RunState,
}

impl StateTracker {
    fn new() -> Self {
        Self {
            state: RunState::Idle,
        }
    }

    fn go(&mut self, next: RunState) {
        if !self.state.can_transition_to(next) {
            warn!("非预期的状态迁移: {:?} -> {:?}", self.state, next);
        }
        debug!("状态: {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

/// 批量处理器
pub struct BatchProcessor<'a> {
    config: &'a Config,
    connector: &'a dyn BrowserConnector,
    observer: &'a dyn RunObserver,
    cancel: CancellationToken,
}

impl<'a> BatchProcessor<'a> {
    pub fn new(
        config: &'a Config,
        connector: &'a dyn BrowserConnector,
        observer: &'a dyn RunObserver,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            connector,
            observer,
            cancel,
        }
    }

    /// 入口：没有选择文件时只报告"未开始"
    pub async fn start(
        &self,
        input: Option<&Path>,
        session: Option<&BrowserSession>,
    ) -> Option<RunOutcome> {
        match input {
            Some(path) => Some(self.run(path, session).await),
            None => {
                info!("未选择文件，不开始处理");
                self.observer.on_finish(false, false);
                None
            }
        }
    }

    /// 处理一个文件；`on_finish` 在返回前恰好调用一次
    pub async fn run(&self, input: &Path, session: Option<&BrowserSession>) -> RunOutcome {
        log_run_start(input);
        let file_name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.display().to_string());
        self.observer
            .on_status(&format!("Procesando: {}", file_name));

        let mut tracker = StateTracker::new();
        let outcome = match self.execute(input, session, &mut tracker).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("❌ 处理失败: {}", e);
                tracker.go(RunState::Failed);
                let message = e.status_message();
                self.observer.on_status(&message);
                RunOutcome {
                    state: RunState::Failed,
                    cancelled: false,
                    direct: RunProgress::default(),
                    grouped: RunProgress::default(),
                    output_path: None,
                    message,
                }
            }
        };

        if !tracker.state.is_terminal() {
            warn!("运行结束时状态未终结: {:?}", tracker.state);
        }
        print_final_stats(&outcome);
        self.observer.on_finish(outcome.cancelled, true);
        outcome
    }

    async fn execute(
        &self,
        input: &Path,
        session: Option<&BrowserSession>,
        tracker: &mut StateTracker,
    ) -> AppResult<RunOutcome> {
        let session = session.ok_or(AppError::Browser(BrowserError::NoSession))?;

        // ========== 打开文件 ==========
        tracker.go(RunState::OpeningFile);
        self.observer.on_status("Abriendo Excel...");
        let mut workbook = XlsxWorkbook::open(input)?;
        let output_path = output_path_for(workbook.path(), &self.config.output_suffix);

        let (cancelled, direct, grouped) = {
            let mut sheet = workbook.sheet_mut(&self.config.sheet_name)?;

            // ========== 分类 ==========
            tracker.go(RunState::Classifying);
            let classification = RowClassifier::new(self.config).classify(&sheet)?;
            info!(
                "✓ MercadoLibre {} 行，Walmart {} 组 / {} 行",
                classification.direct.len(),
                classification.groups.len(),
                classification.grouped_row_count()
            );

            // ========== 连接浏览器 ==========
            let fetcher = self.connector.connect(session).await?;

            // ========== MercadoLibre ==========
            tracker.go(RunState::ProcessingChannelA);
            let direct_flow = DirectFlow::new(
                &classification.direct,
                classification.layout,
                fetcher.as_ref(),
                self.config,
            );
            if classification.direct.is_empty() {
                self.observer
                    .on_status("No hay filas de MercadoLibre para procesar.");
                info!("没有需要处理的 MercadoLibre 行");
            }
            let (direct_result, direct) = self.run_phase(&direct_flow, &mut sheet).await;

            // ========== Walmart ==========
            let mut grouped = RunProgress::new(classification.grouped_row_count());
            let mut cancelled = direct_result == PhaseResult::Cancelled;
            if cancelled {
                tracker.go(RunState::Cancelled);
                self.notify_cancelled(direct);
            } else {
                tracker.go(RunState::ProcessingChannelB);
                if grouped.total > 0 {
                    let grouped_flow =
                        GroupedFlow::new(&classification.groups, classification.layout);
                    let (grouped_result, progress) =
                        self.run_phase(&grouped_flow, &mut sheet).await;
                    grouped = progress;
                    if grouped_result == PhaseResult::Cancelled {
                        cancelled = true;
                        tracker.go(RunState::Cancelled);
                        self.notify_cancelled(grouped);
                    } else {
                        self.observer.on_status("Walmart terminado.");
                    }
                }
            }

            (cancelled, direct, grouped)
        };

        // ========== 保存 ==========
        tracker.go(RunState::Saving);
        workbook.save_as(&output_path)?;
        tracker.go(RunState::Done);

        let message = summary_message(cancelled, direct, grouped, &output_path);
        self.observer.on_status(&message);

        Ok(RunOutcome {
            state: RunState::Done,
            cancelled,
            direct,
            grouped,
            output_path: Some(output_path),
            message,
        })
    }

    /// 跑一个渠道阶段
    async fn run_phase(
        &self,
        processor: &dyn ChannelProcessor,
        sheet: &mut dyn ReportSheet,
    ) -> (PhaseResult, RunProgress) {
        let channel = processor.channel();
        let mut ctx = PhaseCtx::start(channel, processor.total(), &self.cancel, self.observer);
        if processor.total() > 0 {
            self.observer
                .on_status(&format!("Procesando {}...", channel));
            info!("📦 开始处理 {}: {} 行", channel, processor.total());
        }
        let result = processor.run(sheet, &mut ctx).await;
        info!("✓ {} 阶段结束: {} ({:?})", channel, ctx.progress(), result);
        (result, ctx.progress())
    }

    fn notify_cancelled(&self, progress: RunProgress) {
        warn!("⚠️ 收到取消请求，保存已完成的部分 ({})", progress);
        self.observer.on_status(&format!(
            "Proceso cancelado. Guardando archivo... ({})",
            progress
        ));
    }
}

/// 最终状态文本
pub fn summary_message(
    cancelled: bool,
    direct: RunProgress,
    grouped: RunProgress,
    output_path: &Path,
) -> String {
    if cancelled {
        format!(
            "Proceso cancelado. {}: {}. {}: {}. Archivo: {}",
            Channel::Direct,
            direct,
            Channel::Grouped,
            grouped,
            output_path.display()
        )
    } else {
        format!(
            "Listo. {}: {}. {}: {}. Archivo guardado en: {}",
            Channel::Direct,
            direct,
            Channel::Grouped,
            grouped,
            output_path.display()
        )
    }
}

// ========== 日志辅助函数 ==========

fn log_run_start(input: &Path) {
    info!("{}", "=".repeat(60));
    info!("🚀 开始处理报表: {}", input.display());
    info!("{}", "=".repeat(60));
}

fn print_final_stats(outcome: &RunOutcome) {
    info!("\n{}", "=".repeat(60));
    info!("📊 处理结束: {:?}", outcome.state);
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("MercadoLibre: {}", outcome.direct);
    info!("Walmart: {}", outcome.grouped);
    if outcome.cancelled {
        warn!("⚠️ 已取消");
    }
    match &outcome.output_path {
        Some(path) => info!("💾 输出文件: {}", path.display()),
        None => info!("未写出文件"),
    }
    info!("{}", "=".repeat(60));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_message_done_and_cancelled() {
        let direct = RunProgress {
            processed: 3,
            total: 3,
        };
        let grouped = RunProgress {
            processed: 1,
            total: 4,
        };
        let path = Path::new("/tmp/r_con_envios.xlsx");

        assert_eq!(
            summary_message(false, direct, grouped, path),
            "Listo. MercadoLibre: 3/3. Walmart: 1/4. Archivo guardado en: /tmp/r_con_envios.xlsx"
        );
        assert_eq!(
            summary_message(true, direct, grouped, path),
            "Proceso cancelado. MercadoLibre: 3/3. Walmart: 1/4. Archivo: /tmp/r_con_envios.xlsx"
        );
    }

    #[test]
    fn test_tracker_follows_happy_path() {
        let mut tracker = StateTracker::new();
        for next in [
            RunState::OpeningFile,
            RunState::Classifying,
            RunState::ProcessingChannelA,
            RunState::ProcessingChannelB,
            RunState::Saving,
            RunState::Done,
        ] {
            assert!(tracker.state.can_transition_to(next));
            tracker.go(next);
        }
        assert!(tracker.state.is_terminal());
    }
}
