//! 分组渠道流程（Walmart）
//!
//! 同一销售编码的多行：先全部把运费置 0，整组走完后
//! 把 `max(合计) - Σ价格` 的差额（大于 0 时）写到第一行。不访问网络。

use async_trait::async_trait;
use tracing::{debug, info};

use super::phase::{ChannelProcessor, PhaseCtx, PhaseResult};
use crate::models::{format_amount, Channel, ColumnLayout, ReportSheet, RowGroup};

/// 计算分摊差额：`max(0, max(totals) - Σ prices)`，空组的合计按 0
///
/// 求和与相减都是饱和运算，超大金额不会溢出
pub fn group_allocation(prices: &[i64], totals: &[i64]) -> i64 {
    let sum_prices = prices.iter().copied().fold(0i64, i64::saturating_add);
    let group_total = totals.iter().copied().max().unwrap_or(0);
    group_total.saturating_sub(sum_prices).max(0)
}

pub struct GroupedFlow<'a> {
    groups: &'a [RowGroup],
    layout: ColumnLayout,
}

impl<'a> GroupedFlow<'a> {
    pub fn new(groups: &'a [RowGroup], layout: ColumnLayout) -> Self {
        Self { groups, layout }
    }

    fn allocation_for(&self, sheet: &dyn ReportSheet, group: &RowGroup) -> i64 {
        let amount_at = |row: u32, col: u32| sheet.value(row, col).amount().unwrap_or(0);
        let prices: Vec<i64> = group
            .rows
            .iter()
            .map(|&row| amount_at(row, self.layout.price))
            .collect();
        let totals: Vec<i64> = group
            .rows
            .iter()
            .map(|&row| amount_at(row, self.layout.total))
            .collect();
        group_allocation(&prices, &totals)
    }
}

#[async_trait(?Send)]
impl ChannelProcessor for GroupedFlow<'_> {
    fn channel(&self) -> Channel {
        Channel::Grouped
    }

    fn total(&self) -> usize {
        self.groups.iter().map(|g| g.rows.len()).sum()
    }

    async fn run(&self, sheet: &mut dyn ReportSheet, ctx: &mut PhaseCtx<'_>) -> PhaseResult {
        for group in self.groups {
            if ctx.is_cancelled() {
                return PhaseResult::Cancelled;
            }

            for &row in &group.rows {
                if ctx.is_cancelled() {
                    debug!("[编码 {}] 组内取消，跳过分摊", group.code);
                    return PhaseResult::Cancelled;
                }
                sheet.set_amount(row, self.layout.dispatch, 0);
                ctx.advance();
            }

            let diff = self.allocation_for(sheet, group);
            if let Some(&first_row) = group.rows.first() {
                if diff > 0 {
                    sheet.set_amount(first_row, self.layout.dispatch, diff);
                }
                info!(
                    "[编码 {}] {} 行，分摊 {} -> 行 {}",
                    group.code,
                    group.rows.len(),
                    format_amount(diff),
                    first_row
                );
            }
        }
        PhaseResult::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory_sheet::MemorySheet;
    use crate::models::CellValue;
    use crate::workflow::observer::{RunEvent, RunObserver};
    use std::sync::Mutex;
    use tokio_util::sync::CancellationToken;

    const LAYOUT: ColumnLayout = ColumnLayout {
        price: 8,
        dispatch: 9,
        total: 10,
    };

    /// 进度推进到 `cancel_at` 时设置取消标志（模拟界面点击取消）
    struct CancellingObserver {
        cancel: CancellationToken,
        cancel_at: usize,
        events: Mutex<Vec<RunEvent>>,
    }

    impl RunObserver for CancellingObserver {
        fn on_progress(&self, done: usize, total: usize) {
            if done == self.cancel_at {
                self.cancel.cancel();
            }
            self.events
                .lock()
                .unwrap()
                .push(RunEvent::Progress { done, total });
        }
        fn on_status(&self, message: &str) {
            self.events
                .lock()
                .unwrap()
                .push(RunEvent::Status(message.to_string()));
        }
        fn on_finish(&self, cancelled: bool, started: bool) {
            self.events
                .lock()
                .unwrap()
                .push(RunEvent::Finished { cancelled, started });
        }
    }

    fn group(code: &str, rows: &[u32]) -> RowGroup {
        RowGroup {
            code: code.to_string(),
            rows: rows.to_vec(),
        }
    }

    fn observer(cancel: &CancellationToken, cancel_at: usize) -> CancellingObserver {
        CancellingObserver {
            cancel: cancel.clone(),
            cancel_at,
            events: Mutex::new(Vec::new()),
        }
    }

    #[test]
    fn test_allocation_is_max_total_minus_sum_prices() {
        assert_eq!(group_allocation(&[1000, 1500], &[4000, 4000]), 1500);
        assert_eq!(group_allocation(&[3000, 1500], &[4000, 4000]), 0);
        assert_eq!(group_allocation(&[2000, 2000], &[4000, 3000]), 0);
        assert_eq!(group_allocation(&[], &[]), 0);
    }

    #[test]
    fn test_allocation_saturates_on_huge_amounts() {
        assert_eq!(group_allocation(&[i64::MAX, i64::MAX], &[1, 1]), 0);
        assert_eq!(group_allocation(&[-5, i64::MIN], &[i64::MAX]), i64::MAX);
    }

    #[tokio::test]
    async fn test_huge_prices_do_not_abort_group() {
        let mut sheet = MemorySheet::new();
        sheet
            .set_text(2, 8, "$ 9.000.000.000.000.000.000")
            .set_number(2, 10, 1.0);
        sheet
            .set_text(3, 8, "$ 9.000.000.000.000.000.000")
            .set_number(3, 10, 1.0);
        let groups = vec![group("W1", &[2, 3])];

        let cancel = CancellationToken::new();
        let obs = observer(&cancel, usize::MAX);
        let flow = GroupedFlow::new(&groups, LAYOUT);
        let mut ctx = PhaseCtx::start(Channel::Grouped, flow.total(), &cancel, &obs);

        assert_eq!(flow.run(&mut sheet, &mut ctx).await, PhaseResult::Completed);
        assert_eq!(sheet.value(2, 9), CellValue::Number(0.0));
        assert_eq!(sheet.value(3, 9), CellValue::Number(0.0));
        assert_eq!(ctx.progress().processed, 2);
    }

    #[tokio::test]
    async fn test_first_row_gets_difference() {
        let mut sheet = MemorySheet::new();
        sheet.set_number(2, 8, 1000.0).set_number(2, 10, 4000.0);
        sheet.set_text(3, 8, "$ 1.500").set_number(3, 10, 4000.0);
        sheet.set_number(3, 9, 999.0);
        let groups = vec![group("W1", &[2, 3])];

        let cancel = CancellationToken::new();
        let obs = observer(&cancel, usize::MAX);
        let flow = GroupedFlow::new(&groups, LAYOUT);
        let mut ctx = PhaseCtx::start(Channel::Grouped, flow.total(), &cancel, &obs);

        assert_eq!(flow.run(&mut sheet, &mut ctx).await, PhaseResult::Completed);
        assert_eq!(sheet.value(2, 9), CellValue::Number(1500.0));
        assert_eq!(sheet.value(3, 9), CellValue::Number(0.0));
        assert_eq!(ctx.progress().processed, 2);
    }

    #[tokio::test]
    async fn test_no_positive_difference_leaves_zeros() {
        let mut sheet = MemorySheet::new();
        sheet.set_number(2, 8, 3000.0).set_number(2, 10, 4000.0);
        sheet.set_number(3, 8, 1500.0).set_text(3, 10, "no numerico");
        let groups = vec![group("W1", &[2, 3])];

        let cancel = CancellationToken::new();
        let obs = observer(&cancel, usize::MAX);
        let flow = GroupedFlow::new(&groups, LAYOUT);
        let mut ctx = PhaseCtx::start(Channel::Grouped, flow.total(), &cancel, &obs);

        flow.run(&mut sheet, &mut ctx).await;
        assert_eq!(sheet.value(2, 9), CellValue::Number(0.0));
        assert_eq!(sheet.value(3, 9), CellValue::Number(0.0));
    }

    #[tokio::test]
    async fn test_cancel_inside_group_skips_allocation() {
        let mut sheet = MemorySheet::new();
        for row in 2..=4 {
            sheet.set_number(row, 8, 100.0).set_number(row, 10, 5000.0);
        }
        let groups = vec![group("W9", &[2, 3, 4])];

        let cancel = CancellationToken::new();
        // 第 2 行处理完后取消：第 3 行开始前检查到标志
        let obs = observer(&cancel, 2);
        let flow = GroupedFlow::new(&groups, LAYOUT);
        let mut ctx = PhaseCtx::start(Channel::Grouped, flow.total(), &cancel, &obs);

        assert_eq!(flow.run(&mut sheet, &mut ctx).await, PhaseResult::Cancelled);
        assert_eq!(sheet.value(2, 9), CellValue::Number(0.0));
        assert_eq!(sheet.value(3, 9), CellValue::Number(0.0));
        assert_eq!(sheet.value(4, 9), CellValue::Empty);
        assert_eq!(ctx.progress().processed, 2);
    }

    #[tokio::test]
    async fn test_cancel_between_groups_stops_before_next_group() {
        let mut sheet = MemorySheet::new();
        sheet.set_number(2, 8, 100.0).set_number(2, 10, 600.0);
        sheet.set_number(3, 8, 100.0).set_number(3, 10, 600.0);
        let groups = vec![group("W1", &[2]), group("W2", &[3])];

        let cancel = CancellationToken::new();
        let obs = observer(&cancel, 1);
        let flow = GroupedFlow::new(&groups, LAYOUT);
        let mut ctx = PhaseCtx::start(Channel::Grouped, flow.total(), &cancel, &obs);

        assert_eq!(flow.run(&mut sheet, &mut ctx).await, PhaseResult::Cancelled);
        // 第一组已完整走完，分摊照常写入
        assert_eq!(sheet.value(2, 9), CellValue::Number(500.0));
        assert_eq!(sheet.value(3, 9), CellValue::Empty);
    }
}
