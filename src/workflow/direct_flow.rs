//! 直接渠道流程（MercadoLibre）
//!
//! 一个订单 = 一次抓取：运费 = 抓到的金额，合计 = 价格 + 运费

use async_trait::async_trait;
use tracing::info;

use super::phase::{ChannelProcessor, PhaseCtx, PhaseResult};
use crate::config::Config;
use crate::models::{format_amount, Channel, ColumnLayout, DirectItem, ReportSheet};
use crate::services::{fetch_amount, AmountFetcher};

pub struct DirectFlow<'a> {
    items: &'a [DirectItem],
    layout: ColumnLayout,
    fetcher: &'a dyn AmountFetcher,
    config: &'a Config,
}

impl<'a> DirectFlow<'a> {
    pub fn new(
        items: &'a [DirectItem],
        layout: ColumnLayout,
        fetcher: &'a dyn AmountFetcher,
        config: &'a Config,
    ) -> Self {
        Self {
            items,
            layout,
            fetcher,
            config,
        }
    }
}

#[async_trait(?Send)]
impl ChannelProcessor for DirectFlow<'_> {
    fn channel(&self) -> Channel {
        Channel::Direct
    }

    fn total(&self) -> usize {
        self.items.len()
    }

    async fn run(&self, sheet: &mut dyn ReportSheet, ctx: &mut PhaseCtx<'_>) -> PhaseResult {
        for item in self.items {
            if ctx.is_cancelled() {
                return PhaseResult::Cancelled;
            }

            let url = self.config.detail_url(&item.sale_code);
            let amount = fetch_amount(self.fetcher, &item.sale_code, &url).await;

            sheet.set_amount(item.row, self.layout.dispatch, amount);
            let price = sheet.value(item.row, self.layout.price).amount().unwrap_or(0);
            sheet.set_amount(item.row, self.layout.total, price.saturating_add(amount));

            ctx.advance();
            info!(
                "[行 {}] ({}) -> Envíos: {}",
                item.row,
                item.sale_code,
                format_amount(amount)
            );
        }
        PhaseResult::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, AppResult, BrowserError};
    use crate::infrastructure::memory_sheet::MemorySheet;
    use crate::models::CellValue;
    use crate::services::FieldText;
    use crate::workflow::observer::{ChannelObserver, RunEvent};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio_util::sync::CancellationToken;

    /// 按编码返回固定文本；记录访问过的 URL
    struct MapFetcher {
        texts: HashMap<&'static str, &'static str>,
        seen: Mutex<Vec<String>>,
        cancel_after: Option<(usize, CancellationToken)>,
    }

    impl MapFetcher {
        fn new(texts: &[(&'static str, &'static str)]) -> Self {
            Self {
                texts: texts.iter().copied().collect(),
                seen: Mutex::new(Vec::new()),
                cancel_after: None,
            }
        }
    }

    #[async_trait]
    impl AmountFetcher for MapFetcher {
        async fn fetch(&self, sale_code: &str, url: &str) -> AppResult<Option<FieldText>> {
            let count = {
                let mut seen = self.seen.lock().unwrap();
                seen.push(url.to_string());
                seen.len()
            };
            if let Some((n, token)) = &self.cancel_after {
                if count >= *n {
                    token.cancel();
                }
            }
            match self.texts.get(sale_code) {
                Some(&"error") => Err(AppError::Browser(BrowserError::NavigationFailed {
                    url: url.to_string(),
                    reason: "timeout".to_string(),
                })),
                Some(text) => Ok(Some(FieldText {
                    source: "Envíos".to_string(),
                    text: text.to_string(),
                })),
                None => Ok(None),
            }
        }
    }

    const LAYOUT: ColumnLayout = ColumnLayout {
        price: 8,
        dispatch: 9,
        total: 10,
    };

    fn item(row: u32, code: &str) -> DirectItem {
        DirectItem {
            row,
            sale_code: code.to_string(),
        }
    }

    #[tokio::test]
    async fn test_writes_dispatch_and_total() {
        let config = Config::default();
        let fetcher = MapFetcher::new(&[("A1", "$ 3.090"), ("A2", "-$ 500"), ("A3", "error")]);
        let items = vec![item(2, "A1"), item(3, "A2"), item(4, "A3"), item(5, "A4")];
        let mut sheet = MemorySheet::new();
        sheet.set_number(2, 8, 10000.0);
        sheet.set_text(3, 8, "$ 2.000");
        sheet.set_text(4, 8, "sin precio");
        sheet.set_number(5, 8, 700.0);

        let (observer, mut rx) = ChannelObserver::new();
        let cancel = CancellationToken::new();
        let flow = DirectFlow::new(&items, LAYOUT, &fetcher, &config);
        let mut ctx = PhaseCtx::start(Channel::Direct, flow.total(), &cancel, &observer);

        assert_eq!(flow.run(&mut sheet, &mut ctx).await, PhaseResult::Completed);
        assert_eq!(ctx.progress().processed, 4);

        assert_eq!(sheet.value(2, 9), CellValue::Number(3090.0));
        assert_eq!(sheet.value(2, 10), CellValue::Number(13090.0));
        assert_eq!(sheet.value(3, 9), CellValue::Number(0.0));
        assert_eq!(sheet.value(3, 10), CellValue::Number(2000.0));
        assert_eq!(sheet.value(4, 9), CellValue::Number(0.0));
        assert_eq!(sheet.value(4, 10), CellValue::Number(0.0));
        assert_eq!(sheet.value(5, 10), CellValue::Number(700.0));

        assert_eq!(
            fetcher.seen.lock().unwrap()[0],
            "https://www.mercadolibre.cl/ventas/A1/detalle"
        );

        let mut events = Vec::new();
        while let Ok(e) = rx.try_recv() {
            events.push(e);
        }
        assert_eq!(events.first(), Some(&RunEvent::Progress { done: 0, total: 4 }));
        assert_eq!(events.last(), Some(&RunEvent::Progress { done: 4, total: 4 }));
    }

    #[tokio::test]
    async fn test_cancel_leaves_remaining_rows_untouched() {
        let config = Config::default();
        let cancel = CancellationToken::new();
        let mut fetcher = MapFetcher::new(&[("A1", "$ 100"), ("A2", "$ 200"), ("A3", "$ 300")]);
        fetcher.cancel_after = Some((2, cancel.clone()));
        let items = vec![item(2, "A1"), item(3, "A2"), item(4, "A3")];
        let mut sheet = MemorySheet::new();

        let (observer, _rx) = ChannelObserver::new();
        let flow = DirectFlow::new(&items, LAYOUT, &fetcher, &config);
        let mut ctx = PhaseCtx::start(Channel::Direct, flow.total(), &cancel, &observer);

        assert_eq!(flow.run(&mut sheet, &mut ctx).await, PhaseResult::Cancelled);
        assert_eq!(ctx.progress().processed, 2);
        assert_eq!(sheet.value(3, 9), CellValue::Number(200.0));
        assert_eq!(sheet.value(4, 9), CellValue::Empty);
        assert_eq!(fetcher.seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_total_saturates_on_huge_price() {
        let config = Config::default();
        let fetcher = MapFetcher::new(&[("A1", "$ 5")]);
        let items = vec![item(2, "A1")];
        let mut sheet = MemorySheet::new();
        sheet.set_text(2, 8, "9223372036854775807");

        let (observer, _rx) = ChannelObserver::new();
        let cancel = CancellationToken::new();
        let flow = DirectFlow::new(&items, LAYOUT, &fetcher, &config);
        let mut ctx = PhaseCtx::start(Channel::Direct, flow.total(), &cancel, &observer);

        assert_eq!(flow.run(&mut sheet, &mut ctx).await, PhaseResult::Completed);
        assert_eq!(sheet.value(2, 9), CellValue::Number(5.0));
        assert_eq!(sheet.value(2, 10), CellValue::Number(i64::MAX as f64));
    }
}
