//! 行分类服务 - 业务能力层
//!
//! 推导价格/运费/合计三列的位置，并把数据行按渠道分桶

use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, AppResult, SheetError};
use crate::models::{
    Channel, Classification, ColumnLayout, DirectItem, ReportSheet, RowGroup,
};

/// 行分类器
pub struct RowClassifier {
    channel_column: u32,
    sale_code_column: u32,
    direct_channel: String,
    grouped_channel: String,
}

impl RowClassifier {
    pub fn new(config: &Config) -> Self {
        Self {
            channel_column: config.channel_column,
            sale_code_column: config.sale_code_column,
            direct_channel: normalize_channel(&config.direct_channel),
            grouped_channel: normalize_channel(&config.grouped_channel),
        }
    }

    /// 扫描整张表（含表头行），返回最后一个含非空值的列号
    pub fn last_data_column(sheet: &dyn ReportSheet) -> u32 {
        let mut last = 0;
        for row in 1..=sheet.max_row() {
            for col in (last + 1)..=sheet.max_column() {
                if !sheet.value(row, col).is_blank() {
                    last = col;
                }
            }
        }
        last
    }

    /// 判断某个渠道文本属于哪个桶
    pub fn channel_of(&self, raw: &str) -> Option<Channel> {
        let normalized = normalize_channel(raw);
        if normalized == self.direct_channel {
            Some(Channel::Direct)
        } else if normalized == self.grouped_channel {
            Some(Channel::Grouped)
        } else {
            None
        }
    }

    /// 分类整张工作表
    pub fn classify(&self, sheet: &dyn ReportSheet) -> AppResult<Classification> {
        let last_column = Self::last_data_column(sheet);
        let layout = ColumnLayout::from_last_column(last_column)
            .ok_or(AppError::Sheet(SheetError::NoDataColumn { last_column }))?;
        debug!(
            "最后一列: {}，价格列 {} / 运费列 {} / 合计列 {}",
            last_column, layout.price, layout.dispatch, layout.total
        );

        let mut direct = Vec::new();
        let mut groups: Vec<RowGroup> = Vec::new();

        for row in 2..=sheet.max_row() {
            let channel = sheet.value(row, self.channel_column).as_text();
            let sale_code = sheet.value(row, self.sale_code_column).as_text();

            match self.channel_of(&channel) {
                Some(Channel::Direct) => {
                    if sale_code.is_empty() {
                        continue;
                    }
                    direct.push(DirectItem { row, sale_code });
                }
                Some(Channel::Grouped) => {
                    let key = sale_code.trim();
                    if key.is_empty() {
                        continue;
                    }
                    match groups.iter_mut().find(|g| g.code == key) {
                        Some(group) => group.rows.push(row),
                        None => groups.push(RowGroup {
                            code: key.to_string(),
                            rows: vec![row],
                        }),
                    }
                }
                None => {}
            }
        }

        debug!(
            "分类完成: 直接 {} 行，分组 {} 组",
            direct.len(),
            groups.len()
        );
        Ok(Classification {
            layout,
            direct,
            groups,
        })
    }
}

fn normalize_channel(raw: &str) -> String {
    raw.trim().to_lowercase()
}
