//! 金额抓取服务 - 业务能力层
//!
//! 只负责"给一个销售编码，拿回一个金额"，不关心工作表

use async_trait::async_trait;
use tracing::{info, warn};

use super::amount_extractor::FieldText;
use crate::error::AppResult;
use crate::models::{format_amount, parse_amount};

/// 按销售编码抓取金额字段的能力
///
/// - `Ok(Some(_))`：找到主字段或备用字段
/// - `Ok(None)`：两个字段都不存在
/// - `Err(_)`：打开页面 / 导航 / 脚本失败
#[async_trait]
pub trait AmountFetcher: Send + Sync {
    async fn fetch(&self, sale_code: &str, url: &str) -> AppResult<Option<FieldText>>;
}

/// 抓取并换算成最终金额；任何失败都按 0 处理，负数也按 0 处理
pub async fn fetch_amount(fetcher: &dyn AmountFetcher, sale_code: &str, url: &str) -> i64 {
    match fetcher.fetch(sale_code, url).await {
        Ok(field) => resolve_amount(sale_code, field),
        Err(e) => {
            warn!("[编码 {}] 抓取失败，按 $ 0 处理: {}", sale_code, e);
            0
        }
    }
}

/// 把字段文本换算成金额
pub fn resolve_amount(sale_code: &str, field: Option<FieldText>) -> i64 {
    let Some(field) = field else {
        info!("[编码 {}] 未找到 Envíos 或 Bonificaciones，金额: $ 0", sale_code);
        return 0;
    };
    match parse_amount(&field.text) {
        Some(value) => {
            let value = value.max(0);
            info!(
                "[编码 {}] Envíos ({}): {}",
                sale_code,
                field.source,
                format_amount(value)
            );
            value
        }
        None => {
            warn!(
                "[编码 {}] 无法解析 {} 的值: {}",
                sale_code, field.source, field.text
            );
            0
        }
    }
}
