//! 单个销售编码查询
//!
//! 不打开工作簿，只按编码读一次 Envíos / Bonificaciones

use tracing::info;

use crate::browser::{BrowserConnector, BrowserSession};
use crate::config::Config;
use crate::error::{AppError, AppResult, BrowserError, SheetError};
use crate::models::format_amount;
use crate::services::resolve_amount;

/// 查询一个销售编码的金额
///
/// 编码会先去除首尾空白；抓取失败返回错误，字段不存在按 0
pub async fn lookup_detail(
    config: &Config,
    connector: &dyn BrowserConnector,
    session: Option<&BrowserSession>,
    code: &str,
) -> AppResult<i64> {
    let code = code.trim();
    if code.is_empty() {
        return Err(AppError::Sheet(SheetError::EmptySaleCode));
    }
    let session = session.ok_or(AppError::Browser(BrowserError::NoSession))?;

    let url = config.detail_url(code);
    info!("[编码 {}] 打开详情页并读取 Envíos...", code);

    let fetcher = connector.connect(session).await?;
    let field = fetcher.fetch(code, &url).await?;
    let amount = resolve_amount(code, field);
    info!("[编码 {}] 结果: {}", code, format_amount(amount));
    Ok(amount)
}
