//! 金额提取服务 - 业务能力层
//!
//! 在详情页里找"带标题的行"并读出小计文本。找不到是正常情况，不是错误。

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::AppResult;
use crate::infrastructure::JsExecutor;

/// 两次探测之间的间隔
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 一次探测的结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RowProbe {
    /// 是否找到了带该标题的行
    pub found: bool,
    /// 行内小计文本（已去除首尾空白）
    pub text: Option<String>,
}

/// 探测能力：页面上是否已有该标题的行
#[async_trait]
pub trait FieldProbe: Send + Sync {
    async fn probe(&self, label: &str) -> AppResult<RowProbe>;
}

/// 标题匹配前的规整：空白折叠为单个空格、去首尾空白、转小写
pub fn normalize_label(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// 生成探测脚本；行文本在页面里按同样的规则规整后再做包含匹配
pub fn row_probe_script(label: &str) -> AppResult<String> {
    Ok(format!(
        r#"
        (() => {{
            const norm = s => (s || '').replace(/\s+/g, ' ').trim().toLowerCase();
            const label = {};
            const rows = Array.from(document.querySelectorAll('div.sc-account-rows__row'));
            const row = rows.find(r => norm(r.textContent).includes(label));
            if (!row) {{
                return {{ found: false, text: null }};
            }}
            const sub = row.querySelector('span.sc-account-rows__row__subTotal');
            const text = sub ? (sub.textContent || '').trim() : '';
            return {{ found: true, text: text.length ? text : null }};
        }})()
        "#,
        serde_json::to_string(&normalize_label(label))?
    ))
}

#[async_trait]
impl FieldProbe for JsExecutor {
    async fn probe(&self, label: &str) -> AppResult<RowProbe> {
        self.eval_as(row_probe_script(label)?).await
    }
}

/// 等待标题为 `label` 的行出现并返回其小计文本
///
/// 超时或任何查找失败都返回 `None`
pub async fn extract_amount_text<P: FieldProbe + ?Sized>(
    probe: &P,
    label: &str,
    limit: Duration,
) -> Option<String> {
    let deadline = Instant::now() + limit;
    loop {
        match tokio::time::timeout_at(deadline, probe.probe(label)).await {
            Ok(Ok(result)) if result.found => return result.text,
            Ok(Ok(_)) => {}
            Ok(Err(e)) => debug!("探测 '{}' 失败: {}", label, e),
            Err(_) => return None,
        }
        if Instant::now() + POLL_INTERVAL > deadline {
            return None;
        }
        sleep(POLL_INTERVAL).await;
    }
}

/// 提取到的字段文本及其来源标签
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldText {
    pub source: String,
    pub text: String,
}

/// 主字段 / 备用字段及各自的超时
#[derive(Debug, Clone)]
pub struct FieldPolicy {
    pub primary: String,
    pub primary_timeout: Duration,
    pub fallback: String,
    pub fallback_timeout: Duration,
}

impl FieldPolicy {
    /// 先主字段（较长超时），再备用字段（较短超时）
    pub async fn read<P: FieldProbe + ?Sized>(&self, probe: &P) -> Option<FieldText> {
        if let Some(text) = extract_amount_text(probe, &self.primary, self.primary_timeout).await {
            return Some(FieldText {
                source: self.primary.clone(),
                text,
            });
        }
        extract_amount_text(probe, &self.fallback, self.fallback_timeout)
            .await
            .map(|text| FieldText {
                source: self.fallback.clone(),
                text,
            })
    }
}
