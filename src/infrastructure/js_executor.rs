//! JS 执行器 - 基础设施层
//!
//! 持有一个标签页，只暴露"导航""执行 JS""关闭"三种能力

use std::time::Duration;

use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::time::timeout;

use crate::error::{AppError, AppResult, BrowserError};

/// JS 执行器
///
/// 职责：
/// - 持有一个 Page（每个销售编码一个新标签页）
/// - 不认识销售编码 / 工作表
/// - 不处理业务流程
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 导航到 URL，超时即失败
    pub async fn navigate(&self, url: &str, limit: Duration) -> AppResult<()> {
        match timeout(limit, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(AppError::Browser(BrowserError::NavigationFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })),
            Err(_) => Err(AppError::Browser(BrowserError::NavigationFailed {
                url: url.to_string(),
                reason: format!("超时 {} ms", limit.as_millis()),
            })),
        }
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> AppResult<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> AppResult<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 关闭标签页
    pub async fn close(self) -> AppResult<()> {
        self.page.close().await?;
        Ok(())
    }
}
