use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Browser;
use futures::StreamExt;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use super::session::BrowserSession;
use crate::config::Config;
use crate::error::{AppError, AppResult, BrowserError};
use crate::infrastructure::JsExecutor;
use crate::services::{AmountFetcher, FieldPolicy, FieldText};

/// 轮询调试端口，直到能建立 TCP 连接
pub async fn wait_for_endpoint(port: u16, attempts: u32, delay: Duration) -> bool {
    for attempt in 1..=attempts {
        match timeout(delay, TcpStream::connect(("localhost", port))).await {
            Ok(Ok(_)) => {
                debug!("调试端口 {} 可达 (第 {} 次尝试)", port, attempt);
                return true;
            }
            Ok(Err(e)) => debug!("调试端口 {} 暂不可达: {}", port, e),
            Err(_) => debug!("调试端口 {} 连接超时", port),
        }
        sleep(delay).await;
    }
    false
}

/// 已建立的 CDP 连接
///
/// 持有 Browser 和后台事件任务；drop 时停止事件任务
pub struct BrowserConnection {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl BrowserConnection {
    pub fn browser(&self) -> &Browser {
        &self.browser
    }
}

impl Drop for BrowserConnection {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// 连接到已打开的 Chrome，并确认其中有可用的页面上下文
pub async fn connect_over_cdp(session: &BrowserSession) -> AppResult<BrowserConnection> {
    let browser_url = session.endpoint();
    info!("正在连接到浏览器: {}", browser_url);

    let (browser, mut handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        AppError::browser_connection_failed(session.port(), e)
    })?;
    debug!("浏览器连接成功");

    // 在后台处理浏览器事件
    let handler = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });
    let mut connection = BrowserConnection { browser, handler };

    // 添加短暂延迟以等待浏览器状态同步
    sleep(Duration::from_millis(300)).await;

    let targets = connection.browser.fetch_targets().await?;
    let pages = targets.iter().filter(|t| t.r#type == "page").count();
    debug!("获取到 {} 个页面", pages);
    if pages == 0 {
        warn!("Chrome 中没有打开的页面，登录窗口可能已关闭");
        return Err(AppError::Browser(BrowserError::NoContext));
    }

    Ok(connection)
}

/// 建立"按销售编码取金额"能力的入口
///
/// 编排器只依赖这个 trait，测试里可以替换成桩实现
#[async_trait]
pub trait BrowserConnector: Send + Sync {
    async fn connect(&self, session: &BrowserSession) -> AppResult<Box<dyn AmountFetcher>>;
}

/// 基于 chromiumoxide 的连接器
pub struct ChromeConnector {
    config: Config,
}

impl ChromeConnector {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

#[async_trait]
impl BrowserConnector for ChromeConnector {
    async fn connect(&self, session: &BrowserSession) -> AppResult<Box<dyn AmountFetcher>> {
        let attempts = self.config.port_poll_attempts;
        let delay = Duration::from_millis(self.config.port_poll_delay_ms);
        if !wait_for_endpoint(session.port(), attempts, delay).await {
            return Err(AppError::Browser(BrowserError::EndpointUnreachable {
                port: session.port(),
                attempts,
            }));
        }

        let connection = connect_over_cdp(session).await?;
        Ok(Box::new(ChromeFetcher {
            connection,
            policy: FieldPolicy {
                primary: self.config.primary_field.clone(),
                primary_timeout: Duration::from_millis(self.config.primary_timeout_ms),
                fallback: self.config.fallback_field.clone(),
                fallback_timeout: Duration::from_millis(self.config.fallback_timeout_ms),
            },
            navigation_timeout: Duration::from_millis(self.config.navigation_timeout_ms),
        }))
    }
}

/// 每个销售编码开一个新标签页，读完即关
pub struct ChromeFetcher {
    connection: BrowserConnection,
    policy: FieldPolicy,
    navigation_timeout: Duration,
}

#[async_trait]
impl AmountFetcher for ChromeFetcher {
    async fn fetch(&self, sale_code: &str, url: &str) -> AppResult<Option<FieldText>> {
        let page = self
            .connection
            .browser()
            .new_page("about:blank")
            .await
            .map_err(AppError::page_creation_failed)?;
        let executor = JsExecutor::new(page);

        let result = match executor.navigate(url, self.navigation_timeout).await {
            Ok(()) => Ok(self.policy.read(&executor).await),
            Err(e) => Err(e),
        };

        if let Err(e) = executor.close().await {
            debug!("[编码 {}] 关闭标签页失败: {}", sale_code, e);
        }
        result
    }
}
