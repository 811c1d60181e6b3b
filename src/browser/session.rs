//! 浏览器调试会话句柄

use std::fmt;

/// 已登录 Chrome 的调试会话
///
/// 由 login 命令产生（或通过 `--port` 附着到已打开的 Chrome），
/// 显式传给编排器，不使用全局状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrowserSession {
    port: u16,
}

impl BrowserSession {
    /// 附着到指定调试端口
    pub fn attach(port: u16) -> Self {
        Self { port }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// DevTools 端点 URL
    pub fn endpoint(&self) -> String {
        format!("http://localhost:{}", self.port)
    }
}

impl fmt::Display for BrowserSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.endpoint())
    }
}
