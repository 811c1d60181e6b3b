use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};
use tracing::{debug, error, info, warn};

use super::connection::wait_for_endpoint;
use super::session::BrowserSession;
use crate::config::Config;
use crate::error::{AppError, AppResult, BrowserError};

/// 常见的 Chrome 安装位置
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if cfg!(windows) {
        paths.push(PathBuf::from(
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
        ));
        paths.push(PathBuf::from(
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ));
        if let Ok(local) = std::env::var("LOCALAPPDATA") {
            paths.push(Path::new(&local).join(r"Google\Chrome\Application\chrome.exe"));
        }
    } else if cfg!(target_os = "macos") {
        paths.push(PathBuf::from(
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        ));
    } else {
        paths.push(PathBuf::from("/usr/bin/google-chrome"));
        paths.push(PathBuf::from("/usr/bin/google-chrome-stable"));
        paths.push(PathBuf::from("/usr/bin/chromium"));
        paths.push(PathBuf::from("/usr/bin/chromium-browser"));
    }
    paths
}

/// 查找 Chrome 可执行文件：优先使用配置的路径
pub fn find_chrome_executable(configured: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = configured {
        let path = PathBuf::from(path);
        return path.is_file().then_some(path);
    }
    candidate_paths().into_iter().find(|p| p.is_file())
}

/// 让系统分配一个空闲的本地端口
pub fn find_free_port() -> AppResult<u16> {
    let listener = TcpListener::bind(("localhost", 0))?;
    Ok(listener.local_addr()?.port())
}

/// 启动 Chrome 的参数（不带自动化标志，保持普通浏览器外观）
pub fn chrome_args(port: u16, profile_dir: &Path, start_url: &str) -> Vec<String> {
    vec![
        format!("--remote-debugging-port={}", port),
        format!("--user-data-dir={}", profile_dir.display()),
        "--profile-directory=Default".to_string(),
        "--start-maximized".to_string(),
        "--no-default-browser-check".to_string(),
        "--no-first-run".to_string(),
        start_url.to_string(),
    ]
}

/// 已启动的登录浏览器
pub struct LoginBrowser {
    pub session: BrowserSession,
    pub child: Child,
    /// 调试端口是否已确认可达
    pub ready: bool,
}

/// 用专用配置目录启动 Chrome，供操作员手动登录（cookies 保存在配置目录）
pub async fn launch_login_browser(config: &Config) -> AppResult<LoginBrowser> {
    info!("🚀 启动登录浏览器...");

    let chrome = find_chrome_executable(config.chrome_executable.as_deref())
        .ok_or(AppError::Browser(BrowserError::ExecutableNotFound))?;
    debug!("Chrome 路径: {}", chrome.display());

    let port = find_free_port()?;
    let profile_dir = PathBuf::from(&config.profile_dir);
    std::fs::create_dir_all(&profile_dir)
        .map_err(|e| AppError::io(profile_dir.display().to_string(), e))?;
    let profile_dir = profile_dir.canonicalize().unwrap_or(profile_dir);

    let child = Command::new(&chrome)
        .args(chrome_args(port, &profile_dir, &config.login_url))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| {
            error!("启动 Chrome 失败: {}", source);
            AppError::Browser(BrowserError::LaunchFailed { source })
        })?;

    let ready = wait_for_endpoint(
        port,
        config.launch_poll_attempts,
        Duration::from_millis(config.port_poll_delay_ms),
    )
    .await;
    if ready {
        info!(
            "✓ Chrome 已打开 {}，调试端口 {}。请登录，cookies 保存在 {}",
            config.login_url,
            port,
            profile_dir.display()
        );
    } else {
        warn!("⚠️ 无法确认调试端口 {}，请重试", port);
    }

    Ok(LoginBrowser {
        session: BrowserSession::attach(port),
        child,
        ready,
    })
}
