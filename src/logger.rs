//! 日志初始化
//!
//! 控制台 + 运行日志文件两路输出；`RUST_LOG` 优先于配置的详细程度

use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// 只输出到控制台（测试和没有配置时使用）
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init();
}

/// 按配置初始化：写入日志文件头，然后同时输出到控制台和日志文件
pub fn init_with(config: &Config) -> AppResult<()> {
    init_log_file(&config.output_log_file)?;

    let default_level = if config.verbose_logging { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.output_log_file)
        .map_err(|e| AppError::io(&config.output_log_file, e))?;

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .try_init();
    Ok(())
}

/// 初始化日志文件（覆盖旧内容，写入带时间的文件头）
pub fn init_log_file(log_file_path: &str) -> AppResult<()> {
    let log_header = format!(
        "{}\n运费处理日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header).map_err(|e| AppError::io(log_file_path, e))?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 运费回填");
    match config.browser_debug_port {
        Some(port) => info!("🔌 调试端口: {}", port),
        None => info!("🔌 调试端口: 未设置"),
    }
    info!(
        "⏱️ 字段超时: {} {} ms / {} {} ms",
        config.primary_field,
        config.primary_timeout_ms,
        config.fallback_field,
        config.fallback_timeout_ms
    );
    info!("{}", "=".repeat(60));
}
