use std::path::Path;

use serde::Deserialize;

use crate::error::{AppError, AppResult, ConfigError, FileError};

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 浏览器调试端口（由 login 产生，None 表示尚未登录）
    pub browser_debug_port: Option<u16>,
    /// 销售详情页 URL 模板，`{code}` 会被替换为销售编码
    pub detail_url_template: String,
    /// 登录 / 销售列表页
    pub login_url: String,
    /// 报表工作表名称
    pub sheet_name: String,
    /// 渠道列（1 起始，F = 6）
    pub channel_column: u32,
    /// 销售编码列（1 起始，H = 8）
    pub sale_code_column: u32,
    /// 直接抓取的渠道（已规范化：小写、去空格）
    pub direct_channel: String,
    /// 分组分摊的渠道（已规范化）
    pub grouped_channel: String,
    /// 主字段标签
    pub primary_field: String,
    /// 备用字段标签
    pub fallback_field: String,
    /// 主字段等待超时（毫秒）
    pub primary_timeout_ms: u64,
    /// 备用字段等待超时（毫秒）
    pub fallback_timeout_ms: u64,
    /// 页面导航超时（毫秒）
    pub navigation_timeout_ms: u64,
    /// 调试端口轮询次数
    pub port_poll_attempts: u32,
    /// 调试端口轮询间隔（毫秒）
    pub port_poll_delay_ms: u64,
    /// login 启动 Chrome 后的端口轮询次数
    pub launch_poll_attempts: u32,
    /// 输出文件名后缀
    pub output_suffix: String,
    /// Chrome 可执行文件路径（None 时在常见位置查找）
    pub chrome_executable: Option<String>,
    /// 自动化专用的用户数据目录
    pub profile_dir: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: None,
            detail_url_template: "https://www.mercadolibre.cl/ventas/{code}/detalle".to_string(),
            login_url: "https://www.mercadolibre.cl/ventas/omni/listado".to_string(),
            sheet_name: "Reporte".to_string(),
            channel_column: 6,
            sale_code_column: 8,
            direct_channel: "mercadolibre".to_string(),
            grouped_channel: "walmart".to_string(),
            primary_field: "Envíos".to_string(),
            fallback_field: "Bonificaciones".to_string(),
            primary_timeout_ms: 2000,
            fallback_timeout_ms: 1000,
            navigation_timeout_ms: 20000,
            port_poll_attempts: 10,
            port_poll_delay_ms: 400,
            launch_poll_attempts: 15,
            output_suffix: "_con_envios".to_string(),
            chrome_executable: None,
            profile_dir: "ml_profile".to_string(),
            verbose_logging: false,
            output_log_file: "despachos.log".to_string(),
        }
    }
}

impl Config {
    /// 默认配置 + 环境变量覆盖
    pub fn from_env() -> AppResult<Self> {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件读取配置（缺省字段使用默认值）
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::io(path.display().to_string(), e))?;
        toml::from_str(&content).map_err(|source| {
            AppError::File(FileError::TomlParseFailed {
                path: path.display().to_string(),
                source,
            })
        })
    }

    /// 先读配置文件（如果有），再用环境变量覆盖
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let base = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        base.with_env_overrides()
    }

    /// 构建某个销售编码的详情页 URL（编码原样代入）
    pub fn detail_url(&self, code: &str) -> String {
        self.detail_url_template.replace("{code}", code)
    }

    fn with_env_overrides(self) -> AppResult<Self> {
        Ok(Self {
            browser_debug_port: match std::env::var("BROWSER_DEBUG_PORT") {
                Ok(v) => Some(parse_var("BROWSER_DEBUG_PORT", &v, "u16")?),
                Err(_) => self.browser_debug_port,
            },
            detail_url_template: std::env::var("DETAIL_URL_TEMPLATE")
                .unwrap_or(self.detail_url_template),
            login_url: std::env::var("LOGIN_URL").unwrap_or(self.login_url),
            sheet_name: std::env::var("SHEET_NAME").unwrap_or(self.sheet_name),
            channel_column: self.channel_column,
            sale_code_column: self.sale_code_column,
            direct_channel: self.direct_channel,
            grouped_channel: self.grouped_channel,
            primary_field: self.primary_field,
            fallback_field: self.fallback_field,
            primary_timeout_ms: env_or("PRIMARY_TIMEOUT_MS", self.primary_timeout_ms)?,
            fallback_timeout_ms: env_or("FALLBACK_TIMEOUT_MS", self.fallback_timeout_ms)?,
            navigation_timeout_ms: env_or("NAVIGATION_TIMEOUT_MS", self.navigation_timeout_ms)?,
            port_poll_attempts: self.port_poll_attempts,
            port_poll_delay_ms: self.port_poll_delay_ms,
            launch_poll_attempts: self.launch_poll_attempts,
            output_suffix: self.output_suffix,
            chrome_executable: std::env::var("CHROME_EXECUTABLE")
                .ok()
                .or(self.chrome_executable),
            profile_dir: std::env::var("PROFILE_DIR").unwrap_or(self.profile_dir),
            verbose_logging: env_or("VERBOSE_LOGGING", self.verbose_logging)?,
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
        })
    }
}

fn env_or<T: std::str::FromStr>(var_name: &str, default: T) -> AppResult<T> {
    match std::env::var(var_name) {
        Ok(v) => parse_var(var_name, &v, std::any::type_name::<T>()),
        Err(_) => Ok(default),
    }
}

fn parse_var<T: std::str::FromStr>(
    var_name: &str,
    value: &str,
    expected_type: &str,
) -> AppResult<T> {
    value.trim().parse().map_err(|_| {
        AppError::Config(ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value: value.to_string(),
            expected_type: expected_type.to_string(),
        })
    })
}
