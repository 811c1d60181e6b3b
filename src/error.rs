use thiserror::Error;

/// 应用程序错误类型
///
/// 只有"整次运行失败"的情况才会变成 `AppError`；
/// 单行的抓取失败在处理器内部消化（金额按 0 处理）。
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 工作表内容错误
    #[error("工作表错误: {0}")]
    Sheet(#[from] SheetError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 没有可用的调试会话（尚未登录）
    #[error("没有调试端口，请先执行 login")]
    NoSession,
    /// 调试端口在轮询次数内不可达
    #[error("调试端口 {port} 不可达 (尝试 {attempts} 次)")]
    EndpointUnreachable { port: u16, attempts: u32 },
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {source}")]
    ConnectionFailed {
        port: u16,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 浏览器中没有打开的上下文
    #[error("浏览器中没有打开的页面上下文")]
    NoContext,
    /// 创建页面失败
    #[error("创建页面失败: {source}")]
    PageCreationFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 导航失败
    #[error("导航到 {url} 失败: {reason}")]
    NavigationFailed { url: String, reason: String },
    /// 执行脚本失败
    #[error("执行脚本失败: {source}")]
    ScriptExecutionFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 找不到 Chrome 可执行文件
    #[error("找不到 Chrome 可执行文件")]
    ExecutableNotFound,
    /// 启动 Chrome 失败
    #[error("启动 Chrome 失败: {source}")]
    LaunchFailed {
        #[source]
        source: std::io::Error,
    },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 打开工作簿失败
    #[error("无法打开工作簿 ({path}): {reason}")]
    OpenFailed { path: String, reason: String },
    /// 保存工作簿失败
    #[error("无法保存工作簿 ({path}): {reason}")]
    SaveFailed { path: String, reason: String },
    /// 读写文件失败
    #[error("读写文件失败 ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 工作表内容错误
#[derive(Debug, Error)]
pub enum SheetError {
    /// 缺少指定名称的工作表
    #[error("找不到工作表 '{name}'")]
    MissingSheet { name: String },
    /// 找不到最后一列数据（少于 3 列）
    #[error("无法检测最后一列数据 (最后一列: {last_column})")]
    NoDataColumn { last_column: u32 },
    /// 销售编码为空
    #[error("销售编码为空")]
    EmptySaleCode,
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 命令行参数错误
    #[error("命令行参数错误: {0}")]
    InvalidArgument(String),
}

// ========== 从常见错误类型转换 ==========

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(BrowserError::ScriptExecutionFailed {
            source: Box::new(err),
        })
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Browser(BrowserError::ScriptExecutionFailed {
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::Io {
            path: String::new(),
            source: err,
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建浏览器连接错误
    pub fn browser_connection_failed(
        port: u16,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Browser(BrowserError::ConnectionFailed {
            port,
            source: Box::new(source),
        })
    }

    /// 创建页面创建错误
    pub fn page_creation_failed(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        AppError::Browser(BrowserError::PageCreationFailed {
            source: Box::new(source),
        })
    }

    /// 创建文件读写错误
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::Io {
            path: path.into(),
            source,
        })
    }

    /// 面向操作员的状态文本（西班牙语界面）
    pub fn status_message(&self) -> String {
        match self {
            AppError::Browser(BrowserError::NoSession) => {
                "No hay puerto de depuracion. Pulsa el boton de login primero.".to_string()
            }
            AppError::Browser(BrowserError::EndpointUnreachable { port, .. }) => {
                format!("No se pudo alcanzar el puerto {}.", port)
            }
            AppError::Browser(BrowserError::NoContext) => {
                "No hay contextos en Chrome. ¿Cerraste la ventana de login?".to_string()
            }
            AppError::Browser(BrowserError::ExecutableNotFound) => {
                "No se encontro Google Chrome en las rutas tipicas.".to_string()
            }
            AppError::Browser(e) => format!("Error conectando a Chrome: {}", e),
            AppError::File(FileError::OpenFailed { reason, .. }) => {
                format!("No se pudo abrir el archivo: {}", reason)
            }
            AppError::File(FileError::SaveFailed { reason, .. }) => {
                format!("No se pudo guardar el archivo: {}", reason)
            }
            AppError::File(e) => format!("Error de archivo: {}", e),
            AppError::Sheet(SheetError::MissingSheet { name }) => {
                format!("No se encontro la hoja '{}' en el Excel.", name)
            }
            AppError::Sheet(SheetError::NoDataColumn { .. }) => {
                "No se pudo detectar la ultima columna con datos.".to_string()
            }
            AppError::Sheet(SheetError::EmptySaleCode) => {
                "Código requerido.".to_string()
            }
            AppError::Config(e) => format!("Configuracion invalida: {}", e),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
