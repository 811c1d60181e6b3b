//! # Despachos
//!
//! 给销售报表回填运费：读取 `Reporte` 工作表，按渠道分类，
//! 通过已登录的 Chrome（CDP）读取每个销售编码的 Envíos，写回后另存为新文件。
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page / 工作簿），只暴露能力
//! - `JsExecutor` - 页面的唯一 owner，提供 navigate() / eval() 能力
//! - `XlsxWorkbook` - 打开、定位工作表、另存为
//!
//! ### ② 业务能力层（Services）
//! - `RowClassifier` - 推导列位置，按渠道分桶
//! - `FieldPolicy` - 主字段 / 备用字段的读取策略
//! - `AmountFetcher` - 按编码取回金额文本
//!
//! ### ③ 流程层（Workflow）
//! - `DirectFlow` - MercadoLibre：逐行抓取并写入
//! - `GroupedFlow` - Walmart：按编码分组，差额写入组内第一行
//! - `RunObserver` - 进度 / 状态 / 结束通知
//!
//! ### ④ 编排层（Orchestration）
//! - `BatchProcessor` - 一次运行处理一个文件，持有浏览器连接
//! - `lookup_detail` - 单个编码查询
//!
//! ## 模块结构

pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod workflow;

// 重新导出常用类型
pub use browser::{BrowserConnector, BrowserSession, ChromeConnector};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{JsExecutor, XlsxWorkbook};
pub use models::{RunOutcome, RunProgress, RunState};
pub use orchestrator::{lookup_detail, BatchProcessor};
pub use workflow::{ChannelObserver, RunEvent, RunObserver};
