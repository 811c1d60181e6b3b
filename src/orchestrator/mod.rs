//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量报表处理器
//! - 持有浏览器连接和工作簿（一次运行独占）
//! - 依次调度两个渠道流程
//! - 汇总进度、处理取消、保存输出文件
//!
//! ### `detail_lookup` - 单个销售编码查询
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理一个 xlsx)
//!     ↓
//! workflow::{DirectFlow, GroupedFlow} (处理一个渠道)
//!     ↓
//! services (能力层：分类 / 抓取 / 提取)
//!     ↓
//! infrastructure (基础设施：JsExecutor / XlsxWorkbook)
//! ```

pub mod batch_processor;
pub mod detail_lookup;

pub use batch_processor::{summary_message, BatchProcessor};
pub use detail_lookup::lookup_detail;
