//! 报表处理的数据模型

use std::fmt;
use std::path::PathBuf;

/// 销售渠道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// 逐行抓取（MercadoLibre）
    Direct,
    /// 分组分摊（Walmart）
    Grouped,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Direct => write!(f, "MercadoLibre"),
            Channel::Grouped => write!(f, "Walmart"),
        }
    }
}

/// 运行时推导出的三列位置
///
/// 最后一列数据 `L` 决定：价格 = L-2，运费 = L-1，合计 = L
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub price: u32,
    pub dispatch: u32,
    pub total: u32,
}

impl ColumnLayout {
    /// `last_column < 3` 时返回 None
    pub fn from_last_column(last_column: u32) -> Option<Self> {
        if last_column < 3 {
            return None;
        }
        Some(Self {
            price: last_column - 2,
            dispatch: last_column - 1,
            total: last_column,
        })
    }
}

/// 逐行抓取的一项：(行号, 销售编码原文)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectItem {
    pub row: u32,
    pub sale_code: String,
}

/// 共享同一销售编码的一组行（按首次出现顺序）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowGroup {
    pub code: String,
    pub rows: Vec<u32>,
}

/// 分类结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub layout: ColumnLayout,
    pub direct: Vec<DirectItem>,
    pub groups: Vec<RowGroup>,
}

impl Classification {
    pub fn grouped_row_count(&self) -> usize {
        self.groups.iter().map(|g| g.rows.len()).sum()
    }
}

/// 某个渠道阶段的进度
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunProgress {
    pub processed: usize,
    pub total: usize,
}

impl RunProgress {
    pub fn new(total: usize) -> Self {
        Self {
            processed: 0,
            total,
        }
    }
}

impl fmt::Display for RunProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.processed, self.total)
    }
}

/// 编排器的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    OpeningFile,
    Classifying,
    ProcessingChannelA,
    ProcessingChannelB,
    Cancelled,
    Saving,
    Done,
    Failed,
}

impl RunState {
    /// 状态迁移是否合法
    pub fn can_transition_to(self, next: RunState) -> bool {
        use RunState::*;
        match (self, next) {
            (Idle, OpeningFile) | (Idle, Failed) => true,
            (OpeningFile, Classifying) | (OpeningFile, Failed) => true,
            (Classifying, ProcessingChannelA) | (Classifying, Failed) => true,
            (ProcessingChannelA, ProcessingChannelB) | (ProcessingChannelA, Cancelled) => true,
            (ProcessingChannelB, Saving) | (ProcessingChannelB, Cancelled) => true,
            (Cancelled, Saving) => true,
            (Saving, Done) | (Saving, Failed) => true,
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Done | RunState::Failed)
    }
}

/// 一次运行的结果
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub state: RunState,
    pub cancelled: bool,
    pub direct: RunProgress,
    pub grouped: RunProgress,
    pub output_path: Option<PathBuf>,
    pub message: String,
}
