//! 工作表抽象
//!
//! 处理器只通过 `ReportSheet` 读写单元格，不认识具体的 xlsx 库。

use super::amount::parse_amount;

/// 单元格的值
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// 是否为空（只含空白的字符串也算空）
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Number(_) => false,
            CellValue::Text(s) => s.trim().is_empty(),
        }
    }

    /// 转成文本；整数值不带小数点
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                format!("{}", *n as i64)
            }
            CellValue::Number(n) => n.to_string(),
            CellValue::Text(s) => s.clone(),
        }
    }

    /// 解析为金额；数值直接取整，文本走货币解析
    pub fn amount(&self) -> Option<i64> {
        match self {
            CellValue::Empty => None,
            CellValue::Number(n) if n.is_finite() => Some(n.trunc() as i64),
            CellValue::Number(_) => None,
            CellValue::Text(s) => parse_amount(s),
        }
    }
}

/// 报表工作表（行列均从 1 开始）
pub trait ReportSheet {
    /// 最后一行的行号
    fn max_row(&self) -> u32;
    /// 最后一列的列号（可能包含空白列，真正的数据列由分类器判断）
    fn max_column(&self) -> u32;
    /// 读取单元格
    fn value(&self, row: u32, col: u32) -> CellValue;
    /// 写入整数金额
    fn set_amount(&mut self, row: u32, col: u32, amount: i64);
}
