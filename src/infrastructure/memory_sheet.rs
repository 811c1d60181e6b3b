//! 内存工作表，供单元测试使用

use std::collections::BTreeMap;

use crate::models::{CellValue, ReportSheet};

#[derive(Debug, Default, Clone)]
pub struct MemorySheet {
    cells: BTreeMap<(u32, u32), CellValue>,
}

impl MemorySheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, row: u32, col: u32, value: CellValue) -> &mut Self {
        self.cells.insert((row, col), value);
        self
    }

    pub fn set_text(&mut self, row: u32, col: u32, text: &str) -> &mut Self {
        self.set(row, col, CellValue::Text(text.to_string()))
    }

    pub fn set_number(&mut self, row: u32, col: u32, n: f64) -> &mut Self {
        self.set(row, col, CellValue::Number(n))
    }
}

impl ReportSheet for MemorySheet {
    fn max_row(&self) -> u32 {
        self.cells.keys().map(|(r, _)| *r).max().unwrap_or(0)
    }

    fn max_column(&self) -> u32 {
        self.cells.keys().map(|(_, c)| *c).max().unwrap_or(0)
    }

    fn value(&self, row: u32, col: u32) -> CellValue {
        self.cells
            .get(&(row, col))
            .cloned()
            .unwrap_or(CellValue::Empty)
    }

    fn set_amount(&mut self, row: u32, col: u32, amount: i64) {
        self.cells
            .insert((row, col), CellValue::Number(amount as f64));
    }
}
