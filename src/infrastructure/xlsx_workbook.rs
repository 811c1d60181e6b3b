//! xlsx 工作簿 - 基础设施层
//!
//! 持有打开的工作簿，只暴露"取报表工作表"和"另存为"的能力

use std::path::{Path, PathBuf};

use tracing::debug;
use umya_spreadsheet::{CellRawValue, Spreadsheet, Worksheet};

use crate::error::{AppError, AppResult, FileError, SheetError};
use crate::models::{CellValue, ReportSheet};

/// 打开的 xlsx 工作簿
pub struct XlsxWorkbook {
    book: Spreadsheet,
    path: PathBuf,
}

impl XlsxWorkbook {
    /// 打开工作簿
    pub fn open(path: &Path) -> AppResult<Self> {
        debug!("打开工作簿: {}", path.display());
        let book = umya_spreadsheet::reader::xlsx::read(path).map_err(|e| {
            AppError::File(FileError::OpenFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
        })?;
        Ok(Self {
            book,
            path: path.to_path_buf(),
        })
    }

    /// 源文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 按名称取工作表（可写）
    pub fn sheet_mut(&mut self, name: &str) -> AppResult<XlsxSheet<'_>> {
        self.book
            .get_sheet_by_name_mut(name)
            .map(|sheet| XlsxSheet { sheet })
            .ok_or_else(|| {
                AppError::Sheet(SheetError::MissingSheet {
                    name: name.to_string(),
                })
            })
    }

    /// 保存到指定路径
    pub fn save_as(&self, path: &Path) -> AppResult<()> {
        debug!("保存工作簿: {}", path.display());
        umya_spreadsheet::writer::xlsx::write(&self.book, path).map_err(|e| {
            AppError::File(FileError::SaveFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
        })
    }
}

/// 输出文件路径：`<原文件名>{suffix}<原扩展名>`，与源文件同目录
pub fn output_path_for(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match input.extension() {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}{}", stem, suffix),
    };
    input.with_file_name(file_name)
}

/// 工作表视图
pub struct XlsxSheet<'a> {
    sheet: &'a mut Worksheet,
}

impl ReportSheet for XlsxSheet<'_> {
    fn max_row(&self) -> u32 {
        self.sheet.get_highest_row()
    }

    fn max_column(&self) -> u32 {
        self.sheet.get_highest_column()
    }

    fn value(&self, row: u32, col: u32) -> CellValue {
        match self.sheet.get_cell((col, row)) {
            Some(cell) => match cell.get_raw_value() {
                CellRawValue::Empty => CellValue::Empty,
                CellRawValue::Numeric(n) => CellValue::Number(*n),
                _ => CellValue::Text(cell.get_value().into_owned()),
            },
            None => CellValue::Empty,
        }
    }

    fn set_amount(&mut self, row: u32, col: u32, amount: i64) {
        self.sheet
            .get_cell_mut((col, row))
            .set_value_number(amount as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_inserts_suffix_before_extension() {
        let out = output_path_for(Path::new("/tmp/ventas/reporte.xlsx"), "_con_envios");
        assert_eq!(out, PathBuf::from("/tmp/ventas/reporte_con_envios.xlsx"));
    }

    #[test]
    fn test_output_path_without_extension() {
        let out = output_path_for(Path::new("reporte"), "_con_envios");
        assert_eq!(out, PathBuf::from("reporte_con_envios"));
    }

    #[test]
    fn test_sheet_roundtrip_through_umya() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("libro.xlsx");

        let mut book = umya_spreadsheet::new_file_empty_worksheet();
        let sheet = book.new_sheet("Reporte").unwrap();
        sheet.get_cell_mut((1, 1)).set_value("Canal");
        sheet.get_cell_mut((3, 2)).set_value_number(1500);
        umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();

        let mut workbook = XlsxWorkbook::open(&path).unwrap();
        let mut report = workbook.sheet_mut("Reporte").unwrap();
        assert_eq!(report.value(1, 1), CellValue::Text("Canal".to_string()));
        assert_eq!(report.value(2, 3), CellValue::Number(1500.0));
        assert_eq!(report.value(5, 5), CellValue::Empty);

        report.set_amount(2, 4, 2500);
        assert_eq!(report.value(2, 4), CellValue::Number(2500.0));
    }

    #[test]
    fn test_missing_sheet_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("otro.xlsx");
        let book = umya_spreadsheet::new_file();
        umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();

        let mut workbook = XlsxWorkbook::open(&path).unwrap();
        let err = workbook.sheet_mut("Reporte").err().unwrap();
        assert!(matches!(err, AppError::Sheet(SheetError::MissingSheet { .. })));
    }
}
