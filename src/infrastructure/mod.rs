pub mod js_executor;
#[cfg(test)]
pub mod memory_sheet;
pub mod xlsx_workbook;

pub use js_executor::JsExecutor;
pub use xlsx_workbook::{output_path_for, XlsxSheet, XlsxWorkbook};
