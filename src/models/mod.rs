pub mod amount;
pub mod report;
pub mod sheet;

pub use amount::{format_amount, parse_amount};
pub use report::{
    Channel, Classification, ColumnLayout, DirectItem, RowGroup, RunOutcome, RunProgress,
    RunState,
};
pub use sheet::{CellValue, ReportSheet};
