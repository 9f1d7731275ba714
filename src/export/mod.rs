// ==========================================
// 仓库库龄分析系统 - 导出层
// ==========================================
// 职责: 快照 → 固定列投影的导出表 → CSV 文件
// ==========================================

pub mod error;
pub mod table;
pub mod writer;

pub use error::{ExportError, ExportResult};
pub use table::{
    ExportTable, TableExporter, FABRIC_EXPORT_HEADERS, GENERAL_ALL_WAREHOUSES_HEADERS,
    GENERAL_EXPORT_HEADERS,
};
pub use writer::write_csv_tables;
