// ==========================================
// 仓库库龄分析系统 - 导入层
// ==========================================
// 职责: 外部台账文件 → 归一化记录
// 支持: Excel, CSV
// ==========================================

pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod inventory_importer;
pub mod reference_date;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use field_mapper::{FieldMapper, SourceSchema, FABRIC_SCHEMA, GENERAL_SCHEMA};
pub use file_parser::{
    CsvParser, ExcelParser, FileParser, RawRow, RawTable, UniversalFileParser,
    SOURCE_DATE_FORMAT,
};
pub use inventory_importer::{InventoryImporter, LoadedInventory};
pub use reference_date::{
    extract_from_filename, parse_reference_date, resolve_reference_date, ReferenceDate,
    ReferenceDateOrigin,
};
