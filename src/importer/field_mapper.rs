// ==========================================
// 仓库库龄分析系统 - 字段映射器 (Schema Normalizer)
// ==========================================
// 职责: 两个数据源的异构列名 → 统一的 RawInventoryRecord
// 红线: 纯结构映射，不做数值/日期解析
// ==========================================

use crate::domain::record::{RawInventoryRecord, SourceDetails};
use crate::domain::types::SourceKind;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{RawRow, RawTable};
use tracing::debug;

// ==========================================
// SourceSchema - 数据源列名定义
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSchema {
    pub source_kind: SourceKind,
    pub warehouse: &'static str,
    /// FABRIC 无数量列（每行隐含数量 1）
    pub quantity: Option<&'static str>,
    pub last_movement: &'static str,
    pub project: &'static str,
    /// 可选描述列（缺失时置空串）
    pub detail_columns: [&'static str; 3],
}

pub const GENERAL_SCHEMA: SourceSchema = SourceSchema {
    source_kind: SourceKind::General,
    warehouse: "Warehouse",
    quantity: Some("Quantity"),
    last_movement: "Last Movement Date",
    project: "Project",
    detail_columns: ["Color", "Size", "Customer"],
};

pub const FABRIC_SCHEMA: SourceSchema = SourceSchema {
    source_kind: SourceKind::Fabric,
    warehouse: "Ware House",
    quantity: None,
    last_movement: "last transaction date",
    project: "Project",
    detail_columns: ["Lot No", "Style-color", "Gramaj"],
};

impl SourceSchema {
    pub fn for_kind(source_kind: SourceKind) -> &'static SourceSchema {
        match source_kind {
            SourceKind::General => &GENERAL_SCHEMA,
            SourceKind::Fabric => &FABRIC_SCHEMA,
        }
    }

    /// 必需列
    pub fn required_columns(&self) -> Vec<&'static str> {
        let mut columns = vec![self.warehouse];
        columns.extend(self.quantity);
        columns.push(self.last_movement);
        columns.push(self.project);
        columns
    }
}

// ==========================================
// FieldMapper - 归一化器
// ==========================================
pub struct FieldMapper;

impl FieldMapper {
    /// 将一个数据源的原始表映射为统一记录
    ///
    /// # 返回
    /// - Err(SchemaError): 缺少必需列（在任何行映射之前检查）
    pub fn normalize(
        &self,
        table: &RawTable,
        source_kind: SourceKind,
    ) -> ImportResult<Vec<RawInventoryRecord>> {
        let schema = SourceSchema::for_kind(source_kind);

        if let Some(missing) = schema
            .required_columns()
            .into_iter()
            .find(|column| !table.has_column(column))
        {
            return Err(ImportError::SchemaError {
                source_kind,
                column: missing.to_string(),
            });
        }

        let records: Vec<RawInventoryRecord> = table
            .rows
            .iter()
            .map(|row| self.map_row(schema, row))
            .collect();

        debug!(source_kind = %source_kind, count = records.len(), "字段映射完成");
        Ok(records)
    }

    fn map_row(&self, schema: &SourceSchema, row: &RawRow) -> RawInventoryRecord {
        let [first, second, third] = schema.detail_columns;
        let details = match schema.source_kind {
            SourceKind::General => SourceDetails::General {
                color: self.get_string(row, first),
                size: self.get_string(row, second),
                customer: self.get_string(row, third),
            },
            SourceKind::Fabric => SourceDetails::Fabric {
                lot_no: self.get_string(row, first),
                style_color: self.get_string(row, second),
                weight: self.get_string(row, third),
            },
        };

        RawInventoryRecord {
            row_number: row.row_number,
            warehouse: self.get_string(row, schema.warehouse),
            quantity_raw: schema.quantity.map(|column| self.get_string(row, column)),
            last_movement_raw: self.get_string(row, schema.last_movement),
            project: self.get_string(row, schema.project),
            details,
        }
    }

    /// 提取字符串字段（缺失列按空串处理）
    fn get_string(&self, row: &RawRow, key: &str) -> String {
        row.values
            .get(key)
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }
}
