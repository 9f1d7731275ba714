// ==========================================
// 仓库库龄分析系统 - 导出表投影
// ==========================================
// 列投影（固定）:
//   GENERAL: Project, Color, Size, Quantity, Customer, [Warehouse],
//            Last Movement Date, number of days
//   FABRIC : Project, Lot No, Style-color, Gramaj,
//            last transaction date, number of days
// 文件名:
//   单仓库: {warehouse}_{DD-MM-YYYY}_{DaysFilter|Critical}.csv
//   全仓库: All_Warehouses_{date}.csv / Critical_All_Warehouses_{date}.csv
// 红线: 空表不输出
// ==========================================

use crate::domain::record::{InventoryRecord, SourceDetails};
use crate::domain::types::{ActiveFilter, SourceKind};
use crate::engine::pipeline::AnalysisSnapshot;
use crate::importer::file_parser::SOURCE_DATE_FORMAT;
use serde::{Deserialize, Serialize};

pub const GENERAL_EXPORT_HEADERS: [&str; 7] = [
    "Project",
    "Color",
    "Size",
    "Quantity",
    "Customer",
    "Last Movement Date",
    "number of days",
];

pub const GENERAL_ALL_WAREHOUSES_HEADERS: [&str; 8] = [
    "Project",
    "Color",
    "Size",
    "Quantity",
    "Customer",
    "Warehouse",
    "Last Movement Date",
    "number of days",
];

pub const FABRIC_EXPORT_HEADERS: [&str; 6] = [
    "Project",
    "Lot No",
    "Style-color",
    "Gramaj",
    "last transaction date",
    "number of days",
];

/// 一个待写出的表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportTable {
    pub file_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// 按快照生成导出表
#[derive(Debug, Clone, Copy)]
pub struct TableExporter<'a> {
    snapshot: &'a AnalysisSnapshot,
}

impl<'a> TableExporter<'a> {
    pub fn new(snapshot: &'a AnalysisSnapshot) -> Self {
        Self { snapshot }
    }

    fn date_label(&self) -> String {
        self.snapshot.reference_date().format(SOURCE_DATE_FORMAT).to_string()
    }

    /// 每个 (仓库, 数据源) 一个表，仓库按排序表
    ///
    /// 同一仓库两个数据源都有命中时，FABRIC 表文件名带 _FABRIC 后缀避免重名
    pub fn warehouse_tables(&self, filter: &ActiveFilter) -> Vec<ExportTable> {
        let date = self.date_label();
        let suffix = filter.file_suffix();
        let mut tables = Vec::new();

        for warehouse in self.snapshot.warehouses() {
            let matched = |kind: SourceKind| -> Vec<&'a InventoryRecord> {
                self.snapshot
                    .records()
                    .iter()
                    .filter(|r| &r.warehouse == warehouse && r.source_kind == kind && r.matches(filter))
                    .collect()
            };
            let general = matched(SourceKind::General);
            let fabric = matched(SourceKind::Fabric);

            if !general.is_empty() {
                tables.push(ExportTable {
                    file_name: format!("{}_{}_{}.csv", warehouse, date, suffix),
                    headers: to_headers(&GENERAL_EXPORT_HEADERS),
                    rows: general.iter().map(|r| general_row(r, false)).collect(),
                });
            }
            if !fabric.is_empty() {
                let file_name = if general.is_empty() {
                    format!("{}_{}_{}.csv", warehouse, date, suffix)
                } else {
                    format!("{}_FABRIC_{}_{}.csv", warehouse, date, suffix)
                };
                tables.push(ExportTable {
                    file_name,
                    headers: to_headers(&FABRIC_EXPORT_HEADERS),
                    rows: fabric.iter().copied().map(fabric_row).collect(),
                });
            }
        }

        tables
    }

    /// 全仓库视图（GENERAL 数据源，带 Warehouse 列）
    pub fn all_warehouses_table(&self, filter: &ActiveFilter) -> Option<ExportTable> {
        let rows: Vec<Vec<String>> = self
            .snapshot
            .records()
            .iter()
            .filter(|r| r.source_kind == SourceKind::General && r.matches(filter))
            .map(|r| general_row(r, true))
            .collect();
        if rows.is_empty() {
            return None;
        }

        let date = self.date_label();
        let file_name = match filter {
            ActiveFilter::CriticalOnly => format!("Critical_All_Warehouses_{}.csv", date),
            ActiveFilter::Buckets(_) => format!("All_Warehouses_{}.csv", date),
        };
        Some(ExportTable {
            file_name,
            headers: to_headers(&GENERAL_ALL_WAREHOUSES_HEADERS),
            rows,
        })
    }
}

fn to_headers(headers: &[&str]) -> Vec<String> {
    headers.iter().map(|h| h.to_string()).collect()
}

fn format_date(record: &InventoryRecord) -> String {
    record.last_movement_date.format(SOURCE_DATE_FORMAT).to_string()
}

fn general_row(record: &InventoryRecord, with_warehouse: bool) -> Vec<String> {
    let (color, size, customer) = match &record.details {
        SourceDetails::General {
            color,
            size,
            customer,
        } => (color.as_str(), size.as_str(), customer.as_str()),
        SourceDetails::Fabric { .. } => ("", "", ""),
    };

    let mut row = vec![
        record.project.clone(),
        color.to_string(),
        size.to_string(),
        record.quantity.to_string(),
        customer.to_string(),
    ];
    if with_warehouse {
        row.push(record.warehouse.clone());
    }
    row.push(format_date(record));
    row.push(record.age_days.to_string());
    row
}

fn fabric_row(record: &InventoryRecord) -> Vec<String> {
    let (lot_no, style_color, weight) = match &record.details {
        SourceDetails::Fabric {
            lot_no,
            style_color,
            weight,
        } => (lot_no.as_str(), style_color.as_str(), weight.as_str()),
        SourceDetails::General { .. } => ("", "", ""),
    };

    vec![
        record.project.clone(),
        lot_no.to_string(),
        style_color.to_string(),
        weight.to_string(),
        format_date(record),
        record.age_days.to_string(),
    ]
}
