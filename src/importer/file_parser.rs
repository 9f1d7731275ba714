// ==========================================
// 仓库库龄分析系统 - 文件解析器实现
// ==========================================
// 职责: 文件 → RawTable（表头 + 行记录）
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Data, DataType, Reader};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// 源数据日期格式（DD-MM-YYYY）
pub const SOURCE_DATE_FORMAT: &str = "%d-%m-%Y";

/// 源系统导出的工作表名
const PREFERRED_SHEET: &str = "Sheet";

// ==========================================
// RawTable - 解析结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    /// 表头（已去除首尾空白）
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// 数据行号（从 1 开始，空白行也计数）
    pub row_number: usize,
    pub values: HashMap<String, String>,
}

impl RawTable {
    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    fn push_row(&mut self, row_number: usize, cells: impl Iterator<Item = String>) {
        let mut values = HashMap::new();
        for (col_idx, value) in cells.enumerate() {
            if let Some(header) = self.headers.get(col_idx) {
                values.insert(header.clone(), value.trim().to_string());
            }
        }

        // 跳过完全空白的行
        if values.values().all(|v| v.is_empty()) {
            return;
        }

        self.rows.push(RawRow { row_number, values });
    }
}

// ==========================================
// FileParser Trait
// ==========================================
pub trait FileParser: Send + Sync {
    fn parse(&self, file_path: &Path) -> ImportResult<RawTable>;
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse(&self, file_path: &Path) -> ImportResult<RawTable> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let mut table = RawTable {
            headers: reader
                .headers()?
                .iter()
                .map(|h| h.trim().to_string())
                .collect(),
            rows: Vec::new(),
        };

        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            table.push_row(idx + 1, record.iter().map(str::to_string));
        }

        debug!(rows = table.rows.len(), path = %file_path.display(), "CSV 解析完成");
        Ok(table)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl ExcelParser {
    /// 单元格转文本；日期单元格统一输出 DD-MM-YYYY
    fn render_cell(cell: &Data) -> String {
        match cell {
            Data::Empty => String::new(),
            Data::DateTime(_) | Data::DateTimeIso(_) => cell
                .as_date()
                .map(|date| date.format(SOURCE_DATE_FORMAT).to_string())
                .unwrap_or_else(|| cell.to_string()),
            other => other.to_string(),
        }
    }
}

impl FileParser for ExcelParser {
    fn parse(&self, file_path: &Path) -> ImportResult<RawTable> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "xlsx" && ext != "xls" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        // 优先读取 "Sheet"，否则读取第一个 sheet
        let sheet_names = workbook.sheet_names();
        let sheet_name = sheet_names
            .iter()
            .find(|name| name.as_str() == PREFERRED_SHEET)
            .or_else(|| sheet_names.first())
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;

        let range = workbook.worksheet_range(&sheet_name)?;

        let mut rows = range.rows();
        let header_row = rows
            .next()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无表头行".to_string()))?;

        let mut table = RawTable {
            headers: header_row
                .iter()
                .map(|cell| cell.to_string().trim().to_string())
                .collect(),
            rows: Vec::new(),
        };

        for (idx, data_row) in rows.enumerate() {
            table.push_row(idx + 1, data_row.iter().map(Self::render_cell));
        }

        debug!(
            rows = table.rows.len(),
            sheet = %sheet_name,
            path = %file_path.display(),
            "Excel 解析完成"
        );
        Ok(table)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse(&self, file_path: &Path) -> ImportResult<RawTable> {
        match extension_of(file_path).as_str() {
            "csv" => CsvParser.parse(file_path),
            "xlsx" | "xls" => ExcelParser.parse(file_path),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}
