// ==========================================
// 仓库库龄分析系统 - 参考日期解析
// ==========================================
// 职责: 从面料台账文件名提取参考日期
// 规则: 文件名中 "stock" 之后、扩展名之前的部分，空格换成 '-'
//       例: "Fabric stock 15 03 2025.xlsx" → 15-03-2025
// 红线: 回退到"当天"必须显式记录并返回给调用方
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::SOURCE_DATE_FORMAT;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::warn;

const FILENAME_DATE_MARKER: &str = "stock";

/// 参考日期来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceDateOrigin {
    /// 从文件名提取
    Filename,
    /// 命令行/调用方显式指定
    Explicit,
    /// 提取失败，使用调用方提供的回退日期
    Fallback,
}

impl fmt::Display for ReferenceDateOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceDateOrigin::Filename => write!(f, "FILENAME"),
            ReferenceDateOrigin::Explicit => write!(f, "EXPLICIT"),
            ReferenceDateOrigin::Fallback => write!(f, "FALLBACK"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceDate {
    pub date: NaiveDate,
    pub origin: ReferenceDateOrigin,
}

impl ReferenceDate {
    /// DD-MM-YYYY 文本（文件名/报告使用）
    pub fn label(&self) -> String {
        self.date.format(SOURCE_DATE_FORMAT).to_string()
    }
}

/// 解析 DD-MM-YYYY 文本
pub fn parse_reference_date(value: &str) -> ImportResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), SOURCE_DATE_FORMAT)
        .map_err(|_| ImportError::ReferenceDateFormat(value.to_string()))
}

/// 从文件名提取参考日期
pub fn extract_from_filename(file_name: &str) -> ImportResult<NaiveDate> {
    let token = file_name
        .split(FILENAME_DATE_MARKER)
        .nth(1)
        .and_then(|rest| rest.split('.').next())
        .map(|raw| raw.trim().replace(' ', "-"))
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ImportError::ReferenceDateNotFound(file_name.to_string()))?;

    parse_reference_date(&token)
}

/// 解析参考日期，失败时显式回退
///
/// # 参数
/// - fabric_path: 面料台账文件路径（只使用文件名部分）
/// - fallback: 回退日期（通常为处理当天）
pub fn resolve_reference_date(fabric_path: &Path, fallback: NaiveDate) -> ReferenceDate {
    let file_name = fabric_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    match extract_from_filename(&file_name) {
        Ok(date) => ReferenceDate {
            date,
            origin: ReferenceDateOrigin::Filename,
        },
        Err(e) => {
            warn!(
                file_name = %file_name,
                error = %e,
                fallback = %fallback.format(SOURCE_DATE_FORMAT),
                "参考日期提取失败，使用回退日期"
            );
            ReferenceDate {
                date: fallback,
                origin: ReferenceDateOrigin::Fallback,
            }
        }
    }
}
