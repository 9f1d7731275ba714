// ==========================================
// 仓库库龄分析系统 - 库龄计算
// ==========================================
// 规则: age_days = 参考日期 - 最后移动日期（整天数）
// 红线: 未来日期得到负数，原样保留，不截断
// ==========================================

use crate::domain::record::RawInventoryRecord;
use crate::engine::error::{EngineError, EngineResult};
use crate::importer::file_parser::SOURCE_DATE_FORMAT;
use chrono::NaiveDate;

/// 库龄计算器（一次运行共享同一个参考日期）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeCalculator {
    reference_date: NaiveDate,
}

impl AgeCalculator {
    pub fn new(reference_date: NaiveDate) -> Self {
        Self { reference_date }
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    /// 计算库龄天数
    pub fn age_days(&self, last_movement_date: NaiveDate) -> i64 {
        (self.reference_date - last_movement_date).num_days()
    }

    /// 解析记录的最后移动日期
    pub fn parse_last_movement(&self, record: &RawInventoryRecord) -> EngineResult<NaiveDate> {
        NaiveDate::parse_from_str(record.last_movement_raw.trim(), SOURCE_DATE_FORMAT).map_err(
            |_| EngineError::DateParseError {
                source_kind: record.source_kind(),
                row_number: record.row_number,
                warehouse: record.warehouse.clone(),
                value: record.last_movement_raw.clone(),
            },
        )
    }
}
