// ==========================================
// 仓库库龄分析系统 - 引擎错误类型
// ==========================================
// 红线: 全部为数据质量问题，不重试；必须带上定位上下文
// ==========================================

use crate::domain::types::SourceKind;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("日期格式错误 ({source_kind}, 行 {row_number}, 仓库 {warehouse}): 期望 DD-MM-YYYY，实际 {value:?}")]
    DateParseError {
        source_kind: SourceKind,
        row_number: usize,
        warehouse: String,
        value: String,
    },

    #[error("数量无效 ({source_kind}, 行 {row_number}, 仓库 {warehouse}): {value:?}")]
    InvalidQuantity {
        source_kind: SourceKind,
        row_number: usize,
        warehouse: String,
        value: String,
    },

    /// location 描述出处，例如 "GENERAL 行 12"
    #[error("仓库不在排序表中 ({location}): {warehouse}")]
    UnrankedWarehouseError { warehouse: String, location: String },

    #[error("样本量不足 ({source_kind}, 仓库 {warehouse}): n = {sample_size}，至少需要 2")]
    InsufficientSampleError {
        source_kind: SourceKind,
        warehouse: String,
        sample_size: usize,
    },

    #[error("部门不存在: {0}")]
    UnknownDepartment(String),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
