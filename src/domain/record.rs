// ==========================================
// 仓库库龄分析系统 - 库存记录实体
// ==========================================
// 职责: 归一化后的原始记录 + 流水线标注后的记录
// 红线: 派生字段只由流水线一次性写入，不单独修改
// ==========================================

use crate::domain::types::{AgeBucket, SourceKind};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// 数据源专属描述字段
// ==========================================
// 核心不解释这些字段，只做透传（导出/展示使用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceDetails {
    General {
        color: String,
        size: String,
        customer: String,
    },
    Fabric {
        lot_no: String,
        style_color: String,
        /// 克重（Gramaj 列原样保留）
        weight: String,
    },
}

impl SourceDetails {
    pub fn source_kind(&self) -> SourceKind {
        match self {
            SourceDetails::General { .. } => SourceKind::General,
            SourceDetails::Fabric { .. } => SourceKind::Fabric,
        }
    }
}

// ==========================================
// RawInventoryRecord - 归一化记录（未解析）
// ==========================================
// 由 Schema Normalizer 产出：仅做结构映射，不做数值/日期解析
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawInventoryRecord {
    /// 源文件内行号（从 1 开始，不含表头）
    pub row_number: usize,

    pub warehouse: String,

    /// 数量原文（FABRIC 为 None，隐含数量 1）
    pub quantity_raw: Option<String>,

    /// 最后移动日期原文（DD-MM-YYYY）
    pub last_movement_raw: String,

    pub project: String,

    pub details: SourceDetails,
}

impl RawInventoryRecord {
    pub fn source_kind(&self) -> SourceKind {
        self.details.source_kind()
    }
}

// ==========================================
// InventoryRecord - 标注后的库存记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub row_number: usize,
    pub source_kind: SourceKind,
    pub warehouse: String,
    pub quantity: f64,
    pub last_movement_date: NaiveDate,
    pub project: String,
    pub details: SourceDetails,

    // ===== 派生字段 =====
    /// 距参考日期的天数（未来日期为负数，不截断）
    pub age_days: i64,
    pub age_bucket: AgeBucket,
    pub is_critical: bool,
}

impl InventoryRecord {
    /// 判断记录是否命中筛选条件
    pub fn matches(&self, filter: &crate::domain::types::ActiveFilter) -> bool {
        filter.matches(self.age_bucket, self.is_critical)
    }
}

// ==========================================
// RejectedRecord - 被拒绝的记录
// ==========================================
// 仅在 InvalidDatePolicy::RejectRecord 下出现
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRecord {
    pub source_kind: SourceKind,
    pub row_number: usize,
    pub warehouse: String,
    pub reason: String,
}
