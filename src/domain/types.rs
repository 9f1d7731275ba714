// ==========================================
// 仓库库龄分析系统 - 领域类型定义
// ==========================================
// 职责: 数据源类型 / 库龄分桶 / 筛选条件 / 查询范围
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ==========================================
// 数据源类型 (Source Kind)
// ==========================================
// 两个数据源永不混入同一个统计总体
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceKind {
    General, // 通用库存台账
    Fabric,  // 面料库存台账
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::General => write!(f, "GENERAL"),
            SourceKind::Fabric => write!(f, "FABRIC"),
        }
    }
}

// ==========================================
// 库龄分桶 (Age Bucket)
// ==========================================
// 声明顺序即展示顺序（由短到长）
// 序列化名取默认边界下的标签；展示标签随配置边界变化，见 Bucketizer::label
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgeBucket {
    #[serde(rename = "0 - 15 days")]
    UpTo15,
    #[serde(rename = "16 - 30 days")]
    Days16To30,
    #[serde(rename = "31 - 60 days")]
    Days31To60,
    #[serde(rename = "61 - 90 days")]
    Days61To90,
    #[serde(rename = "91 - 180 days")]
    Days91To180,
    #[serde(rename = "180+ days")]
    Over180,
}

impl AgeBucket {
    pub const ALL: [AgeBucket; 6] = [
        AgeBucket::UpTo15,
        AgeBucket::Days16To30,
        AgeBucket::Days31To60,
        AgeBucket::Days61To90,
        AgeBucket::Days91To180,
        AgeBucket::Over180,
    ];

    /// 分桶在 ALL 中的下标（透视表列号）
    pub fn index(self) -> usize {
        self as usize
    }

    /// 从下标还原分桶
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

// ==========================================
// 筛选条件 (Active Filter)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "buckets", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActiveFilter {
    /// 按库龄分桶筛选（空集合不匹配任何记录）
    Buckets(BTreeSet<AgeBucket>),
    /// 仅异常（critical）记录
    CriticalOnly,
}

impl ActiveFilter {
    /// 选中全部六个分桶
    pub fn all_buckets() -> Self {
        ActiveFilter::Buckets(AgeBucket::ALL.into_iter().collect())
    }

    pub fn buckets<I: IntoIterator<Item = AgeBucket>>(buckets: I) -> Self {
        ActiveFilter::Buckets(buckets.into_iter().collect())
    }

    /// 判断记录是否命中
    pub fn matches(&self, bucket: AgeBucket, is_critical: bool) -> bool {
        match self {
            ActiveFilter::Buckets(selected) => selected.contains(&bucket),
            ActiveFilter::CriticalOnly => is_critical,
        }
    }

    /// 导出文件名后缀
    pub fn file_suffix(&self) -> &'static str {
        match self {
            ActiveFilter::Buckets(_) => "DaysFilter",
            ActiveFilter::CriticalOnly => "Critical",
        }
    }
}

// ==========================================
// 查询范围 (Warehouse Scope)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarehouseScope {
    All,
    Warehouse(String),
}

impl WarehouseScope {
    pub fn warehouse(name: impl Into<String>) -> Self {
        WarehouseScope::Warehouse(name.into())
    }

    pub fn contains(&self, warehouse: &str) -> bool {
        match self {
            WarehouseScope::All => true,
            WarehouseScope::Warehouse(name) => name == warehouse,
        }
    }
}
