// ==========================================
// 仓库库龄分析系统 - 汇总视图
// ==========================================
// 职责: 仓库合计 / 透视表 / 分桶合计 / 异常合计 / 阈值表
// 红线: 只读派生视图，每次全量重算
// ==========================================

use crate::domain::types::{AgeBucket, SourceKind};
use serde::{Deserialize, Serialize};

/// 仓库合计（数量）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarehouseTotal {
    pub warehouse: String,
    pub quantity: f64,
}

/// 透视表一行：仓库 × 六个分桶
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotRow {
    pub warehouse: String,

    /// 按 AgeBucket::ALL 顺序排列，缺失组合补 0
    pub quantities: [f64; 6],
}

impl PivotRow {
    pub fn new(warehouse: String) -> Self {
        Self {
            warehouse,
            quantities: [0.0; 6],
        }
    }

    pub fn get(&self, bucket: AgeBucket) -> f64 {
        self.quantities[bucket.index()]
    }

    pub fn add(&mut self, bucket: AgeBucket, quantity: f64) {
        self.quantities[bucket.index()] += quantity;
    }

    /// 行合计（应等于该仓库的 WarehouseTotal）
    pub fn total(&self) -> f64 {
        self.quantities.iter().sum()
    }
}

/// 分桶合计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketTotal {
    pub bucket: AgeBucket,
    pub quantity: f64,
}

/// 数量排名（仪表盘前三高亮）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarehouseQuantityRank {
    pub warehouse: String,
    pub quantity: f64,
    /// 1 为数量最大
    pub rank: usize,
}

impl WarehouseQuantityRank {
    pub fn is_top3(&self) -> bool {
        self.rank <= 3
    }
}

/// 阈值计算方法
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThresholdMethod {
    /// n > 30：正态近似
    Normal { multiplier: f64 },
    /// 2 <= n <= 30：Student-t 临界值
    StudentT { df: usize, t_value: f64 },
    /// n < 2：阈值无定义，由小样本策略决定
    Undefined,
}

/// 每个 (数据源, 仓库) 组的异常阈值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalThreshold {
    pub source_kind: SourceKind,
    pub warehouse: String,
    pub sample_size: usize,
    pub mean: f64,
    /// 样本标准差（n-1）；n < 2 时为 None
    pub sigma: Option<f64>,
    /// 单侧置信上界；n < 2 时为 None
    pub bound: Option<f64>,
    pub method: ThresholdMethod,
}

impl CriticalThreshold {
    /// 判断库龄是否超过上界
    ///
    /// 上界无定义时返回 None，由调用方按策略处理
    pub fn exceeds(&self, age_days: i64) -> Option<bool> {
        self.bound.map(|bound| (age_days as f64) > bound)
    }
}

/// 汇总视图集合
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregateSummary {
    pub warehouse_totals: Vec<WarehouseTotal>,
    pub pivot: Vec<PivotRow>,
    pub bucket_totals: Vec<BucketTotal>,
    pub critical_totals: Vec<WarehouseTotal>,
}
