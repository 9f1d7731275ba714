// ==========================================
// 仓库库龄分析系统 - 异常阈值引擎
// ==========================================
// 规则: 每个 (数据源, 仓库) 组独立计算库龄的单侧置信上界
//   n > 30      : bound = mean + 1.96 * sigma / sqrt(n)
//   2 <= n <= 30: bound = mean + t(n-1, 0.975) * sigma / sqrt(n)
//   n < 2       : 无定义，按 SmallSamplePolicy 处理
// 判定: is_critical = age_days > bound（严格大于）
// 红线: 阈值由全量（未筛选）记录计算一次，之后不可变
// ==========================================

use crate::config::{AnalysisConfig, SmallSamplePolicy};
use crate::domain::summary::{CriticalThreshold, ThresholdMethod};
use crate::domain::types::SourceKind;
use crate::engine::error::{EngineError, EngineResult};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// 正态近似的样本量下限（n 大于该值时使用 1.96）
pub const NORMAL_APPROX_MIN_EXCLUSIVE: usize = 30;

// ==========================================
// 样本统计
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleStats {
    pub n: usize,
    pub mean: f64,
    /// 样本标准差（Bessel 校正）；n < 2 时为 None
    pub sigma: Option<f64>,
}

impl SampleStats {
    pub fn from_ages(ages: &[i64]) -> Self {
        let n = ages.len();
        if n == 0 {
            return Self {
                n,
                mean: 0.0,
                sigma: None,
            };
        }

        let mean = ages.iter().map(|a| *a as f64).sum::<f64>() / n as f64;
        let sigma = if n >= 2 {
            let sum_sq: f64 = ages
                .iter()
                .map(|a| {
                    let d = *a as f64 - mean;
                    d * d
                })
                .sum();
            Some((sum_sq / (n - 1) as f64).sqrt())
        } else {
            None
        };

        Self { n, mean, sigma }
    }
}

// ==========================================
// ThresholdTable - 阈值表
// ==========================================
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ThresholdTable {
    entries: BTreeMap<(SourceKind, String), CriticalThreshold>,
}

impl ThresholdTable {
    pub fn get(&self, source_kind: SourceKind, warehouse: &str) -> Option<&CriticalThreshold> {
        self.entries.get(&(source_kind, warehouse.to_string()))
    }

    /// 按 (数据源, 仓库名) 顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = &CriticalThreshold> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ==========================================
// CriticalThresholdEngine - 异常阈值引擎
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct CriticalThresholdEngine {
    /// 下标 0 对应 df = 1
    t_table: Vec<f64>,
    normal_multiplier: f64,
    small_sample_policy: SmallSamplePolicy,
}

impl CriticalThresholdEngine {
    pub fn new(
        t_table: Vec<f64>,
        normal_multiplier: f64,
        small_sample_policy: SmallSamplePolicy,
    ) -> Self {
        Self {
            t_table,
            normal_multiplier,
            small_sample_policy,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            config.t_table.clone(),
            config.normal_multiplier,
            config.small_sample_policy,
        )
    }

    /// t(df, 0.975) 查表
    pub fn t_value(&self, df: usize) -> Option<f64> {
        df.checked_sub(1).and_then(|idx| self.t_table.get(idx)).copied()
    }

    /// 计算单个组的阈值
    pub fn threshold_for(
        &self,
        source_kind: SourceKind,
        warehouse: &str,
        ages: &[i64],
    ) -> EngineResult<CriticalThreshold> {
        let stats = SampleStats::from_ages(ages);

        let (bound, method) = match stats.sigma {
            Some(sigma) if stats.n > NORMAL_APPROX_MIN_EXCLUSIVE => {
                let multiplier = self.normal_multiplier;
                (
                    Some(stats.mean + multiplier * sigma / (stats.n as f64).sqrt()),
                    ThresholdMethod::Normal { multiplier },
                )
            }
            Some(sigma) => {
                let df = stats.n - 1;
                // validate() 保证 df 1..=29 均有值
                let t_value = self.t_value(df).ok_or_else(|| {
                    EngineError::InsufficientSampleError {
                        source_kind,
                        warehouse: warehouse.to_string(),
                        sample_size: stats.n,
                    }
                })?;
                (
                    Some(stats.mean + t_value * sigma / (stats.n as f64).sqrt()),
                    ThresholdMethod::StudentT { df, t_value },
                )
            }
            None => {
                if self.small_sample_policy == SmallSamplePolicy::Reject {
                    return Err(EngineError::InsufficientSampleError {
                        source_kind,
                        warehouse: warehouse.to_string(),
                        sample_size: stats.n,
                    });
                }
                warn!(
                    source_kind = %source_kind,
                    warehouse = %warehouse,
                    sample_size = stats.n,
                    policy = ?self.small_sample_policy,
                    "样本量不足，阈值无定义"
                );
                (None, ThresholdMethod::Undefined)
            }
        };

        Ok(CriticalThreshold {
            source_kind,
            warehouse: warehouse.to_string(),
            sample_size: stats.n,
            mean: stats.mean,
            sigma: stats.sigma,
            bound,
            method,
        })
    }

    /// 批量计算阈值
    ///
    /// # 参数
    /// - samples: (数据源, 仓库, 库龄) 序列（全量记录）
    pub fn compute<'a, I>(&self, samples: I) -> EngineResult<ThresholdTable>
    where
        I: IntoIterator<Item = (SourceKind, &'a str, i64)>,
    {
        let mut groups: BTreeMap<(SourceKind, String), Vec<i64>> = BTreeMap::new();
        for (source_kind, warehouse, age_days) in samples {
            groups
                .entry((source_kind, warehouse.to_string()))
                .or_default()
                .push(age_days);
        }

        let mut entries = BTreeMap::new();
        for ((source_kind, warehouse), ages) in groups {
            let threshold = self.threshold_for(source_kind, &warehouse, &ages)?;
            debug!(
                source_kind = %source_kind,
                warehouse = %warehouse,
                n = threshold.sample_size,
                mean = threshold.mean,
                bound = ?threshold.bound,
                "阈值计算完成"
            );
            entries.insert((source_kind, warehouse), threshold);
        }

        Ok(ThresholdTable { entries })
    }

    /// 判定单条记录是否异常
    pub fn is_critical(&self, threshold: &CriticalThreshold, age_days: i64) -> bool {
        match threshold.exceeds(age_days) {
            Some(exceeds) => exceeds,
            None => self.small_sample_policy == SmallSamplePolicy::AlwaysCritical,
        }
    }
}
