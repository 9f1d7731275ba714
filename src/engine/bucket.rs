// ==========================================
// 仓库库龄分析系统 - 库龄分桶
// ==========================================
// 默认分桶: (-∞,15] (15,30] (30,60] (60,90] (90,180] (180,∞)
// 边界值落入较低的桶；负库龄落入第一个桶
// 标签与超期判定均由边界推导（默认边界下即 "0 - 15 days" … "180+ days"）
// ==========================================

use crate::config::DEFAULT_BUCKET_BOUNDS;
use crate::domain::types::AgeBucket;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucketizer {
    /// 前五个桶的上边界（含）
    upper_bounds: [i64; 5],
}

impl Default for Bucketizer {
    fn default() -> Self {
        Self::new(DEFAULT_BUCKET_BOUNDS)
    }
}

impl Bucketizer {
    /// 边界需严格递增（由 AnalysisConfig::validate 保证）
    pub fn new(upper_bounds: [i64; 5]) -> Self {
        Self { upper_bounds }
    }

    /// 库龄 → 分桶（全函数）
    pub fn bucket_for(&self, age_days: i64) -> AgeBucket {
        self.upper_bounds
            .iter()
            .position(|bound| age_days <= *bound)
            .and_then(AgeBucket::from_index)
            .unwrap_or(AgeBucket::Over180)
    }

    /// 展示标签
    pub fn label(&self, bucket: AgeBucket) -> String {
        let idx = bucket.index();
        match idx {
            0 => format!("0 - {} days", self.upper_bounds[0]),
            1..=4 => format!(
                "{} - {} days",
                self.upper_bounds[idx - 1] + 1,
                self.upper_bounds[idx]
            ),
            _ => format!("{}+ days", self.upper_bounds[4]),
        }
    }

    /// 按展示标签解析（忽略大小写与首尾空白）
    pub fn from_label(&self, label: &str) -> Option<AgeBucket> {
        let wanted = label.trim();
        AgeBucket::ALL
            .into_iter()
            .find(|bucket| self.label(*bucket).eq_ignore_ascii_case(wanted))
    }

    /// 超期分界（天）：第三个上边界
    pub fn late_cutoff(&self) -> i64 {
        self.upper_bounds[2]
    }

    /// 分桶下界超过超期分界即为超期
    pub fn is_late(&self, bucket: AgeBucket) -> bool {
        bucket.index() > 2
    }
}
