// ==========================================
// 仓库库龄分析系统 - 分析配置
// ==========================================
// 职责: 仓库排序表 / t 分布临界值表 / 分桶边界 / 部门映射 / 策略开关
// 红线: 全部为静态配置，运行期不从数据推导
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// 默认仓库排序（仓库 → 展示序号）
const DEFAULT_WAREHOUSE_ORDER: &[(&str, u32)] = &[
    ("PF_Active", 1),
    ("WIP_Cut_1", 2),
    ("WIP_Pri_1", 3),
    ("WIP_P1", 4),
    ("WIP_Sew_1", 5),
    ("WIP_Sew_2", 6),
    ("WIP_Sew_P1", 7),
    ("WIP_Sew_P2", 8),
    ("WIPLines1", 9),
    ("WIPLines2", 10),
    ("G_Active_1", 11),
    ("G_Active_2", 12),
    ("G_MD_1", 13),
    ("G_MD_2", 14),
    ("Pre_Ship_1", 15),
    ("Pre_Ship_2", 16),
    ("WIP_Emb_1", 17),
    ("HGBU_Extra", 18),
];

/// 双侧 95% Student-t 临界值，下标 0 对应 df = 1
pub const T_975_DF_1_TO_29: [f64; 29] = [
    12.706, 4.303, 3.182, 2.776, 2.571, 2.447, 2.365, 2.306, 2.262, 2.228, 2.201, 2.179, 2.160,
    2.145, 2.131, 2.120, 2.110, 2.101, 2.093, 2.086, 2.080, 2.074, 2.069, 2.064, 2.060, 2.056,
    2.052, 2.048, 2.045,
];

/// 六个分桶的五个上边界（天，含）
pub const DEFAULT_BUCKET_BOUNDS: [i64; 5] = [15, 30, 60, 90, 180];

// ==========================================
// 策略枚举
// ==========================================

/// 样本量不足（n < 2）时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SmallSamplePolicy {
    /// 阈值记为无定义，组内记录均不标记为异常
    #[default]
    NeverCritical,
    /// 组内记录全部标记为异常
    AlwaysCritical,
    /// 拒绝本次运行（InsufficientSampleError）
    Reject,
}

/// 日期无法解析时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvalidDatePolicy {
    /// 第一条坏日期即终止运行
    #[default]
    RejectRun,
    /// 剔除该记录并记入 rejected 列表
    RejectRecord,
}

// ==========================================
// 部门配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentConfig {
    pub name: String,

    /// 通知地址
    pub email: String,

    /// 有序仓库列表
    #[serde(default)]
    pub warehouses: Vec<String>,

    /// 为 true 时解析为快照中出现的全部仓库（按排序表）
    #[serde(default)]
    pub all_warehouses: bool,
}

impl DepartmentConfig {
    fn new(name: &str, email: &str, warehouses: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            warehouses: warehouses.iter().map(|w| w.to_string()).collect(),
            all_warehouses: false,
        }
    }
}

// ==========================================
// AnalysisConfig - 分析配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// 仓库 → 展示序号
    pub warehouse_order: BTreeMap<String, u32>,

    /// t 分布临界值（df = 1..=29）
    pub t_table: Vec<f64>,

    /// 正态近似乘数（n > 30）
    #[serde(default = "default_normal_multiplier")]
    pub normal_multiplier: f64,

    /// 分桶上边界（含），严格递增
    #[serde(default = "default_bucket_bounds")]
    pub bucket_bounds: [i64; 5],

    /// 部门映射（保持配置顺序）
    #[serde(default)]
    pub departments: Vec<DepartmentConfig>,

    #[serde(default)]
    pub small_sample_policy: SmallSamplePolicy,

    #[serde(default)]
    pub invalid_date_policy: InvalidDatePolicy,

    /// 报告中列出的最久滞留记录数
    #[serde(default = "default_report_top_n")]
    pub report_top_n: usize,

    /// 报告落款
    #[serde(default = "default_report_signature")]
    pub report_signature: String,
}

fn default_normal_multiplier() -> f64 {
    1.96
}

fn default_bucket_bounds() -> [i64; 5] {
    DEFAULT_BUCKET_BOUNDS
}

fn default_report_top_n() -> usize {
    3
}

fn default_report_signature() -> String {
    "Planning Department".to_string()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let departments = vec![
            DepartmentConfig::new(
                "Garment Active (G_Active)",
                "garment.active@company.com",
                &["G_Active_1", "G_Active_2"],
            ),
            DepartmentConfig::new(
                "Garment MD (G_MD)",
                "garment.md@company.com",
                &["G_MD_1", "G_MD_2"],
            ),
            DepartmentConfig::new(
                "Pre-Shipment",
                "preshipment@company.com",
                &["Pre_Ship_1", "Pre_Ship_2"],
            ),
            DepartmentConfig::new(
                "WIP Lines",
                "wiplines@company.com",
                &["WIPLines1", "WIPLines2"],
            ),
            DepartmentConfig::new(
                "WIP Sewing",
                "wipsewing@company.com",
                &["WIP_Sew_1", "WIP_Sew_2", "WIP_Sew_P1", "WIP_Sew_P2"],
            ),
            DepartmentConfig::new(
                "WIP Cutting & Print",
                "wipcutting@company.com",
                &["WIP_Cut_1", "WIP_Pri_1", "WIP_P1"],
            ),
            DepartmentConfig::new(
                "WIP Embroidery",
                "wipembroidery@company.com",
                &["WIP_Emb_1"],
            ),
            DepartmentConfig::new(
                "Fabric Department (PF_Active)",
                "fabric@company.com",
                &["PF_Active"],
            ),
            DepartmentConfig::new("HGBU Extra", "hgbu@company.com", &["HGBU_Extra"]),
            DepartmentConfig {
                name: "All Warehouses".to_string(),
                email: "management@company.com".to_string(),
                warehouses: Vec::new(),
                all_warehouses: true,
            },
        ];

        Self {
            warehouse_order: DEFAULT_WAREHOUSE_ORDER
                .iter()
                .map(|(name, rank)| (name.to_string(), *rank))
                .collect(),
            t_table: T_975_DF_1_TO_29.to_vec(),
            normal_multiplier: default_normal_multiplier(),
            bucket_bounds: DEFAULT_BUCKET_BOUNDS,
            departments,
            small_sample_policy: SmallSamplePolicy::default(),
            invalid_date_policy: InvalidDatePolicy::default(),
            report_top_n: default_report_top_n(),
            report_signature: default_report_signature(),
        }
    }
}

impl AnalysisConfig {
    /// 从 JSON 文件加载并校验
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&raw)
    }

    /// 从 JSON 文本加载并校验
    pub fn from_json_str(raw: &str) -> ConfigResult<Self> {
        let config: AnalysisConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// 配置校验
    ///
    /// # 规则
    /// - t 表恰好 29 项且全部为正
    /// - 分桶边界严格递增
    /// - 排序序号不重复
    /// - 部门引用的仓库必须在排序表中
    pub fn validate(&self) -> ConfigResult<()> {
        if self.t_table.len() != T_975_DF_1_TO_29.len() {
            return Err(ConfigError::InvalidValue {
                key: "t_table".to_string(),
                message: format!(
                    "需要 {} 项 (df 1..=29)，实际 {} 项",
                    T_975_DF_1_TO_29.len(),
                    self.t_table.len()
                ),
            });
        }
        if let Some(bad) = self.t_table.iter().find(|v| !v.is_finite() || **v <= 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "t_table".to_string(),
                message: format!("临界值必须为正数: {}", bad),
            });
        }

        if !self.normal_multiplier.is_finite() || self.normal_multiplier <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "normal_multiplier".to_string(),
                message: format!("必须为正数: {}", self.normal_multiplier),
            });
        }

        if self.bucket_bounds.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ConfigError::InvalidValue {
                key: "bucket_bounds".to_string(),
                message: format!("边界必须严格递增: {:?}", self.bucket_bounds),
            });
        }

        let mut seen_ranks = HashSet::new();
        for (warehouse, rank) in &self.warehouse_order {
            if !seen_ranks.insert(*rank) {
                return Err(ConfigError::InvalidValue {
                    key: "warehouse_order".to_string(),
                    message: format!("序号 {} 重复 (仓库 {})", rank, warehouse),
                });
            }
        }

        for department in &self.departments {
            for warehouse in &department.warehouses {
                if !self.warehouse_order.contains_key(warehouse) {
                    return Err(ConfigError::UnknownWarehouse {
                        department: department.name.clone(),
                        warehouse: warehouse.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.warehouse_order.len(), 18);
        assert_eq!(config.warehouse_order["PF_Active"], 1);
        assert_eq!(config.warehouse_order["HGBU_Extra"], 18);
        assert_eq!(config.departments.len(), 10);
        assert!(config
            .departments
            .iter()
            .any(|d| d.name == "All Warehouses" && d.all_warehouses));
    }

    #[test]
    fn test_t_table_reference_values() {
        // 标准 t 分布表抽查
        assert_eq!(T_975_DF_1_TO_29[0], 12.706);
        assert_eq!(T_975_DF_1_TO_29[3], 2.776);
        assert_eq!(T_975_DF_1_TO_29[9], 2.228);
        assert_eq!(T_975_DF_1_TO_29[28], 2.045);
    }

    #[test]
    fn test_json_round_trip_keeps_config() {
        let config = AnalysisConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let loaded = AnalysisConfig::from_json_str(&json).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "warehouse_order": {"A": 1, "B": 2},
            "t_table": [12.706, 4.303, 3.182, 2.776, 2.571, 2.447, 2.365, 2.306, 2.262,
                        2.228, 2.201, 2.179, 2.160, 2.145, 2.131, 2.120, 2.110, 2.101,
                        2.093, 2.086, 2.080, 2.074, 2.069, 2.064, 2.060, 2.056, 2.052,
                        2.048, 2.045],
            "small_sample_policy": "ALWAYS_CRITICAL"
        }"#;
        let config = AnalysisConfig::from_json_str(json).unwrap();
        assert_eq!(config.normal_multiplier, 1.96);
        assert_eq!(config.bucket_bounds, DEFAULT_BUCKET_BOUNDS);
        assert_eq!(config.small_sample_policy, SmallSamplePolicy::AlwaysCritical);
        assert_eq!(config.invalid_date_policy, InvalidDatePolicy::RejectRun);
        assert!(config.departments.is_empty());
    }

    #[test]
    fn test_validate_rejects_short_t_table() {
        let config = AnalysisConfig {
            t_table: vec![12.706],
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key, .. }) if key == "t_table"
        ));
    }

    #[test]
    fn test_validate_rejects_unordered_bounds() {
        let config = AnalysisConfig {
            bucket_bounds: [15, 30, 30, 90, 180],
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_rank() {
        let mut config = AnalysisConfig::default();
        config.warehouse_order.insert("New_WH".to_string(), 1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_department_with_unranked_warehouse() {
        let mut config = AnalysisConfig::default();
        config.departments[0].warehouses.push("Ghost_WH".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownWarehouse { warehouse, .. }) if warehouse == "Ghost_WH"
        ));
    }
}
