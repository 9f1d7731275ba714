// ==========================================
// 仓库库龄分析系统 - 配置层
// ==========================================
// 职责: 分析配置的定义、加载、校验
// 加载顺序: 显式路径 → 环境变量 → 用户配置目录 → 内置默认值
// ==========================================

pub mod analysis_config;
pub mod error;

use std::path::PathBuf;
use tracing::{info, warn};

// 重导出核心配置类型
pub use analysis_config::{
    AnalysisConfig, DepartmentConfig, InvalidDatePolicy, SmallSamplePolicy,
    DEFAULT_BUCKET_BOUNDS, T_975_DF_1_TO_29,
};
pub use error::{ConfigError, ConfigResult};

/// 配置文件路径环境变量
pub const CONFIG_PATH_ENV: &str = "WAREHOUSE_AGING_CONFIG";

/// 用户配置目录下的默认配置文件
///
/// # 返回
/// - Some(path): <config_dir>/warehouse-aging/analysis_config.json
/// - None: 平台无配置目录
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("warehouse-aging").join("analysis_config.json"))
}

/// 解析最终使用的配置
///
/// # 参数
/// - explicit_path: 命令行显式指定的路径（优先级最高，文件必须存在）
///
/// # 说明
/// - 环境变量指定的文件同样必须存在
/// - 用户配置目录下的文件可选，不存在时使用内置默认值
pub fn load_config(explicit_path: Option<PathBuf>) -> ConfigResult<AnalysisConfig> {
    if let Some(path) = explicit_path {
        info!(path = %path.display(), "使用命令行指定的配置文件");
        return AnalysisConfig::from_json_file(path);
    }

    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            info!(path = %trimmed, "使用环境变量指定的配置文件");
            return AnalysisConfig::from_json_file(trimmed);
        }
    }

    if let Some(path) = default_config_path() {
        if path.exists() {
            info!(path = %path.display(), "使用用户配置目录中的配置文件");
            return AnalysisConfig::from_json_file(path);
        }
    }

    warn!("未找到配置文件，使用内置默认配置");
    Ok(AnalysisConfig::default())
}
