// ==========================================
// 仓库库龄分析系统 - 配置错误类型
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败 ({path}): {message}")]
    ReadFailed { path: String, message: String },

    #[error("配置 JSON 解析失败: {0}")]
    ParseFailed(#[from] serde_json::Error),

    #[error("配置值错误 (key: {key}): {message}")]
    InvalidValue { key: String, message: String },

    #[error("部门 {department} 引用了未排序的仓库: {warehouse}")]
    UnknownWarehouse {
        department: String,
        warehouse: String,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
