// ==========================================
// 仓库库龄分析系统 - 导出模块错误类型
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("导出目录不可用 ({path}): {message}")]
    DirectoryError { path: String, message: String },

    #[error("文件写入失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV 写入失败: {0}")]
    Csv(#[from] csv::Error),
}

/// Result 类型别名
pub type ExportResult<T> = Result<T, ExportError>;
