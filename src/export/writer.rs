// ==========================================
// 仓库库龄分析系统 - CSV 写出
// ==========================================

use crate::export::error::{ExportError, ExportResult};
use crate::export::table::ExportTable;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// 将导出表写入目录（目录不存在时创建）
///
/// # 返回
/// 写出的文件路径（与输入顺序一致）
#[instrument(skip(tables), fields(dir = %dir.display(), count = tables.len()))]
pub fn write_csv_tables(dir: &Path, tables: &[ExportTable]) -> ExportResult<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).map_err(|e| ExportError::DirectoryError {
        path: dir.display().to_string(),
        message: e.to_string(),
    })?;

    let mut written = Vec::with_capacity(tables.len());
    for table in tables {
        let path = dir.join(&table.file_name);
        let mut wtr = csv::WriterBuilder::new().has_headers(true).from_path(&path)?;
        wtr.write_record(&table.headers)?;
        for row in &table.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;

        debug!(file = %path.display(), rows = table.len(), "导出表已写出");
        written.push(path);
    }

    info!(files = written.len(), "导出完成");
    Ok(written)
}
