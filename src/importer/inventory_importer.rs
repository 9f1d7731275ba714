// ==========================================
// 仓库库龄分析系统 - 库存台账导入器
// ==========================================
// 职责: 整合导入流程
// 流程: 解析 → 结构校验 → 字段映射
// ==========================================

use crate::domain::record::RawInventoryRecord;
use crate::domain::types::SourceKind;
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::{FileParser, RawTable, UniversalFileParser};
use std::path::Path;
use tracing::{info, instrument};

/// 两个数据源的归一化结果
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoadedInventory {
    pub general: Vec<RawInventoryRecord>,
    pub fabric: Vec<RawInventoryRecord>,
}

impl LoadedInventory {
    pub fn len(&self) -> usize {
        self.general.len() + self.fabric.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 合并为单一序列（通用台账在前，面料台账在后）
    pub fn into_records(self) -> Vec<RawInventoryRecord> {
        let mut records = self.general;
        records.extend(self.fabric);
        records
    }
}

// ==========================================
// InventoryImporter - 导入器
// ==========================================
pub struct InventoryImporter {
    file_parser: Box<dyn FileParser>,
    field_mapper: FieldMapper,
}

impl Default for InventoryImporter {
    fn default() -> Self {
        Self::new(Box::new(UniversalFileParser))
    }
}

impl InventoryImporter {
    pub fn new(file_parser: Box<dyn FileParser>) -> Self {
        Self {
            file_parser,
            field_mapper: FieldMapper,
        }
    }

    /// 从两个文件导入
    ///
    /// # 参数
    /// - general_path: 通用库存台账
    /// - fabric_path: 面料库存台账
    #[instrument(skip(self, general_path, fabric_path))]
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        general_path: P,
        fabric_path: Q,
    ) -> ImportResult<LoadedInventory> {
        let general_table = self.file_parser.parse(general_path.as_ref())?;
        let fabric_table = self.file_parser.parse(fabric_path.as_ref())?;

        let loaded = self.load_tables(&general_table, &fabric_table)?;
        info!(
            general = loaded.general.len(),
            fabric = loaded.fabric.len(),
            "库存台账导入完成"
        );
        Ok(loaded)
    }

    /// 从已解析的表导入（文件读取由外部完成时使用）
    pub fn load_tables(
        &self,
        general_table: &RawTable,
        fabric_table: &RawTable,
    ) -> ImportResult<LoadedInventory> {
        Ok(LoadedInventory {
            general: self
                .field_mapper
                .normalize(general_table, SourceKind::General)?,
            fabric: self
                .field_mapper
                .normalize(fabric_table, SourceKind::Fabric)?,
        })
    }
}
