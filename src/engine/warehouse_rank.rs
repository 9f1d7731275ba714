// ==========================================
// 仓库库龄分析系统 - 仓库排序
// ==========================================
// 职责: 仓库 → 展示序号；只用于展示/导出排序，不参与分组和统计
// 红线: 未排序仓库是配置错误，不得默认排在首位或末位
// ==========================================

use crate::domain::record::RawInventoryRecord;
use crate::engine::error::{EngineError, EngineResult};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseRanker {
    ranks: BTreeMap<String, u32>,
}

impl WarehouseRanker {
    pub fn new(ranks: BTreeMap<String, u32>) -> Self {
        Self { ranks }
    }

    pub fn rank(&self, warehouse: &str) -> Option<u32> {
        self.ranks.get(warehouse).copied()
    }

    fn require_rank(&self, warehouse: &str, location: impl FnOnce() -> String) -> EngineResult<u32> {
        self.rank(warehouse)
            .ok_or_else(|| EngineError::UnrankedWarehouseError {
                warehouse: warehouse.to_string(),
                location: location(),
            })
    }

    /// 校验记录仓库已排序（带行号上下文）
    pub fn check_record(&self, record: &RawInventoryRecord) -> EngineResult<u32> {
        self.require_rank(&record.warehouse, || {
            format!("{} 行 {}", record.source_kind(), record.row_number)
        })
    }

    /// 按序号排序仓库名（去重）
    pub fn order<I, S>(&self, warehouses: I) -> EngineResult<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ranked = BTreeMap::new();
        for warehouse in warehouses {
            let warehouse = warehouse.as_ref();
            let rank = self.require_rank(warehouse, || "排序".to_string())?;
            ranked.insert(rank, warehouse.to_string());
        }
        Ok(ranked.into_values().collect())
    }
}
