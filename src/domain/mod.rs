// ==========================================
// 仓库库龄分析系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、汇总视图
// 红线: 不含文件读取逻辑,不含计算引擎逻辑
// ==========================================

pub mod record;
pub mod summary;
pub mod types;

// 重导出核心类型
pub use record::{InventoryRecord, RawInventoryRecord, RejectedRecord, SourceDetails};
pub use summary::{
    AggregateSummary, BucketTotal, CriticalThreshold, PivotRow, ThresholdMethod,
    WarehouseQuantityRank, WarehouseTotal,
};
pub use types::{ActiveFilter, AgeBucket, SourceKind, WarehouseScope};
