// ==========================================
// 仓库库龄分析系统 - 引擎层
// ==========================================
// 职责: 库龄计算、分桶、仓库排序、异常阈值、汇总、报告选取
// 红线: 引擎不读文件，只消费归一化记录
// ==========================================

pub mod age;
pub mod aggregator;
pub mod bucket;
pub mod critical;
pub mod error;
pub mod pipeline;
pub mod report_selector;
pub mod warehouse_rank;

// 重导出核心引擎
pub use age::AgeCalculator;
pub use aggregator::Aggregator;
pub use bucket::Bucketizer;
pub use critical::{CriticalThresholdEngine, SampleStats, ThresholdTable};
pub use error::{EngineError, EngineResult};
pub use pipeline::{AnalysisPipeline, AnalysisSnapshot, SnapshotSummary};
pub use report_selector::{
    top_n_by_age, DepartmentReport, ReportSelection, ReportSelector, TopItem, WarehouseSlice,
};
pub use warehouse_rank::WarehouseRanker;
