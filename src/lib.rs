// ==========================================
// 仓库库龄分析系统 - 核心库
// ==========================================
// 输入: GENERAL 库存台账 + FABRIC 面料台账 + 参考日期
// 输出: 库龄分桶、仓库异常阈值、汇总视图、部门报告
// 系统定位: 批处理分析（一次全量运行生成只读快照）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 配置层 - 分析配置
pub mod config;

// 导入层 - 外部数据
pub mod importer;

// 引擎层 - 分析规则
pub mod engine;

// 导出层 - CSV 输出
pub mod export;

// 报告层 - 部门报告文本
pub mod report;

// 日志系统
pub mod logging;

// 阶段耗时
pub mod perf;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ActiveFilter, AgeBucket, SourceKind, WarehouseScope};

// 领域实体
pub use domain::{
    AggregateSummary, BucketTotal, CriticalThreshold, InventoryRecord, PivotRow,
    RawInventoryRecord, RejectedRecord, WarehouseTotal,
};

// 配置
pub use config::{load_config, AnalysisConfig, DepartmentConfig};

// 导入
pub use importer::{resolve_reference_date, InventoryImporter, ReferenceDate};

// 引擎
pub use engine::{AnalysisPipeline, AnalysisSnapshot, DepartmentReport, EngineError};

// 导出 / 报告
pub use export::{write_csv_tables, ExportTable, TableExporter};
pub use report::{ComposedReport, ReportComposer};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "仓库库龄分析系统";
