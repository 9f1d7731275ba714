// ==========================================
// 仓库库龄分析系统 - 分析流水线
// ==========================================
// 顺序: 仓库排序校验 → 日期/数量解析 → 库龄 → 分桶
//       → 阈值（全量）→ 异常标注 → 汇总
// 输出: 不可变快照 AnalysisSnapshot，所有查询只读快照
// 红线:
//   - 阈值只用未筛选的全量记录计算
//   - 同一输入重复运行得到相同的汇总与标注
// ==========================================

use crate::config::{AnalysisConfig, ConfigResult, DepartmentConfig, InvalidDatePolicy};
use crate::domain::record::{InventoryRecord, RawInventoryRecord, RejectedRecord, SourceDetails};
use crate::domain::summary::{
    AggregateSummary, BucketTotal, CriticalThreshold, PivotRow, WarehouseQuantityRank,
    WarehouseTotal,
};
use crate::domain::types::{ActiveFilter, SourceKind, WarehouseScope};
use crate::engine::age::AgeCalculator;
use crate::engine::aggregator::Aggregator;
use crate::engine::bucket::Bucketizer;
use crate::engine::critical::{CriticalThresholdEngine, ThresholdTable};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::report_selector::{DepartmentReport, ReportSelection, ReportSelector, TopItem};
use crate::engine::warehouse_rank::WarehouseRanker;
use crate::perf::StageTimer;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

// ==========================================
// AnalysisPipeline - 分析流水线
// ==========================================
#[derive(Debug, Clone)]
pub struct AnalysisPipeline {
    config: AnalysisConfig,
    ranker: WarehouseRanker,
    bucketizer: Bucketizer,
    threshold_engine: CriticalThresholdEngine,
}

impl AnalysisPipeline {
    /// 创建流水线（配置先校验）
    pub fn new(config: AnalysisConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            ranker: WarehouseRanker::new(config.warehouse_order.clone()),
            bucketizer: Bucketizer::new(config.bucket_bounds),
            threshold_engine: CriticalThresholdEngine::from_config(&config),
            config,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn bucketizer(&self) -> &Bucketizer {
        &self.bucketizer
    }

    /// 全量运行
    ///
    /// # 参数
    /// - raw_records: 两个数据源的归一化记录（输入顺序即展示顺序）
    /// - reference_date: 本次运行的参考日期
    #[instrument(skip(self, raw_records), fields(count = raw_records.len()))]
    pub fn run(
        &self,
        raw_records: Vec<RawInventoryRecord>,
        reference_date: NaiveDate,
    ) -> EngineResult<AnalysisSnapshot> {
        let run_id = Uuid::new_v4();
        info!(run_id = %run_id, "开始分析");

        // 1. 未排序仓库直接失败
        {
            let _timer = StageTimer::start("rank_check");
            for record in &raw_records {
                self.ranker.check_record(record)?;
            }
        }

        // 2. 解析 + 库龄 + 分桶
        let calculator = AgeCalculator::new(reference_date);
        let mut records = Vec::with_capacity(raw_records.len());
        let mut rejected = Vec::new();
        {
            let _timer = StageTimer::start("parse_and_bucket");
            for raw in raw_records {
                let last_movement_date = match calculator.parse_last_movement(&raw) {
                    Ok(date) => date,
                    Err(err) => match self.config.invalid_date_policy {
                        InvalidDatePolicy::RejectRun => return Err(err),
                        InvalidDatePolicy::RejectRecord => {
                            warn!(error = %err, "日期无法解析，记录被拒绝");
                            rejected.push(RejectedRecord {
                                source_kind: raw.source_kind(),
                                row_number: raw.row_number,
                                warehouse: raw.warehouse.clone(),
                                reason: err.to_string(),
                            });
                            continue;
                        }
                    },
                };
                let quantity = parse_quantity(&raw)?;
                let age_days = calculator.age_days(last_movement_date);

                records.push(InventoryRecord {
                    row_number: raw.row_number,
                    source_kind: raw.source_kind(),
                    warehouse: raw.warehouse,
                    quantity,
                    last_movement_date,
                    project: raw.project,
                    details: raw.details,
                    age_days,
                    age_bucket: self.bucketizer.bucket_for(age_days),
                    is_critical: false,
                });
            }
        }

        // 3. 阈值（全量记录）
        let thresholds = {
            let _timer = StageTimer::start("thresholds");
            self.threshold_engine.compute(
                records
                    .iter()
                    .map(|r| (r.source_kind, r.warehouse.as_str(), r.age_days)),
            )?
        };

        // 4. 异常标注
        for record in &mut records {
            if let Some(threshold) = thresholds.get(record.source_kind, &record.warehouse) {
                record.is_critical = self.threshold_engine.is_critical(threshold, record.age_days);
            }
        }

        // 5. 汇总
        let aggregator = Aggregator::new(self.ranker.clone());
        let (summary, quantity_ranks, warehouses) = {
            let _timer = StageTimer::start("aggregate");
            (
                aggregator.summarize(&records)?,
                aggregator.quantity_ranks(&records)?,
                aggregator.present_warehouses(&records)?,
            )
        };

        let critical_count = records.iter().filter(|r| r.is_critical).count();
        info!(
            run_id = %run_id,
            records = records.len(),
            rejected = rejected.len(),
            critical = critical_count,
            warehouses = warehouses.len(),
            "分析完成"
        );

        Ok(AnalysisSnapshot {
            run_id,
            reference_date,
            records,
            thresholds,
            summary,
            quantity_ranks,
            warehouses,
            rejected,
            departments: self.config.departments.clone(),
            report_top_n: self.config.report_top_n,
            bucketizer: self.bucketizer,
            aggregator,
        })
    }
}

/// 数量解析：GENERAL 取 Quantity 列（非负数），FABRIC 每行计 1
fn parse_quantity(raw: &RawInventoryRecord) -> EngineResult<f64> {
    if let SourceDetails::Fabric { .. } = raw.details {
        return Ok(1.0);
    }

    let value = raw.quantity_raw.as_deref().unwrap_or("");
    match value.trim().parse::<f64>() {
        Ok(quantity) if quantity.is_finite() && quantity >= 0.0 => Ok(quantity),
        _ => Err(EngineError::InvalidQuantity {
            source_kind: raw.source_kind(),
            row_number: raw.row_number,
            warehouse: raw.warehouse.clone(),
            value: value.to_string(),
        }),
    }
}

// ==========================================
// AnalysisSnapshot - 分析快照（只读）
// ==========================================
#[derive(Debug, Clone)]
pub struct AnalysisSnapshot {
    run_id: Uuid,
    reference_date: NaiveDate,
    records: Vec<InventoryRecord>,
    thresholds: ThresholdTable,
    summary: AggregateSummary,
    quantity_ranks: Vec<WarehouseQuantityRank>,
    /// 出现过的仓库（按排序表）
    warehouses: Vec<String>,
    rejected: Vec<RejectedRecord>,
    departments: Vec<DepartmentConfig>,
    report_top_n: usize,
    bucketizer: Bucketizer,
    aggregator: Aggregator,
}

impl AnalysisSnapshot {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    /// 全部标注记录（输入顺序）
    pub fn records(&self) -> &[InventoryRecord] {
        &self.records
    }

    pub fn thresholds(&self) -> &ThresholdTable {
        &self.thresholds
    }

    pub fn threshold(&self, source_kind: SourceKind, warehouse: &str) -> Option<&CriticalThreshold> {
        self.thresholds.get(source_kind, warehouse)
    }

    pub fn rejected(&self) -> &[RejectedRecord] {
        &self.rejected
    }

    pub fn summary(&self) -> &AggregateSummary {
        &self.summary
    }

    pub fn warehouses(&self) -> &[String] {
        &self.warehouses
    }

    /// 本次运行使用的分桶边界（展示标签由此推导）
    pub fn bucketizer(&self) -> &Bucketizer {
        &self.bucketizer
    }

    // ===== 汇总查询 =====

    pub fn select_warehouse_totals(&self) -> &[WarehouseTotal] {
        &self.summary.warehouse_totals
    }

    pub fn select_pivot(&self) -> &[PivotRow] {
        &self.summary.pivot
    }

    /// 全仓库分桶合计（仅 GENERAL）
    pub fn select_bucket_totals(&self) -> &[BucketTotal] {
        &self.summary.bucket_totals
    }

    pub fn select_bucket_totals_for(&self, scope: &WarehouseScope) -> Vec<BucketTotal> {
        self.aggregator.bucket_totals(&self.records, scope)
    }

    pub fn select_critical_totals(&self) -> &[WarehouseTotal] {
        &self.summary.critical_totals
    }

    pub fn select_warehouse_quantity_ranks(&self) -> &[WarehouseQuantityRank] {
        &self.quantity_ranks
    }

    // ===== 明细查询 =====

    /// 按仓库范围 + 筛选条件取记录（输入顺序）
    pub fn select_records(&self, scope: &WarehouseScope, filter: &ActiveFilter) -> Vec<&InventoryRecord> {
        self.records
            .iter()
            .filter(|r| scope.contains(&r.warehouse) && r.matches(filter))
            .collect()
    }

    /// 部门的有序仓库列表
    ///
    /// all_warehouses 部门展开为快照中出现过的全部仓库（按排序表）
    pub fn department_warehouses(&self, department: &str) -> EngineResult<Vec<String>> {
        let config = self.department(department)?;
        if config.all_warehouses {
            Ok(self.warehouses.clone())
        } else {
            Ok(config.warehouses.clone())
        }
    }

    pub fn select_department(
        &self,
        department: &str,
        filter: &ActiveFilter,
        top_n: usize,
    ) -> EngineResult<ReportSelection<'_>> {
        let warehouses = self.department_warehouses(department)?;
        Ok(ReportSelector.select(&self.records, &warehouses, filter, top_n))
    }

    /// 部门命中记录中库龄最长的 n 条
    pub fn select_top_n(&self, department: &str, filter: &ActiveFilter, n: usize) -> EngineResult<Vec<TopItem>> {
        Ok(self.select_department(department, filter, n)?.top_items)
    }

    /// 部门报告（Top 数量取配置 report_top_n）
    pub fn department_report(&self, department: &str, filter: &ActiveFilter) -> EngineResult<DepartmentReport> {
        let config = self.department(department)?;
        let selection = self.select_department(department, filter, self.report_top_n)?;
        Ok(DepartmentReport {
            department: config.name.clone(),
            email: config.email.clone(),
            reference_date: self.reference_date,
            filter: filter.clone(),
            warehouses: selection.warehouse_names(),
            total_items: selection.total_items,
            top_items: selection.top_items,
        })
    }

    fn department(&self, name: &str) -> EngineResult<&DepartmentConfig> {
        self.departments
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| EngineError::UnknownDepartment(name.to_string()))
    }

    /// 可序列化摘要（--json 输出）
    pub fn to_summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            run_id: self.run_id,
            reference_date: self.reference_date,
            record_count: self.records.len(),
            critical_count: self.records.iter().filter(|r| r.is_critical).count(),
            warehouses: self.warehouses.clone(),
            thresholds: self.thresholds.iter().cloned().collect(),
            summary: self.summary.clone(),
            quantity_ranks: self.quantity_ranks.clone(),
            rejected: self.rejected.clone(),
        }
    }
}

/// 快照摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub run_id: Uuid,
    pub reference_date: NaiveDate,
    pub record_count: usize,
    pub critical_count: usize,
    pub warehouses: Vec<String>,
    pub thresholds: Vec<CriticalThreshold>,
    pub summary: AggregateSummary,
    pub quantity_ranks: Vec<WarehouseQuantityRank>,
    pub rejected: Vec<RejectedRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::AgeBucket;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn reference() -> NaiveDate {
        ymd(2025, 3, 15)
    }

    fn date_for_age(age: i64) -> String {
        (reference() - chrono::Duration::days(age))
            .format("%d-%m-%Y")
            .to_string()
    }

    fn general(row: usize, warehouse: &str, quantity: &str, age: i64, project: &str) -> RawInventoryRecord {
        RawInventoryRecord {
            row_number: row,
            warehouse: warehouse.to_string(),
            quantity_raw: Some(quantity.to_string()),
            last_movement_raw: date_for_age(age),
            project: project.to_string(),
            details: SourceDetails::General {
                color: "Navy".to_string(),
                size: "M".to_string(),
                customer: "ACME".to_string(),
            },
        }
    }

    fn fabric(row: usize, warehouse: &str, age: i64, project: &str) -> RawInventoryRecord {
        RawInventoryRecord {
            row_number: row,
            warehouse: warehouse.to_string(),
            quantity_raw: None,
            last_movement_raw: date_for_age(age),
            project: project.to_string(),
            details: SourceDetails::Fabric {
                lot_no: format!("LOT-{}", row),
                style_color: "S-1".to_string(),
                weight: "180".to_string(),
            },
        }
    }

    fn pipeline() -> AnalysisPipeline {
        AnalysisPipeline::new(AnalysisConfig::default()).unwrap()
    }

    fn scenario() -> Vec<RawInventoryRecord> {
        vec![
            general(1, "WIP_Sew_1", "10", 10, "P-10"),
            general(2, "WIP_Sew_1", "5", 12, "P-12"),
            general(3, "WIP_Sew_1", "2", 400, "P-400"),
            general(4, "WIP_Sew_1", "8", 11, "P-11"),
            general(5, "WIP_Sew_1", "1", 9, "P-9"),
            general(6, "G_MD_1", "4", 30, "MD-30"),
            fabric(1, "PF_Active", 20, "F-20"),
            fabric(2, "PF_Active", 25, "F-25"),
            fabric(3, "PF_Active", 200, "F-200"),
        ]
    }

    #[test]
    fn test_only_outlier_is_critical() {
        let snapshot = pipeline().run(scenario(), reference()).unwrap();
        let critical: Vec<&str> = snapshot
            .records()
            .iter()
            .filter(|r| r.warehouse == "WIP_Sew_1" && r.is_critical)
            .map(|r| r.project.as_str())
            .collect();
        assert_eq!(critical, vec!["P-400"]);
    }

    #[test]
    fn test_age_and_bucket_annotation() {
        let snapshot = pipeline().run(scenario(), reference()).unwrap();
        let md = snapshot
            .records()
            .iter()
            .find(|r| r.project == "MD-30")
            .unwrap();
        assert_eq!(md.age_days, 30);
        assert_eq!(md.age_bucket, AgeBucket::Days16To30);
        // 单条样本：默认策略下不异常
        assert!(!md.is_critical);
        assert!(snapshot.threshold(SourceKind::General, "G_MD_1").unwrap().bound.is_none());
    }

    #[test]
    fn test_fabric_only_warehouse_counts_rows() {
        let snapshot = pipeline().run(scenario(), reference()).unwrap();

        let totals = snapshot.select_warehouse_totals();
        assert_eq!(totals[0].warehouse, "PF_Active");
        assert_eq!(totals[0].quantity, 3.0);
        assert_eq!(snapshot.select_pivot()[0].warehouse, "PF_Active");
        assert_eq!(snapshot.select_critical_totals()[0].warehouse, "PF_Active");

        // 全仓库分桶合计不含 FABRIC
        let over_180 = &snapshot.select_bucket_totals()[AgeBucket::Over180.index()];
        assert_eq!(over_180.quantity, 2.0);
    }

    #[test]
    fn test_run_is_idempotent() {
        let p = pipeline();
        let a = p.run(scenario(), reference()).unwrap();
        let b = p.run(scenario(), reference()).unwrap();

        assert_ne!(a.run_id(), b.run_id());
        assert_eq!(a.records(), b.records());
        assert_eq!(a.summary(), b.summary());
        assert_eq!(a.thresholds(), b.thresholds());
    }

    #[test]
    fn test_invalid_date_rejects_run_by_default() {
        let mut records = scenario();
        records[3].last_movement_raw = "2025/03/01".to_string();

        let err = pipeline().run(records, reference()).unwrap_err();
        assert!(matches!(err, EngineError::DateParseError { row_number: 4, .. }));
    }

    #[test]
    fn test_invalid_date_reject_record_policy() {
        let config = AnalysisConfig {
            invalid_date_policy: InvalidDatePolicy::RejectRecord,
            ..AnalysisConfig::default()
        };
        let mut records = scenario();
        records[5].last_movement_raw = "not a date".to_string();

        let snapshot = AnalysisPipeline::new(config).unwrap().run(records, reference()).unwrap();

        assert_eq!(snapshot.records().len(), 8);
        assert_eq!(snapshot.rejected().len(), 1);
        assert_eq!(snapshot.rejected()[0].warehouse, "G_MD_1");
        assert!(!snapshot.warehouses().contains(&"G_MD_1".to_string()));
    }

    #[test]
    fn test_unranked_warehouse_fails_fast() {
        let mut records = scenario();
        records.push(general(7, "Mystery_WH", "1", 3, "X"));

        let err = pipeline().run(records, reference()).unwrap_err();
        assert!(matches!(err, EngineError::UnrankedWarehouseError { .. }));
    }

    #[test]
    fn test_invalid_quantity() {
        let mut records = scenario();
        records[0].quantity_raw = Some("-3".to_string());

        let err = pipeline().run(records, reference()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidQuantity { row_number: 1, .. }));
    }

    #[test]
    fn test_department_report_and_top_n() {
        let snapshot = pipeline().run(scenario(), reference()).unwrap();

        let report = snapshot
            .department_report("WIP Sewing", &ActiveFilter::all_buckets())
            .unwrap();
        assert_eq!(report.warehouses, vec!["WIP_Sew_1".to_string()]);
        assert_eq!(report.total_items, 5);
        let top: Vec<&str> = report.top_items.iter().map(|t| t.project.as_str()).collect();
        assert_eq!(top, vec!["P-400", "P-12", "P-11"]);

        let top_one = snapshot
            .select_top_n("WIP Sewing", &ActiveFilter::CriticalOnly, 1)
            .unwrap();
        assert_eq!(top_one.len(), 1);
        assert_eq!(top_one[0].age_days, 400);
    }

    #[test]
    fn test_all_warehouses_department_uses_present_warehouses() {
        let snapshot = pipeline().run(scenario(), reference()).unwrap();
        let warehouses = snapshot.department_warehouses("All Warehouses").unwrap();
        assert_eq!(warehouses, vec!["PF_Active", "WIP_Sew_1", "G_MD_1"]);
    }

    #[test]
    fn test_unknown_department() {
        let snapshot = pipeline().run(scenario(), reference()).unwrap();
        assert!(matches!(
            snapshot.department_report("Nobody", &ActiveFilter::CriticalOnly),
            Err(EngineError::UnknownDepartment(_))
        ));
    }

    #[test]
    fn test_select_records_by_scope() {
        let snapshot = pipeline().run(scenario(), reference()).unwrap();
        let fabric = snapshot.select_records(&WarehouseScope::warehouse("PF_Active"), &ActiveFilter::all_buckets());
        assert_eq!(fabric.len(), 3);

        let late = snapshot.select_records(&WarehouseScope::All, &ActiveFilter::buckets([AgeBucket::Over180]));
        let projects: Vec<&str> = late.iter().map(|r| r.project.as_str()).collect();
        assert_eq!(projects, vec!["P-400", "F-200"]);
    }

    #[test]
    fn test_summary_serializes() {
        let snapshot = pipeline().run(scenario(), reference()).unwrap();
        let json = serde_json::to_string(&snapshot.to_summary()).unwrap();
        assert!(json.contains("\"record_count\":9"));
    }

    #[test]
    fn test_custom_bucket_bounds_drive_labels() {
        let config = AnalysisConfig {
            bucket_bounds: [7, 14, 30, 60, 120],
            ..AnalysisConfig::default()
        };
        let snapshot = AnalysisPipeline::new(config).unwrap().run(scenario(), reference()).unwrap();

        let p9 = snapshot.records().iter().find(|r| r.project == "P-9").unwrap();
        assert_eq!(p9.age_bucket, AgeBucket::Days16To30);
        assert_eq!(snapshot.bucketizer().label(p9.age_bucket), "8 - 14 days");
        assert_eq!(snapshot.bucketizer().late_cutoff(), 30);
    }
}
