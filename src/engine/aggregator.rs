// ==========================================
// 仓库库龄分析系统 - 汇总器
// ==========================================
// 输出: 仓库合计 / 仓库×分桶透视 / 分桶合计 / 异常合计
// 红线: 只读全量重算，输出按仓库排序表排列
// ==========================================

use crate::domain::record::InventoryRecord;
use crate::domain::summary::{
    AggregateSummary, BucketTotal, PivotRow, WarehouseQuantityRank, WarehouseTotal,
};
use crate::domain::types::{AgeBucket, SourceKind, WarehouseScope};
use crate::engine::error::EngineResult;
use crate::engine::warehouse_rank::WarehouseRanker;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::instrument;

#[derive(Debug, Clone)]
pub struct Aggregator {
    ranker: WarehouseRanker,
}

impl Aggregator {
    pub fn new(ranker: WarehouseRanker) -> Self {
        Self { ranker }
    }

    /// 一次性生成四个汇总视图
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub fn summarize(&self, records: &[InventoryRecord]) -> EngineResult<AggregateSummary> {
        Ok(AggregateSummary {
            warehouse_totals: self.warehouse_totals(records)?,
            pivot: self.pivot(records)?,
            bucket_totals: self.bucket_totals(records, &WarehouseScope::All),
            critical_totals: self.critical_totals(records)?,
        })
    }

    /// 出现过的仓库（按排序表）
    pub fn present_warehouses(&self, records: &[InventoryRecord]) -> EngineResult<Vec<String>> {
        self.ranker.order(records.iter().map(|r| r.warehouse.as_str()))
    }

    /// 仓库合计：两个数据源合并，FABRIC 每行计 1
    pub fn warehouse_totals(&self, records: &[InventoryRecord]) -> EngineResult<Vec<WarehouseTotal>> {
        self.sum_by_warehouse(records, |_| true)
    }

    /// 异常合计：仅 is_critical 记录，两个数据源合并；无异常的仓库补 0
    pub fn critical_totals(&self, records: &[InventoryRecord]) -> EngineResult<Vec<WarehouseTotal>> {
        self.sum_by_warehouse(records, |r| r.is_critical)
    }

    /// 透视表：仓库 × 六个分桶，缺失组合补 0
    pub fn pivot(&self, records: &[InventoryRecord]) -> EngineResult<Vec<PivotRow>> {
        let mut rows: HashMap<&str, PivotRow> = HashMap::new();
        for record in records {
            rows.entry(record.warehouse.as_str())
                .or_insert_with(|| PivotRow::new(record.warehouse.clone()))
                .add(record.age_bucket, record.quantity);
        }

        Ok(self
            .present_warehouses(records)?
            .into_iter()
            .filter_map(|warehouse| rows.remove(warehouse.as_str()))
            .collect())
    }

    /// 分桶合计（六个分桶全部输出）
    ///
    /// # 口径
    /// - WarehouseScope::All: 仅统计 GENERAL 数据源
    /// - WarehouseScope::Warehouse: 统计该仓库全部记录（不区分数据源）
    pub fn bucket_totals(&self, records: &[InventoryRecord], scope: &WarehouseScope) -> Vec<BucketTotal> {
        let mut totals = [0.0f64; 6];
        for record in records {
            let included = match scope {
                WarehouseScope::All => record.source_kind == SourceKind::General,
                WarehouseScope::Warehouse(name) => &record.warehouse == name,
            };
            if included {
                totals[record.age_bucket.index()] += record.quantity;
            }
        }

        AgeBucket::ALL
            .into_iter()
            .map(|bucket| BucketTotal {
                bucket,
                quantity: totals[bucket.index()],
            })
            .collect()
    }

    /// 仓库按数量降序排名（数量相同按排序表先后）
    pub fn quantity_ranks(&self, records: &[InventoryRecord]) -> EngineResult<Vec<WarehouseQuantityRank>> {
        let mut totals = self.warehouse_totals(records)?;
        // 稳定排序，保持排序表顺序作为次序
        totals.sort_by(|a, b| b.quantity.partial_cmp(&a.quantity).unwrap_or(Ordering::Equal));

        Ok(totals
            .into_iter()
            .enumerate()
            .map(|(idx, total)| WarehouseQuantityRank {
                warehouse: total.warehouse,
                quantity: total.quantity,
                rank: idx + 1,
            })
            .collect())
    }

    fn sum_by_warehouse<F>(&self, records: &[InventoryRecord], include: F) -> EngineResult<Vec<WarehouseTotal>>
    where
        F: Fn(&InventoryRecord) -> bool,
    {
        let mut sums: HashMap<&str, f64> = HashMap::new();
        for record in records {
            let entry = sums.entry(record.warehouse.as_str()).or_insert(0.0);
            if include(record) {
                *entry += record.quantity;
            }
        }

        Ok(self
            .present_warehouses(records)?
            .into_iter()
            .map(|warehouse| {
                let quantity = sums.get(warehouse.as_str()).copied().unwrap_or(0.0);
                WarehouseTotal { warehouse, quantity }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::domain::record::SourceDetails;
    use chrono::NaiveDate;

    fn aggregator() -> Aggregator {
        Aggregator::new(WarehouseRanker::new(AnalysisConfig::default().warehouse_order))
    }

    fn record(
        source_kind: SourceKind,
        warehouse: &str,
        quantity: f64,
        age_days: i64,
        bucket: AgeBucket,
        is_critical: bool,
    ) -> InventoryRecord {
        let details = match source_kind {
            SourceKind::General => SourceDetails::General {
                color: String::new(),
                size: String::new(),
                customer: String::new(),
            },
            SourceKind::Fabric => SourceDetails::Fabric {
                lot_no: String::new(),
                style_color: String::new(),
                weight: String::new(),
            },
        };
        InventoryRecord {
            row_number: 1,
            source_kind,
            warehouse: warehouse.to_string(),
            quantity,
            last_movement_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            project: "P".to_string(),
            details,
            age_days,
            age_bucket: bucket,
            is_critical,
        }
    }

    fn sample() -> Vec<InventoryRecord> {
        vec![
            record(SourceKind::General, "G_MD_1", 5.0, 10, AgeBucket::UpTo15, false),
            record(SourceKind::General, "WIP_Sew_1", 7.0, 200, AgeBucket::Over180, true),
            record(SourceKind::General, "G_MD_1", 3.0, 45, AgeBucket::Days31To60, true),
            record(SourceKind::Fabric, "PF_Active", 1.0, 20, AgeBucket::Days16To30, false),
            record(SourceKind::Fabric, "PF_Active", 1.0, 400, AgeBucket::Over180, true),
        ]
    }

    #[test]
    fn test_warehouse_totals_are_rank_ordered_and_include_fabric() {
        let totals = aggregator().warehouse_totals(&sample()).unwrap();
        let names: Vec<&str> = totals.iter().map(|t| t.warehouse.as_str()).collect();
        assert_eq!(names, vec!["PF_Active", "WIP_Sew_1", "G_MD_1"]);
        assert_eq!(totals[0].quantity, 2.0);
        assert_eq!(totals[2].quantity, 8.0);
    }

    #[test]
    fn test_pivot_rows_reconcile_with_totals() {
        let agg = aggregator();
        let records = sample();
        let totals = agg.warehouse_totals(&records).unwrap();
        let pivot = agg.pivot(&records).unwrap();

        assert_eq!(pivot.len(), totals.len());
        for (row, total) in pivot.iter().zip(totals.iter()) {
            assert_eq!(row.warehouse, total.warehouse);
            assert_eq!(row.total(), total.quantity);
        }
        assert_eq!(pivot[2].get(AgeBucket::Days31To60), 3.0);
        assert_eq!(pivot[2].get(AgeBucket::Days61To90), 0.0);
    }

    #[test]
    fn test_bucket_totals_all_scope_is_general_only() {
        let totals = aggregator().bucket_totals(&sample(), &WarehouseScope::All);
        assert_eq!(totals.len(), 6);
        assert_eq!(totals[AgeBucket::Over180.index()].quantity, 7.0);
        assert_eq!(totals[AgeBucket::Days16To30.index()].quantity, 0.0);
    }

    #[test]
    fn test_bucket_totals_for_fabric_warehouse() {
        let totals = aggregator().bucket_totals(&sample(), &WarehouseScope::warehouse("PF_Active"));
        assert_eq!(totals[AgeBucket::Days16To30.index()].quantity, 1.0);
        assert_eq!(totals[AgeBucket::Over180.index()].quantity, 1.0);
    }

    #[test]
    fn test_critical_totals_never_exceed_warehouse_totals() {
        let agg = aggregator();
        let records = sample();
        let totals = agg.warehouse_totals(&records).unwrap();
        let critical = agg.critical_totals(&records).unwrap();

        assert_eq!(critical.len(), totals.len());
        for (c, t) in critical.iter().zip(totals.iter()) {
            assert_eq!(c.warehouse, t.warehouse);
            assert!(c.quantity <= t.quantity);
        }
        // WIP_Sew_1 全部异常
        assert_eq!(critical[1].quantity, totals[1].quantity);
        assert_eq!(critical[0].quantity, 1.0);
    }

    #[test]
    fn test_quantity_ranks() {
        let ranks = aggregator().quantity_ranks(&sample()).unwrap();
        let names: Vec<&str> = ranks.iter().map(|r| r.warehouse.as_str()).collect();
        assert_eq!(names, vec!["G_MD_1", "WIP_Sew_1", "PF_Active"]);
        assert!(ranks.iter().all(|r| r.is_top3()));
    }

    #[test]
    fn test_empty_records() {
        let agg = aggregator();
        let summary = agg.summarize(&[]).unwrap();
        assert!(summary.warehouse_totals.is_empty());
        assert!(summary.pivot.is_empty());
        assert_eq!(summary.bucket_totals.len(), 6);
        assert!(summary.critical_totals.is_empty());
    }
}
