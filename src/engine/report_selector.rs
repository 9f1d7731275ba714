// ==========================================
// 仓库库龄分析系统 - 报告选取器
// ==========================================
// 输入: 部门有序仓库列表 + 当前筛选条件
// 输出: 非空仓库切片 / 命中行数 / 最久滞留 Top-N
// 红线:
//   - 无命中记录的仓库整体剔除，不输出空切片
//   - Top-N 在部门全部命中记录的并集上计算
//   - 库龄相同按拼接顺序（部门仓库顺序 → 输入顺序）
// ==========================================

use crate::domain::record::InventoryRecord;
use crate::domain::types::{ActiveFilter, SourceKind};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 单个仓库的命中记录
#[derive(Debug, Clone, PartialEq)]
pub struct WarehouseSlice<'a> {
    pub warehouse: String,
    /// 输入顺序
    pub records: Vec<&'a InventoryRecord>,
}

impl WarehouseSlice<'_> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Top-N 条目（报告正文使用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopItem {
    pub warehouse: String,
    pub source_kind: SourceKind,
    pub project: String,
    pub age_days: i64,
}

impl From<&InventoryRecord> for TopItem {
    fn from(record: &InventoryRecord) -> Self {
        Self {
            warehouse: record.warehouse.clone(),
            source_kind: record.source_kind,
            project: record.project.clone(),
            age_days: record.age_days,
        }
    }
}

/// 选取结果
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSelection<'a> {
    pub slices: Vec<WarehouseSlice<'a>>,
    /// 命中行数（不是数量合计）
    pub total_items: usize,
    pub top_items: Vec<TopItem>,
}

impl ReportSelection<'_> {
    pub fn warehouse_names(&self) -> Vec<String> {
        self.slices.iter().map(|s| s.warehouse.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

// ==========================================
// DepartmentReport - 部门报告数据（自持有）
// ==========================================
// 报告正文与附件名由 report 模块生成
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentReport {
    pub department: String,
    pub email: String,
    pub reference_date: NaiveDate,
    pub filter: ActiveFilter,
    /// 非空仓库（部门顺序）
    pub warehouses: Vec<String>,
    pub total_items: usize,
    pub top_items: Vec<TopItem>,
}

impl DepartmentReport {
    pub fn is_empty(&self) -> bool {
        self.warehouses.is_empty()
    }
}

/// 按库龄降序取前 n 条（稳定排序）
pub fn top_n_by_age<'a, I>(records: I, n: usize) -> Vec<&'a InventoryRecord>
where
    I: IntoIterator<Item = &'a InventoryRecord>,
{
    let mut sorted: Vec<&InventoryRecord> = records.into_iter().collect();
    sorted.sort_by(|a, b| b.age_days.cmp(&a.age_days));
    sorted.truncate(n);
    sorted
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportSelector;

impl ReportSelector {
    /// 按部门仓库列表选取
    ///
    /// # 参数
    /// - records: 全量标注记录（输入顺序）
    /// - warehouses: 部门有序仓库列表（重复项只取第一次）
    /// - filter: 当前筛选条件
    /// - top_n: Top 条目数
    pub fn select<'a>(
        &self,
        records: &'a [InventoryRecord],
        warehouses: &[String],
        filter: &ActiveFilter,
        top_n: usize,
    ) -> ReportSelection<'a> {
        let mut seen = HashSet::new();
        let slices: Vec<WarehouseSlice<'a>> = warehouses
            .iter()
            .filter(|warehouse| seen.insert(*warehouse))
            .map(|warehouse| WarehouseSlice {
                warehouse: warehouse.clone(),
                records: records
                    .iter()
                    .filter(|r| &r.warehouse == warehouse && r.matches(filter))
                    .collect(),
            })
            .filter(|slice| !slice.is_empty())
            .collect();

        let total_items = slices.iter().map(WarehouseSlice::len).sum();
        let top_items = top_n_by_age(slices.iter().flat_map(|s| s.records.iter().copied()), top_n)
            .into_iter()
            .map(TopItem::from)
            .collect();

        ReportSelection {
            slices,
            total_items,
            top_items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::SourceDetails;
    use crate::domain::types::AgeBucket;

    fn record(warehouse: &str, project: &str, age_days: i64, bucket: AgeBucket, is_critical: bool) -> InventoryRecord {
        InventoryRecord {
            row_number: 1,
            source_kind: SourceKind::General,
            warehouse: warehouse.to_string(),
            quantity: 1.0,
            last_movement_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            project: project.to_string(),
            details: SourceDetails::General {
                color: String::new(),
                size: String::new(),
                customer: String::new(),
            },
            age_days,
            age_bucket: bucket,
            is_critical,
        }
    }

    fn names(items: &[TopItem]) -> Vec<&str> {
        items.iter().map(|i| i.project.as_str()).collect()
    }

    #[test]
    fn test_empty_warehouse_is_excluded() {
        let records = vec![
            record("G_Active_1", "P1", 100, AgeBucket::Days91To180, true),
            record("G_Active_2", "P2", 5, AgeBucket::UpTo15, false),
        ];
        let department = vec!["G_Active_1".to_string(), "G_Active_2".to_string()];

        let selection = ReportSelector.select(&records, &department, &ActiveFilter::CriticalOnly, 3);

        assert_eq!(selection.slices.len(), 1);
        assert_eq!(selection.warehouse_names(), vec!["G_Active_1".to_string()]);
        assert_eq!(selection.total_items, 1);
    }

    #[test]
    fn test_top_items_span_all_warehouses() {
        let records = vec![
            record("WIP_Sew_1", "A", 50, AgeBucket::Days31To60, false),
            record("WIP_Sew_1", "B", 70, AgeBucket::Days61To90, false),
            record("WIP_Sew_2", "C", 300, AgeBucket::Over180, false),
            record("WIP_Sew_2", "D", 10, AgeBucket::UpTo15, false),
            record("WIP_Sew_P1", "E", 65, AgeBucket::Days61To90, false),
        ];
        let department: Vec<String> = ["WIP_Sew_1", "WIP_Sew_2", "WIP_Sew_P1", "WIP_Sew_P2"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let selection = ReportSelector.select(&records, &department, &ActiveFilter::all_buckets(), 3);

        assert_eq!(selection.slices.len(), 3);
        assert_eq!(selection.total_items, 5);
        assert_eq!(names(&selection.top_items), vec!["C", "B", "E"]);
    }

    #[test]
    fn test_ties_follow_department_then_input_order() {
        let records = vec![
            record("WIP_Sew_2", "late-first-input", 90, AgeBucket::Days61To90, false),
            record("WIP_Sew_1", "x", 90, AgeBucket::Days61To90, false),
            record("WIP_Sew_1", "y", 90, AgeBucket::Days61To90, false),
        ];
        let department = vec!["WIP_Sew_1".to_string(), "WIP_Sew_2".to_string()];

        let selection = ReportSelector.select(&records, &department, &ActiveFilter::all_buckets(), 2);

        assert_eq!(names(&selection.top_items), vec!["x", "y"]);
    }

    #[test]
    fn test_bucket_filter_and_duplicate_department_entries() {
        let records = vec![
            record("G_MD_1", "A", 10, AgeBucket::UpTo15, false),
            record("G_MD_1", "B", 200, AgeBucket::Over180, false),
        ];
        let department = vec!["G_MD_1".to_string(), "G_MD_1".to_string()];

        let selection = ReportSelector.select(
            &records,
            &department,
            &ActiveFilter::buckets([AgeBucket::Over180]),
            3,
        );

        assert_eq!(selection.slices.len(), 1);
        assert_eq!(selection.total_items, 1);
        assert_eq!(names(&selection.top_items), vec!["B"]);
    }

    #[test]
    fn test_no_matches_yields_empty_selection() {
        let records = vec![record("G_MD_1", "A", 10, AgeBucket::UpTo15, false)];
        let department = vec!["G_MD_1".to_string()];

        let selection = ReportSelector.select(&records, &department, &ActiveFilter::CriticalOnly, 3);

        assert!(selection.is_empty());
        assert_eq!(selection.total_items, 0);
        assert!(selection.top_items.is_empty());
    }
}
