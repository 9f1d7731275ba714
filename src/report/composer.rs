// ==========================================
// 仓库库龄分析系统 - 部门报告生成
// ==========================================
// 输入: DepartmentReport（引擎产出）
// 输出: 收件人 / 主题 / 正文 / 附件名
// 说明: 只生成文本，不负责发送
// ==========================================

use crate::config::AnalysisConfig;
use crate::domain::types::ActiveFilter;
use crate::engine::bucket::Bucketizer;
use crate::engine::report_selector::DepartmentReport;
use crate::importer::file_parser::SOURCE_DATE_FORMAT;
use serde::{Deserialize, Serialize};

/// 生成好的报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedReport {
    pub recipient: String,
    pub subject: String,
    pub body: String,
    /// 附件文件名（仓库顺序同报告）
    pub attachments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportComposer {
    signature: String,
    top_n: usize,
    bucketizer: Bucketizer,
}

impl ReportComposer {
    pub fn new(signature: impl Into<String>, top_n: usize) -> Self {
        Self {
            signature: signature.into(),
            top_n,
            bucketizer: Bucketizer::default(),
        }
    }

    /// 筛选描述使用的分桶边界
    pub fn with_bucketizer(mut self, bucketizer: Bucketizer) -> Self {
        self.bucketizer = bucketizer;
        self
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.report_signature.clone(), config.report_top_n)
            .with_bucketizer(Bucketizer::new(config.bucket_bounds))
    }

    pub fn subject(&self, report: &DepartmentReport) -> String {
        format!(
            "Warehouse Stock Report - {} - {}",
            report.department,
            date_label(report)
        )
    }

    pub fn attachment_names(&self, report: &DepartmentReport) -> Vec<String> {
        let date = date_label(report);
        let suffix = report.filter.file_suffix();
        report
            .warehouses
            .iter()
            .map(|warehouse| format!("{}_{}_{}.xlsx", warehouse, date, suffix))
            .collect()
    }

    pub fn body(&self, report: &DepartmentReport) -> String {
        let warehouses = if report.warehouses.is_empty() {
            "None".to_string()
        } else {
            report.warehouses.join(", ")
        };

        let mut lines = vec![
            format!("Dear {} Team,", report.department),
            String::new(),
            "Please find attached the Warehouse Stock Report for your review.".to_string(),
            String::new(),
            "Report Details:".to_string(),
            format!("- Report Date: {}", date_label(report)),
            format!("- Department: {}", report.department),
            format!("- Filter Applied: {}", filter_description(&report.filter, &self.bucketizer)),
            format!("- Number of Files: {}", report.warehouses.len()),
            format!("- Total Items: {}", report.total_items),
            format!("- Warehouses Included: {}", warehouses),
        ];

        if !report.top_items.is_empty() {
            let heading = match report.filter {
                ActiveFilter::CriticalOnly => "Most Critical Projects",
                ActiveFilter::Buckets(_) => "Most Late Projects",
            };
            lines.push(format!("Top {} {}:", self.top_n, heading));
            for (idx, item) in report.top_items.iter().enumerate() {
                lines.push(format!("  {}. {} - {} days", idx + 1, item.project, item.age_days));
            }
        }

        lines.extend([
            String::new(),
            "The attached Excel file(s) contain detailed information about stock items based on the applied filters."
                .to_string(),
            String::new(),
            "Please review the data and take necessary actions as required.".to_string(),
            String::new(),
            "Best regards,".to_string(),
            self.signature.clone(),
        ]);

        let mut body = lines.join("\n");
        body.push('\n');
        body
    }

    pub fn compose(&self, report: &DepartmentReport) -> ComposedReport {
        ComposedReport {
            recipient: report.email.clone(),
            subject: self.subject(report),
            body: self.body(report),
            attachments: self.attachment_names(report),
        }
    }
}

fn date_label(report: &DepartmentReport) -> String {
    report.reference_date.format(SOURCE_DATE_FORMAT).to_string()
}

/// 筛选条件描述
///
/// 选中任一超期分桶时统一描述为超过超期分界（默认 60 天）
pub fn filter_description(filter: &ActiveFilter, bucketizer: &Bucketizer) -> String {
    match filter {
        ActiveFilter::CriticalOnly => "Critical projects".to_string(),
        ActiveFilter::Buckets(buckets) if buckets.iter().any(|b| bucketizer.is_late(*b)) => {
            format!("Projects that stayed over {} days", bucketizer.late_cutoff())
        }
        ActiveFilter::Buckets(buckets) => {
            let labels: Vec<String> = buckets.iter().map(|b| bucketizer.label(*b)).collect();
            format!("Days Filter: {}", labels.join(", "))
        }
    }
}
