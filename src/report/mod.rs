// ==========================================
// 仓库库龄分析系统 - 报告层
// ==========================================
// 职责: 部门报告 → 邮件主题/正文/附件名（不含发送）
// ==========================================

pub mod composer;

pub use composer::{filter_description, ComposedReport, ReportComposer};
