// ==========================================
// 仓库库龄分析系统 - 命令行入口
// ==========================================
// 用法:
//   warehouse-aging <general_file> <fabric_file>
//       [--config PATH] [--date DD-MM-YYYY]
//       [--filter critical|days:<label>,<label>...]
//       [--department NAME] [--export-dir DIR] [--json]
// 说明: 报表输出到 stdout，日志输出到 stderr
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use std::path::PathBuf;
use tracing::info;
use warehouse_aging::importer::{parse_reference_date, ReferenceDateOrigin};
use warehouse_aging::{
    load_config, logging, resolve_reference_date, write_csv_tables, ActiveFilter, AgeBucket,
    AnalysisPipeline, AnalysisSnapshot, InventoryImporter, ReferenceDate, ReportComposer,
    TableExporter,
};
use warehouse_aging::engine::Bucketizer;

const USAGE: &str = "用法: warehouse-aging <general_file> <fabric_file> [--config PATH] [--date DD-MM-YYYY] [--filter critical|days:<label>,...] [--department NAME] [--export-dir DIR] [--json]";

#[derive(Debug, Default)]
struct CliArgs {
    general_file: PathBuf,
    fabric_file: PathBuf,
    config: Option<PathBuf>,
    date: Option<String>,
    filter: Option<String>,
    department: Option<String>,
    export_dir: Option<PathBuf>,
    json: bool,
}

fn parse_args<I: Iterator<Item = String>>(mut args: I) -> Result<CliArgs> {
    let mut positional = Vec::new();
    let mut parsed = CliArgs::default();

    while let Some(arg) = args.next() {
        let mut value = |name: &str| {
            args.next()
                .ok_or_else(|| anyhow!("{} 缺少参数值\n{}", name, USAGE))
        };
        match arg.as_str() {
            "--config" => parsed.config = Some(PathBuf::from(value("--config")?)),
            "--date" => parsed.date = Some(value("--date")?),
            "--filter" => parsed.filter = Some(value("--filter")?),
            "--department" => parsed.department = Some(value("--department")?),
            "--export-dir" => parsed.export_dir = Some(PathBuf::from(value("--export-dir")?)),
            "--json" => parsed.json = true,
            "-h" | "--help" => bail!("{}", USAGE),
            other if other.starts_with("--") => bail!("未知参数: {}\n{}", other, USAGE),
            _ => positional.push(arg),
        }
    }

    if positional.len() != 2 {
        bail!("需要两个输入文件\n{}", USAGE);
    }
    parsed.fabric_file = PathBuf::from(positional.pop().unwrap_or_default());
    parsed.general_file = PathBuf::from(positional.pop().unwrap_or_default());
    Ok(parsed)
}

/// 解析筛选条件: "critical" 或 "days:0 - 15 days,180+ days"
///
/// 分桶标签按配置边界解析
fn parse_filter(raw: Option<&str>, bucketizer: &Bucketizer) -> Result<ActiveFilter> {
    let Some(raw) = raw else {
        return Ok(ActiveFilter::all_buckets());
    };
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("critical") {
        return Ok(ActiveFilter::CriticalOnly);
    }

    let labels = raw
        .strip_prefix("days:")
        .ok_or_else(|| anyhow!("筛选条件格式错误: {}", raw))?;
    let buckets = labels
        .split(',')
        .map(|label| {
            bucketizer.from_label(label).ok_or_else(|| anyhow!("未知分桶: {}", label.trim()))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(ActiveFilter::buckets(buckets))
}

fn print_summary(snapshot: &AnalysisSnapshot, reference: &ReferenceDate) {
    println!("参考日期: {} ({})", reference.label(), reference.origin);
    println!("记录数: {}  拒绝: {}", snapshot.records().len(), snapshot.rejected().len());

    println!("\n== 仓库合计 ==");
    let ranks = snapshot.select_warehouse_quantity_ranks();
    for total in snapshot.select_warehouse_totals() {
        let marker = ranks
            .iter()
            .find(|r| r.warehouse == total.warehouse)
            .filter(|r| r.is_top3())
            .map(|r| format!("  #{}", r.rank))
            .unwrap_or_default();
        println!("{:<12} {:>12.2}{}", total.warehouse, total.quantity, marker);
    }

    println!("\n== 库龄透视 ==");
    let bucketizer = snapshot.bucketizer();
    let header: Vec<String> = AgeBucket::ALL
        .iter()
        .map(|b| format!("{:>14}", bucketizer.label(*b)))
        .collect();
    println!("{:<12}{}", "Warehouse", header.join(""));
    for row in snapshot.select_pivot() {
        let cells: Vec<String> = row.quantities.iter().map(|q| format!("{:>14.2}", q)).collect();
        println!("{:<12}{}", row.warehouse, cells.join(""));
    }

    println!("\n== 分桶合计 (GENERAL) ==");
    for total in snapshot.select_bucket_totals() {
        println!("{:<14} {:>12.2}", bucketizer.label(total.bucket), total.quantity);
    }

    println!("\n== 异常合计 ==");
    for total in snapshot.select_critical_totals() {
        println!("{:<12} {:>12.2}", total.warehouse, total.quantity);
    }
}

fn main() -> Result<()> {
    logging::init();
    info!(version = warehouse_aging::VERSION, "{}", warehouse_aging::APP_NAME);

    let args = parse_args(std::env::args().skip(1))?;
    let config = load_config(args.config.clone()).context("加载配置失败")?;
    let pipeline = AnalysisPipeline::new(config)?;
    let filter = parse_filter(args.filter.as_deref(), pipeline.bucketizer())?;

    let reference = match args.date.as_deref() {
        Some(raw) => ReferenceDate {
            date: parse_reference_date(raw)?,
            origin: ReferenceDateOrigin::Explicit,
        },
        None => resolve_reference_date(&args.fabric_file, Local::now().date_naive()),
    };

    let inventory = InventoryImporter::default()
        .load(&args.general_file, &args.fabric_file)
        .context("导入台账失败")?;

    let snapshot = pipeline.run(inventory.into_records(), reference.date)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot.to_summary())?);
    } else {
        print_summary(&snapshot, &reference);
    }

    if let Some(department) = args.department.as_deref() {
        let report = snapshot.department_report(department, &filter)?;
        let composed = ReportComposer::from_config(pipeline.config()).compose(&report);
        println!("\n== 部门报告 ==");
        println!("To: {}", composed.recipient);
        println!("Subject: {}", composed.subject);
        println!("Attachments: {}", composed.attachments.join(", "));
        println!("\n{}", composed.body);
    }

    if let Some(dir) = args.export_dir.as_deref() {
        let exporter = TableExporter::new(&snapshot);
        let mut tables = exporter.warehouse_tables(&filter);
        tables.extend(exporter.all_warehouses_table(&filter));
        let written = write_csv_tables(dir, &tables)?;
        println!("\n已导出 {} 个文件到 {}", written.len(), dir.display());
    }

    Ok(())
}
