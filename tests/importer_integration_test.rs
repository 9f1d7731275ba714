// ==========================================
// InventoryImporter 集成测试
// ==========================================
// 测试目标: 文件 → 归一化记录 → 参考日期
// ==========================================


use warehouse_aging::domain::SourceDetails;
use warehouse_aging::importer::{
    resolve_reference_date, ImportError, InventoryImporter, ReferenceDateOrigin,
};
use warehouse_aging::{logging, SourceKind};
use test_helpers::*;

#[test]
fn test_import_both_sources() {
    logging::init_test();
    let (_dir, general_path, fabric_path) = write_standard_scenario();

    let loaded = InventoryImporter::default()
        .load(&general_path, &fabric_path)
        .unwrap();

    assert_eq!(loaded.general.len(), 8);
    assert_eq!(loaded.fabric.len(), 3);
    assert_eq!(loaded.len(), 11);

    let first = &loaded.general[0];
    assert_eq!(first.row_number, 1);
    assert_eq!(first.warehouse, "WIP_Sew_1");
    assert_eq!(first.quantity_raw.as_deref(), Some("10"));
    assert_eq!(first.source_kind(), SourceKind::General);

    let fabric = &loaded.fabric[2];
    assert_eq!(fabric.warehouse, "PF_Active");
    assert!(fabric.quantity_raw.is_none());
    match &fabric.details {
        SourceDetails::Fabric { lot_no, weight, .. } => {
            assert_eq!(lot_no, "L3");
            assert_eq!(weight, "180");
        }
        other => panic!("expected fabric details, got {:?}", other),
    }

    // GENERAL 在前，FABRIC 在后
    let records = loaded.into_records();
    assert_eq!(records.len(), 11);
    assert_eq!(records[8].source_kind(), SourceKind::Fabric);
}

#[test]
fn test_missing_column_is_schema_error() {
    logging::init_test();
    let (dir, general_path, _) = write_standard_scenario();
    let broken_fabric = write_csv(
        &dir,
        "Fabric stock 15 03 2025 broken.csv",
        "Ware House,Project,Lot No",
        &["PF_Active,F-1,L1".to_string()],
    );

    let err = InventoryImporter::default()
        .load(&general_path, &broken_fabric)
        .unwrap_err();

    match err {
        ImportError::SchemaError { source_kind, column } => {
            assert_eq!(source_kind, SourceKind::Fabric);
            assert_eq!(column, "last transaction date");
        }
        other => panic!("expected schema error, got {:?}", other),
    }
}

#[test]
fn test_missing_file() {
    let (dir, general_path, _) = write_standard_scenario();
    let missing = dir.path().join("nope.csv");

    let err = InventoryImporter::default()
        .load(&general_path, &missing)
        .unwrap_err();
    assert!(matches!(err, ImportError::FileNotFound(_)));
}

#[test]
fn test_reference_date_from_fabric_file_name() {
    let (_dir, _, fabric_path) = write_standard_scenario();
    let fallback = chrono::NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();

    let resolved = resolve_reference_date(&fabric_path, fallback);
    assert_eq!(resolved.date, reference_date());
    assert_eq!(resolved.origin, ReferenceDateOrigin::Filename);
    assert_eq!(resolved.label(), "15-03-2025");

    let fallback_resolved = resolve_reference_date(std::path::Path::new("fabric.csv"), fallback);
    assert_eq!(fallback_resolved.date, fallback);
    assert_eq!(fallback_resolved.origin, ReferenceDateOrigin::Fallback);
}

#[test]
fn test_import_excel_workbooks() {
    logging::init_test();
    let general_path = fixture_path("General stock.xlsx");
    let fabric_path = fixture_path("Fabric stock 01 03 2025.xlsx");

    let loaded = InventoryImporter::default()
        .load(&general_path, &fabric_path)
        .unwrap();

    assert_eq!(loaded.general.len(), 2);
    assert_eq!(loaded.fabric.len(), 3);

    // 日期单元格统一转为 DD-MM-YYYY，数值单元格去掉多余小数
    assert_eq!(loaded.general[0].last_movement_raw, "01-03-2025");
    assert_eq!(loaded.general[0].quantity_raw.as_deref(), Some("12"));
    assert_eq!(loaded.fabric[1].last_movement_raw, "01-01-2025");
    assert_eq!(loaded.fabric[2].last_movement_raw, "15-02-2025");

    let fallback = chrono::NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
    let resolved = resolve_reference_date(&fabric_path, fallback);
    assert_eq!(resolved.origin, ReferenceDateOrigin::Filename);
    assert_eq!(resolved.label(), "01-03-2025");
}
