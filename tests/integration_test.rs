//! 集成測試

use chrono::NaiveDate;
use plannink::*;
use rust_decimal::Decimal;
use serde_json::json;

fn reference_record() -> RawRecord {
    // 參考情境：歷史 {ENE:200, FEB:250, MAR:300, ABR:280, MAY:220}，
    // 22 個工作日 → 平均 250、日消耗 ≈ 11.36
    json!({
        "CODIGO": "PRD-100",
        "DESCRIPCION": "Guantes de nitrilo talla M",
        "STOCK_FISICO": 500,
        "UNIDADES_POR_CAJA": 24,
        "STOCK_SEGURIDAD": 100,
        "HISTORICO_CONSUMOS": {
            "ENE_2024": 200, "FEB_2024": 250, "MAR_2024": 300,
            "ABR_2024": 280, "MAY_2024": 220
        }
    })
    .as_object()
    .unwrap()
    .clone()
}

fn service() -> PlanningService {
    PlanningService::new(
        PlanningConfig::new(),
        WorkCalendar::default(),
        NaiveDate::from_ymd_opt(2025, 2, 14).unwrap(),
    )
    .unwrap()
}

#[test]
fn test_end_to_end_reference_scenario() {
    let service = service();
    let outcome = service.recalculate(vec![reference_record()]).unwrap();
    assert_eq!(outcome.products.len(), 1);

    let product = service.product("PRD-100").unwrap();

    // 衍生參數
    assert_eq!(product.average_consumption, Decimal::from(250));
    assert_eq!(product.minimum_stock, Decimal::from(350));
    assert_eq!(product.reorder_point, Decimal::from(500));
    assert!(product.daily_consumption > Decimal::new(1136, 2));
    assert!(product.daily_consumption < Decimal::new(1137, 2));

    // 邊界情況：庫存 500 不小於再訂購點 500 → safe，絕不是 warning
    let status = ReorderCalculator::classify(
        product.total_stock,
        product.safety_stock,
        product.reorder_point,
    );
    assert_eq!(status, StockStatus::Safe);

    // 不變量：總庫存 = 實體 + 在途；最小庫存 = 合計消耗 + 安全庫存
    assert_eq!(
        product.total_stock,
        product.physical_stock + product.units_in_transit
    );
    assert_eq!(
        product.minimum_stock,
        product.total_consumption + product.safety_stock
    );

    // 預測序列完整且按月推進
    let projections = service.projections("PRD-100").unwrap();
    assert_eq!(projections.len(), 6);
    assert_eq!(projections[0].mes.label(), "FEB-2025");
    for pair in projections.windows(2) {
        assert!(pair[0].mes < pair[1].mes);
        // 期初鏈結：次期期初 = 前期消耗後庫存 + 前期訂購量
        assert_eq!(
            pair[1].stock_inicial,
            pair[0].stock_proyectado + pair[0].unidades_a_pedir
        );
    }
}

#[test]
fn test_transit_units_full_flow() {
    let service = service();
    service.recalculate(vec![reference_record()]).unwrap();

    let before = service.product("PRD-100").unwrap();
    let updated = service
        .apply_transit_units("PRD-100", Decimal::from(48))
        .unwrap();

    assert_eq!(updated.units_in_transit, Decimal::from(48));
    assert_eq!(updated.total_stock, before.total_stock + Decimal::from(48));
    assert_eq!(
        updated.total_stock,
        updated.physical_stock + updated.units_in_transit
    );

    // 零與負值被拒絕，不是靜默的 no-op
    assert!(service.apply_transit_units("PRD-100", Decimal::ZERO).is_err());
    assert!(service
        .apply_transit_units("PRD-100", Decimal::from(-5))
        .is_err());
    let unchanged = service.product("PRD-100").unwrap();
    assert_eq!(unchanged.units_in_transit, Decimal::from(48));
}

#[test]
fn test_transit_days_flag_persistence_across_operations() {
    let service = service();
    service.recalculate(vec![reference_record()]).unwrap();

    // 對索引 2 套用在途天數
    let updated = service.apply_transit_days("PRD-100", 5, Some(2)).unwrap();
    for (index, projection) in updated.projections.iter().enumerate() {
        assert_eq!(projection.dias_transito_aplicados, index == 2);
    }

    // 無關的在途單位數操作觸發整序列重建，旗標必須保留
    let after_units = service
        .apply_transit_units("PRD-100", Decimal::from(24))
        .unwrap();
    for (index, projection) in after_units.projections.iter().enumerate() {
        assert_eq!(
            projection.dias_transito_aplicados,
            index == 2,
            "索引 {index} 的旗標在重建後改變"
        );
    }

    // 超出上限（30）與非法索引被拒絕
    assert!(service.apply_transit_days("PRD-100", 31, None).is_err());
    assert!(service.apply_transit_days("PRD-100", 5, Some(99)).is_err());
}

#[test]
fn test_weekly_decomposition_from_generated_projections() {
    let service = service();
    service.recalculate(vec![reference_record()]).unwrap();

    let projections = service.projections("PRD-100").unwrap();
    let weekly = derive_weekly_from_monthly(&projections);

    // 每月正好 4 點
    assert_eq!(weekly.len(), projections.len() * 4);

    // 各月的週消耗為月消耗的四分之一
    let first = &projections[0];
    let quarter = first.consumo_mensual / Decimal::from(4);
    for point in &weekly[..4] {
        assert_eq!(point.consumo, quarter);
    }

    // 第一週由消耗後庫存回推到期初
    assert_eq!(
        weekly[0].stock,
        first.stock_proyectado + first.consumo_mensual
    );
    assert!(weekly.iter().all(|p| p.stock >= Decimal::ZERO));
}

#[test]
fn test_business_day_advancement() {
    let calendar = WorkCalendar::default();

    // 2024-01-05（週五）+ 3 個工作日 → 跳過週末 → 2024-01-10（週三）
    let friday = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
    assert_eq!(
        calendar.add_business_days(friday, 3),
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    );
}

#[test]
fn test_stockout_risk_bounds_on_generated_history() {
    let history = ConsumptionHistory::from_labeled(vec![
        ("ENE-2024", Decimal::from(200)),
        ("FEB-2024", Decimal::from(250)),
        ("MAR-2024", Decimal::from(300)),
        ("ABR-2024", Decimal::from(280)),
        ("MAY-2024", Decimal::from(220)),
    ])
    .unwrap();

    for stock in [0.0, 100.0, 250.0, 500.0, 2_000.0] {
        let risk = stats::stockout_risk_percent(stock, &history, 20);
        assert!((0.0..=100.0).contains(&risk), "risk({stock}) = {risk}");
    }

    // 少於 3 點 → 0
    let short = ConsumptionHistory::from_labeled(vec![("ENE-2024", Decimal::from(10))]).unwrap();
    assert_eq!(stats::stockout_risk_percent(100.0, &short, 20), 0.0);
}

#[test]
fn test_wire_format_round_trip() {
    let service = service();
    service.recalculate(vec![reference_record()]).unwrap();
    let product = service.product("PRD-100").unwrap();

    let json = serde_json::to_value(&product).unwrap();

    // 頂層大寫鍵
    assert_eq!(json["CODIGO"], "PRD-100");
    assert!(json.get("STOCK_TOTAL").is_some());
    assert!(json.get("PUNTO_REORDEN").is_some());
    assert!(json.get("DEFICIT").is_some());
    assert!(json.get("CAJAS_A_PEDIR").is_some());
    assert!(json.get("UNIDADES_A_PEDIR").is_some());
    assert!(json.get("FECHA_REPOSICION").is_some());
    assert!(json.get("DIAS_COBERTURA").is_some());
    assert_eq!(json["CONFIGURACION"]["DIAS_PUNTO_REORDEN"], 44);

    // 歷史消耗是月份鍵直接對數量的物件，且按時間順序
    assert!(json["HISTORICO_CONSUMOS"].get("ENE-2024").is_some());
    assert!(json["HISTORICO_CONSUMOS"].get("MAY-2024").is_some());

    // 預測記錄的小寫鍵
    let first = &json["PROYECCIONES"][0];
    assert!(first.get("mes").is_some());
    assert!(first.get("stock_proyectado").is_some());
    assert!(first.get("consumo_mensual").is_some());
    assert!(first.get("punto_reorden").is_some());
    assert!(first.get("deficit").is_some());
    assert!(first.get("cajas_a_pedir").is_some());
    assert!(first.get("alerta_stock").is_some());
    assert!(first.get("fecha_reposicion").is_some());

    // 往返解析
    let back: Product = serde_json::from_value(json).unwrap();
    assert_eq!(back.code, product.code);
    assert_eq!(back.projections.len(), product.projections.len());
}
