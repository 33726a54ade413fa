//! 計算服務層
//!
//! 對外的四個邏輯操作：取得預測、批次重算、套用在途單位數、
//! 套用在途天數。傳輸層（HTTP 等）由呼叫端自理，這裡不做 I/O。

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};
use std::time::Instant;

use chrono::NaiveDate;
use rayon::prelude::*;
use rust_decimal::Decimal;

use plannink_cache::{DirtyReason, DirtyTracker};
use plannink_calc::{
    CalcOutcome, IntegrityWarning, OrderResolver, ProjectionGenerator, TransitAdjuster,
};
use plannink_core::{PlanningConfig, PlanningError, Product, Projection, WorkCalendar};

use crate::ingest::{Normalizer, RawRecord};

/// 計算服務
///
/// 產品集以讀寫鎖保護：每個產品的變更操作經由寫鎖序列化，
/// 避免同一產品上並發的在途操作互相覆蓋。
pub struct PlanningService {
    products: RwLock<HashMap<String, Product>>,
    tracker: Mutex<DirtyTracker>,
    config: PlanningConfig,
    calendar: WorkCalendar,
    start_date: NaiveDate,
}

impl PlanningService {
    /// 創建新的服務
    pub fn new(
        config: PlanningConfig,
        calendar: WorkCalendar,
        start_date: NaiveDate,
    ) -> plannink_core::Result<Self> {
        config.validate()?;
        Ok(Self {
            products: RwLock::new(HashMap::new()),
            tracker: Mutex::new(DirtyTracker::new()),
            config,
            calendar,
            start_date,
        })
    }

    /// 取得產品的預測序列（索引 0 為最近一期）
    pub fn projections(&self, code: &str) -> plannink_core::Result<Vec<Projection>> {
        let products = self.products.read().expect("產品鎖中毒");
        products
            .get(code)
            .map(|p| p.projections.clone())
            .ok_or_else(|| PlanningError::ProductNotFound(code.to_string()))
    }

    /// 取得完整的產品記錄
    pub fn product(&self, code: &str) -> plannink_core::Result<Product> {
        let products = self.products.read().expect("產品鎖中毒");
        products
            .get(code)
            .cloned()
            .ok_or_else(|| PlanningError::ProductNotFound(code.to_string()))
    }

    /// 所有產品代碼（排序）
    pub fn product_codes(&self) -> Vec<String> {
        let products = self.products.read().expect("產品鎖中毒");
        let mut codes: Vec<String> = products.keys().cloned().collect();
        codes.sort();
        codes
    }

    /// 批次重算：攝取原始記錄並重建整個產品集
    ///
    /// 單筆記錄的資料品質問題以警告回報並跳過該筆，不中斷整批。
    pub fn recalculate(&self, records: Vec<RawRecord>) -> plannink_core::Result<CalcOutcome> {
        let started = Instant::now();
        tracing::info!(registros = records.len(), "開始批次重算");

        let results: Vec<(Option<Product>, Vec<IntegrityWarning>)> = records
            .par_iter()
            .map(|record| self.compute_record(record))
            .collect();

        let mut outcome = CalcOutcome::empty();
        for (product, warnings) in results {
            outcome.warnings.extend(warnings);
            if let Some(product) = product {
                outcome.products.push(product);
            }
        }

        {
            let mut products = self.products.write().expect("產品鎖中毒");
            let mut tracker = self.tracker.lock().expect("追蹤器鎖中毒");
            for product in &outcome.products {
                products.insert(product.code.clone(), product.clone());
                tracker.clear(&product.code);
            }
        }

        outcome.calculation_time_ms = Some(started.elapsed().as_millis());
        tracing::info!(
            productos = outcome.products.len(),
            advertencias = outcome.warnings.len(),
            ms = ?outcome.calculation_time_ms,
            "批次重算完成"
        );

        Ok(outcome)
    }

    /// 套用在途單位數（正整數），回傳更新後的產品
    pub fn apply_transit_units(
        &self,
        code: &str,
        units: Decimal,
    ) -> plannink_core::Result<Product> {
        let mut products = self.products.write().expect("產品鎖中毒");
        let product = products
            .get(code)
            .ok_or_else(|| PlanningError::ProductNotFound(code.to_string()))?;

        let updated = TransitAdjuster::apply_transit_units(product, units, &self.calendar)?;
        products.insert(code.to_string(), updated.clone());

        self.tracker
            .lock()
            .expect("追蹤器鎖中毒")
            .mark_dirty(code.to_string(), DirtyReason::TransitUnits);

        Ok(updated)
    }

    /// 套用在途天數（全域或指定單期），回傳更新後的產品
    pub fn apply_transit_days(
        &self,
        code: &str,
        days: i64,
        projection_index: Option<usize>,
    ) -> plannink_core::Result<Product> {
        let mut products = self.products.write().expect("產品鎖中毒");
        let product = products
            .get(code)
            .ok_or_else(|| PlanningError::ProductNotFound(code.to_string()))?;

        let updated =
            TransitAdjuster::apply_transit_days(product, days, projection_index, &self.calendar)?;
        products.insert(code.to_string(), updated.clone());

        self.tracker
            .lock()
            .expect("追蹤器鎖中毒")
            .mark_dirty(code.to_string(), DirtyReason::TransitDays);

        Ok(updated)
    }

    /// 更新全域配置並標記所有產品待重算
    ///
    /// 各產品已套用的在途天數屬於產品狀態，不被全域配置覆寫。
    pub fn update_config(&mut self, config: PlanningConfig) -> plannink_core::Result<()> {
        config.validate()?;
        self.config = config;

        let products = self.products.read().expect("產品鎖中毒");
        let mut tracker = self.tracker.lock().expect("追蹤器鎖中毒");
        for (code, _) in products.iter() {
            tracker.mark_dirty(code.clone(), DirtyReason::Refresh);
        }
        Ok(())
    }

    /// 只重建髒標記產品的預測序列（保留在途旗標）
    pub fn regenerate_dirty(&self) -> plannink_core::Result<usize> {
        // 鎖順序固定為 產品 → 追蹤器，與變更操作一致
        let mut products = self.products.write().expect("產品鎖中毒");
        let dirty = self.tracker.lock().expect("追蹤器鎖中毒").drain();
        if dirty.is_empty() {
            return Ok(0);
        }

        let mut regenerated = 0;

        for (code, reason) in dirty {
            if let Some(product) = products.get_mut(&code) {
                tracing::debug!(codigo = %code, razon = ?reason, "重建預測序列");
                if matches!(reason, DirtyReason::Refresh) {
                    let transit_days = product.config.transit_days;
                    product.config = self.config.clone();
                    product.config.transit_days = transit_days;
                }
                TransitAdjuster::regenerate_preserving_flags(product, &self.calendar)?;
                regenerated += 1;
            }
        }

        Ok(regenerated)
    }

    /// 自上次確認以來變更過的產品（代碼 → 原因）
    pub fn pending_changes(&self) -> Vec<(String, DirtyReason)> {
        // 鎖順序固定為 產品 → 追蹤器，與變更操作一致
        let codes = self.product_codes();
        let tracker = self.tracker.lock().expect("追蹤器鎖中毒");
        let mut changes: Vec<(String, DirtyReason)> = codes
            .into_iter()
            .filter_map(|code| tracker.reason(&code).map(|r| (code, r)))
            .collect();
        changes.sort_by(|a, b| a.0.cmp(&b.0));
        changes
    }

    /// 單筆記錄的正規化 + 投影；失敗時轉為 Error 等級警告
    fn compute_record(&self, record: &RawRecord) -> (Option<Product>, Vec<IntegrityWarning>) {
        match Normalizer::normalize(record, &self.config, self.start_date) {
            Ok((mut product, mut warnings)) => {
                if let Err(error) = ProjectionGenerator::project(&mut product, &self.calendar) {
                    warnings.push(IntegrityWarning::error(
                        product.code.clone(),
                        format!("投影計算失敗: {error}"),
                    ));
                    return (None, warnings);
                }
                if let Some(warning) = OrderResolver::verify_order_quantities(&product) {
                    warnings.push(warning);
                }
                (Some(product), warnings)
            }
            Err(error) => (
                None,
                vec![IntegrityWarning::error(
                    "<sin codigo>".to_string(),
                    format!("記錄被跳過: {error}"),
                )],
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_record(code: &str, stock: i64) -> RawRecord {
        json!({
            "CODIGO": code,
            "DESCRIPCION": format!("Producto {code}"),
            "STOCK_FISICO": stock,
            "UNIDADES_POR_CAJA": 24,
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
    fn test_recalculate_builds_product_set() {
        let service = service();
        let outcome = service
            .recalculate(vec![raw_record("PRD-001", 500), raw_record("PRD-002", 100)])
            .unwrap();

        assert_eq!(outcome.products.len(), 2);
        assert!(outcome.calculation_time_ms.is_some());
        assert_eq!(service.product_codes(), vec!["PRD-001", "PRD-002"]);

        let projections = service.projections("PRD-001").unwrap();
        assert_eq!(projections.len(), 6);
    }

    #[test]
    fn test_bad_record_is_skipped_with_warning() {
        let service = service();
        let bad = json!({"DESCRIPCION": "sin codigo"}).as_object().unwrap().clone();

        let outcome = service
            .recalculate(vec![raw_record("PRD-001", 500), bad])
            .unwrap();

        assert_eq!(outcome.products.len(), 1);
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.message.contains("記錄被跳過")));
    }

    #[test]
    fn test_unknown_product_not_found() {
        let service = service();
        assert!(matches!(
            service.projections("NO-EXISTE"),
            Err(PlanningError::ProductNotFound(_))
        ));
        assert!(matches!(
            service.apply_transit_units("NO-EXISTE", Decimal::from(10)),
            Err(PlanningError::ProductNotFound(_))
        ));
    }

    #[test]
    fn test_transit_units_updates_store_and_marks_dirty() {
        let service = service();
        service.recalculate(vec![raw_record("PRD-001", 400)]).unwrap();

        let updated = service
            .apply_transit_units("PRD-001", Decimal::from(48))
            .unwrap();

        assert_eq!(updated.units_in_transit, Decimal::from(48));
        // 存儲的副本與回傳值一致
        let stored = service.product("PRD-001").unwrap();
        assert_eq!(stored.total_stock, updated.total_stock);

        let changes = service.pending_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].1, DirtyReason::TransitUnits);
    }

    #[test]
    fn test_rejected_transit_mutation_changes_nothing() {
        let service = service();
        service.recalculate(vec![raw_record("PRD-001", 400)]).unwrap();
        let before = service.product("PRD-001").unwrap();

        let result = service.apply_transit_units("PRD-001", Decimal::ZERO);
        assert!(result.is_err());

        let after = service.product("PRD-001").unwrap();
        assert_eq!(
            serde_json::to_string(&after).unwrap(),
            serde_json::to_string(&before).unwrap()
        );
        assert!(service.pending_changes().is_empty());
    }

    #[test]
    fn test_transit_days_per_projection_flag() {
        let service = service();
        service.recalculate(vec![raw_record("PRD-001", 400)]).unwrap();

        let updated = service.apply_transit_days("PRD-001", 5, Some(1)).unwrap();

        assert!(updated.projections[1].dias_transito_aplicados);
        assert!(!updated.projections[0].dias_transito_aplicados);
    }

    #[test]
    fn test_update_config_regenerates_dirty() {
        let mut service = service();
        service.recalculate(vec![raw_record("PRD-001", 400)]).unwrap();
        let before = service.product("PRD-001").unwrap();
        assert_eq!(before.reorder_point, Decimal::from(500));

        // 再訂購點從 44 天縮到 22 天 → 門檻值減半
        let config = PlanningConfig::new().with_reorder_point_days(22);
        service.update_config(config).unwrap();
        let regenerated = service.regenerate_dirty().unwrap();

        assert_eq!(regenerated, 1);
        let after = service.product("PRD-001").unwrap();
        assert_eq!(after.reorder_point, Decimal::from(250));
        assert!(service.pending_changes().is_empty());
    }
}
