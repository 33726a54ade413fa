//! 在途調整引擎

use plannink_core::{PlanningError, Product, WorkCalendar};
use rust_decimal::Decimal;

use crate::projection::ProjectionGenerator;

/// 在途調整引擎
///
/// 兩個操作都以「複製 → 修改 → 回傳」的方式進行：驗證失敗時
/// 呼叫端看不到任何部分變更。
pub struct TransitAdjuster;

impl TransitAdjuster {
    /// 增加在途單位數並重建預測序列
    ///
    /// 單位數必須為正整數；0 不是靜默的 no-op，而是驗證錯誤。
    pub fn apply_transit_units(
        product: &Product,
        units: Decimal,
        calendar: &WorkCalendar,
    ) -> plannink_core::Result<Product> {
        if units <= Decimal::ZERO {
            return Err(PlanningError::Validation(format!(
                "在途單位數必須大於 0: {units}"
            )));
        }
        if !units.fract().is_zero() {
            return Err(PlanningError::Validation(format!(
                "在途單位數必須為整數: {units}"
            )));
        }

        let mut updated = product.clone();
        updated.units_in_transit += units;
        updated.recompute_total_stock();

        tracing::info!(
            codigo = %updated.code,
            unidades = %units,
            transito = %updated.units_in_transit,
            "套用在途單位數"
        );

        Self::regenerate_preserving_flags(&mut updated, calendar)?;
        Ok(updated)
    }

    /// 設置在途天數並重算受影響的預測
    ///
    /// `projection_index` 為 None 時設置全域在途天數並重建整個序列；
    /// 指定索引時只重算該期的起迄日期並標記
    /// `dias_transito_aplicados`，其他期的旗標與數值不受影響。
    pub fn apply_transit_days(
        product: &Product,
        days: i64,
        projection_index: Option<usize>,
        calendar: &WorkCalendar,
    ) -> plannink_core::Result<Product> {
        if days <= 0 {
            return Err(PlanningError::Validation(format!(
                "在途天數必須大於 0: {days}"
            )));
        }
        if days > i64::from(product.config.max_transit_days) {
            return Err(PlanningError::Validation(format!(
                "在途天數 {days} 超過上限 {}",
                product.config.max_transit_days
            )));
        }
        let days = days as u32;

        let mut updated = product.clone();

        match projection_index {
            None => {
                updated.config.transit_days = days;
                tracing::info!(codigo = %updated.code, dias = days, "套用全域在途天數");
                Self::regenerate_preserving_flags(&mut updated, calendar)?;
            }
            Some(index) => {
                let total = updated.projections.len();
                let projection = updated.projections.get_mut(index).ok_or_else(|| {
                    PlanningError::Validation(format!(
                        "預測索引 {index} 超出範圍（共 {total} 期）"
                    ))
                })?;

                projection.dias_transito = days;
                projection.fecha_fin =
                    calendar.add_business_days(projection.fecha_inicio, days);
                projection.fecha_arribo = Some(projection.fecha_fin);
                projection.dias_transito_aplicados = true;

                tracing::info!(
                    codigo = %updated.code,
                    dias = days,
                    indice = index,
                    "套用單期在途天數"
                );
            }
        }

        Ok(updated)
    }

    /// 重建預測序列，保留既有的 `dias_transito_aplicados` 旗標
    ///
    /// 旗標屬於使用者操作的痕跡，不因無關的重算而被重設。
    pub fn regenerate_preserving_flags(
        product: &mut Product,
        calendar: &WorkCalendar,
    ) -> plannink_core::Result<()> {
        let saved_flags: Vec<bool> = product
            .projections
            .iter()
            .map(|p| p.dias_transito_aplicados)
            .collect();
        let saved_days: Vec<u32> = product.projections.iter().map(|p| p.dias_transito).collect();

        ProjectionGenerator::project(product, calendar)?;

        for (index, projection) in product.projections.iter_mut().enumerate() {
            if saved_flags.get(index).copied().unwrap_or(false) {
                projection.dias_transito_aplicados = true;
                if let Some(days) = saved_days.get(index) {
                    projection.dias_transito = *days;
                    projection.fecha_fin =
                        calendar.add_business_days(projection.fecha_inicio, *days);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use plannink_core::{ConsumptionHistory, MonthKey, PlanningConfig};
    use rstest::rstest;

    fn history_of(values: &[i64]) -> ConsumptionHistory {
        let mut history = ConsumptionHistory::new();
        let mut key: MonthKey = "ENE-2024".parse().unwrap();
        for v in values {
            history.insert(key, Decimal::from(*v));
            key = key.next();
        }
        history
    }

    fn projected_product() -> Product {
        let mut product = Product::new(
            "PRD-001".to_string(),
            "Alcohol gel".to_string(),
            NaiveDate::from_ymd_opt(2025, 2, 14).unwrap(),
        )
        .with_physical_stock(Decimal::from(400))
        .with_units_per_box(Decimal::from(12))
        .with_history(history_of(&[200, 250, 300, 280, 220]))
        .with_config(PlanningConfig::new());

        ProjectionGenerator::project(&mut product, &WorkCalendar::default()).unwrap();
        product
    }

    #[test]
    fn test_apply_transit_units_increments_and_recomputes() {
        let product = projected_product();
        let calendar = WorkCalendar::default();

        let updated =
            TransitAdjuster::apply_transit_units(&product, Decimal::from(50), &calendar).unwrap();

        assert_eq!(updated.units_in_transit, Decimal::from(50));
        assert_eq!(updated.total_stock, Decimal::from(450));
        // 總庫存上升，缺口隨之縮小
        assert!(updated.deficit < product.deficit);
        assert_eq!(updated.projections[0].stock_inicial, Decimal::from(450));

        // 再套用一次是累加，不是覆寫
        let again =
            TransitAdjuster::apply_transit_units(&updated, Decimal::from(50), &calendar).unwrap();
        assert_eq!(again.units_in_transit, Decimal::from(100));
        assert_eq!(again.total_stock, Decimal::from(500));
    }

    #[rstest]
    #[case(Decimal::ZERO)]
    #[case(Decimal::from(-10))]
    #[case(Decimal::new(55, 1))] // 5.5：非整數
    fn test_apply_transit_units_rejects_invalid(#[case] units: Decimal) {
        let product = projected_product();
        let result =
            TransitAdjuster::apply_transit_units(&product, units, &WorkCalendar::default());
        assert!(matches!(result, Err(PlanningError::Validation(_))));
    }

    #[test]
    fn test_rejected_mutation_leaves_original_untouched() {
        let product = projected_product();
        let before = serde_json::to_string(&product).unwrap();

        let _ = TransitAdjuster::apply_transit_units(
            &product,
            Decimal::ZERO,
            &WorkCalendar::default(),
        );

        assert_eq!(serde_json::to_string(&product).unwrap(), before);
    }

    #[test]
    fn test_apply_transit_days_global_regenerates() {
        let product = projected_product();
        let updated =
            TransitAdjuster::apply_transit_days(&product, 5, None, &WorkCalendar::default())
                .unwrap();

        assert_eq!(updated.config.transit_days, 5);
        // 到貨日後移：第一期起始日按工作日推進
        assert_eq!(
            updated.projections[0].fecha_inicio,
            NaiveDate::from_ymd_opt(2025, 2, 21).unwrap()
        );
        assert!(updated.transit_consumption > Decimal::ZERO);
    }

    #[test]
    fn test_apply_transit_days_single_index_sets_flag_only_there() {
        let product = projected_product();
        let calendar = WorkCalendar::default();

        let updated =
            TransitAdjuster::apply_transit_days(&product, 5, Some(2), &calendar).unwrap();

        for (index, projection) in updated.projections.iter().enumerate() {
            assert_eq!(projection.dias_transito_aplicados, index == 2);
        }
        assert_eq!(updated.projections[2].dias_transito, 5);
        assert_eq!(
            updated.projections[2].fecha_fin,
            calendar.add_business_days(updated.projections[2].fecha_inicio, 5)
        );

        // 其他期的數值完全不變
        assert_eq!(
            serde_json::to_value(&updated.projections[0]).unwrap(),
            serde_json::to_value(&product.projections[0]).unwrap()
        );
    }

    #[test]
    fn test_flag_survives_unrelated_recomputation() {
        let product = projected_product();
        let calendar = WorkCalendar::default();

        let flagged =
            TransitAdjuster::apply_transit_days(&product, 5, Some(2), &calendar).unwrap();
        // 無關的在途單位數操作觸發整個序列重建
        let updated =
            TransitAdjuster::apply_transit_units(&flagged, Decimal::from(24), &calendar).unwrap();

        for (index, projection) in updated.projections.iter().enumerate() {
            assert_eq!(
                projection.dias_transito_aplicados,
                index == 2,
                "索引 {index} 的旗標被重設"
            );
        }
        assert_eq!(updated.projections[2].dias_transito, 5);
    }

    #[rstest]
    #[case(0)]
    #[case(-3)]
    #[case(31)] // 超過上限 30
    fn test_apply_transit_days_rejects_invalid(#[case] days: i64) {
        let product = projected_product();
        let result =
            TransitAdjuster::apply_transit_days(&product, days, None, &WorkCalendar::default());
        assert!(matches!(result, Err(PlanningError::Validation(_))));
    }

    #[test]
    fn test_apply_transit_days_rejects_out_of_range_index() {
        let product = projected_product();
        let result =
            TransitAdjuster::apply_transit_days(&product, 5, Some(99), &WorkCalendar::default());
        assert!(matches!(result, Err(PlanningError::Validation(_))));
    }
}
