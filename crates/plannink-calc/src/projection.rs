//! 預測序列產生器

use chrono::{Datelike, Duration, Months, NaiveDate};
use plannink_core::{
    CalculationMethod, ConsumptionHistory, MonthKey, PlannedReceipt, PlanningError, Product,
    Projection, RequiredAction, WorkCalendar,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::order::OrderResolver;
use crate::reorder::ReorderCalculator;

/// 警報提前量（天）：在警報天數之上再提早示警
const ALARM_ANTICIPATION_DAYS: u32 = 10;

/// 下單日相對補貨日的提前天數
const REQUEST_LEAD_DAYS: i64 = 5;

/// 預測序列產生器
///
/// 由產品的歷史消耗、目前庫存與配置產生整個規劃期的月度預測，
/// 並回填產品層級的補貨參數與訂購建議。
pub struct ProjectionGenerator;

impl ProjectionGenerator {
    /// 重新計算產品的衍生參數並重建預測序列
    ///
    /// 注意：所有預測的 `dias_transito_aplicados` 旗標會被重設；
    /// 要保留旗標的呼叫端（在途調整）必須先存檔再回寫。
    pub fn project(product: &mut Product, calendar: &WorkCalendar) -> plannink_core::Result<()> {
        let supplied_safety_stock = if product.safety_stock > Decimal::ZERO {
            Some(product.safety_stock)
        } else {
            None
        };

        let params = ReorderCalculator::params(
            &product.history,
            product.projected_consumption,
            supplied_safety_stock,
            &product.config,
        )?;

        product.average_consumption = params.average_consumption;
        product.total_consumption = params.total_consumption;
        product.daily_consumption = params.daily_consumption;
        product.safety_stock = params.safety_stock;
        product.minimum_stock = params.minimum_stock;
        product.reorder_point = params.reorder_point;
        product.recompute_total_stock();

        let config = product.config.clone();
        let daily = params.daily_consumption;
        let transit_days = config.transit_days;

        // 在途天數先行：到貨日按工作日推進，途中消耗從期初庫存扣除
        let arrival_date = if transit_days > 0 {
            calendar.add_business_days(product.start_date, transit_days)
        } else {
            product.start_date
        };
        let transit_burn = daily * Decimal::from(transit_days);
        let opening_stock = (product.total_stock - transit_burn).max(Decimal::ZERO);
        product.transit_consumption = transit_burn.round_dp(2);

        // 產品層級訂購狀態
        product.deficit = (params.reorder_point - opening_stock).max(Decimal::ZERO);
        product.boxes_to_order =
            OrderResolver::boxes_for_deficit(product.deficit, product.units_per_box);
        product.units_to_order = Decimal::from(product.boxes_to_order) * product.units_per_box;

        let lead = Decimal::from(config.lead_time_days);
        let max_repo = Decimal::from(config.max_reposition_days);

        if daily > Decimal::ZERO {
            let coverage = (opening_stock / daily).min(max_repo);
            let frequency = (params.reorder_point / daily).min(max_repo);
            let days_until_reposition = (frequency - lead).max(Decimal::ZERO);

            product.days_of_coverage = coverage.round_dp(2);
            product.reposition_frequency = frequency.round_dp(2);
            product.reposition_date = Some(shift_days(product.start_date, days_until_reposition)?);
        } else {
            product.days_of_coverage = Decimal::ZERO;
            product.reposition_frequency = Decimal::ZERO;
            product.reposition_date = None;
        }

        tracing::debug!(
            codigo = %product.code,
            stock_inicial = %opening_stock,
            punto_reorden = %params.reorder_point,
            "產生預測序列"
        );

        // 月度預測：期初庫存 = 前期消耗後庫存 + 前期訂購量
        let mut projections = Vec::with_capacity(config.horizon_months as usize);
        let mut open = opening_stock;
        let mut previous_ordered = Decimal::ZERO;
        let alarm_threshold =
            daily * Decimal::from(config.stock_alarm_days + ALARM_ANTICIPATION_DAYS);

        for offset in 0..config.horizon_months {
            let current_date = arrival_date
                .checked_add_months(Months::new(offset))
                .ok_or_else(|| PlanningError::InvalidDate("規劃期超出日期範圍".to_string()))?;
            let mes = MonthKey::new(current_date.year(), current_date.month())?;

            let consumption = monthly_consumption(
                &product.history,
                daily,
                current_date.month(),
                &config,
            );

            let closing = (open - consumption).max(Decimal::ZERO);

            // 目標庫存補到安全與最小庫存的中點；跌破安全庫存時至少補回安全線
            let target_stock = (params.safety_stock + params.minimum_stock) / Decimal::TWO;
            let mut month_deficit = (target_stock - closing).max(Decimal::ZERO);
            if closing < params.safety_stock {
                month_deficit = (params.safety_stock - closing).max(month_deficit);
            }

            let boxes = OrderResolver::boxes_for_deficit(month_deficit, product.units_per_box);
            let ordered_units = Decimal::from(boxes) * product.units_per_box;
            let stock_with_orders = closing + ordered_units;

            let mut projection = Projection::new(mes, current_date);
            projection.dias_transito = transit_days;
            projection.fecha_fin = calendar.add_business_days(current_date, transit_days);
            projection.stock_inicial = open.round_dp(2);
            projection.stock_proyectado = closing.round_dp(2);
            projection.consumo_mensual = consumption;
            projection.consumo_diario = daily.round_dp(2);
            projection.stock_seguridad = params.safety_stock.round_dp(2);
            projection.stock_minimo = params.minimum_stock.round_dp(2);
            projection.punto_reorden = params.reorder_point.round_dp(2);
            projection.deficit = month_deficit.round_dp(2);
            projection.cajas_a_pedir = boxes;
            projection.unidades_a_pedir = ordered_units;
            projection.alerta_stock = closing < alarm_threshold;
            projection.pedidos_recibidos = previous_ordered;
            projection.frecuencia_reposicion = product.reposition_frequency;

            if daily > Decimal::ZERO {
                let coverage = (stock_with_orders / daily).min(max_repo);
                projection.tiempo_cobertura = coverage.round_dp(2);
                projection.fecha_reposicion =
                    Some(shift_days(current_date, (coverage - lead).max(Decimal::ZERO))?);
                projection.fecha_solicitud = Some(shift_days(
                    current_date,
                    (coverage - lead - Decimal::from(REQUEST_LEAD_DAYS)).max(Decimal::ZERO),
                )?);
                projection.fecha_arribo = Some(shift_days(
                    current_date,
                    (coverage - Decimal::from(REQUEST_LEAD_DAYS)).max(Decimal::ZERO),
                )?);
            }

            projection.accion_requerida = if boxes > 0 {
                RequiredAction::OrderNow(boxes)
            } else if projection.alerta_stock {
                RequiredAction::Monitor
            } else {
                RequiredAction::Sufficient
            };

            if ordered_units > Decimal::ZERO {
                let receipt_arrival = projection.fecha_arribo.unwrap_or(projection.fecha_fin);
                projection
                    .add_pending_receipt(mes.next(), PlannedReceipt::new(ordered_units, receipt_arrival));
            }

            projections.push(projection);

            open = stock_with_orders;
            previous_ordered = ordered_units;
        }

        product.projections = projections;
        Ok(())
    }
}

/// 動態月消耗
///
/// 基底 = 日消耗 × 每月消耗天數；有同月歷史時按 0.7/0.3 加權，
/// 再套用最近三個月的趨勢因子（限制在 0.5–1.5），下限為基底的一半。
fn monthly_consumption(
    history: &ConsumptionHistory,
    daily_consumption: Decimal,
    month: u32,
    config: &plannink_core::PlanningConfig,
) -> Decimal {
    let base = daily_consumption * Decimal::from(config.consumption_days_per_month);

    if config.calculation_method == Some(CalculationMethod::HistoricalAverage) {
        return base.round_dp(2);
    }

    let same_month = history.values_for_month(month);
    let mut consumption = if same_month.is_empty() {
        base
    } else {
        let month_avg: Decimal =
            same_month.iter().copied().sum::<Decimal>() / Decimal::from(same_month.len());
        Decimal::new(7, 1) * month_avg + Decimal::new(3, 1) * base
    };

    consumption *= growth_factor(history);

    let floor = base * Decimal::new(5, 1);
    consumption.max(floor).round_dp(2)
}

/// 最近三個月的趨勢因子，限制在 [0.5, 1.5]
fn growth_factor(history: &ConsumptionHistory) -> Decimal {
    let recent: Vec<Decimal> = history
        .last_n(3)
        .into_iter()
        .filter(|v| *v > Decimal::ZERO)
        .collect();

    if recent.len() < 2 {
        return Decimal::ONE;
    }

    let diffs: Vec<Decimal> = recent.windows(2).map(|w| w[1] - w[0]).collect();
    let mean_diff: Decimal = diffs.iter().copied().sum::<Decimal>() / Decimal::from(diffs.len());
    let base_values = &recent[..recent.len() - 1];
    let base_mean: Decimal =
        base_values.iter().copied().sum::<Decimal>() / Decimal::from(base_values.len());

    if base_mean == Decimal::ZERO {
        return Decimal::ONE;
    }

    let growth = mean_diff / base_mean;
    (Decimal::ONE + growth)
        .max(Decimal::new(5, 1))
        .min(Decimal::new(15, 1))
}

/// 日期前移（天數取整）
fn shift_days(date: NaiveDate, days: Decimal) -> plannink_core::Result<NaiveDate> {
    let whole_days = days.floor().to_i64().unwrap_or(0);
    date.checked_add_signed(Duration::days(whole_days))
        .ok_or_else(|| PlanningError::InvalidDate(format!("日期溢出: {date} + {whole_days} 天")))
}
