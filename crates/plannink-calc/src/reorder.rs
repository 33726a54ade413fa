//! 補貨參數計算

use plannink_core::{ConsumptionHistory, PlanningConfig, PlanningError};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// 庫存狀態分類
///
/// 嚴格小於的優先級串聯：低於安全庫存為 danger，否則低於再訂購點為
/// warning，否則 safe。等於門檻值不降級。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    /// 危急
    Danger,
    /// 偏低
    Warning,
    /// 安全
    Safe,
}

/// 產品的衍生補貨參數
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderParams {
    /// 平均月消耗
    pub average_consumption: Decimal,

    /// 額外預計月消耗
    pub projected_consumption: Decimal,

    /// 合計月消耗（平均 + 預計）
    pub total_consumption: Decimal,

    /// 日消耗（合計月消耗 / 每月工作日數）
    pub daily_consumption: Decimal,

    /// 安全庫存
    pub safety_stock: Decimal,

    /// 最小庫存（合計月消耗 + 安全庫存）
    pub minimum_stock: Decimal,

    /// 再訂購點（日消耗 × 再訂購點天數）
    pub reorder_point: Decimal,
}

/// 補貨參數計算器
pub struct ReorderCalculator;

impl ReorderCalculator {
    /// 由歷史消耗與配置推導補貨參數
    ///
    /// `safety_stock` 給定時視為外部供應值（必須非負），否則以
    /// 日消耗 × 安全庫存天數推導。
    pub fn params(
        history: &ConsumptionHistory,
        projected_consumption: Decimal,
        safety_stock: Option<Decimal>,
        config: &PlanningConfig,
    ) -> plannink_core::Result<ReorderParams> {
        config.validate()?;

        if let Some(ss) = safety_stock {
            if ss < Decimal::ZERO {
                return Err(PlanningError::Validation(format!(
                    "安全庫存不可為負: {ss}"
                )));
            }
        }

        let average_consumption = history.mean();
        let total_consumption = average_consumption + projected_consumption;
        let working_days = Decimal::from(config.working_days_per_month);
        let daily_consumption = total_consumption / working_days;

        let safety_stock = safety_stock
            .unwrap_or_else(|| daily_consumption * Decimal::from(config.safety_stock_days));
        let minimum_stock = total_consumption + safety_stock;

        // 先乘後除：250/22 的循環小數經 ×44 會留下最後一位殘差，
        // 把 500 的門檻值推成 500.000...02
        let reorder_point =
            total_consumption * Decimal::from(config.reorder_point_days) / working_days;

        Ok(ReorderParams {
            average_consumption,
            projected_consumption,
            total_consumption,
            daily_consumption,
            safety_stock,
            minimum_stock,
            reorder_point,
        })
    }

    /// 覆蓋天數 = round(庫存 / 日消耗)
    ///
    /// 日消耗為 0 時拒絕計算，呼叫端必須改用哨兵值。
    pub fn days_of_coverage(
        stock: Decimal,
        daily_consumption: Decimal,
    ) -> plannink_core::Result<Decimal> {
        if daily_consumption <= Decimal::ZERO {
            return Err(PlanningError::DivisionGuard(
                "日消耗為 0，無法計算覆蓋天數".to_string(),
            ));
        }
        Ok((stock / daily_consumption)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
    }

    /// 庫存狀態分類（嚴格小於串聯）
    pub fn classify(stock: Decimal, safety_stock: Decimal, reorder_point: Decimal) -> StockStatus {
        if stock < safety_stock {
            StockStatus::Danger
        } else if stock < reorder_point {
            StockStatus::Warning
        } else {
            StockStatus::Safe
        }
    }
}
